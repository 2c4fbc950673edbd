//! Demo host for the opsgate dispatcher.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!   Client Request       │                  DISPATCHER                  │
//!   ─────────────────────┼─▶ readiness path ──▶ run checks ─▶ counter   │
//!                        │   liveness path  ──▶ read counter (cascade)  │
//!                        │   metrics path   ──▶ Prometheus exporter     │
//!                        │   /debug/*       ──▶ profiling router        │
//!                        │   anything else  ──▶ admission gate          │
//!                        │                        └─▶ route table       │
//!                        │                             └─▶ Context      │
//!                        │                                 lifecycle    │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use clap::Parser;
use tokio::net::TcpListener;

use opsgate::config::{load_config, options, Settings};
use opsgate::lifecycle::{signals, startup, Shutdown};
use opsgate::observability::logging;
use opsgate::{check_fn, BasicContext, Dispatcher};

#[derive(Parser, Debug)]
#[command(name = "opsgate", version, about = "HTTP dispatcher demo host")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the admission gate capacity (0 = unlimited).
    #[arg(long)]
    concurrency: Option<usize>,

    /// Override the readiness cascade threshold (0 = disabled).
    #[arg(long)]
    readiness_cascade: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => Settings::default(),
    };
    if let Some(bind) = cli.bind {
        settings.bind_address = bind;
    }

    logging::init(&settings.log_level);
    tracing::info!("opsgate v{} starting", env!("CARGO_PKG_VERSION"));

    let started = Instant::now();
    let mut builder = Dispatcher::basic()
        .options(settings.dispatcher.clone())
        .check(
            "process",
            check_fn(move || async move {
                tracing::trace!(uptime_secs = started.elapsed().as_secs(), "process check");
                Ok(())
            }),
        )
        .provide(settings.clone())
        .handle("/hello", |ctx: Arc<BasicContext>| async move {
            let name = ctx
                .uri()
                .query()
                .and_then(|q| q.strip_prefix("name="))
                .unwrap_or("world")
                .to_string();
            ctx.text(StatusCode::OK, format!("hello, {name}"));
        })
        .handle("/config", |ctx: Arc<BasicContext>| async move {
            match ctx.component::<Settings>() {
                Some(settings) => ctx.json(StatusCode::OK, &settings.dispatcher),
                None => ctx.text(StatusCode::INTERNAL_SERVER_ERROR, "settings not injected"),
            }
        });

    if let Some(n) = cli.concurrency {
        builder = builder.option(options::concurrency(n));
    }
    if let Some(n) = cli.readiness_cascade {
        builder = builder.option(options::readiness_cascade(n));
    }
    let dispatcher = builder.build()?;

    let listener = TcpListener::bind(&settings.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    startup::serve(listener, dispatcher, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
