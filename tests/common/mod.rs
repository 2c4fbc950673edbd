//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use opsgate::lifecycle::{startup, Shutdown};
use opsgate::Dispatcher;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

/// A dispatcher served on an ephemeral port. Shuts down when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    pub dispatcher: Dispatcher,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestServer {
    pub async fn start(dispatcher: Dispatcher) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        let served = dispatcher.clone();
        tokio::spawn(async move {
            let _ = startup::serve(listener, served, server_shutdown).await;
        });

        let client = reqwest::Client::builder()
            .no_proxy()
            .pool_max_idle_per_host(0)
            .build()
            .unwrap();

        Self {
            addr,
            dispatcher,
            client,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// GET `path`, returning status and body.
    pub async fn get(&self, path: &str) -> (u16, String) {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("server unreachable");
        let status = res.status().as_u16();
        (status, res.text().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Parks handlers until the test releases them, tracking how many are inside.
#[derive(Debug)]
#[allow(dead_code)]
pub struct Blocker {
    inside: AtomicUsize,
    max_inside: AtomicUsize,
    entered: AtomicUsize,
    release: Semaphore,
}

#[allow(dead_code)]
impl Blocker {
    pub fn new() -> Self {
        Self {
            inside: AtomicUsize::new(0),
            max_inside: AtomicUsize::new(0),
            entered: AtomicUsize::new(0),
            release: Semaphore::new(0),
        }
    }

    /// Called from a handler body: wait for one release.
    pub async fn enter(&self) {
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_inside.fetch_max(now, Ordering::SeqCst);
        self.entered.fetch_add(1, Ordering::SeqCst);

        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }
        self.inside.fetch_sub(1, Ordering::SeqCst);
    }

    /// Let `n` parked handlers finish.
    pub fn release(&self, n: usize) {
        self.release.add_permits(n);
    }

    pub fn inside(&self) -> usize {
        self.inside.load(Ordering::SeqCst)
    }

    pub fn max_inside(&self) -> usize {
        self.max_inside.load(Ordering::SeqCst)
    }

    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` handlers are parked.
    pub async fn wait_inside(&self, n: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while self.inside() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "expected {n} handlers inside, saw {}", self.inside());
    }

    /// Wait until at least `n` handlers have entered in total.
    pub async fn wait_entered(&self, n: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while self.entered() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "expected {n} handlers entered, saw {}", self.entered());
    }
}
