//! Admission gate behaviour under load.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use opsgate::config::options;
use opsgate::{BasicContext, Dispatcher};

mod common;

use common::{Blocker, TestServer};

fn blocking_dispatcher(concurrency: usize, blocker: Arc<Blocker>) -> Dispatcher {
    Dispatcher::basic()
        .option(options::concurrency(concurrency))
        .handle("/work", move |ctx: Arc<BasicContext>| {
            let blocker = blocker.clone();
            async move {
                blocker.enter().await;
                ctx.text(StatusCode::OK, "done");
            }
        })
        .build()
        .unwrap()
}

fn spawn_gets(server: &Arc<TestServer>, path: &'static str, n: usize) -> Vec<tokio::task::JoinHandle<(u16, String)>> {
    (0..n)
        .map(|_| {
            let server = server.clone();
            tokio::spawn(async move { server.get(path).await })
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_is_enforced() {
    const K: usize = 3;
    let blocker = Arc::new(Blocker::new());
    let server = Arc::new(TestServer::start(blocking_dispatcher(K, blocker.clone())).await);

    // 1. Saturate the gate and queue one more.
    let tasks = spawn_gets(&server, "/work", K + 1);
    blocker.wait_inside(K).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // 2. The extra request is parked at the gate, not in the handler.
    assert_eq!(blocker.inside(), K);
    assert_eq!(blocker.entered(), K);
    assert_eq!(server.dispatcher.gate().available_permits(), Some(0));

    // 3. One completion admits the waiter.
    blocker.release(1);
    blocker.wait_entered(K + 1).await;
    assert_eq!(blocker.entered(), K + 1);

    // 4. Drain.
    blocker.release(K);
    for task in tasks {
        assert_eq!(task.await.unwrap(), (200, "done".to_string()));
    }
    assert_eq!(blocker.max_inside(), K);
    assert_eq!(server.dispatcher.gate().available_permits(), Some(K));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reserved_endpoints_bypass_saturated_gate() {
    let blocker = Arc::new(Blocker::new());
    let server = Arc::new(TestServer::start(blocking_dispatcher(2, blocker.clone())).await);

    let tasks = spawn_gets(&server, "/work", 5);
    blocker.wait_inside(2).await;

    for path in ["/debug/ready", "/debug/alive", "/debug/metrics", "/debug/pprof/"] {
        let res = tokio::time::timeout(Duration::from_secs(2), server.get(path)).await;
        let (status, _) = res.unwrap_or_else(|_| panic!("{path} starved by application load"));
        assert_eq!(status, 200, "{path}");
    }
    assert_eq!(blocker.inside(), 2);

    blocker.release(5);
    for task in tasks {
        assert_eq!(task.await.unwrap().0, 200);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_zero_concurrency_is_unthrottled() {
    const N: usize = 50;
    let blocker = Arc::new(Blocker::new());
    let server = Arc::new(TestServer::start(blocking_dispatcher(0, blocker.clone())).await);
    assert!(!server.dispatcher.gate().is_enabled());

    let tasks = spawn_gets(&server, "/work", N);
    blocker.wait_inside(N).await;
    assert_eq!(blocker.max_inside(), N);

    blocker.release(N);
    for task in tasks {
        assert_eq!(task.await.unwrap().0, 200);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_wait_does_not_leak_permits() {
    let blocker = Arc::new(Blocker::new());
    let dispatcher = blocking_dispatcher(1, blocker.clone());

    let work = || Request::builder().uri("/work").body(Body::empty()).unwrap();

    // 1. Occupy the only permit.
    let first = {
        let d = dispatcher.clone();
        let req = work();
        tokio::spawn(async move { d.dispatch(req).await.status() })
    };
    blocker.wait_inside(1).await;

    // 2. A second request waits at the gate, then its client goes away.
    let second = {
        let d = dispatcher.clone();
        let req = work();
        tokio::spawn(async move { d.dispatch(req).await.status() })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!second.is_finished());
    second.abort();
    assert!(second.await.unwrap_err().is_cancelled());

    // 3. Capacity is intact once the first request finishes.
    blocker.release(1);
    assert_eq!(first.await.unwrap(), StatusCode::OK);
    assert_eq!(dispatcher.gate().available_permits(), Some(1));
    assert_eq!(blocker.entered(), 1);

    blocker.release(1);
    assert_eq!(dispatcher.dispatch(work()).await.status(), StatusCode::OK);
    assert_eq!(dispatcher.gate().available_permits(), Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_handler_releases_permit() {
    let blocker = Arc::new(Blocker::new());
    let dispatcher = blocking_dispatcher(1, blocker.clone());

    let running = {
        let d = dispatcher.clone();
        tokio::spawn(async move {
            d.dispatch(Request::builder().uri("/work").body(Body::empty()).unwrap())
                .await
        })
    };
    blocker.wait_inside(1).await;
    assert_eq!(dispatcher.gate().available_permits(), Some(0));

    running.abort();
    let _ = running.await;
    assert_eq!(dispatcher.gate().available_permits(), Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bounded_wait_rejects_with_503() {
    let blocker = Arc::new(Blocker::new());
    let dispatcher = Dispatcher::basic()
        .option(options::concurrency(1))
        .option(options::admission_timeout(Duration::from_millis(50)))
        .handle("/work", {
            let blocker = blocker.clone();
            move |ctx: Arc<BasicContext>| {
                let blocker = blocker.clone();
                async move {
                    blocker.enter().await;
                    ctx.text(StatusCode::OK, "done");
                }
            }
        })
        .build()
        .unwrap();
    let server = Arc::new(TestServer::start(dispatcher).await);

    let held = spawn_gets(&server, "/work", 1);
    blocker.wait_inside(1).await;

    assert_eq!(server.get("/work").await, (503, "ADMISSION TIMEOUT".to_string()));

    blocker.release(1);
    for task in held {
        assert_eq!(task.await.unwrap().0, 200);
    }
}
