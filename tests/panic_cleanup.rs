//! Panic handling tests
//!
//! The binary installs a reporting panic hook. These check that the hook lets
//! unwinding continue, so the remote server is still stopped when a run panics.

use async_trait::async_trait;
use network_throughput_validator::{
    app::install_panic_hook,
    remote::{with_server, RemoteServerController},
    Result,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

static EARLIER_HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct CountingController {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

#[async_trait]
impl RemoteServerController for CountingController {
    async fn start(&self) -> Result<Option<String>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn run_blows_up() -> bool {
    true
}

#[tokio::test]
async fn test_server_is_stopped_when_run_panics_under_installed_hook() {
    std::panic::set_hook(Box::new(|_| {
        EARLIER_HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
    }));
    install_panic_hook();

    let controller = Arc::new(CountingController::default());
    let inner = controller.clone();

    let handle = tokio::spawn(async move {
        with_server(inner.as_ref(), |_| async {
            if run_blows_up() {
                panic!("interval table overflowed");
            }
        })
        .await
    });

    let joined = handle.await;
    assert!(joined.unwrap_err().is_panic());
    assert_eq!(controller.starts.load(Ordering::SeqCst), 1);
    assert_eq!(controller.stops.load(Ordering::SeqCst), 1);

    // the earlier hook still ran, once, for the original panic
    assert_eq!(EARLIER_HOOK_CALLS.load(Ordering::SeqCst), 1);

    let _ = std::panic::take_hook();
}
