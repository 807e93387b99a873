use tokio::sync::watch;

/// Shutdown signal shared by the scheduler and the HTTP server.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Sender half; dropping it does not trigger shutdown.
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

impl Shutdown {
    /// Resolve once shutdown has been triggered.
    pub async fn wait(mut self) {
        if self.rx.wait_for(|requested| *requested).await.is_err() {
            // Trigger dropped without firing: never resolve.
            std::future::pending::<()>().await;
        }
    }
}

/// Resolve on the first Ctrl+C. A second Ctrl+C exits immediately.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }

    tracing::warn!("shutdown requested, finishing current tick");

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("force quit");
            std::process::exit(130);
        }
    });
}
