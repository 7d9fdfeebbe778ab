//! Process-wide shutdown token.
//!
//! The token is set at most once, by the signal listener, and never resets.
//! The prune loop polls it at the top of every cycle and races it against
//! every sleep, so a shutdown is observed without waiting out the interval.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Clone, Debug)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Sleeps for `duration` unless shutdown is requested first.
    /// Returns `true` when the sleep was cut short.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.wait() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }
}

/// Installs SIGTERM and SIGINT handlers and spawns a task that triggers
/// `shutdown` on the first signal. Both handlers are registered before this
/// returns, so no signal delivered afterwards is lost.
#[cfg(unix)]
pub fn install_signal_handlers(shutdown: Shutdown) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("Interrupt received, preparing to shut down..."),
            _ = terminate.recv() => info!("SIGTERM received, preparing to shut down..."),
        }

        shutdown.trigger();
    });

    Ok(handle)
}

/// Ctrl-C only. The listener is registered on the first poll of the
/// spawned task.
#[cfg(not(unix))]
pub fn install_signal_handlers(shutdown: Shutdown) -> Result<JoinHandle<()>> {
    let handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, preparing to shut down...");
            shutdown.trigger();
        }
    });

    Ok(handle)
}
