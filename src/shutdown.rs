use std::sync::Arc;
use tokio::sync::watch;

/// Shared close signal of a running server.
///
/// Every accept loop, connection and request holds a clone; closing is
/// observed by all of them and can not be undone.
#[derive(Debug, Clone)]
pub(crate) struct ShutDownState {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ShutDownState {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Signals a shutdown. Returns `false` if it was already signaled.
    pub fn shutdown(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [ShutDownState::shutdown] has been called.
    pub async fn wait(&mut self) {
        // the sender lives as long as any clone, so this only fails after a shutdown
        let _ = self.rx.wait_for(|closed| *closed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_resolves_after_shutdown() {
        let state = ShutDownState::new();
        let mut waiter = state.clone();
        assert!(!waiter.is_shutdown());
        assert!(state.shutdown());
        assert!(!state.shutdown());
        waiter.wait().await;
        assert!(waiter.is_shutdown());
    }
}
