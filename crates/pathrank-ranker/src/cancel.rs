//! Run cancellation signal.
//!
//! A [`CancelHandle`] owned by the caller flips a watch channel; every
//! [`Cancellation`] clone observes it. Once cancelled, always cancelled.

use tokio::sync::watch;

#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

/// Create a linked handle/signal pair.
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, Cancellation { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> Cancellation {
        Cancellation { rx: self.tx.subscribe() }
    }
}

impl Cancellation {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // receivers keep the last value once the sender is gone
        drop(tx);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pending forever if the
    /// handle is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let sender_gone = rx.wait_for(|c| *c).await.is_err();
        if sender_gone {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_wakes_waiters() {
        let (handle, signal) = cancellation();
        let waiter = signal.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        assert!(!signal.is_cancelled());
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
        assert!(signal.is_cancelled());
        assert!(handle.signal().is_cancelled());
    }

    #[tokio::test]
    async fn test_never_does_not_fire() {
        let signal = Cancellation::never();
        assert!(!signal.is_cancelled());
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(waited.is_err());
    }
}
