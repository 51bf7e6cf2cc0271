//! Cooperative cancellation for in-flight fetches.
//!
//! A [`CancellationSource`] is held by whoever may abort an operation (the
//! view manager); the matching [`CancellationToken`] is handed to the
//! operation itself (the transport), which either polls
//! [`is_cancelled`](CancellationToken::is_cancelled) or awaits
//! [`cancelled`](CancellationToken::cancelled) in a `select!`.
//!
//! Built on `tokio::sync::watch`, so tokens are cheap to clone and wake every
//! waiter at once.

use tokio::sync::watch;

/// The control handle that triggers cancellation.
///
/// Dropping the source does not cancel its tokens; call
/// [`cancel`](Self::cancel) explicitly.
#[derive(Debug)]
pub struct CancellationSource {
    sender: watch::Sender<bool>,
}

/// A cloneable view of a [`CancellationSource`].
#[derive(Debug, Clone)]
pub struct CancellationToken {
    receiver: watch::Receiver<bool>,
}

impl CancellationSource {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            receiver: self.sender.subscribe(),
        }
    }

    /// Signal cancellation to every token. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// A token that is never cancelled, for calls nobody will abort.
    pub fn never() -> Self {
        let (_, receiver) = watch::channel(false);
        Self { receiver }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once cancellation is requested.
    ///
    /// If the source is dropped without cancelling, this never resolves.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
