//! One-shot completion for callback-driven ceremonies.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::credential::CeremonyOutcome;
use crate::error::CeremonyFailure;

/// Sender half handed to the platform callback.
///
/// `complete` consumes the handle, so a second delivery does not compile.
/// Dropping the handle without completing delivers
/// [`CeremonyFailure::Abandoned`], so the waiting side is always resolved.
pub struct Completion {
    sender: Option<oneshot::Sender<CeremonyOutcome>>,
}

/// Receiving half; resolves to the single outcome.
pub struct CompletionReceiver {
    receiver: oneshot::Receiver<CeremonyOutcome>,
}

impl Completion {
    pub fn channel() -> (Completion, CompletionReceiver) {
        let (sender, receiver) = oneshot::channel();
        (
            Completion {
                sender: Some(sender),
            },
            CompletionReceiver { receiver },
        )
    }

    pub fn complete(mut self, outcome: CeremonyOutcome) {
        if let Some(sender) = self.sender.take() {
            if sender.send(outcome).is_err() {
                debug!("Ceremony completed after the caller stopped waiting");
            }
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(sender) = self.sender.take() {
            warn!("Ceremony completion dropped without a result");
            let _ = sender.send(CeremonyOutcome::Failure(CeremonyFailure::Abandoned));
        }
    }
}

impl Future for CompletionReceiver {
    type Output = CeremonyOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver)
            .poll(cx)
            .map(|received| {
                received.unwrap_or(CeremonyOutcome::Failure(CeremonyFailure::Abandoned))
            })
    }
}
