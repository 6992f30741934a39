//! # Animation Completion
//!
//! The display owns the spin. The engine only needs to know when it has
//! finished, so that signal is a one-shot future rather than a rendering
//! callback.
//!
//! ```text
//! engine:   let (notifier, completion) = animation_signal(round);
//! engine:   completion.await        <-- parked until ...
//! display:  notifier.notify()       <-- ... the spin ends
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// Creates a linked notifier and completion future for `round`.
#[must_use]
pub fn animation_signal(round: u64) -> (AnimationNotifier, AnimationCompletion) {
    let (sender, receiver) = oneshot::channel();
    (
        AnimationNotifier { round, sender },
        AnimationCompletion { round, receiver },
    )
}

/// The display's half: fire once when the spin ends.
#[derive(Debug)]
pub struct AnimationNotifier {
    round: u64,
    sender: oneshot::Sender<()>,
}

impl AnimationNotifier {
    /// Round the spin belongs to.
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Signals completion. Returns false if nobody is waiting any more.
    pub fn notify(self) -> bool {
        self.sender.send(()).is_ok()
    }
}

/// The engine's half. Resolves to `true` when notified, `false` if the
/// notifier was dropped without firing.
#[derive(Debug)]
pub struct AnimationCompletion {
    round: u64,
    receiver: oneshot::Receiver<()>,
}

impl AnimationCompletion {
    /// Round the spin belongs to.
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.round
    }
}

impl Future for AnimationCompletion {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        Pin::new(&mut self.receiver).poll(cx).map(|r| r.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_completes() {
        let (notifier, completion) = animation_signal(4);
        assert_eq!(notifier.round(), 4);
        assert_eq!(completion.round(), 4);

        let waiter = tokio::spawn(completion);
        assert!(notifier.notify());
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_notifier_resolves_false() {
        let (notifier, completion) = animation_signal(1);
        drop(notifier);
        assert!(!completion.await);
    }

    #[tokio::test]
    async fn test_notify_without_waiter() {
        let (notifier, completion) = animation_signal(1);
        drop(completion);
        assert!(!notifier.notify());
    }
}
