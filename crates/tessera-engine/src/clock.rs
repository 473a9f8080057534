//! Fixed-step boundary callbacks with cooperative cancellation.
//!
//! The late-fixed-update loop of a pipeline is a registration with the
//! [`FixedStepScheduler`]. At every fixed-step boundary the due registrations
//! run once; each is re-queued only if its body asks to continue and its
//! [`CancellationToken`] is still live.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops a scheduled loop at its next boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct Registration {
    key: usize,
    token: CancellationToken,
}

/// Queue of callbacks waiting for the next fixed-step boundary.
///
/// Keys identify the owner of each registration (a pipeline index); the body
/// passed to [`run_boundary`](Self::run_boundary) maps a key back to work.
#[derive(Debug, Default)]
pub struct FixedStepScheduler {
    pending: Vec<Registration>,
    boundaries: u64,
}

impl FixedStepScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` for the next boundary.
    pub fn schedule(&mut self, key: usize, token: CancellationToken) {
        self.pending.push(Registration { key, token });
    }

    /// Fire one boundary. Cancelled registrations are dropped unrun; the rest
    /// run in registration order and are re-queued when `body` returns `true`
    /// and their token is still live. Returns how many bodies ran.
    pub fn run_boundary(&mut self, mut body: impl FnMut(usize) -> bool) -> usize {
        self.boundaries += 1;
        let due = std::mem::take(&mut self.pending);
        let mut ran = 0;
        for registration in due {
            if registration.token.is_cancelled() {
                continue;
            }
            ran += 1;
            if body(registration.key) && !registration.token.is_cancelled() {
                self.pending.push(registration);
            }
        }
        ran
    }

    /// Live registrations waiting for the next boundary.
    pub fn pending(&self) -> usize {
        self.pending
            .iter()
            .filter(|r| !r.token.is_cancelled())
            .count()
    }

    /// Boundaries fired so far.
    pub fn boundaries(&self) -> u64 {
        self.boundaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requeues_while_body_continues() {
        let mut clock = FixedStepScheduler::new();
        let token = CancellationToken::new();
        clock.schedule(3, token.clone());

        let mut calls = 0;
        for _ in 0..3 {
            clock.run_boundary(|key| {
                assert_eq!(key, 3);
                calls += 1;
                calls < 2
            });
        }
        assert_eq!(calls, 2);
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.boundaries(), 3);
    }

    #[test]
    fn cancelled_registration_never_runs_again() {
        let mut clock = FixedStepScheduler::new();
        let token = CancellationToken::new();
        clock.schedule(0, token.clone());
        assert_eq!(clock.run_boundary(|_| true), 1);

        token.cancel();
        assert_eq!(clock.pending(), 0);
        assert_eq!(clock.run_boundary(|_| panic!("cancelled loop ran")), 0);
    }

    #[test]
    fn cancel_inside_body_stops_requeue() {
        let mut clock = FixedStepScheduler::new();
        let token = CancellationToken::new();
        clock.schedule(0, token.clone());
        clock.run_boundary(|_| {
            token.cancel();
            true
        });
        assert_eq!(clock.run_boundary(|_| true), 0);
    }
}
