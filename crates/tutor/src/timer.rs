use std::time::{Duration, Instant};

/// Identifies one scheduling of a [`Timer`]. Tokens from earlier schedulings never fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerToken(u64);

/// A single cancellable deadline, driven by the host either by polling with the current
/// time or by handing back the token from its own callback.
#[derive(Debug, Default)]
pub struct Timer {
    generation: u64,
    pending: Option<(TimerToken, Instant)>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending deadline.
    pub fn schedule(&mut self, now: Instant, delay: Duration) -> TimerToken {
        self.generation += 1;
        let token = TimerToken(self.generation);
        self.pending = Some((token, now + delay));
        token
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<(TimerToken, Instant)> {
        self.pending
    }

    /// Consumes the pending deadline if `token` is still current.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        match self.pending {
            Some((current, _)) if current == token => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Consumes the pending deadline if it has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some((_, deadline)) if now >= deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}
