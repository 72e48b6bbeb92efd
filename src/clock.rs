use std::time::{Duration, Instant};

/// Cancellable periodic deadline that drives gravity.
///
/// The clock never fires on its own: the frontend polls it with the current
/// time and performs one soft drop per `true`. Each install (start or
/// reschedule) bumps `generation`, so a stale deadline can never fire next to
/// a fresh one.
#[derive(Clone, Debug)]
pub struct DropClock {
    interval: Duration,
    deadline: Option<Instant>,
    generation: u64,
}

impl DropClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            generation: 0,
        }
    }

    /// Installs a deadline one `interval` after `now`.
    pub fn start(&mut self, interval: Duration, now: Instant) {
        self.interval = interval;
        self.deadline = Some(now + interval);
        self.generation += 1;
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Replaces the running timer with one at `interval`, counted from `now`.
    pub fn reschedule(&mut self, interval: Duration, now: Instant) {
        self.cancel();
        self.start(interval, now);
    }

    /// True once per reached deadline. Re-arms relative to `now`, so a late
    /// poll yields a single tick rather than a burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.checked_duration_since(now).unwrap_or(Duration::ZERO))
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
