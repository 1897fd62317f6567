use std::time::{Duration, Instant};

/// Fixed period between animation steps
pub const TICK_PERIOD: Duration = Duration::from_millis(1500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
}

/// Repeating timer driving the year animation.
/// At most one tick is ever pending.
#[derive(Clone, Debug)]
pub struct AnimationClock {
    period: Duration,
    next_tick: Option<Instant>,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self {
            period: TICK_PERIOD,
            next_tick: None,
        }
    }

    pub fn state(&self) -> ClockState {
        if self.next_tick.is_some() {
            ClockState::Running
        } else {
            ClockState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ClockState::Running
    }

    /// Schedule the next tick unless one is already pending
    pub fn start(&mut self, now: Instant) {
        if self.next_tick.is_none() {
            self.next_tick = Some(now + self.period);
        }
    }

    /// Cancel the pending tick, if any
    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    /// Returns true when a tick is due, rescheduling the next one
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_tick {
            Some(due) if now >= due => {
                self.next_tick = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}
