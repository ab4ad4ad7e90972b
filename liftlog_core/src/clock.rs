//! Session clock and rest timer.
//!
//! Both timers are advanced by an explicit `tick()` call (the host drives
//! one tick per second) and hand back immutable events as return values
//! rather than invoking callbacks, so a faulty consumer can never stop a
//! countdown.

/// Immutable event emitted by the session clock for each counted second
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockTick {
    pub elapsed_seconds: u64,
}

/// Monotonic elapsed-time source for an active session.
///
/// The accumulated count is the authoritative progress counter and is
/// independent of wall-clock drift: suspension (page hidden) stops tick
/// emission without resetting the count, and resuming continues from the
/// retained value with no catch-up burst for the hidden interval.
#[derive(Clone, Debug, Default)]
pub struct SessionClock {
    elapsed_seconds: u64,
    running: bool,
    suspended: bool,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from the current accumulated value
    pub fn start(&mut self) {
        self.running = true;
        self.suspended = false;
    }

    /// Suspend tick emission without touching the accumulated count
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Resume tick emission from the retained value
    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Zero the accumulated count and stop
    pub fn reset(&mut self) {
        self.elapsed_seconds = 0;
        self.running = false;
        self.suspended = false;
    }

    /// Restore a previously accumulated count (session resume)
    pub fn restore(&mut self, elapsed_seconds: u64) {
        self.elapsed_seconds = elapsed_seconds;
    }

    /// Count one second if running and not suspended
    pub fn tick(&mut self) -> Option<ClockTick> {
        if !self.running || self.suspended {
            return None;
        }
        self.elapsed_seconds += 1;
        Some(ClockTick {
            elapsed_seconds: self.elapsed_seconds,
        })
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

/// Events emitted by the rest timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestTimerEvent {
    Tick { remaining_seconds: u32 },
    /// Emitted exactly once, when remaining time first reaches 50%
    Halfway,
    /// Emitted exactly once, when remaining time reaches zero
    Completed,
}

/// Countdown timer for the rest interval after a completed set.
///
/// After completion the timer is inert until explicitly restarted. Starting
/// a new countdown while one is running cancels the previous one outright.
#[derive(Clone, Debug, Default)]
pub struct RestTimer {
    initial_seconds: u32,
    remaining_seconds: u32,
    halfway_emitted: bool,
    active: bool,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a countdown, cancelling any running one. A zero duration is
    /// treated as a cancel.
    pub fn start(&mut self, seconds: u32) {
        if seconds == 0 {
            self.cancel();
            return;
        }
        self.initial_seconds = seconds;
        self.remaining_seconds = seconds;
        self.halfway_emitted = false;
        self.active = true;
        tracing::debug!("Rest timer started: {}s", seconds);
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.remaining_seconds = 0;
        self.halfway_emitted = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    /// Count down one second, returning the events crossed by this tick
    pub fn tick(&mut self) -> Vec<RestTimerEvent> {
        if !self.active {
            return Vec::new();
        }

        self.remaining_seconds -= 1;
        let mut events = vec![RestTimerEvent::Tick {
            remaining_seconds: self.remaining_seconds,
        }];

        if !self.halfway_emitted
            && self.remaining_seconds > 0
            && self.remaining_seconds * 2 <= self.initial_seconds
        {
            self.halfway_emitted = true;
            events.push(RestTimerEvent::Halfway);
        }

        if self.remaining_seconds == 0 {
            self.active = false;
            events.push(RestTimerEvent::Completed);
            tracing::debug!("Rest timer completed ({}s)", self.initial_seconds);
        }

        events
    }
}
