use std::time::{Duration, Instant};

/// A countdown for one round. The session polls it; nothing fires on its own.
pub trait RoundTimer {
    fn start(&mut self, duration_ms: u64);
    fn cancel(&mut self);
    /// Milliseconds left. Zero once expired or cancelled.
    fn remaining_ms(&self) -> u64;
    /// Freezes the remaining time. No-op unless running.
    fn pause(&mut self);
    /// Continues with whatever was left at `pause`. No-op unless paused.
    fn resume(&mut self);
    fn is_running(&self) -> bool;
    /// Length of the countdown passed to the last `start`.
    fn duration_ms(&self) -> u64;

    fn is_expired(&self) -> bool {
        self.is_running() && self.remaining_ms() == 0
    }

    fn elapsed_ms(&self) -> u64 {
        self.duration_ms().saturating_sub(self.remaining_ms())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clock {
    Idle,
    Running { deadline: Instant },
    Paused { remaining: Duration },
}

/// Wall-clock timer on the monotonic `Instant`.
#[derive(Debug, Clone)]
pub struct SystemTimer {
    clock: Clock,
    duration_ms: u64,
}

impl SystemTimer {
    pub fn new() -> Self {
        Self { clock: Clock::Idle, duration_ms: 0 }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundTimer for SystemTimer {
    fn start(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
        self.clock = Clock::Running { deadline: Instant::now() + Duration::from_millis(duration_ms) };
    }

    fn cancel(&mut self) {
        self.clock = Clock::Idle;
    }

    fn remaining_ms(&self) -> u64 {
        match self.clock {
            Clock::Idle => 0,
            Clock::Running { deadline } => {
                deadline.saturating_duration_since(Instant::now()).as_millis() as u64
            }
            Clock::Paused { remaining } => remaining.as_millis() as u64,
        }
    }

    fn pause(&mut self) {
        if let Clock::Running { deadline } = self.clock {
            self.clock = Clock::Paused { remaining: deadline.saturating_duration_since(Instant::now()) };
        }
    }

    fn resume(&mut self) {
        if let Clock::Paused { remaining } = self.clock {
            self.clock = Clock::Running { deadline: Instant::now() + remaining };
        }
    }

    fn is_running(&self) -> bool {
        matches!(self.clock, Clock::Running { .. })
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

/// Timer that only moves when told to. For tests and scripted play.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    duration_ms: u64,
    remaining_ms: u64,
    running: bool,
    paused: bool,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets `ms` pass. Ignored while paused or stopped.
    pub fn advance(&mut self, ms: u64) {
        if self.running && !self.paused {
            self.remaining_ms = self.remaining_ms.saturating_sub(ms);
        }
    }
}

impl RoundTimer for ManualTimer {
    fn start(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
        self.remaining_ms = duration_ms;
        self.running = true;
        self.paused = false;
    }

    fn cancel(&mut self) {
        self.remaining_ms = 0;
        self.running = false;
        self.paused = false;
    }

    fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    fn pause(&mut self) {
        if self.running {
            self.paused = true;
        }
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn is_running(&self) -> bool {
        self.running && !self.paused
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEnd {
    Correct,
    Wrong,
    TimedOut,
}

/// One question's lifetime. Only the first resolution counts.
#[derive(Debug, Clone, Default)]
pub struct Round {
    resolved: Option<RoundEnd>,
}

impl Round {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.resolved.is_none()
    }

    pub fn resolution(&self) -> Option<RoundEnd> {
        self.resolved
    }

    /// Returns false if the round was already over; the event is then ignored.
    pub fn resolve(&mut self, end: RoundEnd) -> bool {
        if self.resolved.is_some() {
            return false;
        }
        self.resolved = Some(end);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_timer_counts_down_and_expires() {
        let mut timer = ManualTimer::new();
        timer.start(2000);
        timer.advance(1500);
        assert_eq!(timer.remaining_ms(), 500);
        assert_eq!(timer.elapsed_ms(), 1500);
        assert!(!timer.is_expired());
        timer.advance(900);
        assert!(timer.is_expired());
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut timer = ManualTimer::new();
        timer.start(4000);
        timer.advance(1000);
        timer.pause();
        timer.advance(10_000);
        assert_eq!(timer.remaining_ms(), 3000);
        assert!(!timer.is_expired());
        timer.resume();
        timer.advance(3000);
        assert!(timer.is_expired());
    }

    #[test]
    fn cancelled_timer_never_expires() {
        let mut timer = ManualTimer::new();
        timer.start(1000);
        timer.cancel();
        timer.advance(5000);
        assert!(!timer.is_expired());
        assert!(!timer.is_running());
    }

    #[test]
    fn system_timer_pause_keeps_remaining() {
        let mut timer = SystemTimer::new();
        timer.start(60_000);
        timer.pause();
        let frozen = timer.remaining_ms();
        assert!(frozen > 59_000);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(timer.remaining_ms(), frozen);
        assert!(!timer.is_running());
        timer.resume();
        assert!(timer.is_running());
        assert!(!timer.is_expired());
        timer.cancel();
        assert_eq!(timer.remaining_ms(), 0);
    }

    #[test]
    fn round_resolves_once() {
        let mut round = Round::new();
        assert!(round.resolve(RoundEnd::Correct));
        assert!(!round.resolve(RoundEnd::TimedOut));
        assert_eq!(round.resolution(), Some(RoundEnd::Correct));
        assert!(!round.is_active());
    }
}
