//! Per-question response countdown.
//!
//! The timer holds no clock of its own: the session loop calls [`Countdown::tick`]
//! once per second. That keeps restarts trivially free of overlapping timers and
//! makes expiry deterministic under test.

/// Result of advancing the countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running; nothing happened
    Idle,
    /// Still running with this many seconds left
    Running(u32),
    /// Just reached zero; reported once per `start`
    Expired,
}

#[derive(Debug, Default, Clone)]
pub struct Countdown {
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts counting down from `seconds`, replacing any run in progress.
    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.running = true;
    }

    /// Stops counting without reporting expiry.
    pub fn cancel(&mut self) {
        self.running = false;
    }

    /// Advances by one second.
    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            Tick::Expired
        } else {
            Tick::Running(self.remaining)
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_mm_ss(self.remaining)
    }
}

/// Formats seconds as zero-padded `MM:SS`.
pub fn format_mm_ss(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks_until_expiry(countdown: &mut Countdown, limit: u32) -> Vec<u32> {
        let mut expired_at = Vec::new();
        for second in 1..=limit {
            if countdown.tick() == Tick::Expired {
                expired_at.push(second);
            }
        }
        expired_at
    }

    #[test]
    fn expires_exactly_once_after_duration() {
        let mut countdown = Countdown::new();
        countdown.start(3);

        assert_eq!(countdown.tick(), Tick::Running(2));
        assert_eq!(countdown.tick(), Tick::Running(1));
        assert_eq!(countdown.tick(), Tick::Expired);
        assert_eq!(countdown.tick(), Tick::Idle);
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_running());
    }

    #[test]
    fn restart_replaces_previous_duration() {
        let mut countdown = Countdown::new();
        countdown.start(2);
        countdown.start(5);

        assert_eq!(ticks_until_expiry(&mut countdown, 20), vec![5]);
    }

    #[test]
    fn restart_midway_never_fires_for_first_run() {
        let mut countdown = Countdown::new();
        countdown.start(3);
        countdown.tick();
        countdown.tick();
        countdown.start(4);

        assert_eq!(ticks_until_expiry(&mut countdown, 20), vec![4]);
    }

    #[test]
    fn cancel_suppresses_expiry() {
        let mut countdown = Countdown::new();
        countdown.start(2);
        countdown.tick();
        countdown.cancel();

        assert!(ticks_until_expiry(&mut countdown, 10).is_empty());
        assert_eq!(countdown.remaining(), 1);
    }

    #[test]
    fn zero_duration_expires_on_first_tick() {
        let mut countdown = Countdown::new();
        countdown.start(0);
        assert_eq!(countdown.tick(), Tick::Expired);
    }

    #[test]
    fn formats_zero_padded_minutes_and_seconds() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(9), "00:09");
        assert_eq!(format_mm_ss(120), "02:00");
        assert_eq!(format_mm_ss(754), "12:34");

        let mut countdown = Countdown::new();
        countdown.start(61);
        assert_eq!(countdown.display(), "01:01");
    }
}
