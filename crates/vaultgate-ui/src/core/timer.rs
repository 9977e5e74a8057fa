//! Idle countdown driving the vault auto-close.
//!
//! # Design
//! - The timer is a pure state machine over whole seconds; the browser shell
//!   drives [`ActivityTimer::tick`] from a 1 s interval it owns and drops on
//!   unmount, so no tick or expiry can fire after teardown.
//! - `period: None` means the inactivity auto-logout is disabled.
//! - Expiry is reported exactly once per countdown; later ticks stay silent
//!   until an explicit restart.

/// Outcome of a single one-second tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTick {
    /// Timer disabled or not counting; nothing happened.
    Idle,
    /// Still counting down.
    Counting,
    /// The countdown just hit zero. Reported once per expiry.
    Expired,
}

/// Countdown with restart/force semantics for the idle auto-logout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityTimer {
    period: Option<u64>,
    remaining: u64,
    running: bool,
    // set by restart, cleared by the first following tick; lets keep-alive
    // probes skip resetting a countdown that just restarted this cycle
    fresh: bool,
}

impl ActivityTimer {
    /// Create a timer; `period` in seconds, `None` or zero disables it.
    #[must_use]
    pub fn new(period: Option<u64>) -> Self {
        let period = period.filter(|secs| *secs > 0);
        Self {
            period,
            remaining: period.unwrap_or(0),
            running: period.is_some(),
            fresh: true,
        }
    }

    /// Replace the configured period and start a fresh countdown.
    ///
    /// Called when the authenticated view mounts with the settings current at
    /// that point; `None` stops the timer entirely.
    pub fn set_period(&mut self, period: Option<u64>) {
        *self = Self::new(period);
    }

    /// Whether the countdown is currently active.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds left until expiry.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Reset the countdown. A forced restart always resets; an unforced one
    /// only resets when the timer is not freshly restarted this cycle.
    pub fn restart(&mut self, force: bool) {
        let Some(period) = self.period else {
            return;
        };
        if force || !self.fresh {
            self.remaining = period;
            self.running = true;
            self.fresh = true;
        }
    }

    /// Halt the countdown without firing; used on view teardown.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TimerTick {
        if !self.running {
            return TimerTick::Idle;
        }
        self.fresh = false;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            TimerTick::Expired
        } else {
            TimerTick::Counting
        }
    }
}

/// Render a remaining-seconds value as `hh:mm:ss`.
#[must_use]
pub fn format_clock(secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::{ActivityTimer, TimerTick, format_clock};

    #[test]
    fn expires_exactly_once_after_period_ticks() {
        let mut timer = ActivityTimer::new(Some(5));
        for _ in 0..4 {
            assert_eq!(timer.tick(), TimerTick::Counting);
        }
        assert_eq!(timer.tick(), TimerTick::Expired);
        // subsequent ticks stay silent until a restart
        for _ in 0..3 {
            assert_eq!(timer.tick(), TimerTick::Idle);
        }
    }

    #[test]
    fn forced_restart_mid_countdown_delays_expiry() {
        let mut timer = ActivityTimer::new(Some(5));
        for _ in 0..3 {
            timer.tick();
        }
        timer.restart(true);
        assert_eq!(timer.remaining(), 5);
        // expiry now lands on the 8th tick from timer start
        for _ in 0..4 {
            assert_eq!(timer.tick(), TimerTick::Counting);
        }
        assert_eq!(timer.tick(), TimerTick::Expired);
    }

    #[test]
    fn unforced_restart_skips_fresh_countdowns() {
        let mut timer = ActivityTimer::new(Some(10));
        timer.restart(true);
        timer.restart(false);
        assert_eq!(timer.remaining(), 10);
        timer.tick();
        assert_eq!(timer.remaining(), 9);
        // no longer fresh, so a keep-alive restart resets now
        timer.restart(false);
        assert_eq!(timer.remaining(), 10);
    }

    #[test]
    fn restart_after_expiry_arms_a_new_countdown() {
        let mut timer = ActivityTimer::new(Some(2));
        timer.tick();
        assert_eq!(timer.tick(), TimerTick::Expired);
        timer.restart(true);
        assert!(timer.is_running());
        timer.tick();
        assert_eq!(timer.tick(), TimerTick::Expired);
    }

    #[test]
    fn disabled_timer_never_ticks_or_restarts() {
        let mut timer = ActivityTimer::new(None);
        assert!(!timer.is_running());
        assert_eq!(timer.tick(), TimerTick::Idle);
        timer.restart(true);
        assert_eq!(timer.tick(), TimerTick::Idle);

        let mut zero = ActivityTimer::new(Some(0));
        assert_eq!(zero.tick(), TimerTick::Idle);
    }

    #[test]
    fn stop_halts_ticks_until_restarted() {
        let mut timer = ActivityTimer::new(Some(5));
        timer.tick();
        timer.stop();
        assert_eq!(timer.tick(), TimerTick::Idle);
        timer.restart(true);
        assert_eq!(timer.tick(), TimerTick::Counting);
    }

    #[test]
    fn clock_projection_is_zero_padded() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(61), "00:01:01");
        assert_eq!(format_clock(3_600), "01:00:00");
        assert_eq!(format_clock(86_399), "23:59:59");
    }
}
