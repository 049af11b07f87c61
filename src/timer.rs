use chrono::{DateTime, Local};

use crate::models::RestTimerState;

/// Result of advancing the rest countdown by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestTick {
    /// No timer is running.
    Idle,
    /// Still counting down; carries the seconds left.
    Running(u32),
    /// The countdown just hit zero. Reported exactly once, so the host can
    /// alert the user; a skipped timer never reports it.
    Finished,
}

impl RestTimerState {
    /// Starts a countdown at `total_seconds`, replacing any running timer
    /// outright. Timers never stack. A zero duration has nothing to count
    /// and finishes on the spot; a timer at zero is never left active.
    pub fn start(&mut self, total_seconds: u32) {
        self.total_seconds = total_seconds;
        self.remaining_seconds = total_seconds;
        self.active = total_seconds > 0;
    }

    /// Advances the countdown by one second. The host loop calls this on its
    /// own schedule; nothing in here touches the exercise/set cursor.
    pub fn tick(&mut self) -> RestTick {
        if !self.active {
            return RestTick::Idle;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.active = false;
            RestTick::Finished
        } else {
            RestTick::Running(self.remaining_seconds)
        }
    }

    /// Manual skip: zeroes the timer immediately and cancels the pending
    /// finish signal. Idempotent.
    pub fn skip(&mut self) {
        self.active = false;
        self.remaining_seconds = 0;
    }
}

/// Whole seconds elapsed since the session started, floored, never negative.
/// Display-only: recomputed from wall clock, mutates nothing.
pub fn session_elapsed_seconds(started_at: DateTime<Local>, now: DateTime<Local>) -> i64 {
    (now - started_at).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn tick_counts_down_and_finishes_once() {
        let mut timer = RestTimerState::default();
        timer.start(3);
        assert!(timer.active);
        assert_eq!(timer.total_seconds, 3);

        assert_eq!(timer.tick(), RestTick::Running(2));
        assert_eq!(timer.tick(), RestTick::Running(1));
        assert_eq!(timer.tick(), RestTick::Finished);
        assert!(!timer.active);

        // Past zero the timer is idle, no repeated finish signal.
        assert_eq!(timer.tick(), RestTick::Idle);
        assert_eq!(timer.remaining_seconds, 0);
    }

    #[test]
    fn skip_zeroes_immediately_and_cancels_the_signal() {
        let mut timer = RestTimerState::default();
        timer.start(60);
        assert_eq!(timer.tick(), RestTick::Running(59));

        timer.skip();
        assert!(!timer.active);
        assert_eq!(timer.remaining_seconds, 0);
        assert_eq!(timer.tick(), RestTick::Idle);

        // Skipping again is a no-op.
        timer.skip();
        assert_eq!(timer.remaining_seconds, 0);
    }

    #[test]
    fn starting_replaces_a_running_timer() {
        let mut timer = RestTimerState::default();
        timer.start(90);
        timer.tick();
        timer.tick();

        timer.start(30);
        assert_eq!(timer.remaining_seconds, 30);
        assert_eq!(timer.total_seconds, 30);
        assert!(timer.active);
    }

    #[test]
    fn zero_duration_finishes_on_the_spot() {
        let mut timer = RestTimerState::default();
        timer.start(0);
        assert!(!timer.active);
        assert_eq!(timer.remaining_seconds, 0);
        assert_eq!(timer.total_seconds, 0);
        assert_eq!(timer.tick(), RestTick::Idle);

        // A zero restart also clears a running countdown.
        timer.start(60);
        assert!(timer.active);
        timer.start(0);
        assert!(!timer.active);
        assert_eq!(timer.remaining_seconds, 0);
    }

    #[test]
    fn tick_on_idle_timer_is_idle() {
        let mut timer = RestTimerState::default();
        assert_eq!(timer.tick(), RestTick::Idle);
    }

    #[test]
    fn elapsed_is_floored_and_never_negative() {
        let start = Local::now();
        assert_eq!(
            session_elapsed_seconds(start, start + Duration::milliseconds(2500)),
            2
        );
        assert_eq!(session_elapsed_seconds(start, start - Duration::seconds(5)), 0);
        assert_eq!(session_elapsed_seconds(start, start), 0);
    }
}
