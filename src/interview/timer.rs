use serde::Serialize;
use tokio::time::Instant;

/// Wall-clock bookkeeping for a running interview: total elapsed time for
/// the header display and per-answer response time for the backend.
#[derive(Debug, Default)]
pub struct SessionClock {
    started_at: Option<Instant>,
    response_started_at: Option<Instant>,
}

/// Snapshot handed to the UI.
#[derive(Serialize, Clone, Debug)]
pub struct ClockState {
    pub elapsed_seconds: u64,
    pub elapsed_display: String,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Mark the moment the candidate may begin answering the current
    /// question. Called once per turn, after the question finishes playing.
    pub fn mark_response_start(&mut self, now: Instant) {
        self.response_started_at = Some(now);
    }

    pub fn elapsed_seconds(&self, now: Instant) -> u64 {
        self.started_at
            .map(|t| now.saturating_duration_since(t).as_secs())
            .unwrap_or(0)
    }

    /// Whole seconds the candidate spent on the current answer.
    pub fn response_seconds(&self, now: Instant) -> u64 {
        self.response_started_at
            .map(|t| now.saturating_duration_since(t).as_secs())
            .unwrap_or(0)
    }

    pub fn snapshot(&self, now: Instant) -> ClockState {
        let elapsed = self.elapsed_seconds(now);
        ClockState {
            elapsed_seconds: elapsed,
            elapsed_display: format_elapsed(elapsed),
        }
    }
}

/// Render seconds as "mm:ss" for the interview header.
pub fn format_elapsed(total_seconds: u64) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unstarted_clock_reads_zero() {
        let clock = SessionClock::new();
        let now = Instant::now();
        assert_eq!(clock.elapsed_seconds(now), 0);
        assert_eq!(clock.response_seconds(now), 0);
        assert!(!clock.is_running());
    }

    #[test]
    fn elapsed_and_response_track_independently() {
        let mut clock = SessionClock::new();
        let start = Instant::now();
        clock.start(start);
        clock.mark_response_start(start + Duration::from_secs(10));

        let now = start + Duration::from_secs(14);
        assert_eq!(clock.elapsed_seconds(now), 14);
        assert_eq!(clock.response_seconds(now), 4);
    }

    #[test]
    fn response_start_resets_each_turn() {
        let mut clock = SessionClock::new();
        let start = Instant::now();
        clock.start(start);
        clock.mark_response_start(start + Duration::from_secs(5));
        clock.mark_response_start(start + Duration::from_secs(60));

        let now = start + Duration::from_secs(63);
        assert_eq!(clock.response_seconds(now), 3);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(59), "00:59");
        assert_eq!(format_elapsed(61), "01:01");
        assert_eq!(format_elapsed(754), "12:34");
    }

    #[test]
    fn snapshot_carries_display_string() {
        let mut clock = SessionClock::new();
        let start = Instant::now();
        clock.start(start);
        let state = clock.snapshot(start + Duration::from_secs(90));
        assert_eq!(state.elapsed_seconds, 90);
        assert_eq!(state.elapsed_display, "01:30");
    }
}
