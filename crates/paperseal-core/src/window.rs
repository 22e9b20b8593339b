//! Release window computation
//!
//! The paper may be requested only inside the five minutes immediately
//! before the scheduled exam start: `0 < start - now <= 5 min`. The state is
//! a pure function of the caller-supplied clock and is recomputed on every
//! request; nothing here is cached and no background timer exists. At the
//! exact start instant the window is already expired (hard cliff, no grace
//! period).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::ExamSchedule;
use crate::RELEASE_WINDOW_SECS;

/// Position of `now` relative to the release window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WindowState {
    /// Too early: the window opens in `opens_in_secs` seconds
    NotYetOpen { opens_in_secs: i64 },

    /// Open: the exam starts (and the window closes) in `closes_in_secs`
    Open { closes_in_secs: i64 },

    /// The exam has started; the paper can no longer be requested
    Expired,
}

impl WindowState {
    /// Evaluate the window for `schedule` at `now`
    pub fn evaluate(schedule: &ExamSchedule, now: DateTime<Utc>) -> Self {
        let remaining = schedule.start_time - now;

        if remaining <= Duration::zero() {
            WindowState::Expired
        } else if remaining <= Duration::seconds(RELEASE_WINDOW_SECS) {
            WindowState::Open {
                closes_in_secs: remaining.num_seconds(),
            }
        } else {
            WindowState::NotYetOpen {
                opens_in_secs: remaining.num_seconds() - RELEASE_WINDOW_SECS,
            }
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, WindowState::Open { .. })
    }

    /// Seconds until the window opens, zero once open or expired
    pub fn secs_until_requestable(&self) -> i64 {
        match self {
            WindowState::NotYetOpen { opens_in_secs } => *opens_in_secs,
            _ => 0,
        }
    }
}

/// Whether a paper request is permitted right now
pub fn can_request_paper(schedule: &ExamSchedule, now: DateTime<Utc>) -> bool {
    schedule.status.allows_release() && WindowState::evaluate(schedule, now).is_open()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExamId;
    use chrono::TimeZone;

    fn schedule_starting_at(start: DateTime<Utc>) -> ExamSchedule {
        ExamSchedule::new(
            ExamId::generate(),
            "Test exam",
            start,
            start + Duration::hours(3),
        )
    }

    #[test]
    fn test_window_boundaries() {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap();
        let schedule = schedule_starting_at(start);

        // 09:54:59 - one second too early
        let state = WindowState::evaluate(&schedule, start - Duration::seconds(301));
        assert_eq!(state, WindowState::NotYetOpen { opens_in_secs: 1 });

        // 09:55:00 - window opens (inclusive upper edge)
        let state = WindowState::evaluate(&schedule, start - Duration::seconds(300));
        assert_eq!(state, WindowState::Open { closes_in_secs: 300 });

        // 09:59:59 - still open
        let state = WindowState::evaluate(&schedule, start - Duration::seconds(1));
        assert_eq!(state, WindowState::Open { closes_in_secs: 1 });

        // 10:00:00 - hard cliff, already expired
        let state = WindowState::evaluate(&schedule, start);
        assert_eq!(state, WindowState::Expired);

        // 10:00:01 - expired
        let state = WindowState::evaluate(&schedule, start + Duration::seconds(1));
        assert_eq!(state, WindowState::Expired);
    }

    #[test]
    fn test_secs_until_requestable() {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap();
        let schedule = schedule_starting_at(start);

        let state = WindowState::evaluate(&schedule, start - Duration::seconds(305));
        assert_eq!(state.secs_until_requestable(), 5);

        let state = WindowState::evaluate(&schedule, start - Duration::seconds(100));
        assert_eq!(state.secs_until_requestable(), 0);
    }

    #[test]
    fn test_cancelled_exam_never_requestable() {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap();
        let mut schedule = schedule_starting_at(start);
        schedule.status = crate::schedule::ExamStatus::Cancelled;

        assert!(!can_request_paper(
            &schedule,
            start - Duration::seconds(100)
        ));
    }

    #[test]
    fn test_can_request_inside_window() {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap();
        let schedule = schedule_starting_at(start);
        assert!(can_request_paper(&schedule, start - Duration::seconds(150)));
        assert!(!can_request_paper(&schedule, start + Duration::seconds(1)));
    }
}
