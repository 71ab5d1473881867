use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StreakStats {
    pub current_streak: u32,
    pub best_streak: u32,
}

/// Parses a check-in date. Only the zero-padded `YYYY-MM-DD` form is accepted,
/// so every calendar day has exactly one spelling.
pub fn parse_day(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .filter(|date| date.format("%Y-%m-%d").to_string() == input)
}

/// Derives both streak numbers from completed dates.
///
/// `completed_desc` must be sorted newest first with no repeated dates, which
/// is what [`crate::db::Database::completed_dates_desc`] returns. `today` is the
/// day the current streak has to end on.
pub fn compute_streaks(completed_desc: &[NaiveDate], today: NaiveDate) -> StreakStats {
    if completed_desc.is_empty() {
        return StreakStats::default();
    }

    StreakStats {
        current_streak: current_streak(completed_desc, today),
        best_streak: best_streak(completed_desc),
    }
}

pub fn best_streak(completed_desc: &[NaiveDate]) -> u32 {
    if completed_desc.is_empty() {
        return 0;
    }

    let mut best = 1;
    let mut run = 1;

    for pair in completed_desc.windows(2) {
        if pair[0] - pair[1] == Duration::days(1) {
            run += 1;
            best = best.max(run);
        } else {
            run = 1;
        }
    }

    best
}

pub fn current_streak(completed: &[NaiveDate], today: NaiveDate) -> u32 {
    let present = completed.iter().copied().collect::<HashSet<_>>();

    let mut count = 0;
    let mut day = Some(today);
    while let Some(current) = day.filter(|candidate| present.contains(candidate)) {
        count += 1;
        day = current.pred_opt();
    }

    count
}
