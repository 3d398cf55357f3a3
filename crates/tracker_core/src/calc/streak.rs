//! Habit streak calculation.

use crate::model::habit::Habit;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Counts consecutive completed days ending at and including `today`.
///
/// Returns 0 when `today` itself is not completed; a gap of a single day
/// ends the streak.
pub fn current_streak(completed: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor.filter(|day| completed.contains(day)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

/// Longest current streak across `habits`, 0 when there are none.
pub fn best_streak(habits: &[Habit], today: NaiveDate) -> u32 {
    habits
        .iter()
        .map(|habit| habit.streak(today))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{best_streak, current_streak};
    use crate::model::habit::Habit;
    use crate::model::id::EntityId;
    use chrono::{Duration, NaiveDate};
    use std::collections::BTreeSet;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn days_back(offsets: &[i64]) -> BTreeSet<NaiveDate> {
        offsets
            .iter()
            .map(|offset| today() - Duration::days(*offset))
            .collect()
    }

    fn habit(offsets: &[i64]) -> Habit {
        Habit {
            id: EntityId::generate(),
            name: "habit".to_string(),
            completed_dates: days_back(offsets),
        }
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        assert_eq!(current_streak(&days_back(&[2, 1, 0]), today()), 3);
    }

    #[test]
    fn missing_today_means_no_streak() {
        assert_eq!(current_streak(&days_back(&[2, 1]), today()), 0);
    }

    #[test]
    fn gap_stops_the_count() {
        assert_eq!(current_streak(&days_back(&[0, 1, 3, 4, 5]), today()), 2);
    }

    #[test]
    fn future_dates_do_not_count() {
        assert_eq!(current_streak(&days_back(&[-1, 0]), today()), 1);
    }

    #[test]
    fn streak_crosses_month_and_leap_day() {
        // 2024-02-29 exists; the cursor walks 03-01 -> 02-29 -> 02-28.
        assert_eq!(current_streak(&days_back(&[0, 1, 2]), today()), 3);
    }

    #[test]
    fn streak_equals_run_length_for_any_n() {
        for n in 1..=40_i64 {
            let mut offsets: Vec<i64> = (0..n).collect();
            offsets.push(n + 1);
            offsets.push(n + 5);
            assert_eq!(current_streak(&days_back(&offsets), today()), n as u32);
        }
    }

    #[test]
    fn empty_set_has_no_streak() {
        assert_eq!(current_streak(&BTreeSet::new(), today()), 0);
    }

    #[test]
    fn best_streak_picks_maximum() {
        let habits = vec![habit(&[0]), habit(&[0, 1, 2, 3]), habit(&[1, 2])];
        assert_eq!(best_streak(&habits, today()), 4);
        assert_eq!(best_streak(&[], today()), 0);
    }
}
