//! Fixed-length calendar windows for the habit grid.

use crate::model::habit::Habit;
use chrono::NaiveDate;
use std::iter::successors;

/// Width of the habit grid when configuration does not override it.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Widest habit grid accepted from configuration: one leap year.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Returns `len` consecutive dates in ascending order, the last being `end`.
///
/// The window is shorter than `len` only when it would run past the earliest
/// date chrono can represent.
pub fn calendar_window(len: u32, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = successors(Some(end), |day| day.pred_opt())
        .take(len as usize)
        .collect();
    days.reverse();
    days
}

/// One column of a habit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub date: NaiveDate,
    pub completed: bool,
    pub is_today: bool,
}

/// Pairs each window day with the habit's completion state.
///
/// The last day of `window` is treated as today.
pub fn habit_row(habit: &Habit, window: &[NaiveDate]) -> Vec<GridCell> {
    let today = window.last().copied();
    window
        .iter()
        .map(|&date| GridCell {
            date,
            completed: habit.is_completed_on(date),
            is_today: Some(date) == today,
        })
        .collect()
}
