//! Pure computations over repository snapshots.
//!
//! Nothing here touches storage or the clock; callers pass "today" in.

pub mod calendar;
pub mod streak;
pub mod views;
