//! Daily visit streak derived from the last-active date.

use chrono::NaiveDate;

use crate::state::ProgressState;

/// Outcome of one daily streak roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakRoll {
    /// Whether the state changed (false when already rolled today).
    pub changed: bool,
    pub streak: u32,
}

/// Roll the streak for `today`. The whole transition is gated on
/// `today != last_active_date`, so calling it twice on the same day is a
/// no-op: a consecutive day increments the streak, any gap (or a first-ever
/// visit) resets it to 1, and `last_active_date` always lands on today.
pub fn roll_daily(state: &mut ProgressState, today: NaiveDate) -> StreakRoll {
    if state.last_active_date == Some(today) {
        return StreakRoll {
            changed: false,
            streak: state.streak,
        };
    }

    let consecutive = state.last_active_date.and_then(|d| d.succ_opt()) == Some(today);
    state.streak = if consecutive { state.streak + 1 } else { 1 };
    state.last_active_date = Some(today);
    StreakRoll {
        changed: true,
        streak: state.streak,
    }
}
