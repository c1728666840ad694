//! Pure scoring rules: level math and achievement predicate evaluation.
//!
//! Nothing in this module performs I/O or reads the clock on its own; the
//! caller passes `now` in, so every function is a deterministic transition
//! of the state it is given.

use chrono::{DateTime, Utc};

use crate::catalog::AchievementDef;
use crate::state::ProgressState;

/// Level for a point total against a threshold ladder: `1 + ` the highest
/// index whose threshold the points have reached. Past the last threshold
/// the level saturates at `ladder.len()`.
#[must_use]
pub fn level_from_points(points: u32, ladder: &[u32]) -> u32 {
    let reached = ladder.iter().take_while(|&&threshold| points >= threshold).count();
    u32::try_from(reached.max(1)).unwrap_or(u32::MAX)
}

/// Percent of the way from the current level's threshold to the next one,
/// in `[0, 100]`. At the top level (no next threshold) this is always 100.
#[must_use]
pub fn progress_percent(points: u32, ladder: &[u32]) -> f32 {
    let level = level_from_points(points, ladder) as usize;
    let Some(&next) = ladder.get(level) else {
        return 100.0;
    };
    let current = ladder.get(level - 1).copied().unwrap_or(0);
    let span = next.saturating_sub(current);
    if span == 0 {
        return 100.0;
    }
    let into = points.saturating_sub(current) as f32;
    (into / span as f32 * 100.0).clamp(0.0, 100.0)
}

/// Evaluate every still-locked achievement against the state's counters and
/// unlock the ones whose predicate now holds, stamping `unlocked_at = now`.
/// Returns the newly unlocked ids. Already-unlocked rows are never touched.
pub fn evaluate_achievements(
    state: &mut ProgressState,
    catalog: &[AchievementDef],
    now: DateTime<Utc>,
) -> Vec<String> {
    let counters = state.counters();
    let mut unlocked = Vec::new();
    for status in &mut state.achievements {
        if status.unlocked {
            continue;
        }
        let Some(def) = catalog.iter().find(|def| def.id == status.id) else {
            continue;
        };
        if (def.predicate)(&counters) {
            status.unlocked = true;
            status.unlocked_at = Some(now);
            unlocked.push(status.id.clone());
        }
    }
    unlocked
}
