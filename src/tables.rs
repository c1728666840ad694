//! Rule tables: point values per content category and the level ladder.
//!
//! Both clients consume the same tables through the same engine; a shell may
//! inject its own tuning by deserializing a `RuleTables` from JSON, but there
//! is exactly one set of default numbers checked in here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::state::ContentCategory;

/// Cumulative point thresholds for each level boundary. `ladder[0]` is
/// always 0 (level 1); a profile with `points >= ladder.last()` sits at the
/// top level and stays there — the ladder is not extrapolated past its end.
pub type LevelLadder = Vec<u32>;

/// Point award per content category plus the level ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTables {
    #[serde(default = "default_points")]
    pub points: HashMap<ContentCategory, u32>,
    #[serde(default = "default_ladder")]
    pub ladder: LevelLadder,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            points: default_points(),
            ladder: default_ladder(),
        }
    }
}

impl RuleTables {
    /// Point value for a category, or `None` when the active table does not
    /// score it. Callers treat `None` as a hard rejection, not zero points.
    #[must_use]
    pub fn point_value(&self, category: ContentCategory) -> Option<u32> {
        self.points.get(&category).copied()
    }

    /// Highest level the ladder defines.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.ladder.len()).unwrap_or(u32::MAX)
    }

    /// A ladder is usable when it is non-empty, anchored at 0, and strictly
    /// increasing.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.ladder.first() == Some(&0) && self.ladder.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Return these tables if they are usable, otherwise fall back to the
    /// defaults so a bad injected config never takes the engine down.
    #[must_use]
    pub fn sanitized(self) -> Self {
        if self.is_valid() {
            self
        } else {
            log::warn!("rejecting invalid rule tables (ladder {:?}), using defaults", self.ladder);
            Self::default()
        }
    }
}

fn default_points() -> HashMap<ContentCategory, u32> {
    HashMap::from([
        (ContentCategory::Story, 10),
        (ContentCategory::Video, 5),
        (ContentCategory::Game, 15),
    ])
}

fn default_ladder() -> LevelLadder {
    vec![0, 50, 120, 250, 450, 700, 1000]
}
