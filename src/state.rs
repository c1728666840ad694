//! Persistent progress state and the serialized shape of the save blob.
//!
//! Everything in this module is plain serde data. The whole [`ProgressState`]
//! is written and re-read as one JSON document; every field carries a
//! `#[serde(default)]` so a blob written by an older release still loads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::catalog::AchievementDef;
use crate::rules::level_from_points;

/// What kind of content item was completed. Used as the lookup key into the
/// point table and the per-category counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Story,
    Video,
    Game,
}

impl ContentCategory {
    pub const ALL: [Self; 3] = [Self::Story, Self::Video, Self::Game];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Video => "video",
            Self::Game => "game",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "story" => Ok(Self::Story),
            "video" => Ok(Self::Video),
            "game" => Ok(Self::Game),
            _ => Err(()),
        }
    }
}

impl From<ContentCategory> for String {
    fn from(value: ContentCategory) -> Self {
        value.as_str().to_string()
    }
}

/// One finished content item. Identity is the `(category, item_id)` pair;
/// records are append-only and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub category: ContentCategory,
    pub item_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Stored unlock state for one catalog entry. Once `unlocked` flips to true
/// it never flips back, and `unlocked_at` never changes after being set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub id: String,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl AchievementStatus {
    #[must_use]
    pub fn locked(id: &str) -> Self {
        Self {
            id: id.to_string(),
            unlocked: false,
            unlocked_at: None,
        }
    }
}

/// The root persisted entity: points, computed level, the append-only
/// completion log, per-achievement unlock state, and the daily streak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    #[serde(default, deserialize_with = "coerce_u32")]
    pub points: u32,
    #[serde(default = "default_level", deserialize_with = "coerce_level")]
    pub level: u32,
    #[serde(default)]
    pub completions: Vec<CompletionRecord>,
    #[serde(default)]
    pub achievements: Vec<AchievementStatus>,
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
    #[serde(default)]
    pub streak: u32,
}

/// Derived counters handed to achievement predicates. Predicates see only
/// these numbers, never the raw state or the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCounters {
    pub total: u32,
    pub stories: u32,
    pub videos: u32,
    pub games: u32,
    pub points: u32,
    pub level: u32,
    pub streak: u32,
}

impl ProgressCounters {
    #[must_use]
    pub const fn category_count(&self, category: ContentCategory) -> u32 {
        match category {
            ContentCategory::Story => self.stories,
            ContentCategory::Video => self.videos,
            ContentCategory::Game => self.games,
        }
    }
}

impl ProgressState {
    /// The state a brand-new profile starts from: zero points, level 1, no
    /// completions, every catalog entry locked.
    #[must_use]
    pub fn zero(catalog: &[AchievementDef]) -> Self {
        Self {
            points: 0,
            level: 1,
            completions: Vec::new(),
            achievements: catalog
                .iter()
                .map(|def| AchievementStatus::locked(def.id))
                .collect(),
            last_active_date: None,
            streak: 0,
        }
    }

    #[must_use]
    pub fn is_completed(&self, category: ContentCategory, item_id: &str) -> bool {
        self.completions
            .iter()
            .any(|rec| rec.category == category && rec.item_id == item_id)
    }

    /// Derive the counter snapshot predicates are evaluated against.
    #[must_use]
    pub fn counters(&self) -> ProgressCounters {
        let mut stories = 0u32;
        let mut videos = 0u32;
        let mut games = 0u32;
        for rec in &self.completions {
            match rec.category {
                ContentCategory::Story => stories += 1,
                ContentCategory::Video => videos += 1,
                ContentCategory::Game => games += 1,
            }
        }
        ProgressCounters {
            total: stories + videos + games,
            stories,
            videos,
            games,
            points: self.points,
            level: self.level,
            streak: self.streak,
        }
    }

    /// Rebuild the stored achievement rows against the current catalog:
    /// retired ids are dropped, new definitions come in locked, and unlock
    /// state for surviving ids is preserved, in catalog order.
    pub fn reconcile_achievements(&mut self, catalog: &[AchievementDef]) {
        let stored = std::mem::take(&mut self.achievements);
        self.achievements = catalog
            .iter()
            .map(|def| {
                stored
                    .iter()
                    .find(|status| status.id == def.id)
                    .cloned()
                    .unwrap_or_else(|| AchievementStatus::locked(def.id))
            })
            .collect();
    }

    /// Repair a freshly loaded blob so the in-memory invariants hold:
    /// duplicate completions collapse to their first record, `level` is
    /// recomputed from `points`, and the achievement rows are reconciled.
    pub fn normalize(&mut self, ladder: &[u32], catalog: &[AchievementDef]) {
        let mut seen = HashSet::new();
        self.completions
            .retain(|rec| seen.insert((rec.category, rec.item_id.clone())));
        self.level = level_from_points(self.points, ladder);
        self.reconcile_achievements(catalog);
    }
}

fn default_level() -> u32 {
    1
}

/// Accept any JSON value for a counter field, falling back to 0 rather than
/// rejecting the whole blob over one bad number.
fn coerce_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0))
}

fn coerce_level<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_else(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn category_round_trips_through_str() {
        for category in ContentCategory::ALL {
            assert_eq!(category.as_str().parse::<ContentCategory>(), Ok(category));
        }
        assert!("podcast".parse::<ContentCategory>().is_err());
    }

    #[test]
    fn zero_state_locks_whole_catalog() {
        let state = ProgressState::zero(catalog::CATALOG);
        assert_eq!(state.points, 0);
        assert_eq!(state.level, 1);
        assert!(state.completions.is_empty());
        assert_eq!(state.achievements.len(), catalog::CATALOG.len());
        assert!(state.achievements.iter().all(|status| !status.unlocked));
    }

    #[test]
    fn partial_blob_loads_with_defaults() {
        let state: ProgressState = serde_json::from_str(r#"{"points": 30}"#).unwrap();
        assert_eq!(state.points, 30);
        assert_eq!(state.level, 1);
        assert!(state.completions.is_empty());
        assert_eq!(state.streak, 0);
    }

    #[test]
    fn invalid_numeric_fields_coerce_instead_of_rejecting() {
        let state: ProgressState =
            serde_json::from_str(r#"{"points": -7, "level": "three"}"#).unwrap();
        assert_eq!(state.points, 0);
        assert_eq!(state.level, 1);
    }

    #[test]
    fn normalize_dedups_and_recomputes_level() {
        let record = CompletionRecord {
            category: ContentCategory::Story,
            item_id: "42".to_string(),
            completed_at: Utc::now(),
        };
        let mut state = ProgressState::zero(catalog::CATALOG);
        state.completions = vec![record.clone(), record];
        state.points = 60;
        state.level = 9;

        state.normalize(&[0, 50, 120], catalog::CATALOG);

        assert_eq!(state.completions.len(), 1);
        assert_eq!(state.level, 2);
    }

    #[test]
    fn reconcile_drops_retired_ids_and_keeps_unlocks() {
        let mut state = ProgressState::zero(catalog::CATALOG);
        state.achievements[0].unlocked = true;
        state.achievements[0].unlocked_at = Some(Utc::now());
        state
            .achievements
            .push(AchievementStatus::locked("retired_badge"));

        state.reconcile_achievements(catalog::CATALOG);

        assert_eq!(state.achievements.len(), catalog::CATALOG.len());
        assert!(state.achievements[0].unlocked);
        assert!(state.achievements.iter().all(|s| s.id != "retired_badge"));
    }
}
