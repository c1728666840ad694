//! Lumo Progress Engine
//!
//! Platform-agnostic, local-first progress and achievement engine for the
//! Lumo children's media library. Completions of content items earn points,
//! points map to a level through a threshold ladder, and badges unlock from
//! pure predicates over accumulated counters. The whole state persists as a
//! single JSON blob through a pluggable storage abstraction; UI shells embed
//! this crate and provide their own storage where the built-in adapters in
//! [`storage`] do not fit.
#![forbid(unsafe_code)]

pub mod catalog;
pub mod rules;
pub mod state;
pub mod storage;
pub mod streak;
pub mod tables;

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use catalog::{AchievementDef, CATALOG};
pub use state::{
    AchievementStatus, CompletionRecord, ContentCategory, ProgressCounters, ProgressState,
};
pub use storage::{FileStorage, FileStorageError, MemoryStorage};
pub use streak::StreakRoll;
pub use tables::{LevelLadder, RuleTables};

/// Errors the engine surfaces to callers. Storage failures are deliberately
/// absent: reads fail open to the zero state and writes degrade to
/// in-memory-only, so the only visible error is the programmer error of
/// recording a category the active rule tables do not score.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    #[error("category '{0}' has no point value in the active rule tables")]
    UnscoredCategory(ContentCategory),
}

/// Trait for abstracting persistence of the progress blob.
/// Platform-specific implementations should provide this.
pub trait ProgressStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist the whole state as one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(&self, state: &ProgressState) -> Result<(), Self::Error>;

    /// Load the stored state, or `None` when nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored document cannot be read or parsed.
    fn load(&self) -> Result<Option<ProgressState>, Self::Error>;

    /// Remove the stored document. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored document cannot be removed.
    fn clear(&self) -> Result<(), Self::Error>;
}

/// One-shot reward payload for a recorded completion. The UI reads it once
/// (toast, confetti) and discards it; it is not part of durable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub points_earned: u32,
    pub level_up: bool,
    pub achievements_unlocked: Vec<String>,
    pub already_completed: bool,
}

impl CompletionOutcome {
    fn duplicate() -> Self {
        Self {
            points_earned: 0,
            level_up: false,
            achievements_unlocked: Vec::new(),
            already_completed: true,
        }
    }
}

/// Outcome of the daily session roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub streak: u32,
    pub achievements_unlocked: Vec<String>,
}

/// A catalog entry joined with its stored unlock state, shaped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementView {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

struct EngineInner {
    state: ProgressState,
    last_reward: Option<CompletionOutcome>,
}

/// The completion recorder: loads state once at construction, applies the
/// scoring rules on every recorded completion, and writes the merged state
/// back through storage.
///
/// All mutations (`record_completion`, `start_session`, `reset`) run under
/// one internal lock that covers the whole mutate-then-save unit, so
/// overlapping calls serialize and no update is lost. Display reads take the
/// same lock only long enough to copy a value.
pub struct ProgressEngine<S>
where
    S: ProgressStorage,
{
    storage: S,
    tables: RuleTables,
    inner: Mutex<EngineInner>,
}

impl<S> ProgressEngine<S>
where
    S: ProgressStorage,
{
    /// Create an engine with the default rule tables, loading any previously
    /// stored state. Loading fails open: a missing, corrupt, or unreadable
    /// blob yields the zero state.
    pub fn new(storage: S) -> Self {
        Self::with_tables(storage, RuleTables::default())
    }

    /// Create an engine with injected rule tables (platform tuning). Invalid
    /// tables are replaced by the defaults rather than rejected.
    pub fn with_tables(storage: S, tables: RuleTables) -> Self {
        let tables = tables.sanitized();
        let state = Self::load_or_zero(&storage, &tables);
        Self {
            storage,
            tables,
            inner: Mutex::new(EngineInner {
                state,
                last_reward: None,
            }),
        }
    }

    fn load_or_zero(storage: &S, tables: &RuleTables) -> ProgressState {
        match storage.load() {
            Ok(Some(mut state)) => {
                state.normalize(&tables.ladder, CATALOG);
                state
            }
            Ok(None) => ProgressState::zero(CATALOG),
            Err(err) => {
                log::warn!("progress load failed, starting from zero state: {err}");
                ProgressState::zero(CATALOG)
            }
        }
    }

    /// Record that `(category, item_id)` was completed.
    ///
    /// Recording the same pair again is an idempotent no-op: the outcome
    /// comes back with `already_completed` set, all deltas zero, and nothing
    /// is rewritten. Storage failures are not visible here; the in-memory
    /// state stays authoritative for the session.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::UnscoredCategory`] when the active rule
    /// tables carry no point value for `category`; the state is untouched.
    pub fn record_completion(
        &self,
        category: ContentCategory,
        item_id: &str,
    ) -> Result<CompletionOutcome, ProgressError> {
        let points_earned = self
            .tables
            .point_value(category)
            .ok_or(ProgressError::UnscoredCategory(category))?;

        let mut inner = self.lock_inner();
        if inner.state.is_completed(category, item_id) {
            return Ok(CompletionOutcome::duplicate());
        }

        let now = Utc::now();
        let old_level = inner.state.level;
        inner.state.completions.push(CompletionRecord {
            category,
            item_id: item_id.to_string(),
            completed_at: now,
        });
        inner.state.points += points_earned;
        inner.state.level = rules::level_from_points(inner.state.points, &self.tables.ladder);
        let achievements_unlocked = rules::evaluate_achievements(&mut inner.state, CATALOG, now);

        let outcome = CompletionOutcome {
            points_earned,
            level_up: inner.state.level > old_level,
            achievements_unlocked,
            already_completed: false,
        };
        log::debug!(
            "recorded completion {category}/{item_id}: +{points_earned} points, level {}",
            inner.state.level
        );
        self.persist(&inner.state);
        inner.last_reward = Some(outcome.clone());
        Ok(outcome)
    }

    /// Roll the daily visit streak for today (local calendar day) and
    /// persist the result. Idempotent per day.
    pub fn start_session(&self) -> SessionOutcome {
        self.start_session_on(Local::now().date_naive())
    }

    /// [`Self::start_session`] with an explicit date, for deterministic tests
    /// and for shells that define "today" themselves.
    pub fn start_session_on(&self, today: NaiveDate) -> SessionOutcome {
        let mut inner = self.lock_inner();
        let roll = streak::roll_daily(&mut inner.state, today);
        if !roll.changed {
            return SessionOutcome {
                streak: roll.streak,
                achievements_unlocked: Vec::new(),
            };
        }
        let achievements_unlocked =
            rules::evaluate_achievements(&mut inner.state, CATALOG, Utc::now());
        log::debug!("daily streak rolled to {} for {today}", roll.streak);
        self.persist(&inner.state);
        SessionOutcome {
            streak: roll.streak,
            achievements_unlocked,
        }
    }

    /// Destructive reset back to the zero state, clearing the stored blob.
    /// Intended to sit behind a confirmation-gated settings action.
    pub fn reset(&self) {
        let mut inner = self.lock_inner();
        if let Err(err) = self.storage.clear() {
            log::warn!("progress reset could not clear storage: {err}");
        }
        inner.state = ProgressState::zero(CATALOG);
        inner.last_reward = None;
        log::debug!("progress state reset to zero");
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.lock_inner().state.points
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.lock_inner().state.level
    }

    /// Percent of the way into the current level, in `[0, 100]`.
    #[must_use]
    pub fn progress_percent(&self) -> f32 {
        rules::progress_percent(self.lock_inner().state.points, &self.tables.ladder)
    }

    /// The full achievement list in catalog order, joined with unlock state.
    #[must_use]
    pub fn achievements(&self) -> Vec<AchievementView> {
        let inner = self.lock_inner();
        CATALOG
            .iter()
            .map(|def| {
                let status = inner
                    .state
                    .achievements
                    .iter()
                    .find(|status| status.id == def.id);
                AchievementView {
                    id: def.id,
                    title: def.title,
                    description: def.description,
                    icon: def.icon,
                    unlocked: status.is_some_and(|s| s.unlocked),
                    unlocked_at: status.and_then(|s| s.unlocked_at),
                }
            })
            .collect()
    }

    /// Copy of the current state, for shells that render from a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ProgressState {
        self.lock_inner().state.clone()
    }

    /// Take the one-shot reward payload from the most recent successful
    /// completion, clearing it. Returns `None` when already consumed.
    pub fn take_last_reward(&self) -> Option<CompletionOutcome> {
        self.lock_inner().last_reward.take()
    }

    #[must_use]
    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    fn persist(&self, state: &ProgressState) {
        if let Err(err) = self.storage.save(state) {
            log::warn!("progress save failed, keeping in-memory state: {err}");
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, EngineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
