//! The build-time achievement catalog.
//!
//! The catalog is immutable data: each entry pairs display metadata with a
//! pure predicate over [`ProgressCounters`]. Mutable unlock state lives in
//! [`crate::state::AchievementStatus`] rows, never here. The catalog may
//! grow across releases; stored blobs are reconciled against it on load.

use crate::state::ProgressCounters;

/// One badge definition. `predicate` is a plain `fn` pointer so the catalog
/// stays a `const` data table.
#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub predicate: fn(&ProgressCounters) -> bool,
}

/// Well-known achievement ids, for callers that match on specific badges.
pub mod ids {
    pub const FIRST_STEP: &str = "first_step";
    pub const HIGH_FIVE: &str = "high_five";
    pub const POINT_COLLECTOR: &str = "point_collector";
    pub const POINT_HOARDER: &str = "point_hoarder";
    pub const STORY_SAGE: &str = "story_sage";
    pub const MOVIE_BUFF: &str = "movie_buff";
    pub const GAME_WHIZ: &str = "game_whiz";
    pub const LADDER_TOPPER: &str = "ladder_topper";
    pub const THREE_DAY_STREAK: &str = "three_day_streak";
    pub const WEEK_STREAK: &str = "week_streak";
}

pub const CATALOG: &[AchievementDef] = &[
    AchievementDef {
        id: ids::FIRST_STEP,
        title: "First Step",
        description: "Finish your very first story, video or game",
        icon: "🌱",
        predicate: |c| c.total >= 1,
    },
    AchievementDef {
        id: ids::HIGH_FIVE,
        title: "High Five",
        description: "Finish five things",
        icon: "🖐️",
        predicate: |c| c.total >= 5,
    },
    AchievementDef {
        id: ids::POINT_COLLECTOR,
        title: "Point Collector",
        description: "Collect 50 points",
        icon: "⭐",
        predicate: |c| c.points >= 50,
    },
    AchievementDef {
        id: ids::POINT_HOARDER,
        title: "Point Hoarder",
        description: "Collect 200 points",
        icon: "✨",
        predicate: |c| c.points >= 200,
    },
    AchievementDef {
        id: ids::STORY_SAGE,
        title: "Story Sage",
        description: "Finish ten stories",
        icon: "📚",
        predicate: |c| c.stories >= 10,
    },
    AchievementDef {
        id: ids::MOVIE_BUFF,
        title: "Movie Buff",
        description: "Watch ten videos to the end",
        icon: "🎬",
        predicate: |c| c.videos >= 10,
    },
    AchievementDef {
        id: ids::GAME_WHIZ,
        title: "Game Whiz",
        description: "Finish ten games",
        icon: "🕹️",
        predicate: |c| c.games >= 10,
    },
    AchievementDef {
        id: ids::LADDER_TOPPER,
        title: "Ladder Topper",
        description: "Reach the highest level",
        icon: "🏔️",
        predicate: |c| c.level >= 7,
    },
    AchievementDef {
        id: ids::THREE_DAY_STREAK,
        title: "Back Again",
        description: "Visit three days in a row",
        icon: "🔥",
        predicate: |c| c.streak >= 3,
    },
    AchievementDef {
        id: ids::WEEK_STREAK,
        title: "Full Week",
        description: "Visit seven days in a row",
        icon: "🗓️",
        predicate: |c| c.streak >= 7,
    },
];

/// Look up a definition by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static AchievementDef> {
    CATALOG.iter().find(|def| def.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters() -> ProgressCounters {
        ProgressCounters {
            total: 0,
            stories: 0,
            videos: 0,
            games: 0,
            points: 0,
            level: 1,
            streak: 0,
        }
    }

    #[test]
    fn ids_are_unique() {
        for (i, def) in CATALOG.iter().enumerate() {
            assert!(
                CATALOG.iter().skip(i + 1).all(|other| other.id != def.id),
                "duplicate id {}",
                def.id
            );
        }
    }

    #[test]
    fn nothing_unlocks_on_the_zero_counters() {
        let zero = counters();
        assert!(CATALOG.iter().all(|def| !(def.predicate)(&zero)));
    }

    #[test]
    fn find_resolves_known_ids() {
        assert_eq!(find(ids::FIRST_STEP).map(|d| d.title), Some("First Step"));
        assert!(find("retired_badge").is_none());
    }

    #[test]
    fn streak_badges_follow_the_streak_counter() {
        let mut c = counters();
        c.streak = 3;
        assert!((find(ids::THREE_DAY_STREAK).unwrap().predicate)(&c));
        assert!(!(find(ids::WEEK_STREAK).unwrap().predicate)(&c));
        c.streak = 7;
        assert!((find(ids::WEEK_STREAK).unwrap().predicate)(&c));
    }
}
