use serde::{Deserialize, Serialize};

use crate::config::Tuning;
use crate::taxonomy::{Category, DinoState};

/// Continuous-duration counters. A streak grows by elapsed tick seconds while
/// its category group persists and snaps to zero the instant the group is
/// left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Streaks {
    pub coding_secs: f64,
    pub productive_browsing_secs: f64,
    pub social_secs: f64,
    pub browsing_secs: f64,
}

/// One-shot events surfaced by threshold crossings. Firing resets the
/// underlying counter so the event cannot refire on every subsequent tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreakEvent {
    CodingCelebration { secs: f64 },
    SocialBinge { secs: f64 },
}

impl Streaks {
    pub fn update(&mut self, category: Category, state: DinoState, elapsed_secs: f64) {
        if category == Category::Coding {
            self.coding_secs += elapsed_secs;
        } else {
            self.coding_secs = 0.0;
        }

        if state.is_browsing() && category.is_productive() {
            self.productive_browsing_secs += elapsed_secs;
        } else {
            self.productive_browsing_secs = 0.0;
        }

        if category == Category::Social {
            self.social_secs += elapsed_secs;
        } else {
            self.social_secs = 0.0;
        }

        if state.is_browsing() {
            self.browsing_secs += elapsed_secs;
        } else {
            self.browsing_secs = 0.0;
        }
    }

    /// Drain threshold crossings since the last call.
    pub fn take_triggers(&mut self, tuning: &Tuning) -> Vec<StreakEvent> {
        let mut events = Vec::new();

        if self.coding_secs >= tuning.coding_celebrate_streak_secs {
            events.push(StreakEvent::CodingCelebration {
                secs: self.coding_secs,
            });
            self.coding_secs = 0.0;
        }

        if self.social_secs >= tuning.social_alert_streak_secs {
            events.push(StreakEvent::SocialBinge {
                secs: self.social_secs,
            });
            self.social_secs = 0.0;
        }

        events
    }

    /// Whether the x1.5 earn multiplier is active for the given activity.
    /// The bonus threshold is lower than the celebration threshold so the
    /// celebration reset does not starve the bonus window.
    pub fn earn_bonus_active(&self, category: Category, state: DinoState, tuning: &Tuning) -> bool {
        if category == Category::Coding {
            return self.coding_secs > tuning.coding_bonus_streak_secs;
        }
        if state.is_browsing() && category.is_productive() {
            return self.productive_browsing_secs > tuning.coding_bonus_streak_secs;
        }
        false
    }

    /// Break and reset actions clear the distraction counters.
    pub fn reset_distraction(&mut self) {
        self.social_secs = 0.0;
        self.browsing_secs = 0.0;
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> Tuning {
        Tuning::default()
    }

    #[test]
    fn coding_streak_resets_on_category_change() {
        let mut streaks = Streaks::default();

        streaks.update(Category::Coding, DinoState::Coding, 10.0);
        streaks.update(Category::Coding, DinoState::Coding, 10.0);
        assert_eq!(streaks.coding_secs, 20.0);

        streaks.update(Category::Social, DinoState::Browsing(Category::Social), 10.0);
        assert_eq!(streaks.coding_secs, 0.0);
        assert_eq!(streaks.social_secs, 10.0);

        streaks.update(Category::Coding, DinoState::Coding, 10.0);
        assert_eq!(streaks.coding_secs, 10.0);
        assert_eq!(streaks.social_secs, 0.0);
    }

    #[test]
    fn browsing_streak_tracks_any_browsing_state() {
        let mut streaks = Streaks::default();
        streaks.update(Category::News, DinoState::Browsing(Category::News), 30.0);
        streaks.update(Category::Social, DinoState::Browsing(Category::Social), 30.0);
        assert_eq!(streaks.browsing_secs, 60.0);

        streaks.update(Category::Coding, DinoState::Coding, 30.0);
        assert_eq!(streaks.browsing_secs, 0.0);
    }

    #[test]
    fn productive_browsing_needs_both_conditions() {
        let mut streaks = Streaks::default();
        streaks.update(Category::Learning, DinoState::Browsing(Category::Learning), 60.0);
        assert_eq!(streaks.productive_browsing_secs, 60.0);

        // Productive but not browsing: counter resets.
        streaks.update(Category::Coding, DinoState::Coding, 60.0);
        assert_eq!(streaks.productive_browsing_secs, 0.0);
    }

    #[test]
    fn celebration_trigger_is_one_shot() {
        let mut streaks = Streaks {
            coding_secs: 3700.0,
            ..Default::default()
        };
        let events = streaks.take_triggers(&tuning());
        assert_eq!(events.len(), 1);
        assert_eq!(streaks.coding_secs, 0.0);

        // No refire on the next check.
        assert!(streaks.take_triggers(&tuning()).is_empty());
    }

    #[test]
    fn social_binge_trigger_resets_counter() {
        let mut streaks = Streaks {
            social_secs: 901.0,
            ..Default::default()
        };
        let events = streaks.take_triggers(&tuning());
        assert!(matches!(events[0], StreakEvent::SocialBinge { .. }));
        assert_eq!(streaks.social_secs, 0.0);
    }

    #[test]
    fn earn_bonus_uses_lower_threshold_than_celebration() {
        let streaks = Streaks {
            coding_secs: 2000.0,
            ..Default::default()
        };
        assert!(streaks.earn_bonus_active(Category::Coding, DinoState::Coding, &tuning()));

        let short = Streaks {
            coding_secs: 600.0,
            ..Default::default()
        };
        assert!(!short.earn_bonus_active(Category::Coding, DinoState::Coding, &tuning()));
    }
}
