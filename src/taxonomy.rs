use serde::{Deserialize, Serialize};

/// Activity bucket assigned by the classifier. Fixed taxonomy; per-category
/// behavior (stat modifiers, earn rates, match patterns) lives in the rules
/// table so new behavior is data, not code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Coding,
    Work,
    Learning,
    Designing,
    Social,
    News,
    Entertainment,
    Shopping,
    Gaming,
    Other,
    Idle,
}

impl Category {
    /// Categories that count toward productive time and streaks.
    pub fn is_productive(self) -> bool {
        matches!(
            self,
            Category::Coding | Category::Learning | Category::Work | Category::Designing
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Coding => "coding",
            Category::Work => "work",
            Category::Learning => "learning",
            Category::Designing => "designing",
            Category::Social => "social",
            Category::News => "news",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Gaming => "gaming",
            Category::Other => "other",
            Category::Idle => "idle",
        }
    }
}

/// Display state of the dino. Derived from the category (plus health
/// thresholds and transient action states); never persisted on its own
/// authority; the category is what the stat and economy math consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DinoState {
    Idle,
    Working,
    Coding,
    Designing,
    Gaming,
    Browsing(Category),
    Eating,
    Excited,
    Sick,
    Dead,
}

impl DinoState {
    /// Stable key used for time-spent accounting and remote status.
    pub fn key(self) -> &'static str {
        match self {
            DinoState::Idle => "idle",
            DinoState::Working => "working",
            DinoState::Coding => "coding",
            DinoState::Designing => "designing",
            DinoState::Gaming => "gaming",
            DinoState::Browsing(cat) => match cat {
                Category::Coding => "browsing_coding",
                Category::Work => "browsing_work",
                Category::Learning => "browsing_learning",
                Category::Designing => "browsing_designing",
                Category::Social => "browsing_social",
                Category::News => "browsing_news",
                Category::Entertainment => "browsing_entertainment",
                Category::Shopping => "browsing_shopping",
                Category::Gaming => "browsing_gaming",
                Category::Other => "browsing_other",
                Category::Idle => "browsing_other",
            },
            DinoState::Eating => "eating",
            DinoState::Excited => "excited",
            DinoState::Sick => "sick",
            DinoState::Dead => "dead",
        }
    }

    pub fn is_browsing(self) -> bool {
        matches!(self, DinoState::Browsing(_))
    }
}

/// State the classifier derives for a category when the signal came from a
/// non-browser application (or idle fallback).
pub fn state_for_app_category(category: Category) -> DinoState {
    match category {
        Category::Coding => DinoState::Coding,
        Category::Work => DinoState::Working,
        Category::Designing => DinoState::Designing,
        Category::Gaming => DinoState::Gaming,
        _ => DinoState::Idle,
    }
}

/// Health override applied on top of the category-derived state. Display
/// only: the underlying category keeps driving stat/economy math.
pub fn display_state(base: DinoState, health: f64) -> DinoState {
    if health <= 0.0 {
        DinoState::Dead
    } else if health < 20.0 {
        DinoState::Sick
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn productive_set_matches_streak_groups() {
        assert!(Category::Coding.is_productive());
        assert!(Category::Learning.is_productive());
        assert!(Category::Work.is_productive());
        assert!(Category::Designing.is_productive());
        assert!(!Category::Social.is_productive());
        assert!(!Category::Idle.is_productive());
    }

    #[test]
    fn health_override_is_display_only() {
        let base = DinoState::Browsing(Category::Social);
        assert_eq!(display_state(base, 50.0), base);
        assert_eq!(display_state(base, 10.0), DinoState::Sick);
        assert_eq!(display_state(base, 0.0), DinoState::Dead);
    }

    #[test]
    fn browsing_keys_are_stable() {
        assert_eq!(DinoState::Browsing(Category::Social).key(), "browsing_social");
        assert_eq!(DinoState::Browsing(Category::Other).key(), "browsing_other");
    }
}
