use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::RwLock,
};

use crate::taxonomy::Category;

/// Per-category behavior: stat deltas applied per ~3s sample tick, the
/// dumpling rate per minute, and the match patterns the classifier consults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProfile {
    pub health_modifier: f64,
    pub happiness_modifier: f64,
    pub currency_rate_per_minute: f64,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CategoryProfile {
    fn new(health: f64, happiness: f64, rate: f64, domains: &[&str], keywords: &[&str]) -> Self {
        Self {
            health_modifier: health,
            happiness_modifier: happiness,
            currency_rate_per_minute: rate,
            domains: domains.iter().map(|s| s.to_string()).collect(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Thresholds and costs that gate streak bonuses, alerts and actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tuning {
    /// Coding streak length that switches the x1.5 earn bonus on.
    pub coding_bonus_streak_secs: f64,
    /// Coding streak length that triggers the one-shot celebration (and
    /// resets the streak so it does not refire every tick).
    pub coding_celebrate_streak_secs: f64,
    /// Continuous social time that triggers the one-shot binge alert.
    pub social_alert_streak_secs: f64,
    /// Productive time since the last break before a reminder is due.
    pub break_due_secs: f64,
    pub feed_cost: f64,
    /// Session earnings that count as hitting the daily goal.
    pub daily_goal: f64,
    /// How far ahead a peer must be before an overtaken alert fires.
    pub overtake_margin: f64,
    /// Peers with activity older than this are not considered online.
    pub peer_active_window_secs: i64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            coding_bonus_streak_secs: 1800.0,
            coding_celebrate_streak_secs: 3600.0,
            social_alert_streak_secs: 900.0,
            break_due_secs: 2700.0,
            feed_cost: 5.0,
            daily_goal: 50.0,
            overtake_margin: 10.0,
            peer_active_window_secs: 1800,
        }
    }
}

/// The full data-driven rule table: one classifier consults this instead of
/// category checks being scattered across call sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesConfig {
    pub categories: BTreeMap<Category, CategoryProfile>,
    /// User-defined domain-substring overrides; checked before built-ins.
    #[serde(default)]
    pub overrides: BTreeMap<String, Category>,
    pub coding_apps: Vec<String>,
    pub work_apps: Vec<String>,
    pub design_apps: Vec<String>,
    pub gaming_apps: Vec<String>,
    pub browsers: Vec<String>,
    #[serde(default)]
    pub tuning: Tuning,
}

impl RulesConfig {
    pub fn profile(&self, category: Category) -> CategoryProfile {
        self.categories.get(&category).cloned().unwrap_or(CategoryProfile {
            health_modifier: 0.0,
            happiness_modifier: 0.0,
            currency_rate_per_minute: 0.0,
            domains: Vec::new(),
            keywords: Vec::new(),
        })
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(
            Category::Coding,
            CategoryProfile::new(
                1.0,
                2.0,
                2.0,
                &["github.com", "gitlab.com", "bitbucket.org", "stackoverflow.com", "codepen.io", "replit.com"],
                &["code", "repository", "commit", "pull request", "api"],
            ),
        );
        categories.insert(
            Category::Work,
            CategoryProfile::new(
                0.5,
                1.0,
                0.8,
                &["gmail.com", "outlook.com", "notion.so", "trello.com", "asana.com", "monday.com", "linear.app"],
                &["email", "calendar", "meeting", "project"],
            ),
        );
        categories.insert(
            Category::Learning,
            CategoryProfile::new(
                1.0,
                1.5,
                1.8,
                &["docs.", "developer.", "learn.", "coursera.com", "udemy.com", "khanacademy.org", "freecodecamp.org"],
                &["documentation", "tutorial", "learn", "course", "guide"],
            ),
        );
        categories.insert(
            Category::Designing,
            CategoryProfile::new(
                0.5,
                2.0,
                1.5,
                &["figma.com", "sketch.com", "dribbble.com", "behance.net", "canva.com"],
                &["design", "prototype", "mockup", "wireframe"],
            ),
        );
        categories.insert(
            Category::Social,
            CategoryProfile::new(
                -1.0,
                0.5,
                -0.2,
                &["twitter.com", "x.com", "facebook.com", "instagram.com", "reddit.com", "tiktok.com", "linkedin.com"],
                &["social", "post", "feed", "comment"],
            ),
        );
        categories.insert(
            Category::News,
            CategoryProfile::new(
                -0.5,
                0.0,
                -0.1,
                &["news.", "cnn.com", "bbc.com", "nytimes.com", "techcrunch.com", "ycombinator.com"],
                &["news", "breaking", "headlines"],
            ),
        );
        categories.insert(
            Category::Entertainment,
            CategoryProfile::new(
                -1.5,
                2.0,
                -0.3,
                &["youtube.com", "netflix.com", "twitch.tv", "spotify.com", "hulu.com"],
                &["video", "music", "stream", "watch"],
            ),
        );
        categories.insert(
            Category::Shopping,
            CategoryProfile::new(
                -0.5,
                1.0,
                -0.15,
                &["amazon.com", "ebay.com", "etsy.com", "shopify.com"],
                &["shop", "buy", "cart", "checkout"],
            ),
        );
        categories.insert(
            Category::Gaming,
            CategoryProfile::new(
                0.0,
                3.0,
                -0.4,
                &["steampowered.com", "itch.io", "epicgames.com"],
                &["game", "gaming", "achievement"],
            ),
        );
        categories.insert(
            Category::Other,
            CategoryProfile::new(0.0, 0.0, 0.0, &[], &[]),
        );
        categories.insert(
            Category::Idle,
            CategoryProfile::new(0.0, 0.0, 0.0, &[], &[]),
        );

        let to_vec = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            categories,
            overrides: BTreeMap::new(),
            coding_apps: to_vec(&[
                "code", "xcode", "vim", "atom", "sublime", "cursor", "terminal", "iterm",
                "intellij", "pycharm",
            ]),
            work_apps: to_vec(&["slack", "teams", "notion", "trello", "zoom"]),
            design_apps: to_vec(&["figma", "sketch", "photoshop", "illustrator"]),
            gaming_apps: to_vec(&["steam", "game"]),
            browsers: to_vec(&["chrome", "safari", "firefox", "arc", "brave", "edge"]),
            tuning: Tuning::default(),
        }
    }
}

/// File-backed rule table. Loads once at startup, hands out clones to the
/// loops, and can be reloaded in place without restarting the sampler.
pub struct RulesStore {
    path: PathBuf,
    data: RwLock<RulesConfig>,
}

impl RulesStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read rules from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            let defaults = RulesConfig::default();
            // Write the defaults out so users have a file to edit.
            let serialized = serde_json::to_string_pretty(&defaults)?;
            fs::write(&path, serialized)
                .with_context(|| format!("Failed to write rules to {}", path.display()))?;
            defaults
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> RulesConfig {
        self.data.read().unwrap().clone()
    }

    pub fn tuning(&self) -> Tuning {
        self.data.read().unwrap().tuning.clone()
    }

    pub fn set_override(&self, domain: String, category: Category) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.overrides.insert(domain, category);
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: RulesConfig = serde_json::from_str(&contents)?;
        let mut guard = self.data.write().unwrap();
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &RulesConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write rules to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_category() {
        let rules = RulesConfig::default();
        for cat in [
            Category::Coding,
            Category::Work,
            Category::Learning,
            Category::Designing,
            Category::Social,
            Category::News,
            Category::Entertainment,
            Category::Shopping,
            Category::Gaming,
            Category::Other,
            Category::Idle,
        ] {
            assert!(rules.categories.contains_key(&cat), "missing {cat:?}");
        }
    }

    #[test]
    fn distracting_rates_are_negative() {
        let rules = RulesConfig::default();
        assert!(rules.profile(Category::Social).currency_rate_per_minute < 0.0);
        assert!(rules.profile(Category::Coding).currency_rate_per_minute > 0.0);
    }

    #[test]
    fn store_roundtrips_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let store = RulesStore::new(path.clone()).unwrap();
        store.set_override("github.com".into(), Category::Social).unwrap();

        let reopened = RulesStore::new(path).unwrap();
        assert_eq!(
            reopened.current().overrides.get("github.com"),
            Some(&Category::Social)
        );
    }
}
