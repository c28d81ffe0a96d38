use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Everything the pet can nag the user about. Each kind throttles
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    HealthCritical,
    HealthWarning,
    BreakDue,
    Milestone,
    DailyGoal,
    CodingStreak,
    SocialStreak,
    SocialOvertaken,
    WebsiteChanged,
}

/// Timestamps of the last permitted firing per kind. Lives in the session so
/// throttles survive restarts.
pub type FiredLog = BTreeMap<EventKind, DateTime<Utc>>;

/// Rate-limit decision function. Pure: the caller records a firing with
/// `record_fired` only after actually dispatching, which keeps the policy
/// independently testable.
#[derive(Debug, Clone)]
pub struct NotificationPolicy {
    pub health_critical_secs: i64,
    pub health_warning_secs: i64,
    pub break_due_secs: i64,
    pub social_secs: i64,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            health_critical_secs: 600,
            health_warning_secs: 900,
            break_due_secs: 2700,
            social_secs: 300,
        }
    }
}

impl NotificationPolicy {
    fn min_interval(&self, kind: EventKind) -> Duration {
        let secs = match kind {
            EventKind::HealthCritical => self.health_critical_secs,
            EventKind::HealthWarning => self.health_warning_secs,
            EventKind::BreakDue => self.break_due_secs,
            EventKind::SocialStreak | EventKind::SocialOvertaken => self.social_secs,
            // Edge-triggered kinds are one-shot at the source; never throttled.
            EventKind::Milestone
            | EventKind::DailyGoal
            | EventKind::CodingStreak
            | EventKind::WebsiteChanged => 0,
        };
        Duration::seconds(secs)
    }

    pub fn should_notify(&self, kind: EventKind, fired: &FiredLog, now: DateTime<Utc>) -> bool {
        match fired.get(&kind) {
            Some(last) => now.signed_duration_since(*last) >= self.min_interval(kind),
            None => true,
        }
    }

    pub fn record_fired(&self, kind: EventKind, fired: &mut FiredLog, now: DateTime<Utc>) {
        fired.insert(kind, now);
    }
}
