use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::Classification;
use crate::config::{RulesConfig, Tuning};
use crate::engine::{EarningContext, EconomyLedger, FiredLog, StatBlock, StreakEvent, Streaks};
use crate::error::PetError;
use crate::taxonomy::{display_state, Category, DinoState};

/// Dumpling bonus credited for taking a break.
const BREAK_BONUS: f64 = 3.0;

/// Domain-level things that happened during a tick. These are candidates for
/// notification; the sampler runs them through the notification policy.
#[derive(Debug, Clone, PartialEq)]
pub enum PetEvent {
    WebsiteChanged { domain: String, category: Category },
    CodingCelebration { secs: f64 },
    SocialBinge { secs: f64 },
    Milestone { threshold: u64 },
    DailyGoal { earned: f64 },
}

/// Digest of a finished day, written to the day_summaries table at rollover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub session_earned: f64,
    pub productive_secs: f64,
    pub top_domain: Option<String>,
    pub top_domain_secs: f64,
}

/// The aggregate root. Everything the pet knows lives here; the sampler
/// loops mutate it behind one lock and persist the whole value after every
/// state-changing tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub stats: StatBlock,
    pub ledger: EconomyLedger,
    pub streaks: Streaks,
    /// Seconds spent per display-state key today.
    pub time_spent: BTreeMap<String, f64>,
    /// Seconds spent per browsed domain today.
    #[serde(default)]
    pub site_time: BTreeMap<String, f64>,
    pub current_category: Category,
    /// Category-derived base state. The health override is applied on read
    /// (`display`), never stored, so it cannot leak into the economy math.
    pub current_state: DinoState,
    #[serde(default)]
    pub current_domain: Option<String>,
    pub session_started_at: DateTime<Utc>,
    #[serde(default)]
    pub productive_secs_today: f64,
    #[serde(default)]
    pub productive_secs_since_break: f64,
    #[serde(default)]
    pub daily_goal_reached: bool,
    #[serde(default)]
    pub last_fired: FiredLog,
}

impl Session {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            stats: StatBlock::default(),
            ledger: EconomyLedger::new(now),
            streaks: Streaks::default(),
            time_spent: BTreeMap::new(),
            site_time: BTreeMap::new(),
            current_category: Category::Idle,
            current_state: DinoState::Idle,
            current_domain: None,
            session_started_at: now,
            productive_secs_today: 0.0,
            productive_secs_since_break: 0.0,
            daily_goal_reached: false,
            last_fired: FiredLog::new(),
        }
    }

    /// State shown to the outside (menu bar, leaderboard): the base state
    /// with the sick/dead health override applied.
    pub fn display(&self) -> DinoState {
        display_state(self.current_state, self.stats.health)
    }

    /// Called once after loading a snapshot: downtime between process runs
    /// never earns or costs dumplings.
    pub fn mark_resumed(&mut self, now: DateTime<Utc>) {
        self.ledger.last_tick_at = now;
    }

    /// Apply one classified activity sample.
    pub fn apply_sample(
        &mut self,
        classification: &Classification,
        elapsed_secs: f64,
        rules: &RulesConfig,
    ) -> Vec<PetEvent> {
        let mut events = Vec::new();
        let category = classification.category;
        let state = classification.state;

        if let Some(domain) = &classification.domain {
            if self.current_domain.as_deref() != Some(domain.as_str()) {
                events.push(PetEvent::WebsiteChanged {
                    domain: domain.clone(),
                    category,
                });
            }
        }

        let profile = rules.profile(category);
        self.stats.apply_tick(category, &profile, elapsed_secs);

        self.streaks.update(category, state, elapsed_secs);
        for trigger in self.streaks.take_triggers(&rules.tuning) {
            events.push(match trigger {
                StreakEvent::CodingCelebration { secs } => PetEvent::CodingCelebration { secs },
                StreakEvent::SocialBinge { secs } => PetEvent::SocialBinge { secs },
            });
        }

        *self.time_spent.entry(state.key().to_string()).or_insert(0.0) += elapsed_secs;
        if let Some(domain) = &classification.domain {
            *self.site_time.entry(domain.clone()).or_insert(0.0) += elapsed_secs;
        }

        if category.is_productive() {
            self.productive_secs_today += elapsed_secs;
            self.productive_secs_since_break += elapsed_secs;
        }

        self.current_category = category;
        self.current_state = state;
        self.current_domain = classification.domain.clone();

        events
    }

    /// Settle dumpling earnings since the ledger's own last settlement.
    /// Runs on its own cadence; under a minute of elapsed time is skipped so
    /// overlapping wakeups cannot double-settle.
    pub fn settle_economy(&mut self, rules: &RulesConfig, now: DateTime<Utc>) -> Vec<PetEvent> {
        let elapsed_minutes =
            now.signed_duration_since(self.ledger.last_tick_at).num_seconds() as f64 / 60.0;
        if elapsed_minutes < 1.0 {
            return Vec::new();
        }

        let ctx = EarningContext {
            streak_bonus: self.streaks.earn_bonus_active(
                self.current_category,
                self.current_state,
                &rules.tuning,
            ),
            health: self.stats.health,
        };
        let rate = rules.profile(self.current_category).currency_rate_per_minute;

        let outcome = self.ledger.settle(rate, elapsed_minutes, ctx);
        self.ledger.last_tick_at = now;

        let mut events: Vec<PetEvent> = outcome
            .milestones
            .into_iter()
            .map(|threshold| PetEvent::Milestone { threshold })
            .collect();
        events.extend(self.check_daily_goal(&rules.tuning));
        events
    }

    /// Feed the dino. Costs dumplings; rejected whole when the balance is
    /// short, leaving stats untouched.
    pub fn feed(&mut self, tuning: &Tuning) -> Result<(), PetError> {
        self.ledger.spend(tuning.feed_cost)?;
        self.stats.apply_feed();
        Ok(())
    }

    /// Pet the dino. Free.
    pub fn pet(&mut self) {
        self.stats.apply_pet();
    }

    /// Take a break: restore stats, reset the distraction streaks and the
    /// break accumulator, and credit a small bonus through the normal award
    /// path (so it counts toward milestones and the daily goal).
    pub fn take_break(&mut self, tuning: &Tuning) -> Vec<PetEvent> {
        self.stats.apply_break();
        self.streaks.reset_distraction();
        self.productive_secs_since_break = 0.0;

        let mut events: Vec<PetEvent> = self
            .ledger
            .award_bonus(BREAK_BONUS)
            .into_iter()
            .map(|threshold| PetEvent::Milestone { threshold })
            .collect();
        events.extend(self.check_daily_goal(tuning));
        events
    }

    /// A break reminder is due once enough productive time has accumulated
    /// since the last break. Cadence beyond the first is the policy's 45
    /// minute throttle.
    pub fn break_due(&self, tuning: &Tuning) -> bool {
        self.productive_secs_since_break >= tuning.break_due_secs
    }

    /// Roll the session into a new day if the calendar date changed.
    ///
    /// Zeroes the per-day accumulators and returns the finished day's digest;
    /// preserves the balance, lifetime totals, fired milestones and stats.
    /// Idempotent: a second call on the same date is a no-op.
    pub fn rollover_if_new_day(&mut self, now: DateTime<Utc>) -> Option<DaySummary> {
        if now.date_naive() == self.session_started_at.date_naive() {
            return None;
        }

        let top = self
            .site_time
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(domain, secs)| (domain.clone(), *secs));

        let summary = DaySummary {
            date: self.session_started_at.date_naive(),
            session_earned: self.ledger.session_earned,
            productive_secs: self.productive_secs_today,
            top_domain: top.as_ref().map(|(d, _)| d.clone()),
            top_domain_secs: top.map(|(_, s)| s).unwrap_or(0.0),
        };

        self.time_spent.clear();
        self.site_time.clear();
        self.streaks.reset_all();
        self.ledger.session_earned = 0.0;
        self.ledger.last_tick_at = now;
        self.productive_secs_today = 0.0;
        self.productive_secs_since_break = 0.0;
        self.daily_goal_reached = false;
        self.session_started_at = now;

        Some(summary)
    }

    fn check_daily_goal(&mut self, tuning: &Tuning) -> Option<PetEvent> {
        if !self.daily_goal_reached && self.ledger.session_earned >= tuning.daily_goal {
            self.daily_goal_reached = true;
            Some(PetEvent::DailyGoal {
                earned: self.ledger.session_earned,
            })
        } else {
            None
        }
    }
}
