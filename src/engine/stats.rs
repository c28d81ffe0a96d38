use serde::{Deserialize, Serialize};

use crate::config::CategoryProfile;
use crate::taxonomy::Category;

/// Reference sample cadence: category modifiers are expressed per 3s tick
/// and scaled linearly when the actual interval drifts.
pub const TICK_SECS: f64 = 3.0;

/// Hourly drift applied to energy/happiness while nothing productive is
/// happening.
const IDLE_DRIFT_PER_HOUR: f64 = 5.0;
/// Hourly health regeneration while the dino is otherwise cared for.
const HEALTH_REGEN_PER_HOUR: f64 = 3.0;
/// Hourly health decay once energy or happiness has bottomed out.
const HEALTH_DECAY_PER_HOUR: f64 = 2.0;
/// Energy/happiness floor below which idle health regeneration flips to decay.
const CARE_FLOOR: f64 = 20.0;

/// Bounded pet stats. Mutated only through the transition functions here;
/// every mutation re-clamps so an out-of-range value never reaches the
/// stored session, even transiently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatBlock {
    pub health: f64,
    pub happiness: f64,
    pub energy: f64,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            health: 100.0,
            happiness: 50.0,
            energy: 50.0,
        }
    }
}

impl StatBlock {
    /// Apply one sample tick worth of category effects.
    pub fn apply_tick(&mut self, category: Category, profile: &CategoryProfile, elapsed_secs: f64) {
        if elapsed_secs <= 0.0 {
            return;
        }
        let scale = elapsed_secs / TICK_SECS;
        let hours = elapsed_secs / 3600.0;

        if category == Category::Idle {
            self.energy -= IDLE_DRIFT_PER_HOUR * hours;
            self.happiness -= IDLE_DRIFT_PER_HOUR * hours;
            if self.energy >= CARE_FLOOR && self.happiness >= CARE_FLOOR {
                self.health += HEALTH_REGEN_PER_HOUR * hours;
            } else {
                self.health -= HEALTH_DECAY_PER_HOUR * hours;
            }
        } else {
            self.health += profile.health_modifier * scale;
            self.happiness += profile.happiness_modifier * scale;
            if !category.is_productive() {
                self.energy -= IDLE_DRIFT_PER_HOUR * hours;
            }
        }

        self.clamp();
    }

    /// Feeding: big happiness and health boost. The dumpling cost is gated by
    /// the economy engine before this is applied.
    pub fn apply_feed(&mut self) {
        self.happiness += 20.0;
        self.health += 15.0;
        self.clamp();
    }

    /// Petting: free, smaller boost.
    pub fn apply_pet(&mut self) {
        self.happiness += 15.0;
        self.health += 5.0;
        self.clamp();
    }

    /// Taking a break: restores all three stats. Streak resets are handled by
    /// the session, not here.
    pub fn apply_break(&mut self) {
        self.health += 15.0;
        self.energy += 20.0;
        self.happiness += 10.0;
        self.clamp();
    }

    fn clamp(&mut self) {
        self.health = self.health.clamp(0.0, 100.0);
        self.happiness = self.happiness.clamp(0.0, 100.0);
        self.energy = self.energy.clamp(0.0, 100.0);
    }

    pub fn in_bounds(&self) -> bool {
        (0.0..=100.0).contains(&self.health)
            && (0.0..=100.0).contains(&self.happiness)
            && (0.0..=100.0).contains(&self.energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;

    fn profile(category: Category) -> CategoryProfile {
        RulesConfig::default().profile(category)
    }

    #[test]
    fn coding_tick_raises_health_and_happiness() {
        let mut stats = StatBlock {
            health: 50.0,
            happiness: 50.0,
            energy: 50.0,
        };
        stats.apply_tick(Category::Coding, &profile(Category::Coding), 3.0);
        assert_eq!(stats.health, 51.0);
        assert_eq!(stats.happiness, 52.0);
    }

    #[test]
    fn modifiers_scale_with_elapsed_time() {
        let mut stats = StatBlock {
            health: 50.0,
            happiness: 50.0,
            energy: 50.0,
        };
        // 6s tick applies double the per-tick modifier.
        stats.apply_tick(Category::Coding, &profile(Category::Coding), 6.0);
        assert_eq!(stats.health, 52.0);
        assert_eq!(stats.happiness, 54.0);
    }

    #[test]
    fn stats_never_leave_bounds() {
        let mut stats = StatBlock {
            health: 99.5,
            happiness: 99.9,
            energy: 100.0,
        };
        for _ in 0..100 {
            stats.apply_tick(Category::Coding, &profile(Category::Coding), 3.0);
            assert!(stats.in_bounds());
        }
        assert_eq!(stats.health, 100.0);

        let mut low = StatBlock {
            health: 0.4,
            happiness: 0.1,
            energy: 0.0,
        };
        for _ in 0..100 {
            low.apply_tick(
                Category::Entertainment,
                &profile(Category::Entertainment),
                3.0,
            );
            assert!(low.in_bounds());
        }
        assert_eq!(low.health, 0.0);
    }

    #[test]
    fn idle_drifts_energy_and_happiness_down() {
        let mut stats = StatBlock {
            health: 50.0,
            happiness: 50.0,
            energy: 50.0,
        };
        // One hour of idle in 3s ticks.
        for _ in 0..1200 {
            stats.apply_tick(Category::Idle, &profile(Category::Idle), 3.0);
        }
        assert!((stats.energy - 45.0).abs() < 0.01);
        assert!((stats.happiness - 45.0).abs() < 0.01);
        // Stats are healthy, so health regenerated.
        assert!(stats.health > 50.0);
    }

    #[test]
    fn idle_health_decays_when_neglected() {
        let mut stats = StatBlock {
            health: 50.0,
            happiness: 5.0,
            energy: 5.0,
        };
        stats.apply_tick(Category::Idle, &profile(Category::Idle), 3600.0);
        assert!(stats.health < 50.0);
    }

    #[test]
    fn manual_actions_apply_fixed_boosts() {
        let mut stats = StatBlock {
            health: 40.0,
            happiness: 40.0,
            energy: 40.0,
        };
        stats.apply_feed();
        assert_eq!(stats.happiness, 60.0);
        assert_eq!(stats.health, 55.0);

        stats.apply_pet();
        assert_eq!(stats.happiness, 75.0);
        assert_eq!(stats.health, 60.0);

        stats.apply_break();
        assert_eq!(stats.health, 75.0);
        assert_eq!(stats.energy, 60.0);
        assert_eq!(stats.happiness, 85.0);
    }
}
