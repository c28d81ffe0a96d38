use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PetError;

/// Lifetime milestone thresholds for total dumplings earned. Each fires at
/// most once per ledger lifetime, surviving day rollovers.
pub const MILESTONES: [u64; 7] = [10, 25, 50, 100, 200, 500, 1000];

/// The dumpling ledger.
///
/// Invariants: `balance` never goes negative (losses are capped at the
/// available balance) and `total_earned` only moves on positive awards, so it
/// is monotonically non-decreasing across any sequence of ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomyLedger {
    pub balance: f64,
    pub total_earned: f64,
    pub session_earned: f64,
    pub last_tick_at: DateTime<Utc>,
    #[serde(default)]
    pub fired_milestones: BTreeSet<u64>,
}

impl EconomyLedger {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            balance: 0.0,
            total_earned: 0.0,
            session_earned: 0.0,
            last_tick_at: now,
            fired_milestones: BTreeSet::new(),
        }
    }
}

/// Inputs to the multiplier stack for one settlement.
#[derive(Debug, Clone, Copy)]
pub struct EarningContext {
    pub streak_bonus: bool,
    pub health: f64,
}

/// Result of one settlement: the applied delta plus milestone thresholds
/// newly crossed by this settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct SettleOutcome {
    pub delta: f64,
    pub milestones: Vec<u64>,
}

impl EconomyLedger {
    /// Settle earnings for elapsed minutes at the category's rate.
    ///
    /// Multipliers apply in fixed order (streak x1.5, then health>80 x1.2,
    /// then health<30 x0.5) and only to positive base amounts. Negative amounts
    /// (distracting categories) pass through unchanged: penalties are felt at
    /// full strength regardless of dino health.
    pub fn settle(
        &mut self,
        rate_per_minute: f64,
        elapsed_minutes: f64,
        ctx: EarningContext,
    ) -> SettleOutcome {
        if elapsed_minutes <= 0.0 {
            return SettleOutcome {
                delta: 0.0,
                milestones: Vec::new(),
            };
        }

        let mut amount = rate_per_minute * elapsed_minutes;

        if amount > 0.0 {
            if ctx.streak_bonus {
                amount *= 1.5;
            }
            if ctx.health > 80.0 {
                amount *= 1.2;
            } else if ctx.health < 30.0 {
                amount *= 0.5;
            }
            self.award(amount);
            let milestones = self.check_milestones();
            SettleOutcome {
                delta: amount,
                milestones,
            }
        } else if amount < 0.0 {
            let loss = (-amount).min(self.balance);
            self.balance -= loss;
            self.session_earned -= loss;
            SettleOutcome {
                delta: -loss,
                milestones: Vec::new(),
            }
        } else {
            SettleOutcome {
                delta: 0.0,
                milestones: Vec::new(),
            }
        }
    }

    /// Credit a positive amount to all three totals (settlements, break
    /// bonuses).
    pub fn award(&mut self, amount: f64) {
        debug_assert!(amount >= 0.0);
        self.balance += amount;
        self.total_earned += amount;
        self.session_earned += amount;
    }

    /// Award a fixed bonus (break reward) and report any milestone thresholds
    /// it pushed the lifetime total across.
    pub fn award_bonus(&mut self, amount: f64) -> Vec<u64> {
        self.award(amount);
        self.check_milestones()
    }

    /// Atomic spend: rejects without mutating anything when the balance does
    /// not cover the cost. Spending never touches `total_earned`.
    pub fn spend(&mut self, cost: f64) -> Result<(), PetError> {
        if self.balance < cost {
            return Err(PetError::InsufficientFunds {
                needed: cost,
                available: self.balance,
            });
        }
        self.balance -= cost;
        Ok(())
    }

    /// Thresholds crossed by `total_earned` that have not fired before.
    fn check_milestones(&mut self) -> Vec<u64> {
        let mut crossed = Vec::new();
        for threshold in MILESTONES {
            if self.total_earned >= threshold as f64 && self.fired_milestones.insert(threshold) {
                crossed.push(threshold);
            }
        }
        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> EconomyLedger {
        EconomyLedger::new(Utc::now())
    }

    fn plain(health: f64) -> EarningContext {
        EarningContext {
            streak_bonus: false,
            health,
        }
    }

    #[test]
    fn five_minutes_of_coding_without_bonuses() {
        let mut ledger = ledger();
        let outcome = ledger.settle(2.0, 5.0, plain(50.0));
        assert_eq!(outcome.delta, 10.0);
        assert_eq!(ledger.balance, 10.0);
        assert_eq!(ledger.session_earned, 10.0);
        assert_eq!(ledger.total_earned, 10.0);
    }

    #[test]
    fn losses_clamp_to_available_balance() {
        let mut ledger = ledger();
        ledger.balance = 1.0;
        let outcome = ledger.settle(-0.2, 10.0, plain(50.0));
        // Raw delta is -2.0 but only the available balance is lost.
        assert_eq!(outcome.delta, -1.0);
        assert_eq!(ledger.balance, 0.0);
        assert_eq!(ledger.total_earned, 0.0);
    }

    #[test]
    fn multipliers_stack_in_order_on_positive_base() {
        let mut ledger = ledger();
        let outcome = ledger.settle(
            2.0,
            1.0,
            EarningContext {
                streak_bonus: true,
                health: 90.0,
            },
        );
        // 2.0 * 1.5 * 1.2
        assert!((outcome.delta - 3.6).abs() < 1e-9);
    }

    #[test]
    fn low_health_halves_positive_earnings() {
        let mut ledger = ledger();
        let outcome = ledger.settle(2.0, 1.0, plain(20.0));
        assert_eq!(outcome.delta, 1.0);
    }

    #[test]
    fn negative_base_ignores_multipliers() {
        let mut ledger = ledger();
        ledger.balance = 100.0;
        let outcome = ledger.settle(
            -0.2,
            10.0,
            EarningContext {
                streak_bonus: true,
                health: 90.0,
            },
        );
        assert_eq!(outcome.delta, -2.0);
        assert_eq!(ledger.balance, 98.0);
    }

    #[test]
    fn total_earned_is_monotone_across_mixed_ticks() {
        let mut ledger = ledger();
        let mut previous = ledger.total_earned;
        let rates = [2.0, -0.3, 1.8, -0.2, 0.0, 2.0];
        for rate in rates {
            ledger.settle(rate, 1.0, plain(50.0));
            assert!(ledger.total_earned >= previous);
            assert!(ledger.balance >= 0.0);
            previous = ledger.total_earned;
        }
    }

    #[test]
    fn spend_rejects_without_mutation() {
        let mut ledger = ledger();
        ledger.balance = 3.0;
        let err = ledger.spend(5.0).unwrap_err();
        assert!(matches!(err, PetError::InsufficientFunds { .. }));
        assert_eq!(ledger.balance, 3.0);

        ledger.spend(3.0).unwrap();
        assert_eq!(ledger.balance, 0.0);
        assert_eq!(ledger.total_earned, 0.0);
    }

    #[test]
    fn milestones_fire_once_per_lifetime() {
        let mut ledger = ledger();
        let outcome = ledger.settle(2.0, 6.0, plain(50.0));
        assert_eq!(outcome.milestones, vec![10]);

        // Earn past the same threshold again (e.g. after a day rollover zeroed
        // session_earned): no refire, next thresholds fire instead.
        ledger.session_earned = 0.0;
        let outcome = ledger.settle(2.0, 8.0, plain(50.0));
        assert_eq!(outcome.milestones, vec![25]);

        let outcome = ledger.settle(2.0, 15.0, plain(50.0));
        assert_eq!(outcome.milestones, vec![50]);
    }

    #[test]
    fn one_settlement_can_cross_several_milestones() {
        let mut ledger = ledger();
        let outcome = ledger.settle(2.0, 15.0, plain(50.0));
        assert_eq!(outcome.milestones, vec![10, 25]);
    }
}
