pub mod economy;
pub mod policy;
pub mod stats;
pub mod streaks;

pub use economy::{EarningContext, EconomyLedger, SettleOutcome, MILESTONES};
pub use policy::{EventKind, FiredLog, NotificationPolicy};
pub use stats::StatBlock;
pub use streaks::{StreakEvent, Streaks};
