//! Installment schedule for sanctioned funds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Percentage of the estimated cost released per installment, in order.
pub const INSTALLMENT_SCHEDULE: [u8; 3] = [30, 40, 30];

/// Number of installments in the schedule.
pub const INSTALLMENT_COUNT: u8 = INSTALLMENT_SCHEDULE.len() as u8;

/// Percentage for a 1-based installment number.
pub fn installment_percentage(installment: u8) -> Option<u8> {
    let index = usize::from(installment).checked_sub(1)?;
    INSTALLMENT_SCHEDULE.get(index).copied()
}

/// Cumulative percentage released once `installment` has been paid.
pub fn cumulative_percentage(installment: u8) -> u8 {
    INSTALLMENT_SCHEDULE
        .iter()
        .take(usize::from(installment))
        .sum()
}

/// Amount due for an installment.
///
/// Every installment but the last is `cost * pct / 100`. The last one takes
/// whatever remains so the released sum equals `estimated_cost` exactly.
pub fn installment_amount(estimated_cost: u64, installment: u8, already_released: u64) -> Option<u64> {
    let percentage = installment_percentage(installment)?;
    if installment == INSTALLMENT_COUNT {
        return Some(estimated_cost.saturating_sub(already_released));
    }
    let amount = u128::from(estimated_cost) * u128::from(percentage) / 100;
    u64::try_from(amount).ok()
}

/// One released installment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundReleaseRecord {
    /// 1-based installment number
    pub installment: u8,
    /// Share of the estimated cost
    pub percentage: u8,
    /// Amount released, in rupees
    pub amount: u64,
    /// Share released so far including this installment
    pub cumulative_percentage: u8,
    /// Officer who authorized the release
    pub released_by: String,
    pub released_at: DateTime<Utc>,
}
