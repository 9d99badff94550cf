//! Parking fee calculation.
//!
//! The `fee` module turns an entry timestamp, a current timestamp and
//! a [`PricingConfig`] into a [`FeeResult`].  The calculation is a
//! pure function with no side effects: it may be invoked on every
//! clock tick while an exit screen is open, and calling it twice with
//! identical inputs yields identical results.
//!
//! Billing policy: the first hour is a flat charge regardless of how
//! little of it was used.  Past the first hour, the overage past the
//! last full hour is handled in three tiers — forgiven when it falls
//! within the tolerance window, charged the flat fraction surcharge
//! when it falls within the fraction window, and rounded up to a full
//! extra hour beyond that.  Both thresholds are inclusive on the
//! lower bound.

use crate::models::{FeeResult, PricingConfig};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by the fee calculator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeeError {
    /// The pricing configuration violates
    /// `tolerance_minutes <= fraction_limit_minutes <= 60`.  Indicates
    /// a misconfiguration the attendant must fix, never a transient
    /// condition.
    #[error(
        "invalid pricing config: tolerance {tolerance_minutes}min, \
         fraction limit {fraction_limit_minutes}min (expected tolerance <= limit <= 60)"
    )]
    InvalidConfig {
        tolerance_minutes: u32,
        fraction_limit_minutes: u32,
    },
}

/// Validates the pricing invariant shared by every fee calculation.
pub fn validate_config(config: &PricingConfig) -> Result<(), FeeError> {
    if config.tolerance_minutes > config.fraction_limit_minutes
        || config.fraction_limit_minutes > 60
    {
        return Err(FeeError::InvalidConfig {
            tolerance_minutes: config.tolerance_minutes,
            fraction_limit_minutes: config.fraction_limit_minutes,
        });
    }
    Ok(())
}

/// Computes the fee for a stay running from `entry_time` to `now`.
///
/// Total over all timestamp pairs once the config validates: a stay of
/// zero or negative duration (device clock changes happen) is billed
/// as one minute rather than producing a zero or negative amount.
pub fn compute_fee(
    entry_time: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &PricingConfig,
) -> Result<FeeResult, FeeError> {
    validate_config(config)?;

    let elapsed_ms = (now - entry_time).num_milliseconds();
    // ceil(elapsed_ms / 60000), floored at one billable minute
    let total_minutes = if elapsed_ms <= 0 {
        1
    } else {
        (elapsed_ms + 59_999) / 60_000
    };

    let amount_due = if total_minutes <= 60 {
        config.hourly_rate
    } else {
        let full_hours = total_minutes / 60;
        let remainder = total_minutes % 60;
        if remainder <= i64::from(config.tolerance_minutes) {
            full_hours as f64 * config.hourly_rate
        } else if remainder <= i64::from(config.fraction_limit_minutes) {
            full_hours as f64 * config.hourly_rate + config.fraction_rate
        } else {
            (full_hours + 1) as f64 * config.hourly_rate
        }
    };

    Ok(FeeResult {
        total_minutes,
        amount_due,
        hours: total_minutes / 60,
        minutes: total_minutes % 60,
    })
}
