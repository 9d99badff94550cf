//! Data models for the Parking Engine.
//!
//! The `models` module defines a set of serialisable structs and
//! enums representing the pricing configuration, parked vehicles,
//! payment methods and calculation results.  These data types derive
//! `Serialize` and `Deserialize` so that they can be easily persisted
//! or transmitted over a network, and their wire names use camelCase
//! to stay compatible with the settings and vehicle records the
//! attendant-facing application stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pricing configuration for a single lot.
///
/// Values are attendant-configured and persisted externally; the
/// engine only reads them.  The invariant
/// `tolerance_minutes <= fraction_limit_minutes <= 60` is checked by
/// the fee calculator before any amount is computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    /// Amount charged per full hour, in the lot's currency.
    pub hourly_rate: f64,
    /// Grace window, in minutes, after each full hour before any
    /// extra charge applies.
    pub tolerance_minutes: u32,
    /// Flat surcharge applied when the overage falls within the
    /// fraction window.
    pub fraction_rate: f64,
    /// Upper bound, in minutes, of the fraction overage window.
    /// Beyond it a full extra hour is charged.
    pub fraction_limit_minutes: u32,
}

/// The PIX receiving account used when building payment payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixReceiver {
    /// The PIX key: an email address, phone number, random key or tax
    /// id.  Treated as an opaque identifier.
    pub pix_key: String,
    /// Display name of the account holder.
    pub pix_holder_name: String,
    /// City of the account holder.
    pub pix_holder_city: String,
}

/// Complete lot settings: the pricing configuration plus the PIX
/// receiving account.  Serialises to the flat camelCase object the
/// application persists (`hourlyRate`, `pixKey`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub pricing: PricingConfig,
    #[serde(flatten)]
    pub receiver: PixReceiver,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pricing: PricingConfig {
                hourly_rate: 10.0,
                tolerance_minutes: 5,
                fraction_rate: 5.0,
                fraction_limit_minutes: 15,
            },
            receiver: PixReceiver {
                pix_key: "seu-pix@email.com".to_string(),
                pix_holder_name: "NOME DO TITULAR".to_string(),
                pix_holder_city: "CIDADE".to_string(),
            },
        }
    }
}

/// The result of a fee calculation for one stay.
///
/// Recomputed fresh on every invocation (the reference cadence is
/// once per second while an exit screen is open); never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeResult {
    /// Billed minutes, always at least 1.
    pub total_minutes: i64,
    /// Amount due for the stay.
    pub amount_due: f64,
    /// Full hours of the stay, for display.
    pub hours: i64,
    /// Remaining minutes of the stay, for display.
    pub minutes: i64,
}

/// Whether a vehicle is still in the lot or has paid and left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Parked,
    Paid,
}

/// How an exit was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Pix,
    Cash,
    Card,
    /// Courtesy agreement: the exit is recorded but settles at zero.
    Convenio,
}

impl PaymentMethod {
    /// The amount actually charged for an exit settled with this
    /// method.  Courtesy (`Convenio`) exits settle at zero; every
    /// other method charges the computed amount.
    pub fn amount_charged(&self, amount_due: f64) -> f64 {
        match self {
            PaymentMethod::Convenio => 0.0,
            _ => amount_due,
        }
    }
}

/// A vehicle record as supplied by the external session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub plate: String,
    pub model: String,
    pub color: String,
    /// Timestamp of entry into the lot.
    pub entry_time: DateTime<Utc>,
    /// Timestamp of exit, present once the vehicle has paid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<DateTime<Utc>>,
    pub status: VehicleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

/// Rolling window over which a revenue report is computed.  Windows
/// start at local midnight of their first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportPeriod {
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "7days")]
    Last7Days,
    #[serde(rename = "15days")]
    Last15Days,
    #[serde(rename = "30days")]
    Last30Days,
}

/// Aggregate revenue figures for one report window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Sum of `amount_paid` over the exits in the window.
    pub total_revenue: f64,
    /// Number of exits in the window.
    pub exit_count: usize,
    /// Revenue broken down by payment method.
    pub revenue_by_method: HashMap<PaymentMethod, f64>,
    /// Mean stay length in minutes, 0 when the window has no exits.
    pub average_stay_minutes: f64,
    /// Full hours of the mean stay, for display.
    pub average_stay_hours: i64,
    /// Remaining minutes of the mean stay, rounded, for display.
    pub average_stay_remainder: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_flat_camel_case() {
        let json = r#"{
            "hourlyRate": 12.0,
            "toleranceMinutes": 10,
            "fractionRate": 6.0,
            "fractionLimitMinutes": 20,
            "pixKey": "dono@lote.com",
            "pixHolderName": "Dono do Lote",
            "pixHolderCity": "Recife"
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.pricing.hourly_rate, 12.0);
        assert_eq!(settings.pricing.fraction_limit_minutes, 20);
        assert_eq!(settings.receiver.pix_key, "dono@lote.com");

        let out = serde_json::to_value(&settings).unwrap();
        assert_eq!(out["hourlyRate"], 12.0);
        assert_eq!(out["pixHolderCity"], "Recife");
    }

    #[test]
    fn convenio_settles_at_zero() {
        assert_eq!(PaymentMethod::Convenio.amount_charged(42.0), 0.0);
        assert_eq!(PaymentMethod::Pix.amount_charged(42.0), 42.0);
        assert_eq!(PaymentMethod::Cash.amount_charged(42.0), 42.0);
    }

    #[test]
    fn vehicle_deserialises_without_exit_fields() {
        let json = r#"{
            "id": "1",
            "plate": "ABC-1234",
            "model": "Uno",
            "color": "Prata",
            "entryTime": "2024-05-01T12:00:00Z",
            "status": "parked"
        }"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Parked);
        assert!(vehicle.exit_time.is_none());
        assert!(vehicle.payment_method.is_none());
    }

    #[test]
    fn report_period_wire_names() {
        let period: ReportPeriod = serde_json::from_str("\"7days\"").unwrap();
        assert_eq!(period, ReportPeriod::Last7Days);
        assert_eq!(
            serde_json::to_string(&ReportPeriod::Today).unwrap(),
            "\"today\""
        );
    }
}
