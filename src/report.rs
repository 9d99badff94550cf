//! Revenue reports over rolling windows.
//!
//! The `report` module aggregates paid exits into the figures the
//! reports screen shows: total revenue, exit count, revenue per
//! payment method and the average stay length.  Windows are anchored
//! to local midnight of their first day, and the aggregation fans the
//! per-vehicle work across cores with [`rayon`].  The clock is an
//! explicit input so that the computation stays pure and testable.

use crate::models::{PaymentMethod, ReportPeriod, ReportSummary, Vehicle, VehicleStatus};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use rayon::prelude::*;
use std::collections::HashMap;

impl ReportPeriod {
    fn days_back(&self) -> i64 {
        match self {
            ReportPeriod::Today => 0,
            ReportPeriod::Last7Days => 7,
            ReportPeriod::Last15Days => 15,
            ReportPeriod::Last30Days => 30,
        }
    }

    /// Local midnight of the first day of the window ending at `now`.
    pub fn starts_at(&self, now: DateTime<Local>) -> DateTime<Local> {
        let first_day = (now - Duration::days(self.days_back())).date_naive();
        let midnight = first_day.and_hms_opt(0, 0, 0).unwrap_or_default();
        match Local.from_local_datetime(&midnight) {
            chrono::LocalResult::Single(start) => start,
            // DST transition at midnight: take the earliest reading
            chrono::LocalResult::Ambiguous(earliest, _) => earliest,
            chrono::LocalResult::None => Local.from_utc_datetime(&midnight),
        }
    }
}

/// Running aggregate over the exits of one window.
#[derive(Default)]
struct Aggregate {
    revenue: f64,
    exits: usize,
    by_method: HashMap<PaymentMethod, f64>,
    stay_minutes: f64,
}

impl Aggregate {
    fn add(mut self, vehicle: &Vehicle) -> Self {
        let paid = vehicle.amount_paid.unwrap_or(0.0);
        self.revenue += paid;
        self.exits += 1;
        if let Some(method) = vehicle.payment_method {
            *self.by_method.entry(method).or_insert(0.0) += paid;
        }
        if let Some(exit_time) = vehicle.exit_time {
            let duration_ms = (exit_time - vehicle.entry_time).num_milliseconds();
            self.stay_minutes += duration_ms as f64 / 60_000.0;
        }
        self
    }

    fn merge(mut self, other: Aggregate) -> Self {
        self.revenue += other.revenue;
        self.exits += other.exits;
        for (method, amount) in other.by_method {
            *self.by_method.entry(method).or_insert(0.0) += amount;
        }
        self.stay_minutes += other.stay_minutes;
        self
    }
}

/// Aggregates every vehicle that exited paid at or after the start of
/// `period` into a [`ReportSummary`].  Parked vehicles and exits that
/// predate the window never count.
pub fn revenue_report(
    vehicles: &[Vehicle],
    period: ReportPeriod,
    now: DateTime<Local>,
) -> ReportSummary {
    let window_start: DateTime<Utc> = period.starts_at(now).with_timezone(&Utc);

    let aggregate = vehicles
        .par_iter()
        .filter(|v| {
            v.status == VehicleStatus::Paid
                && v.exit_time.map_or(false, |exit| exit >= window_start)
        })
        .fold(Aggregate::default, |acc, v| acc.add(v))
        .reduce(Aggregate::default, Aggregate::merge);

    let average_stay_minutes = if aggregate.exits > 0 {
        aggregate.stay_minutes / aggregate.exits as f64
    } else {
        0.0
    };

    ReportSummary {
        total_revenue: aggregate.revenue,
        exit_count: aggregate.exits,
        revenue_by_method: aggregate.by_method,
        average_stay_minutes,
        average_stay_hours: (average_stay_minutes / 60.0).floor() as i64,
        average_stay_remainder: (average_stay_minutes % 60.0).round() as i64,
    }
}
