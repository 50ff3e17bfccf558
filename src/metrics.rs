// Totals and the linear year-end forecast.
//
// The forecast is a straight-line extrapolation: the average daily rate
// since the start of the window, carried to the end of the window. There is
// no seasonality or smoothing.
use crate::error::{ReportError, Result};
use crate::types::{DebtRecord, DebtTotals, ForecastResult, MeteringRecord, Verdict};
use crate::util::{days_between, sum_present};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Project the metering total to `period_end`.
///
/// Fails with `DivisionUndefined` when no day has elapsed (the daily rate
/// would be meaningless) and with `InvalidWindow` when `as_of` precedes the
/// window. A zero plan total does not fail: the ratio is left undefined and
/// the verdict is `Undetermined`.
pub fn forecast(
    records: &[MeteringRecord],
    as_of: NaiveDate,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<ForecastResult> {
    let days_total = days_between(period_start, period_end);
    if days_total <= 0 {
        return Err(ReportError::InvalidWindow(format!(
            "period_end {} is not after period_start {}",
            period_end, period_start
        )));
    }
    let days_passed = days_between(period_start, as_of);
    if days_passed < 0 {
        return Err(ReportError::InvalidWindow(format!(
            "as_of {} is before period_start {}",
            as_of, period_start
        )));
    }
    if days_passed == 0 {
        return Err(ReportError::DivisionUndefined { divisor: "days_passed" });
    }

    let total_current = sum_present(records.iter().map(|r| r.total_meters));
    let total_plan = sum_present(records.iter().map(|r| r.plan));

    let avg_per_day = total_current / days_passed as f64;
    let forecast_total = avg_per_day * days_total as f64;
    let forecast_ratio = if total_plan == 0.0 {
        warn!("Plan total is zero; forecast ratio is undefined");
        None
    } else {
        Some(forecast_total / total_plan)
    };
    let verdict = match forecast_ratio {
        Some(r) if r >= 1.0 => Verdict::MeetsPlan,
        Some(_) => Verdict::BelowPlan,
        None => Verdict::Undetermined,
    };

    info!(
        total_current,
        total_plan,
        days_passed,
        days_total,
        forecast_total,
        "Computed forecast"
    );

    Ok(ForecastResult {
        total_current,
        total_plan,
        as_of,
        period_end,
        days_passed,
        days_total,
        avg_per_day,
        forecast_total,
        forecast_ratio,
        verdict,
    })
}

impl ForecastResult {
    /// The forecast ratio, or `DivisionUndefined` when the plan total is zero.
    pub fn require_ratio(&self) -> Result<f64> {
        self.forecast_ratio
            .ok_or(ReportError::DivisionUndefined { divisor: "total_plan" })
    }
}

pub fn debt_totals(records: &[DebtRecord]) -> DebtTotals {
    DebtTotals {
        unit_count: records.len(),
        total_count: records.iter().map(|r| r.overdue_customers).sum(),
        total_amount: records.iter().map(|r| r.amount).sum(),
    }
}
