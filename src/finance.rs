//! General functions related to finance.
use crate::units::{Dimensionless, Money, MoneyPerEnergy};

/// Calculates the capital recovery factor (CRF) for a given number of periods and interest rate.
///
/// The CRF is the fraction of a principal which must be repaid each period to clear it, with
/// interest, by the end of the last period.
pub fn capital_recovery_factor(periods: u32, rate: Dimensionless) -> Dimensionless {
    if periods == 0 {
        return Dimensionless(0.0);
    }
    if rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(periods as f64);
    }
    let factor = (Dimensionless(1.0) + rate).powi(periods as i32);
    (rate * factor) / (factor - Dimensionless(1.0))
}

/// Calculates the annual repayment on an amortised loan with monthly payments.
///
/// # Arguments
///
/// * `principal` - The amount borrowed
/// * `annual_interest_rate` - Yearly interest rate as a fraction; compounded monthly
/// * `term_years` - Length of the loan
pub fn annual_loan_repayment(
    principal: Money,
    annual_interest_rate: Dimensionless,
    term_years: u32,
) -> Money {
    let monthly_rate = annual_interest_rate / Dimensionless(12.0);
    let months = term_years * 12;
    principal * capital_recovery_factor(months, monthly_rate) * Dimensionless(12.0)
}

/// Multiplier applied to import prices in the given year, for a constant annual escalation.
///
/// Year 1 is the first year of the analysis and has no escalation.
pub fn escalation_factor(annual_escalation: Dimensionless, year: u32) -> Dimensionless {
    (Dimensionless(1.0) + annual_escalation).powi(year.saturating_sub(1) as i32)
}

/// A rate after `year - 1` years of constant fractional decline.
///
/// Year 1 is the first year of the analysis and has no degradation.
pub fn degraded_rate(
    rate: MoneyPerEnergy,
    year: u32,
    annual_degradation: Dimensionless,
) -> MoneyPerEnergy {
    rate * (Dimensionless(1.0) - annual_degradation).powi(year.saturating_sub(1) as i32)
}

/// The value of `principal` after compounding annually at `rate` for `years` years
pub fn future_value(principal: Money, rate: Dimensionless, years: u32) -> Money {
    principal * (Dimensionless(1.0) + rate).powi(years as i32)
}
