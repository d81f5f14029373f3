//! The multi-year financial projector.
//!
//! For each provider and each year of the analysis, the representative day of every season is
//! dispatched twice: once for the household as it is (the baseline) and once with the proposed
//! solar and battery system. The resulting bills are scaled up by the number of days in each
//! season and combined with fixed charges, rebates and loan repayments.
use crate::analysis::{AnalysisParameters, InsufficientData};
use crate::battery::BatteryConfig;
use crate::dispatch::{DailyEnergyBreakdown, simulate_day};
use crate::finance::{annual_loan_repayment, escalation_factor, future_value};
use crate::hours::{Hourly, TouBands};
use crate::season::{Season, SeasonalProfile, SeasonalProfiles};
use crate::shape::{consumption_profile, solar_profile};
use crate::tariff::recipe::{DailyBill, RateAdjustment, TariffRegistry};
use crate::tariff::{ProviderID, ProviderTariff};
use crate::units::{Dimensionless, Energy, Money};
use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;
use strum::IntoEnumIterator;

/// Costs for one provider in one year of the analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearlyCost {
    /// Year of the analysis, starting from 1
    pub year: u32,
    /// Cost of grid import with the proposed system
    pub import_cost: Money,
    /// Credit for export with the proposed system
    pub export_credit: Money,
    /// Daily and monthly fixed charges
    pub supply_charge: Money,
    /// One-off rebate (first year only)
    pub rebate: Money,
    /// Loan repayments made in the year
    pub loan_repayment: Money,
    /// Total cost with the proposed system
    pub net_cost: Money,
    /// Total cost without the proposed system
    pub baseline_net_cost: Money,
    /// The difference between the baseline and proposed costs
    pub savings: Money,
    /// Savings summed up to and including this year
    pub cumulative_savings: Money,
    /// Return forgone by spending the up-front outlay on the system, if a discount rate is set
    pub opportunity_cost: Option<Money>,
}

/// The dispatch and bill for one season's representative day
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonBreakdown {
    /// The season
    pub season: Season,
    /// Days the season contributes to the year
    pub days: u32,
    /// Energy flows with the proposed system
    pub breakdown: DailyEnergyBreakdown,
    /// The day's bill with the proposed system
    pub bill: DailyBill,
}

/// The projected costs for one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProjection {
    /// The provider
    pub provider_id: ProviderID,
    /// One entry per year of the analysis
    pub years: Vec<YearlyCost>,
    /// The first year's per-season results
    pub first_year_seasons: Vec<SeasonBreakdown>,
    /// The first year in which cumulative savings cover the up-front outlay, if any
    pub payback_year: Option<u32>,
}

/// Projected costs for every provider under comparison, in the order they were given
pub type Projection = IndexMap<ProviderID, ProviderProjection>;

/// Annual totals from dispatching every season's representative day
#[derive(Default)]
struct AnnualEnergyBill {
    cost: Money,
    credit: Money,
    seasons: Vec<SeasonBreakdown>,
}

/// A representative day's hourly profiles
struct RepresentativeDay {
    season: Season,
    consumption: Hourly<Energy>,
    solar: Hourly<Energy>,
}

impl RepresentativeDay {
    fn new(season: Season, profile: &SeasonalProfile, bands: &TouBands) -> Self {
        Self {
            season,
            consumption: consumption_profile(profile, bands),
            solar: solar_profile(profile),
        }
    }
}

/// The two scenarios compared in every year
struct Scenario {
    solar_factor: f64,
    battery: BatteryConfig,
}

/// Dispatch every representative day and total the bills over the year
fn annual_energy_bill(
    days: &[RepresentativeDay],
    scenario: &Scenario,
    tariff: &ProviderTariff,
    registry: &TariffRegistry,
    year: u32,
    adjustment: &RateAdjustment,
) -> Result<AnnualEnergyBill> {
    let mut total = AnnualEnergyBill::default();
    for day in days {
        let solar = day.solar.map(|energy| Energy(energy.value() * scenario.solar_factor));
        let breakdown = simulate_day(&day.consumption, &solar, tariff, &scenario.battery);
        let bill = registry.bill(tariff, &breakdown, year, adjustment)?;

        let season_days = Dimensionless(f64::from(day.season.days()));
        total.cost += bill.cost * season_days;
        total.credit += bill.credit * season_days;
        total.seasons.push(SeasonBreakdown {
            season: day.season,
            days: day.season.days(),
            breakdown,
            bill,
        });
    }

    Ok(total)
}

/// Fixed charges for a year, before escalation
fn annual_supply_charge(tariff: &ProviderTariff) -> Money {
    tariff.daily_charge * Dimensionless(365.0) + tariff.monthly_fee * Dimensionless(12.0)
}

/// Project costs for a single provider
fn project_provider(
    parameters: &AnalysisParameters,
    days: &[RepresentativeDay],
    tariff: &ProviderTariff,
    registry: &TariffRegistry,
    proposed_solar_factor: f64,
) -> Result<ProviderProjection> {
    let loan_repayment = annual_loan_repayment(
        parameters.loan_amount,
        parameters.loan_interest_rate(),
        parameters.loan_term_years,
    );
    let outlay = parameters.upfront_outlay();
    let baseline = Scenario {
        solar_factor: 1.0,
        battery: BatteryConfig::NONE,
    };

    let mut years = Vec::new();
    let mut first_year_seasons = Vec::new();
    let mut cumulative_savings = Money(0.0);
    let mut payback_year = None;
    for year in 1..=parameters.num_years {
        let escalation = escalation_factor(parameters.tariff_escalation(), year);
        let adjustment = RateAdjustment {
            escalation,
            feed_in_degradation: parameters.feed_in_degradation(),
        };
        let solar_degradation =
            (Dimensionless(1.0) - parameters.solar_degradation()).powi(year as i32 - 1);
        let proposed = Scenario {
            solar_factor: proposed_solar_factor * solar_degradation.0,
            battery: parameters
                .battery
                .degraded(year, parameters.battery_degradation()),
        };

        let with_system = annual_energy_bill(days, &proposed, tariff, registry, year, &adjustment)?;
        let without_system =
            annual_energy_bill(days, &baseline, tariff, registry, year, &adjustment)?;

        let supply_charge = annual_supply_charge(tariff) * escalation;
        let rebate = if year == 1 { tariff.rebate } else { Money(0.0) };
        let net_cost =
            with_system.cost - with_system.credit + supply_charge - rebate + loan_repayment;
        let baseline_net_cost =
            without_system.cost - without_system.credit + supply_charge - rebate;
        let savings = baseline_net_cost - net_cost;
        cumulative_savings += savings;
        if payback_year.is_none() && cumulative_savings >= outlay {
            payback_year = Some(year);
        }

        let opportunity_cost = parameters
            .discount_rate()
            .map(|rate| future_value(outlay, rate, year) - outlay);

        debug!(
            "{} year {year}: net cost {net_cost:.2}, baseline {baseline_net_cost:.2}",
            tariff.id
        );
        years.push(YearlyCost {
            year,
            import_cost: with_system.cost,
            export_credit: with_system.credit,
            supply_charge,
            rebate,
            loan_repayment,
            net_cost,
            baseline_net_cost,
            savings,
            cumulative_savings,
            opportunity_cost,
        });
        if year == 1 {
            first_year_seasons = with_system.seasons;
        }
    }

    Ok(ProviderProjection {
        provider_id: tariff.id.clone(),
        years,
        first_year_seasons,
        payback_year,
    })
}

/// Project yearly costs with and without the proposed system for each provider.
///
/// # Arguments
///
/// * `parameters` - Analysis parameters: horizon, degradation, escalation, financing and the
///   proposed system
/// * `profiles` - Representative days for each season
/// * `providers` - The tariffs to compare
/// * `registry` - Recipes used to bill the tariffs
///
/// # Returns
///
/// A separate projection for every provider. Returns an [`InsufficientData`] error if there are no
/// seasonal profiles or no providers.
pub fn project(
    parameters: &AnalysisParameters,
    profiles: &SeasonalProfiles,
    providers: &[&ProviderTariff],
    registry: &TariffRegistry,
) -> Result<Projection> {
    if providers.is_empty() {
        return Err(InsufficientData::NoProvidersSelected.into());
    }
    if profiles.is_empty() {
        return Err(InsufficientData::NoSeasonalProfiles.into());
    }

    let days: Vec<_> = Season::iter()
        .filter_map(|season| {
            let Some(profile) = profiles.get(&season) else {
                warn!("No usage data for {season}; it will be left out of yearly totals");
                return None;
            };
            Some(RepresentativeDay::new(season, profile, &parameters.bands))
        })
        .collect();

    let solar_factor = parameters.solar_scale_factor().unwrap_or_else(|| {
        warn!("existing_solar_kw is zero, so historical solar will be used without scaling");
        1.0
    });

    let mut projection = Projection::new();
    for tariff in providers {
        info!("Projecting costs for provider {}", tariff.id);
        let provider_projection =
            project_provider(parameters, &days, tariff, registry, solar_factor)?;
        projection.insert(tariff.id.clone(), provider_projection);
    }

    Ok(projection)
}
