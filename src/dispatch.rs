//! The dispatch simulator: decides hour by hour how energy moves between solar, battery, load and
//! grid for a single day.
use crate::battery::BatteryConfig;
use crate::hours::{HOURS_PER_DAY, Hourly, TouPeriod};
use crate::tariff::ProviderTariff;
use crate::units::Energy;
use serde::Serialize;

/// The energy flows of one simulated day, categorised for billing
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DailyEnergyBreakdown {
    /// Grid import during peak hours
    pub peak_kwh: Energy,
    /// Grid import during shoulder hours
    pub shoulder_kwh: Energy,
    /// Grid import during off-peak hours
    pub off_peak_kwh: Energy,
    /// Export within the tariff's tier 1 allowance
    pub tier1_export_kwh: Energy,
    /// Export beyond the tier 1 allowance
    pub tier2_export_kwh: Energy,
    /// Grid import drawn to charge the battery
    pub grid_charge_kwh: Energy,
    /// Solar used directly by the load
    pub self_consumed_kwh: Energy,
    /// Load met by the battery
    pub battery_discharge_kwh: Energy,
    /// Export in each hour
    #[serde(skip)]
    pub hourly_exports: Hourly<Energy>,
    /// Grid import in each hour, including grid charging
    #[serde(skip)]
    pub hourly_imports: Hourly<Energy>,
    /// Battery discharge in each hour
    #[serde(skip)]
    pub hourly_discharge: Hourly<Energy>,
    /// State of charge at the end of each hour
    #[serde(skip)]
    pub hourly_soc: Hourly<Energy>,
}

impl DailyEnergyBreakdown {
    /// Total grid import over the day
    pub fn total_import(&self) -> Energy {
        self.peak_kwh + self.shoulder_kwh + self.off_peak_kwh
    }

    /// Total export over the day
    pub fn total_export(&self) -> Energy {
        self.tier1_export_kwh + self.tier2_export_kwh
    }

    /// The largest import in any single hour
    pub fn max_hourly_import(&self) -> Energy {
        self.hourly_imports
            .iter()
            .copied()
            .fold(Energy(0.0), Energy::max)
    }

    fn add_import(&mut self, period: TouPeriod, energy: Energy) {
        match period {
            TouPeriod::Peak => self.peak_kwh += energy,
            TouPeriod::Shoulder => self.shoulder_kwh += energy,
            TouPeriod::OffPeak => self.off_peak_kwh += energy,
        }
    }
}

/// Simulate one day of energy flows.
///
/// The battery starts the day empty. Each hour, solar first meets the load directly; the battery
/// then discharges to cover what is left and charges from any excess solar, with the remainder
/// exported. If the tariff's grid charge applies in that hour, the battery is topped up from the
/// grid with whatever inverter power is left over.
///
/// # Arguments
///
/// * `consumption` - Household load in each hour
/// * `solar` - Solar generation in each hour
/// * `tariff` - Provides the time-of-use bands, export tiers and grid charge schedule
/// * `battery` - The battery available (zero capacity or power means no battery)
pub fn simulate_day(
    consumption: &Hourly<Energy>,
    solar: &Hourly<Energy>,
    tariff: &ProviderTariff,
    battery: &BatteryConfig,
) -> DailyEnergyBreakdown {
    let capacity = battery.capacity_kwh;
    let max_transfer = battery.inverter_kw.over_one_hour();
    let zero = Energy(0.0);

    let mut breakdown = DailyEnergyBreakdown::default();
    let mut soc = zero;
    for hour in 0..HOURS_PER_DAY {
        let self_consumed = consumption[hour].min(solar[hour]);
        let remaining = consumption[hour] - self_consumed;
        let excess_solar = solar[hour] - self_consumed;

        let discharge = remaining.min(soc).min(max_transfer);
        soc -= discharge;
        let mut import = remaining - discharge;

        let charge = excess_solar
            .min((capacity - soc).max(zero))
            .min(max_transfer);
        soc += charge;
        let export = excess_solar - charge;

        if tariff.grid_charge.is_active(hour, soc, capacity) {
            let headroom = (max_transfer - discharge - charge).max(zero);
            let top_up = (capacity - soc).min(headroom).max(zero);
            soc += top_up;
            import += top_up;
            breakdown.grid_charge_kwh += top_up;
        }

        breakdown.add_import(tariff.tou_bands.classify(hour), import);
        breakdown.self_consumed_kwh += self_consumed;
        breakdown.battery_discharge_kwh += discharge;
        breakdown.hourly_imports[hour] = import;
        breakdown.hourly_exports[hour] = export;
        breakdown.hourly_discharge[hour] = discharge;
        breakdown.hourly_soc[hour] = soc;
    }

    let (tier1, tier2) = split_export_tiers(&breakdown.hourly_exports, tariff.export_tier1_limit());
    breakdown.tier1_export_kwh = tier1;
    breakdown.tier2_export_kwh = tier2;

    breakdown
}

/// Split a day's export into the part within the tier 1 allowance and the rest.
///
/// The allowance is used up in hour order. With no limit, all export is tier 1.
fn split_export_tiers(exports: &Hourly<Energy>, tier1_limit: Option<Energy>) -> (Energy, Energy) {
    let total: Energy = exports.iter().copied().sum();
    match tier1_limit {
        None => (total, Energy(0.0)),
        Some(limit) => {
            let tier1 = total.min(limit.max(Energy(0.0)));
            (tier1, total - tier1)
        }
    }
}
