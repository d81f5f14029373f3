//! The sizing recommender.
//!
//! Three recommendations are made: a quick heuristic from the seasonal averages, a detailed one
//! from replaying every historical day through the dispatch simulator, and a blackout reserve
//! sized from the worst stretch of consumption in the history.
use crate::analysis::{AnalysisParameters, InsufficientData};
use crate::battery::BatteryConfig;
use crate::dispatch::simulate_day;
use crate::history::{SolarHistory, UsageHistory, iter_overlapping_days};
use crate::season::aggregate;
use crate::tariff::ProviderTariff;
use crate::units::{Energy, Power};
use chrono::NaiveDate;
use itertools::Itertools;
use log::{info, warn};
use serde::Serialize;

/// Battery capacities (kWh) commonly sold, in ascending order
pub const STANDARD_BATTERY_SIZES: [f64; 9] = [5.0, 10.0, 13.5, 16.0, 20.0, 24.0, 32.0, 40.0, 48.0];

/// Peak sun hours assumed by the heuristic solar sizing
const PEAK_SUN_HOURS: f64 = 4.0;

/// Percentile of daily demand the detailed recommendation covers
const DETAILED_PERCENTILE: f64 = 90.0;

/// All three sizing recommendations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingRecommendation {
    /// Closed-form estimate from seasonal averages
    pub heuristic: HeuristicSizing,
    /// Percentile-based estimate from replaying the history
    pub detailed: DetailedSizing,
    /// Reserve needed to ride through a blackout
    pub blackout: BlackoutSizing,
}

/// Sizes estimated from seasonal averages
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeuristicSizing {
    /// Battery capacity
    pub battery_kwh: Energy,
    /// Inverter power
    pub inverter_kw: Power,
    /// Solar array size
    pub solar_kw: Power,
}

/// Sizes taken from the distribution of daily demand in the history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedSizing {
    /// The number of days replayed
    pub days: usize,
    /// The percentile used for the recommendation
    pub percentile: f64,
    /// Recommended battery capacity, in whole kWh
    pub battery_kwh: Energy,
    /// Recommended inverter power, to the nearest half kW above
    pub inverter_kw: Power,
    /// Days whose peak-period demand is within the recommended capacity
    pub battery_coverage_days: usize,
    /// Days whose largest hourly demand is within the recommended inverter power
    pub inverter_coverage_days: usize,
    /// Days fully covered by the configured battery
    pub configured_battery_coverage_days: usize,
    /// Per-day statistics, in date order
    #[serde(skip)]
    pub daily: Vec<DayDemand>,
}

/// The demand statistics for one historical day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayDemand {
    /// The calendar day
    pub date: NaiveDate,
    /// Total consumption
    pub consumption_kwh: Energy,
    /// Total solar generation used in the replay
    pub solar_kwh: Energy,
    /// Peak-period grid import with no battery
    pub peak_kwh: Energy,
    /// The largest import in any single hour with no battery
    pub max_hourly_kwh: Energy,
    /// Export with no battery
    pub export_kwh: Energy,
}

/// The reserve needed for a blackout
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlackoutSizing {
    /// Length of the blackout
    pub duration_hours: usize,
    /// The most energy consumed in any window of that length
    pub max_window_kwh: Energy,
    /// The part of that energy to be covered
    pub reserve_kwh: Energy,
    /// The detailed battery recommendation plus the reserve
    pub required_kwh: Energy,
    /// The smallest standard battery size at least as large as required
    pub recommended_kwh: Energy,
}

/// Round up to the nearest half
fn ceil_half(value: f64) -> f64 {
    (value * 2.0).ceil() / 2.0
}

/// The `percentile`th order statistic of `sorted`, which must be in ascending order.
///
/// Uses the `ceil(p * N) - 1` index, so the 90th percentile of `1..=10` is 9.
pub fn percentile(sorted: &[f64], percentile: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let rank = (percentile * sorted.len() as f64 / 100.0).ceil() as usize;
    let index = rank.saturating_sub(1).min(sorted.len() - 1);
    Some(sorted[index])
}

/// Sort a sample in ascending order
fn sorted_sample(values: impl Iterator<Item = f64>) -> Vec<f64> {
    values.sorted_by(f64::total_cmp).collect()
}

/// Heuristic sizing from the seasonal averages
fn heuristic_sizing(
    usage: &UsageHistory,
    solar: &SolarHistory,
    parameters: &AnalysisParameters,
) -> Result<HeuristicSizing, InsufficientData> {
    let profiles = aggregate(usage, solar, &parameters.bands);
    if profiles.is_empty() {
        return Err(InsufficientData::NoSeasonalProfiles);
    }

    let target = parameters.coverage_target / 100.0;
    let max_peak = profiles
        .values()
        .map(|profile| profile.avg_peak.value())
        .fold(0.0, f64::max);
    let mean_consumption = profiles
        .values()
        .map(|profile| profile.avg_consumption().value())
        .sum::<f64>()
        / profiles.len() as f64;

    let battery_kwh = (max_peak * target).ceil();
    Ok(HeuristicSizing {
        battery_kwh: Energy(battery_kwh),
        inverter_kw: Power(ceil_half(battery_kwh / 2.0)),
        solar_kw: Power(ceil_half(mean_consumption * target / PEAK_SUN_HOURS)),
    })
}

/// Replay each day with matching solar data without a battery and record its demand
fn replay_history(
    usage: &UsageHistory,
    solar: &SolarHistory,
    parameters: &AnalysisParameters,
) -> Vec<DayDemand> {
    let tariff = ProviderTariff::reference(parameters.bands);
    let solar_factor = if parameters.replace_existing_system {
        parameters.solar_scale_factor().unwrap_or_else(|| {
            warn!("existing_solar_kw is zero, so solar will not be scaled for sizing");
            1.0
        })
    } else {
        1.0
    };

    iter_overlapping_days(usage, solar)
        .map(|(usage_day, solar_day)| {
            let generation = solar_day.scaled(solar_factor);
            let breakdown = simulate_day(
                &usage_day.consumption,
                &generation,
                &tariff,
                &BatteryConfig::NONE,
            );
            DayDemand {
                date: usage_day.date,
                consumption_kwh: usage_day.total_consumption(),
                solar_kwh: generation.iter().copied().sum(),
                peak_kwh: breakdown.peak_kwh,
                max_hourly_kwh: breakdown.max_hourly_import(),
                export_kwh: breakdown.total_export(),
            }
        })
        .collect()
}

/// Detailed sizing from the percentiles of daily demand
fn detailed_sizing(
    usage: &UsageHistory,
    solar: &SolarHistory,
    parameters: &AnalysisParameters,
) -> Result<DetailedSizing, InsufficientData> {
    let daily = replay_history(usage, solar, parameters);
    let peaks = sorted_sample(daily.iter().map(|day| day.peak_kwh.value()));
    let max_hourly = sorted_sample(daily.iter().map(|day| day.max_hourly_kwh.value()));

    let battery_kwh = Energy(
        percentile(&peaks, DETAILED_PERCENTILE)
            .ok_or(InsufficientData::NoOverlappingDays)?
            .ceil(),
    );
    let inverter_kw = Power(ceil_half(
        percentile(&max_hourly, DETAILED_PERCENTILE).ok_or(InsufficientData::NoOverlappingDays)?,
    ));

    let battery_coverage_days = daily
        .iter()
        .filter(|day| day.peak_kwh <= battery_kwh)
        .count();
    let inverter_coverage_days = daily
        .iter()
        .filter(|day| day.max_hourly_kwh <= inverter_kw.over_one_hour())
        .count();
    let configured = &parameters.battery;
    let configured_battery_coverage_days = daily
        .iter()
        .filter(|day| {
            day.peak_kwh <= configured.capacity_kwh
                && day.max_hourly_kwh <= configured.inverter_kw.over_one_hour()
        })
        .count();

    info!(
        "Detailed sizing over {} days: {battery_kwh} kWh battery, {inverter_kw} kW inverter",
        daily.len()
    );
    Ok(DetailedSizing {
        days: daily.len(),
        percentile: DETAILED_PERCENTILE,
        battery_kwh,
        inverter_kw,
        battery_coverage_days,
        inverter_coverage_days,
        configured_battery_coverage_days,
        daily,
    })
}

/// The largest total over any `window` consecutive values.
///
/// A window longer than the series covers the whole series. A zero-length window gives zero.
fn max_window_sum(series: &[Energy], window: usize) -> Energy {
    if window == 0 || series.is_empty() {
        return Energy(0.0);
    }
    if window >= series.len() {
        return series.iter().copied().sum();
    }

    let mut sum: Energy = series[..window].iter().copied().sum();
    let mut max = sum;
    for i in window..series.len() {
        sum += series[i] - series[i - window];
        max = max.max(sum);
    }

    max
}

/// The smallest standard battery size at least as large as `required`, or `required` rounded up if
/// it is larger than all of them
fn standard_battery_size(required: Energy) -> Energy {
    STANDARD_BATTERY_SIZES
        .iter()
        .copied()
        .find(|size| *size >= required.value())
        .map_or_else(|| Energy(required.value().ceil()), Energy)
}

/// Blackout reserve sizing on top of the detailed battery recommendation
fn blackout_sizing(
    usage: &UsageHistory,
    parameters: &AnalysisParameters,
    detailed_battery: Energy,
) -> BlackoutSizing {
    let series: Vec<Energy> = usage
        .values()
        .sorted_by_key(|day| day.date)
        .flat_map(|day| day.consumption)
        .collect();

    let duration_hours = parameters.blackout_duration_hours;
    let max_window_kwh = max_window_sum(&series, duration_hours);
    let reserve_kwh = Energy(max_window_kwh.value() * parameters.blackout_coverage_pct / 100.0);
    let required_kwh = detailed_battery + reserve_kwh;

    BlackoutSizing {
        duration_hours,
        max_window_kwh,
        reserve_kwh,
        required_kwh,
        recommended_kwh: standard_battery_size(required_kwh),
    }
}

/// Recommend battery, inverter and solar sizes from the household's history.
///
/// # Arguments
///
/// * `usage` - Metered usage history
/// * `solar` - Solar generation history
/// * `parameters` - Supplies the coverage target, the configured battery, the solar system sizes
///   and the blackout requirements
///
/// # Returns
///
/// The recommendations, or the reason there isn't enough data to make them
pub fn recommend(
    usage: &UsageHistory,
    solar: &SolarHistory,
    parameters: &AnalysisParameters,
) -> Result<SizingRecommendation, InsufficientData> {
    if usage.is_empty() {
        return Err(InsufficientData::NoUsageHistory);
    }
    if solar.is_empty() {
        return Err(InsufficientData::NoSolarHistory);
    }

    let heuristic = heuristic_sizing(usage, solar, parameters)?;
    let detailed = detailed_sizing(usage, solar, parameters)?;
    let blackout = blackout_sizing(usage, parameters, detailed.battery_kwh);

    Ok(SizingRecommendation {
        heuristic,
        detailed,
        blackout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{solar_day, usage_day};
    use crate::history::DailyUsage;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn usage_history(days: impl IntoIterator<Item = DailyUsage>) -> UsageHistory {
        days.into_iter().map(|day| (day.date, day)).collect()
    }

    #[test]
    fn test_percentile() {
        let sample: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(percentile(&sample, 90.0), Some(9.0));
        assert_eq!(percentile(&sample, 100.0), Some(10.0));
        assert_eq!(percentile(&sample, 70.0), Some(7.0));
        assert_eq!(percentile(&sample, 1.0), Some(1.0));
        assert_eq!(percentile(&[], 90.0), None);
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(2.1, 2.5)]
    #[case(2.5, 2.5)]
    #[case(2.6, 3.0)]
    fn test_ceil_half(#[case] value: f64, #[case] expected: f64) {
        assert_eq!(ceil_half(value), expected);
    }

    #[rstest]
    #[case(0, 0.0)]
    #[case(1, 5.0)]
    #[case(2, 8.0)]
    #[case(3, 10.0)]
    #[case(100, 12.0)]
    fn test_max_window_sum(#[case] window: usize, #[case] expected: f64) {
        let series = [1.0, 3.0, 5.0, 2.0, 1.0].map(Energy);
        assert_eq!(max_window_sum(&series, window), Energy(expected));
    }

    #[rstest]
    #[case(0.0, 5.0)]
    #[case(5.0, 5.0)]
    #[case(11.0, 13.5)]
    #[case(47.9, 48.0)]
    #[case(51.2, 52.0)]
    fn test_standard_battery_size(#[case] required: f64, #[case] expected: f64) {
        assert_eq!(standard_battery_size(Energy(required)), Energy(expected));
    }

    #[test]
    fn test_recommend_insufficient_data() {
        let usage = usage_history([usage_day("2024-01-01", 1.0)]);
        let solar: SolarHistory = [solar_day("2024-02-01", &[(12, 5.0)])]
            .into_iter()
            .map(|day| (day.date, day))
            .collect();
        let parameters = AnalysisParameters::default();

        assert_eq!(
            recommend(&UsageHistory::new(), &solar, &parameters),
            Err(InsufficientData::NoUsageHistory)
        );
        assert_eq!(
            recommend(&usage, &SolarHistory::new(), &parameters),
            Err(InsufficientData::NoSolarHistory)
        );
        assert_eq!(
            recommend(&usage, &solar, &parameters),
            Err(InsufficientData::NoOverlappingDays)
        );
    }

    #[test]
    fn test_recommend() {
        // Ten days with increasing consumption and the same solar
        let usage = usage_history(
            (1..=10).map(|day| usage_day(&format!("2024-01-{day:02}"), f64::from(day) * 0.5)),
        );
        let solar: SolarHistory = (1..=10)
            .map(|day| {
                let day = solar_day(&format!("2024-01-{day:02}"), &[(11, 6.0), (12, 6.0)]);
                (day.date, day)
            })
            .collect();
        let parameters = AnalysisParameters {
            battery: BatteryConfig {
                capacity_kwh: Energy(20.0),
                inverter_kw: Power(5.0),
            },
            blackout_duration_hours: 4,
            blackout_coverage_pct: 50.0,
            ..AnalysisParameters::default()
        };

        let recommendation = recommend(&usage, &solar, &parameters).unwrap();

        // Peak hours see no solar, so peak demand is 9 hours of consumption: 4.5, 9, ..., 45 kWh
        let detailed = &recommendation.detailed;
        assert_eq!(detailed.days, 10);
        assert_eq!(detailed.battery_kwh, Energy(41.0));
        assert_eq!(detailed.inverter_kw, Power(4.5));
        assert_eq!(detailed.battery_coverage_days, 9);
        assert_eq!(detailed.inverter_coverage_days, 9);
        assert_eq!(detailed.configured_battery_coverage_days, 4);
        assert_eq!(detailed.daily[0].solar_kwh, Energy(12.0));
        assert_eq!(detailed.daily[0].export_kwh, Energy(11.0));

        // Summer peak averages 9 * 2.75 kWh
        let heuristic = &recommendation.heuristic;
        assert_eq!(heuristic.battery_kwh, Energy(23.0));
        assert_eq!(heuristic.inverter_kw, Power(11.5));
        assert_eq!(heuristic.solar_kw, Power(15.0));

        // Worst four hours are on the last day: 4 * 5 kWh, half of which is reserved
        let blackout = &recommendation.blackout;
        assert_approx_eq!(Energy, blackout.max_window_kwh, Energy(20.0), epsilon = 1e-9);
        assert_approx_eq!(Energy, blackout.reserve_kwh, Energy(10.0), epsilon = 1e-9);
        assert_approx_eq!(Energy, blackout.required_kwh, Energy(51.0), epsilon = 1e-9);
        assert_eq!(blackout.recommended_kwh, Energy(51.0));
    }

    #[test]
    fn test_coverage_target_only_affects_heuristic() {
        let usage = usage_history(
            (1..=10).map(|day| usage_day(&format!("2024-01-{day:02}"), f64::from(day) * 0.5)),
        );
        let solar: SolarHistory = (1..=10)
            .map(|day| {
                let day = solar_day(&format!("2024-01-{day:02}"), &[(11, 6.0), (12, 6.0)]);
                (day.date, day)
            })
            .collect();
        let parameters = AnalysisParameters {
            coverage_target: 50.0,
            ..AnalysisParameters::default()
        };

        let recommendation = recommend(&usage, &solar, &parameters).unwrap();

        // The detailed sizing stays at the 90th percentile of daily peak demand
        let detailed = &recommendation.detailed;
        assert_eq!(detailed.percentile, 90.0);
        assert_eq!(detailed.battery_kwh, Energy(41.0));
        assert_eq!(detailed.inverter_kw, Power(4.5));

        // Half of the 24.75 kWh summer peak average
        assert_eq!(recommendation.heuristic.battery_kwh, Energy(13.0));
    }

    #[test]
    fn test_replace_scales_solar() {
        let usage = usage_history([usage_day("2024-03-01", 1.0)]);
        let solar: SolarHistory = [solar_day("2024-03-01", &[(12, 4.0)])]
            .into_iter()
            .map(|day| (day.date, day))
            .collect();
        let mut parameters = AnalysisParameters {
            existing_solar_kw: Power(5.0),
            new_solar_kw: Power(10.0),
            ..AnalysisParameters::default()
        };

        // Adding to the existing system doesn't change the historical replay
        let daily = replay_history(&usage, &solar, &parameters);
        assert_eq!(daily[0].solar_kwh, Energy(4.0));

        parameters.replace_existing_system = true;
        let daily = replay_history(&usage, &solar, &parameters);
        assert_eq!(daily[0].solar_kwh, Energy(8.0));
        assert_eq!(daily[0].export_kwh, Energy(7.0));
    }
}
