//! Fixtures for tests

use crate::dispatch::DailyEnergyBreakdown;
use crate::history::{DailySolar, DailyUsage};
use crate::hours::{HOURS_PER_DAY, HourSet, TouBands};
use crate::season::{Season, SeasonalProfile, SeasonalProfiles};
use crate::tariff::recipe::{
    FLAT_RATE_FIT, FLAT_RATE_IMPORT, GLOBIRD_COMPLEX_FIT, TIME_OF_USE_IMPORT,
};
use crate::tariff::{ExportBand, GridCharge, ProviderTariff, RateTable};
use crate::units::{Energy, Money, MoneyPerEnergy};
use chrono::NaiveDate;
use float_cmp::approx_eq;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Assert that two energies are equal to within floating-point error
pub fn assert_energy_close(actual: Energy, expected: Energy) {
    assert!(
        approx_eq!(Energy, actual, expected, epsilon = 1e-9),
        "{actual:?} != {expected:?}"
    );
}

/// Assert that two amounts of money are equal to within floating-point error
pub fn assert_money_close(actual: Money, expected: Money) {
    assert!(
        approx_eq!(Money, actual, expected, epsilon = 1e-9),
        "{actual:?} != {expected:?}"
    );
}

fn date(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
}

/// A day of usage with the same consumption in every hour and no export
pub fn usage_day(day: &str, per_hour: f64) -> DailyUsage {
    DailyUsage {
        date: date(day),
        consumption: [Energy(per_hour); HOURS_PER_DAY],
        feed_in: [Energy(0.0); HOURS_PER_DAY],
    }
}

/// A day of solar generation which is zero outside the given hours
pub fn solar_day(day: &str, generation: &[(usize, f64)]) -> DailySolar {
    let mut hourly = [Energy(0.0); HOURS_PER_DAY];
    for &(hour, value) in generation {
        hourly[hour] = Energy(value);
    }

    DailySolar {
        date: date(day),
        hourly,
    }
}

/// A breakdown with only the given import totals set
pub fn breakdown(peak: f64, shoulder: f64, off_peak: f64) -> DailyEnergyBreakdown {
    DailyEnergyBreakdown {
        peak_kwh: Energy(peak),
        shoulder_kwh: Energy(shoulder),
        off_peak_kwh: Energy(off_peak),
        ..DailyEnergyBreakdown::default()
    }
}

#[fixture]
pub fn flat_provider() -> ProviderTariff {
    ProviderTariff {
        id: "flat".into(),
        description: "Flat rate".into(),
        import_component: FLAT_RATE_IMPORT.into(),
        export_component: FLAT_RATE_FIT.into(),
        daily_charge: Money(1.0),
        monthly_fee: Money(0.0),
        rebate: Money(0.0),
        rates: RateTable::from([("import", 0.30), ("feed_in", 0.05)]),
        tou_bands: TouBands::default(),
        export_bands: Vec::new(),
        grid_charge: GridCharge::default(),
    }
}

#[fixture]
pub fn tou_provider() -> ProviderTariff {
    ProviderTariff {
        id: "tou".into(),
        description: "Time of use".into(),
        import_component: TIME_OF_USE_IMPORT.into(),
        export_component: FLAT_RATE_FIT.into(),
        daily_charge: Money(1.0),
        monthly_fee: Money(0.0),
        rebate: Money(0.0),
        rates: RateTable::from([
            ("peak", 0.5),
            ("shoulder", 0.3),
            ("off_peak", 0.2),
            ("feed_in", 0.05),
        ]),
        tou_bands: TouBands::default(),
        export_bands: vec![
            ExportBand {
                name: "day".into(),
                hours: HourSet::from_ranges(&[(10, 16)]),
                rate: MoneyPerEnergy(0.05),
            },
            ExportBand {
                name: "evening".into(),
                hours: HourSet::from_ranges(&[(16, 21)]),
                rate: MoneyPerEnergy(0.12),
            },
        ],
        grid_charge: GridCharge::default(),
    }
}

#[fixture]
pub fn globird_provider(tou_provider: ProviderTariff) -> ProviderTariff {
    let mut tariff = ProviderTariff {
        id: "globird".into(),
        export_component: GLOBIRD_COMPLEX_FIT.into(),
        ..tou_provider
    };
    tariff.rates.0.insert("bonus".into(), 0.10);
    tariff.rates.0.insert("bonus_limit_kwh".into(), 10.0);
    tariff
}

/// Profiles for all four seasons with enough evening load for a battery to be worthwhile
#[fixture]
pub fn seasonal_profiles() -> SeasonalProfiles {
    [
        (Season::Summer, 25.0),
        (Season::Autumn, 15.0),
        (Season::Winter, 12.0),
        (Season::Spring, 20.0),
    ]
    .into_iter()
    .map(|(season, solar)| {
        let profile = SeasonalProfile {
            avg_peak: Energy(12.0),
            avg_shoulder: Energy(6.0),
            avg_off_peak: Energy(8.0),
            avg_solar: Energy(solar),
            days: 30,
        };
        (season, profile)
    })
    .collect()
}
