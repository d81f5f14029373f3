//! Fixed shape functions for turning a seasonal daily average back into an hourly profile.
use crate::hours::{Hourly, TouBands, TouPeriod};
use crate::season::SeasonalProfile;
use crate::units::Energy;
use std::f64::consts::PI;

/// The first hour with any solar generation
const SUNRISE_HOUR: usize = 6;

/// The last hour with any solar generation
const SUNSET_HOUR: usize = 18;

/// Spread each period's average consumption evenly over that period's hours
pub fn consumption_profile(profile: &SeasonalProfile, bands: &TouBands) -> Hourly<Energy> {
    let per_hour = |total: Energy, period| {
        let hours = bands.hours_in(period);
        if hours == 0 {
            Energy(0.0)
        } else {
            Energy(total.value() / hours as f64)
        }
    };
    let peak = per_hour(profile.avg_peak, TouPeriod::Peak);
    let shoulder = per_hour(profile.avg_shoulder, TouPeriod::Shoulder);
    let off_peak = per_hour(profile.avg_off_peak, TouPeriod::OffPeak);

    std::array::from_fn(|hour| match bands.classify(hour) {
        TouPeriod::Peak => peak,
        TouPeriod::Shoulder => shoulder,
        TouPeriod::OffPeak => off_peak,
    })
}

/// The fraction of a day's solar generation produced in each hour.
///
/// A half-sine over daylight hours, normalised to sum to one.
pub fn solar_shape() -> Hourly<f64> {
    let daylight = (SUNSET_HOUR - SUNRISE_HOUR + 1) as f64;
    let mut shape: Hourly<f64> = std::array::from_fn(|hour| {
        if (SUNRISE_HOUR..=SUNSET_HOUR).contains(&hour) {
            let position = (hour - SUNRISE_HOUR) as f64 + 0.5;
            (PI * position / daylight).sin()
        } else {
            0.0
        }
    });

    let total: f64 = shape.iter().sum();
    for value in &mut shape {
        *value /= total;
    }

    shape
}

/// Distribute the season's average daily solar generation over the day
pub fn solar_profile(profile: &SeasonalProfile) -> Hourly<Energy> {
    let shape = solar_shape();
    std::array::from_fn(|hour| Energy(profile.avg_solar.value() * shape[hour]))
}

/// Sum an hourly profile
pub fn daily_total(profile: &Hourly<Energy>) -> Energy {
    profile.iter().copied().sum()
}
