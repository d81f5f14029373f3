//! Seasons of the year and the seasonal aggregation of historical data.
//!
//! The full usage and solar history is reduced to one representative day per season, which is then
//! used as the input for the multi-year projection.
use crate::history::{SolarHistory, UsageHistory};
use crate::hours::{TouBands, TouPeriod};
use crate::units::Energy;
use chrono::Datelike;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};

/// One of the four fixed three-month seasons (southern hemisphere)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display, Serialize,
)]
pub enum Season {
    /// December, January and February
    #[strum(serialize = "Q1_Summer")]
    #[serde(rename = "Q1_Summer")]
    Summer,
    /// March, April and May
    #[strum(serialize = "Q2_Autumn")]
    #[serde(rename = "Q2_Autumn")]
    Autumn,
    /// June, July and August
    #[strum(serialize = "Q3_Winter")]
    #[serde(rename = "Q3_Winter")]
    Winter,
    /// September, October and November
    #[strum(serialize = "Q4_Spring")]
    #[serde(rename = "Q4_Spring")]
    Spring,
}

impl Season {
    /// The season containing the given month (1 = January)
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            12 | 1 | 2 => Some(Self::Summer),
            3..=5 => Some(Self::Autumn),
            6..=8 => Some(Self::Winter),
            9..=11 => Some(Self::Spring),
            _ => None,
        }
    }

    /// The number of days each season is scaled by when building a year
    pub fn days(self) -> u32 {
        match self {
            Self::Summer => 90,
            Self::Autumn => 91,
            Self::Winter | Self::Spring => 92,
        }
    }
}

/// Average daily energy figures for one season
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeasonalProfile {
    /// Average daily consumption during peak hours
    pub avg_peak: Energy,
    /// Average daily consumption during shoulder hours
    pub avg_shoulder: Energy,
    /// Average daily consumption during off-peak hours
    pub avg_off_peak: Energy,
    /// Average daily solar generation
    pub avg_solar: Energy,
    /// The number of observed days the averages were taken over
    pub days: u32,
}

impl SeasonalProfile {
    /// Average daily consumption across all periods
    pub fn avg_consumption(&self) -> Energy {
        self.avg_peak + self.avg_shoulder + self.avg_off_peak
    }
}

/// Representative profiles for the seasons which had at least one observed day
pub type SeasonalProfiles = IndexMap<Season, SeasonalProfile>;

/// Running totals for a season
#[derive(Default)]
struct SeasonTotals {
    peak: Energy,
    shoulder: Energy,
    off_peak: Energy,
    solar: Energy,
    days: u32,
}

impl SeasonTotals {
    fn average(&self) -> Option<SeasonalProfile> {
        if self.days == 0 {
            return None;
        }

        let days = f64::from(self.days);
        let avg = |total: Energy| Energy(total.value() / days);
        Some(SeasonalProfile {
            avg_peak: avg(self.peak),
            avg_shoulder: avg(self.shoulder),
            avg_off_peak: avg(self.off_peak),
            avg_solar: avg(self.solar),
            days: self.days,
        })
    }
}

/// Reduce the usage and solar history to one average day per season.
///
/// Consumption is split into time-of-use periods using `bands`. Solar is looked up by date; a day
/// without solar data contributes no generation but still counts towards the average.
///
/// # Returns
///
/// Profiles for the seasons with at least one observed day, in season order. The map is empty if
/// there is no usage history.
pub fn aggregate(
    usage: &UsageHistory,
    solar: &SolarHistory,
    bands: &TouBands,
) -> SeasonalProfiles {
    let mut totals: IndexMap<Season, SeasonTotals> = Season::iter()
        .map(|season| (season, SeasonTotals::default()))
        .collect();

    let mut days_without_solar = 0;
    for day in usage.values() {
        // Dates are calendar days, so there is no time zone to account for here
        let Some(season) = Season::from_month(day.date.month()) else {
            continue;
        };
        let season_totals = &mut totals[&season];

        for (hour, consumption) in day.consumption.iter().enumerate() {
            match bands.classify(hour) {
                TouPeriod::Peak => season_totals.peak += *consumption,
                TouPeriod::Shoulder => season_totals.shoulder += *consumption,
                TouPeriod::OffPeak => season_totals.off_peak += *consumption,
            }
        }

        match solar.get(&day.date) {
            Some(solar_day) => season_totals.solar += solar_day.total(),
            None => days_without_solar += 1,
        }
        season_totals.days += 1;
    }

    if days_without_solar > 0 {
        warn!("{days_without_solar} usage days have no matching solar data");
    }

    totals
        .into_iter()
        .filter_map(|(season, totals)| {
            let profile = totals.average()?;
            debug!(
                "{season}: {} days, {:.2} kWh consumption, {:.2} kWh solar",
                profile.days,
                profile.avg_consumption(),
                profile.avg_solar
            );
            Some((season, profile))
        })
        .collect()
}
