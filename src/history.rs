//! Historical time-series data: metered consumption/export and solar generation per day.
use crate::hours::Hourly;
use crate::units::Energy;
use chrono::NaiveDate;
use indexmap::IndexMap;

/// Metered grid consumption and export for one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyUsage {
    /// The calendar day
    pub date: NaiveDate,
    /// Energy imported from the grid in each hour
    pub consumption: Hourly<Energy>,
    /// Energy exported to the grid in each hour
    pub feed_in: Hourly<Energy>,
}

impl DailyUsage {
    /// Total consumption over the day
    pub fn total_consumption(&self) -> Energy {
        self.consumption.iter().copied().sum()
    }

    /// Total export over the day
    pub fn total_feed_in(&self) -> Energy {
        self.feed_in.iter().copied().sum()
    }
}

/// Solar generation for one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DailySolar {
    /// The calendar day
    pub date: NaiveDate,
    /// Energy generated in each hour
    pub hourly: Hourly<Energy>,
}

impl DailySolar {
    /// Total generation over the day
    pub fn total(&self) -> Energy {
        self.hourly.iter().copied().sum()
    }

    /// A copy of this day with every hour multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Hourly<Energy> {
        self.hourly.map(|energy| Energy(energy.value() * factor))
    }
}

/// Usage history keyed by date, in ascending date order
pub type UsageHistory = IndexMap<NaiveDate, DailyUsage>;

/// Solar history keyed by date, in ascending date order
pub type SolarHistory = IndexMap<NaiveDate, DailySolar>;

/// Iterate over the usage days which have solar data for the same date
pub fn iter_overlapping_days<'a>(
    usage: &'a UsageHistory,
    solar: &'a SolarHistory,
) -> impl Iterator<Item = (&'a DailyUsage, &'a DailySolar)> {
    usage
        .values()
        .filter_map(|day| solar.get(&day.date).map(|solar_day| (day, solar_day)))
}
