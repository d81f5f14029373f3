//! Hours of the day and the time-of-use bands built from them.
//!
//! All simulations run on a fixed 24-step day, one step per hour.
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The number of simulation steps in a day
pub const HOURS_PER_DAY: usize = 24;

/// A value for every hour of a day
pub type Hourly<T> = [T; HOURS_PER_DAY];

/// A set of hours of the day (0 to 23)
#[derive(Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct HourSet([bool; HOURS_PER_DAY]);

impl HourSet {
    /// An empty set of hours
    pub const fn empty() -> Self {
        Self([false; HOURS_PER_DAY])
    }

    /// Build a set from half-open ranges of hours, e.g. `[(7, 10), (16, 22)]`
    pub fn from_ranges(ranges: &[(usize, usize)]) -> Self {
        let mut set = Self::empty();
        for &(start, end) in ranges {
            for hour in start..end.min(HOURS_PER_DAY) {
                set.0[hour] = true;
            }
        }

        set
    }

    /// Whether `hour` is in the set
    pub fn contains(&self, hour: usize) -> bool {
        hour < HOURS_PER_DAY && self.0[hour]
    }

    /// Whether two sets share any hour
    pub fn overlaps(&self, other: &HourSet) -> bool {
        self.0.iter().zip(other.0.iter()).any(|(a, b)| *a && *b)
    }

    /// Iterate over the hours in the set, in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..HOURS_PER_DAY).filter(|&hour| self.0[hour])
    }

    /// The number of hours in the set
    pub fn len(&self) -> usize {
        self.0.iter().filter(|in_set| **in_set).count()
    }

    /// Whether the set contains no hours
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TryFrom<Vec<usize>> for HourSet {
    type Error = String;

    fn try_from(hours: Vec<usize>) -> Result<Self, Self::Error> {
        let mut set = Self::empty();
        for hour in hours {
            if hour >= HOURS_PER_DAY {
                return Err(format!("Invalid hour {hour}: must be between 0 and 23"));
            }
            if set.0[hour] {
                return Err(format!("Hour {hour} is listed more than once"));
            }
            set.0[hour] = true;
        }

        Ok(set)
    }
}

impl From<HourSet> for Vec<usize> {
    fn from(set: HourSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Debug for HourSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// One of the three standard time-of-use periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouPeriod {
    /// The most expensive part of the day
    Peak,
    /// The intermediate-price part of the day
    Shoulder,
    /// Every hour which is neither peak nor shoulder
    OffPeak,
}

/// The peak and shoulder hours of a time-of-use schedule.
///
/// Off-peak is every hour not in either set, so the three periods always partition the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouBands {
    /// Peak hours
    pub peak: HourSet,
    /// Shoulder hours
    pub shoulder: HourSet,
}

impl Default for TouBands {
    /// Peak is 7am to 10am and 4pm to 10pm, shoulder is 10am to 4pm
    fn default() -> Self {
        Self {
            peak: HourSet::from_ranges(&[(7, 10), (16, 22)]),
            shoulder: HourSet::from_ranges(&[(10, 16)]),
        }
    }
}

impl TouBands {
    /// Check that no hour is both peak and shoulder
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.peak.overlaps(&self.shoulder),
            "Peak and shoulder hours overlap"
        );

        Ok(())
    }

    /// The time-of-use period for the given hour
    pub fn classify(&self, hour: usize) -> TouPeriod {
        if self.peak.contains(hour) {
            TouPeriod::Peak
        } else if self.shoulder.contains(hour) {
            TouPeriod::Shoulder
        } else {
            TouPeriod::OffPeak
        }
    }

    /// The number of hours in the given period
    pub fn hours_in(&self, period: TouPeriod) -> usize {
        (0..HOURS_PER_DAY)
            .filter(|&hour| self.classify(hour) == period)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, TouPeriod::OffPeak)]
    #[case(6, TouPeriod::OffPeak)]
    #[case(7, TouPeriod::Peak)]
    #[case(9, TouPeriod::Peak)]
    #[case(10, TouPeriod::Shoulder)]
    #[case(15, TouPeriod::Shoulder)]
    #[case(16, TouPeriod::Peak)]
    #[case(21, TouPeriod::Peak)]
    #[case(22, TouPeriod::OffPeak)]
    #[case(23, TouPeriod::OffPeak)]
    fn test_standard_bands(#[case] hour: usize, #[case] expected: TouPeriod) {
        assert_eq!(TouBands::default().classify(hour), expected);
    }

    #[test]
    fn test_standard_bands_partition_day() {
        let bands = TouBands::default();
        assert_eq!(bands.hours_in(TouPeriod::Peak), 9);
        assert_eq!(bands.hours_in(TouPeriod::Shoulder), 6);
        assert_eq!(bands.hours_in(TouPeriod::OffPeak), 9);
    }

    #[test]
    fn test_hour_set_try_from() {
        let set = HourSet::try_from(vec![3, 1]).unwrap();
        assert!(set.contains(1) && set.contains(3));
        assert_eq!(set.iter().collect::<Vec<_>>(), [1, 3]);

        assert!(HourSet::try_from(vec![24]).is_err());
        assert!(HourSet::try_from(vec![2, 2]).is_err());
    }

    #[test]
    fn test_validate_overlap() {
        let bands = TouBands {
            peak: HourSet::from_ranges(&[(7, 12)]),
            shoulder: HourSet::from_ranges(&[(11, 16)]),
        };
        assert!(bands.validate().is_err());
        assert!(TouBands::default().validate().is_ok());
    }
}
