//! Electricity provider tariffs.
//!
//! A tariff names one import component and one export component (see [`recipe`]) and carries the
//! rate table, time-of-use bands and grid-charging schedule those components and the dispatch
//! simulator read.
use crate::hours::{HOURS_PER_DAY, HourSet, TouBands};
use crate::id::{define_id_getter, define_id_type};
use crate::units::{Energy, Money, MoneyPerEnergy};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::warn;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;

pub mod recipe;

define_id_type! {ProviderID}
define_id_type! {ComponentTag}

/// A map of provider tariffs, keyed by provider ID
pub type ProviderMap = IndexMap<ProviderID, ProviderTariff>;

/// Rate-table entry for the daily export allowance billed at the tier 1 rate
pub const TIER1_LIMIT_KWH: &str = "tier1_limit_kwh";

/// An electricity provider's tariff
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderTariff {
    /// Unique identifier for the provider
    pub id: ProviderID,
    /// Text description of the plan
    #[serde(default)]
    pub description: String,
    /// The recipe used to bill imported energy
    pub import_component: ComponentTag,
    /// The recipe used to credit exported energy
    pub export_component: ComponentTag,
    /// Fixed supply charge per day
    #[serde(default)]
    pub daily_charge: Money,
    /// Fixed fee per month
    #[serde(default)]
    pub monthly_fee: Money,
    /// One-off rebate, credited in the first year
    #[serde(default)]
    pub rebate: Money,
    /// Named rates ($/kWh) and limits (kWh) read by the import and export recipes
    #[serde(default)]
    pub rates: RateTable,
    /// Time-of-use bands used to classify grid import
    #[serde(default)]
    pub tou_bands: TouBands,
    /// Hour-dependent export rates
    #[serde(default)]
    pub export_bands: Vec<ExportBand>,
    /// Scheduled charging of the battery from the grid
    #[serde(default)]
    pub grid_charge: GridCharge,
}
define_id_getter! {ProviderTariff, ProviderID}

impl ProviderTariff {
    /// A tariff with no charges which uses `bands` to classify import.
    ///
    /// Used where only the energy flows matter, not the bill.
    pub fn reference(bands: TouBands) -> Self {
        Self {
            id: "reference".into(),
            description: String::new(),
            import_component: recipe::FLAT_RATE_IMPORT.into(),
            export_component: recipe::FLAT_RATE_FIT.into(),
            daily_charge: Money(0.0),
            monthly_fee: Money(0.0),
            rebate: Money(0.0),
            rates: RateTable::default(),
            tou_bands: bands,
            export_bands: Vec::new(),
            grid_charge: GridCharge::default(),
        }
    }

    /// Check the tariff's internal consistency
    pub fn validate(&self) -> Result<()> {
        self.tou_bands.validate().context("Invalid time-of-use bands")?;
        self.grid_charge.validate().context("Invalid grid charge")?;

        for (i, band) in self.export_bands.iter().enumerate() {
            for other in &self.export_bands[i + 1..] {
                ensure!(
                    !band.hours.overlaps(&other.hours),
                    "Export bands {} and {} overlap",
                    band.name,
                    other.name
                );
            }
        }

        for (name, value) in &self.rates.0 {
            ensure!(
                value.is_finite() && *value >= 0.0,
                "Rate {name} must be a finite, non-negative number"
            );
        }

        Ok(())
    }

    /// The daily export allowance at the tier 1 rate, if the tariff tiers its export
    pub fn export_tier1_limit(&self) -> Option<Energy> {
        self.rates.get(TIER1_LIMIT_KWH).map(Energy)
    }

    /// The time-of-use export rate for the given hour (zero if no band covers it)
    pub fn export_rate_for_hour(&self, hour: usize) -> MoneyPerEnergy {
        self.export_bands
            .iter()
            .find(|band| band.hours.contains(hour))
            .map_or(MoneyPerEnergy(0.0), |band| band.rate)
    }
}

/// Named numeric tariff parameters.
///
/// Lookups of names which are not present give zero, so that a partially configured tariff can
/// still be evaluated. Entries which are not numbers are read as zero.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "IndexMap<String, toml::Value>")]
pub struct RateTable(pub IndexMap<String, f64>);

impl From<IndexMap<String, toml::Value>> for RateTable {
    fn from(entries: IndexMap<String, toml::Value>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(name, value)| {
                    let value = match value {
                        toml::Value::Float(value) => value,
                        toml::Value::Integer(value) => value as f64,
                        other => {
                            warn!("Rate {name} is not a number ({other}); using 0");
                            0.0
                        }
                    };
                    (name, value)
                })
                .collect(),
        )
    }
}

impl RateTable {
    /// Get the raw value for `name`, if present
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Whether there is an entry for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// The rate called `name`, or zero if absent
    pub fn rate(&self, name: &str) -> MoneyPerEnergy {
        MoneyPerEnergy(self.get(name).unwrap_or(0.0))
    }

    /// The energy limit called `name`, or zero if absent
    pub fn energy(&self, name: &str) -> Energy {
        Energy(self.get(name).unwrap_or(0.0))
    }
}

impl<const N: usize> From<[(&str, f64); N]> for RateTable {
    fn from(entries: [(&str, f64); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }
}

/// A set of hours with its own export rate
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportBand {
    /// Name of the band (e.g. "peak")
    pub name: String,
    /// The hours the band covers
    pub hours: HourSet,
    /// Credit per kWh exported during the band
    #[serde(default)]
    pub rate: MoneyPerEnergy,
}

/// How grid charging is triggered
#[derive(Debug, Clone, Copy, PartialEq, Default, DeserializeLabeledStringEnum)]
pub enum GridChargeMode {
    /// Charge during a fixed window of hours
    #[default]
    #[string = "window"]
    Window,
    /// Charge whenever the state of charge is below a threshold
    #[string = "threshold"]
    Threshold,
}

/// Scheduled charging of the battery from the grid
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct GridCharge {
    /// Whether grid charging is used at all
    #[serde(default)]
    pub enabled: bool,
    /// How charging is triggered
    #[serde(default)]
    pub mode: GridChargeMode,
    /// First hour of the charging window
    #[serde(default)]
    pub start_hour: usize,
    /// Hour at which the charging window ends (exclusive)
    #[serde(default)]
    pub end_hour: usize,
    /// State of charge (percent of capacity) below which threshold charging starts
    #[serde(default)]
    pub threshold_pct: f64,
}

impl GridCharge {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.start_hour < HOURS_PER_DAY && self.end_hour <= HOURS_PER_DAY,
            "Grid charge window must lie within the day"
        );
        ensure!(
            (0.0..=100.0).contains(&self.threshold_pct),
            "threshold_pct must be between 0 and 100"
        );

        Ok(())
    }

    /// Whether `hour` lies in the charging window.
    ///
    /// Windows with `start_hour > end_hour` wrap past midnight.
    pub fn in_window(&self, hour: usize) -> bool {
        if self.start_hour <= self.end_hour {
            (self.start_hour..self.end_hour).contains(&hour)
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Whether the battery should be topped up from the grid in this hour
    pub fn is_active(&self, hour: usize, soc: Energy, capacity: Energy) -> bool {
        if !self.enabled {
            return false;
        }

        match self.mode {
            GridChargeMode::Window => self.in_window(hour),
            GridChargeMode::Threshold => {
                soc.value() < capacity.value() * self.threshold_pct / 100.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, tou_provider};
    use rstest::rstest;

    fn window(start_hour: usize, end_hour: usize) -> GridCharge {
        GridCharge {
            enabled: true,
            mode: GridChargeMode::Window,
            start_hour,
            end_hour,
            threshold_pct: 0.0,
        }
    }

    #[rstest]
    #[case(window(11, 14), 10, false)]
    #[case(window(11, 14), 11, true)]
    #[case(window(11, 14), 13, true)]
    #[case(window(11, 14), 14, false)]
    #[case(window(22, 4), 23, true)]
    #[case(window(22, 4), 2, true)]
    #[case(window(22, 4), 4, false)]
    #[case(window(22, 4), 12, false)]
    fn test_in_window(
        #[case] grid_charge: GridCharge,
        #[case] hour: usize,
        #[case] expected: bool,
    ) {
        assert_eq!(grid_charge.in_window(hour), expected);
    }

    #[test]
    fn test_is_active() {
        let mut grid_charge = window(1, 5);
        grid_charge.enabled = false;
        assert!(!grid_charge.is_active(2, Energy(0.0), Energy(10.0)));

        let threshold = GridCharge {
            enabled: true,
            mode: GridChargeMode::Threshold,
            threshold_pct: 30.0,
            ..GridCharge::default()
        };
        assert!(threshold.is_active(15, Energy(2.9), Energy(10.0)));
        assert!(!threshold.is_active(15, Energy(3.0), Energy(10.0)));
    }

    #[test]
    fn test_rate_table_lenient() {
        let rates = RateTable::from([("peak", 0.5)]);
        assert_eq!(rates.rate("peak"), MoneyPerEnergy(0.5));
        assert_eq!(rates.rate("shoulder"), MoneyPerEnergy(0.0));
        assert_eq!(rates.energy("bonus_limit_kwh"), Energy(0.0));
    }

    #[rstest]
    fn test_export_rate_for_hour(tou_provider: ProviderTariff) {
        assert_eq!(tou_provider.export_rate_for_hour(12), MoneyPerEnergy(0.05));
        assert_eq!(tou_provider.export_rate_for_hour(18), MoneyPerEnergy(0.12));
        assert_eq!(tou_provider.export_rate_for_hour(3), MoneyPerEnergy(0.0));
    }

    #[rstest]
    fn test_validate_overlapping_export_bands(mut tou_provider: ProviderTariff) {
        tou_provider.export_bands[1].hours = HourSet::from_ranges(&[(12, 20)]);
        assert_error!(tou_provider.validate(), "Export bands day and evening overlap");
    }

    #[rstest]
    fn test_validate_negative_rate(mut tou_provider: ProviderTariff) {
        tou_provider.rates.0.insert("peak".into(), -0.1);
        assert_error!(
            tou_provider.validate(),
            "Rate peak must be a finite, non-negative number"
        );
    }

    #[test]
    fn test_deserialise_tariff() {
        let tariff: ProviderTariff = toml::from_str(
            r#"
            id = "simple"
            import_component = "FLAT_RATE_IMPORT"
            export_component = "FLAT_RATE_FIT"
            daily_charge = 1.2
            rates = { import = 0.3, feed_in = 0.05 }

            [grid_charge]
            enabled = true
            mode = "threshold"
            threshold_pct = 20
            "#,
        )
        .unwrap();

        assert_eq!(tariff.id, "simple".into());
        assert_eq!(tariff.daily_charge, Money(1.2));
        assert_eq!(tariff.rates.rate("import"), MoneyPerEnergy(0.3));
        assert_eq!(tariff.tou_bands, TouBands::default());
        assert_eq!(tariff.grid_charge.mode, GridChargeMode::Threshold);
        assert_eq!(tariff.export_tier1_limit(), None);
    }

    #[test]
    fn test_deserialise_non_numeric_rate() {
        let tariff: ProviderTariff = toml::from_str(
            r#"
            id = "typo"
            import_component = "FLAT_RATE_IMPORT"
            export_component = "FLAT_RATE_FIT"
            rates = { import = "abc", feed_in = 0.05, tier1_limit_kwh = 10 }
            "#,
        )
        .unwrap();

        assert!(tariff.rates.contains("import"));
        assert_eq!(tariff.rates.rate("import"), MoneyPerEnergy(0.0));
        assert_eq!(tariff.rates.rate("feed_in"), MoneyPerEnergy(0.05));
        assert_eq!(tariff.rates.energy("tier1_limit_kwh"), Energy(10.0));
        tariff.validate().unwrap();
    }
}
