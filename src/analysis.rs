//! Code for loading an analysis: the household's history, the provider tariffs to compare and the
//! parameters of the proposed system.
use crate::history::{SolarHistory, UsageHistory};
use crate::id::IDCollection;
use crate::input::{read_providers, read_solar_history, read_usage_history};
use crate::tariff::recipe::TariffRegistry;
use crate::tariff::{ProviderMap, ProviderTariff};
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

pub mod parameters;
pub use parameters::AnalysisParameters;

/// Inputs which are missing or don't overlap, so that there is nothing to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsufficientData {
    /// There is no usage history
    NoUsageHistory,
    /// There is no solar history
    NoSolarHistory,
    /// No usage day has solar data for the same date
    NoOverlappingDays,
    /// No providers have been selected for comparison
    NoProvidersSelected,
    /// Aggregation produced no seasonal profiles
    NoSeasonalProfiles,
}

impl fmt::Display for InsufficientData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let message = match self {
            Self::NoUsageHistory => "No usage history was provided",
            Self::NoSolarHistory => "No solar history was provided",
            Self::NoOverlappingDays => "No usage days have matching solar data",
            Self::NoProvidersSelected => "No providers are selected for comparison",
            Self::NoSeasonalProfiles => "No seasonal profiles could be built from usage history",
        };
        write!(f, "{message}")
    }
}

impl std::error::Error for InsufficientData {}

/// All the inputs for one analysis
pub struct Analysis {
    /// Parameters from `analysis.toml`
    pub parameters: AnalysisParameters,
    /// Metered usage, keyed by date
    pub usage: UsageHistory,
    /// Solar generation, keyed by date
    pub solar: SolarHistory,
    /// Every provider tariff defined for the analysis
    pub providers: ProviderMap,
    /// The recipes used to bill the tariffs
    pub registry: TariffRegistry,
}

impl Analysis {
    /// Read an analysis from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `analysis_dir` - Folder containing analysis input files
    pub fn from_path<P: AsRef<Path>>(analysis_dir: P) -> Result<Self> {
        let analysis_dir = analysis_dir.as_ref();
        let registry = TariffRegistry::default();

        let parameters = AnalysisParameters::from_path(analysis_dir)?;
        let usage = read_usage_history(analysis_dir)?;
        let solar = read_solar_history(analysis_dir)?;
        let providers = read_providers(analysis_dir, &registry)?;

        for id in &parameters.selected_providers {
            providers
                .get_id_by_str(&id.0)
                .context("Invalid value for selected_providers")?;
        }

        Ok(Self {
            parameters,
            usage,
            solar,
            providers,
            registry,
        })
    }

    /// The providers to compare, in the order they were selected.
    ///
    /// If none were selected explicitly, every provider is used.
    pub fn selected_providers(&self) -> Vec<&ProviderTariff> {
        if self.parameters.selected_providers.is_empty() {
            return self.providers.values().collect();
        }

        self.parameters
            .selected_providers
            .iter()
            .filter_map(|id| self.providers.get(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{flat_provider, tou_provider};
    use crate::id::collect_unique_by_id;
    use rstest::rstest;

    fn analysis(providers: ProviderMap, selected: &[&str]) -> Analysis {
        Analysis {
            parameters: AnalysisParameters {
                selected_providers: selected.iter().map(|id| (*id).into()).collect(),
                ..AnalysisParameters::default()
            },
            usage: UsageHistory::new(),
            solar: SolarHistory::new(),
            providers,
            registry: TariffRegistry::default(),
        }
    }

    #[rstest]
    fn test_selected_providers(flat_provider: ProviderTariff, tou_provider: ProviderTariff) {
        let providers = collect_unique_by_id([flat_provider, tou_provider]).unwrap();

        let all = analysis(providers.clone(), &[]);
        let ids: Vec<_> = all.selected_providers().iter().map(|p| p.id.to_string()).collect();
        assert_eq!(ids, ["flat", "tou"]);

        let reversed = analysis(providers, &["tou", "flat"]);
        let ids: Vec<_> = reversed
            .selected_providers()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, ["tou", "flat"]);
    }

    #[test]
    fn test_insufficient_data_is_error() {
        let error = anyhow::Error::from(InsufficientData::NoOverlappingDays);
        assert_eq!(
            error.downcast_ref::<InsufficientData>(),
            Some(&InsufficientData::NoOverlappingDays)
        );
        assert_eq!(error.to_string(), "No usage days have matching solar data");
    }
}
