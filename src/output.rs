//! The module responsible for writing output data to disk.
use crate::projection::{Projection, SeasonBreakdown};
use crate::season::SeasonalProfiles;
use crate::sizing::{DayDemand, SizingRecommendation};
use crate::tariff::ProviderID;
use crate::units::{Energy, Money};
use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which analysis-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "solar_roi_results";

/// The output file name for seasonal profiles
const SEASONAL_PROFILES_FILE_NAME: &str = "seasonal_profiles.csv";

/// The output file name for yearly costs
const YEARLY_COSTS_FILE_NAME: &str = "yearly_costs.csv";

/// The output file name for the first year's per-season breakdown
const SEASONAL_BREAKDOWN_FILE_NAME: &str = "seasonal_breakdown.csv";

/// The output file name for sizing recommendations
const SIZING_FILE_NAME: &str = "sizing.toml";

/// The output file name for the per-day replay
const DAILY_BREAKDOWN_FILE_NAME: &str = "debug_daily_breakdown.csv";

/// Get the default output directory for the analysis in the specified directory
pub fn get_output_dir(analysis_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let analysis_dir = analysis_dir
        .canonicalize()
        .context("Could not resolve path to analysis")?;

    let analysis_name = analysis_dir
        .file_name()
        .context("Analysis cannot be in root folder")?
        .to_str()
        .context("Invalid chars in analysis dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, analysis_name].iter().collect())
}

/// Create a new output directory, optionally replacing one which already has files in it.
///
/// # Returns
///
/// Whether an existing non-empty directory was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if output_dir.is_dir() {
        if output_dir.read_dir()?.next().is_none() {
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please use the --overwrite option or \
            choose a different folder."
        );
        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the seasonal profiles CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SeasonalProfileRow {
    season: String,
    days: u32,
    avg_peak: Energy,
    avg_shoulder: Energy,
    avg_off_peak: Energy,
    avg_solar: Energy,
}

/// Represents a row in the yearly costs CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct YearlyCostRow {
    provider_id: ProviderID,
    year: u32,
    import_cost: Money,
    export_credit: Money,
    supply_charge: Money,
    rebate: Money,
    loan_repayment: Money,
    net_cost: Money,
    baseline_net_cost: Money,
    savings: Money,
    cumulative_savings: Money,
    opportunity_cost: Option<Money>,
}

/// Represents a row in the seasonal breakdown CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SeasonBreakdownRow {
    provider_id: ProviderID,
    season: String,
    days: u32,
    peak_kwh: Energy,
    shoulder_kwh: Energy,
    off_peak_kwh: Energy,
    tier1_export_kwh: Energy,
    tier2_export_kwh: Energy,
    grid_charge_kwh: Energy,
    self_consumed_kwh: Energy,
    battery_discharge_kwh: Energy,
    daily_cost: Money,
    daily_credit: Money,
}

impl SeasonBreakdownRow {
    fn new(provider_id: &ProviderID, season: &SeasonBreakdown) -> Self {
        let breakdown = &season.breakdown;
        Self {
            provider_id: provider_id.clone(),
            season: season.season.to_string(),
            days: season.days,
            peak_kwh: breakdown.peak_kwh,
            shoulder_kwh: breakdown.shoulder_kwh,
            off_peak_kwh: breakdown.off_peak_kwh,
            tier1_export_kwh: breakdown.tier1_export_kwh,
            tier2_export_kwh: breakdown.tier2_export_kwh,
            grid_charge_kwh: breakdown.grid_charge_kwh,
            self_consumed_kwh: breakdown.self_consumed_kwh,
            battery_discharge_kwh: breakdown.battery_discharge_kwh,
            daily_cost: season.bill.cost,
            daily_credit: season.bill.credit,
        }
    }
}

/// Represents a row in the debug daily breakdown CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DailyBreakdownRow {
    date: NaiveDate,
    consumption_kwh: Energy,
    solar_kwh: Energy,
    peak_kwh: Energy,
    max_hourly_kwh: Energy,
    export_kwh: Energy,
}

impl From<&DayDemand> for DailyBreakdownRow {
    fn from(day: &DayDemand) -> Self {
        Self {
            date: day.date,
            consumption_kwh: day.consumption_kwh,
            solar_kwh: day.solar_kwh,
            peak_kwh: day.peak_kwh,
            max_hourly_kwh: day.max_hourly_kwh,
            export_kwh: day.export_kwh,
        }
    }
}

/// An object for writing analysis results to file
pub struct DataWriter {
    output_path: PathBuf,
    profiles_writer: csv::Writer<File>,
    yearly_costs_writer: csv::Writer<File>,
    seasonal_breakdown_writer: csv::Writer<File>,
    debug_writer: Option<csv::Writer<File>>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_debug_info` - Whether to include the per-day replay
    pub fn create(output_path: &Path, save_debug_info: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let debug_writer = if save_debug_info {
            Some(new_writer(DAILY_BREAKDOWN_FILE_NAME)?)
        } else {
            None
        };

        Ok(Self {
            output_path: output_path.to_path_buf(),
            profiles_writer: new_writer(SEASONAL_PROFILES_FILE_NAME)?,
            yearly_costs_writer: new_writer(YEARLY_COSTS_FILE_NAME)?,
            seasonal_breakdown_writer: new_writer(SEASONAL_BREAKDOWN_FILE_NAME)?,
            debug_writer,
        })
    }

    /// Write seasonal profiles to a CSV file
    pub fn write_profiles(&mut self, profiles: &SeasonalProfiles) -> Result<()> {
        for (season, profile) in profiles {
            let row = SeasonalProfileRow {
                season: season.to_string(),
                days: profile.days,
                avg_peak: profile.avg_peak,
                avg_shoulder: profile.avg_shoulder,
                avg_off_peak: profile.avg_off_peak,
                avg_solar: profile.avg_solar,
            };
            self.profiles_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write every provider's yearly costs and first-year seasonal breakdown to CSV files
    pub fn write_projection(&mut self, projection: &Projection) -> Result<()> {
        for (provider_id, provider) in projection {
            for year in &provider.years {
                let row = YearlyCostRow {
                    provider_id: provider_id.clone(),
                    year: year.year,
                    import_cost: year.import_cost,
                    export_credit: year.export_credit,
                    supply_charge: year.supply_charge,
                    rebate: year.rebate,
                    loan_repayment: year.loan_repayment,
                    net_cost: year.net_cost,
                    baseline_net_cost: year.baseline_net_cost,
                    savings: year.savings,
                    cumulative_savings: year.cumulative_savings,
                    opportunity_cost: year.opportunity_cost,
                };
                self.yearly_costs_writer.serialize(row)?;
            }

            for season in &provider.first_year_seasons {
                self.seasonal_breakdown_writer
                    .serialize(SeasonBreakdownRow::new(provider_id, season))?;
            }
        }

        Ok(())
    }

    /// Write sizing recommendations to a TOML file, and the per-day replay if debugging
    pub fn write_sizing(&mut self, sizing: &SizingRecommendation) -> Result<()> {
        let file_path = self.output_path.join(SIZING_FILE_NAME);
        fs::write(&file_path, toml::to_string(sizing)?)
            .with_context(|| format!("Failed to write {}", file_path.display()))?;

        if let Some(wtr) = &mut self.debug_writer {
            for day in &sizing.detailed.daily {
                wtr.serialize(DailyBreakdownRow::from(day))?;
            }
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.profiles_writer.flush()?;
        self.yearly_costs_writer.flush()?;
        self.seasonal_breakdown_writer.flush()?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisParameters;
    use crate::fixture::{flat_provider, seasonal_profiles, solar_day, usage_day};
    use crate::history::{SolarHistory, UsageHistory};
    use crate::projection::project;
    use crate::season::Season;
    use crate::sizing::recommend;
    use crate::tariff::ProviderTariff;
    use crate::tariff::recipe::TariffRegistry;
    use itertools::Itertools;
    use rstest::rstest;
    use strum::IntoEnumIterator;
    use tempfile::tempdir;

    fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
        csv::Reader::from_path(path)
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap()
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");

        // New directory
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // Existing empty directory
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // Existing directory with files
        fs::write(output_dir.join("file.txt"), "contents").unwrap();
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(!output_dir.join("file.txt").exists());
    }

    #[rstest]
    fn test_write_profiles(seasonal_profiles: SeasonalProfiles) {
        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path(), false).unwrap();
            writer.write_profiles(&seasonal_profiles).unwrap();
            writer.flush().unwrap();
        }

        let rows: Vec<SeasonalProfileRow> =
            read_rows(&dir.path().join(SEASONAL_PROFILES_FILE_NAME));
        assert_eq!(
            rows.iter().map(|row| row.season.clone()).collect_vec(),
            Season::iter().map(|season| season.to_string()).collect_vec()
        );
        let summer = &seasonal_profiles[&Season::Summer];
        assert_eq!(rows[0].avg_solar, summer.avg_solar);
        assert!(!dir.path().join(DAILY_BREAKDOWN_FILE_NAME).exists());
    }

    #[rstest]
    fn test_write_projection(seasonal_profiles: SeasonalProfiles, flat_provider: ProviderTariff) {
        let parameters = AnalysisParameters {
            num_years: 3,
            discount_rate_pct: Some(4.0),
            ..AnalysisParameters::default()
        };
        let projection = project(
            &parameters,
            &seasonal_profiles,
            &[&flat_provider],
            &TariffRegistry::default(),
        )
        .unwrap();

        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path(), false).unwrap();
            writer.write_projection(&projection).unwrap();
            writer.flush().unwrap();
        }

        let rows: Vec<YearlyCostRow> = read_rows(&dir.path().join(YEARLY_COSTS_FILE_NAME));
        assert_eq!(rows.len(), 3);
        let expected = &projection[&flat_provider.id].years;
        for (row, year) in rows.iter().zip(expected) {
            assert_eq!(row.provider_id, flat_provider.id);
            assert_eq!(row.year, year.year);
            assert_eq!(row.net_cost, year.net_cost);
            assert_eq!(row.opportunity_cost, year.opportunity_cost);
        }

        let rows: Vec<SeasonBreakdownRow> =
            read_rows(&dir.path().join(SEASONAL_BREAKDOWN_FILE_NAME));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].season, "Q3_Winter");
        assert_eq!(rows[2].days, 92);
    }

    #[test]
    fn test_write_sizing_with_debug() {
        let usage: UsageHistory = [usage_day("2024-05-01", 1.0), usage_day("2024-05-02", 2.0)]
            .into_iter()
            .map(|day| (day.date, day))
            .collect();
        let solar: SolarHistory = [
            solar_day("2024-05-01", &[(12, 3.0)]),
            solar_day("2024-05-02", &[(12, 3.0)]),
        ]
        .into_iter()
        .map(|day| (day.date, day))
        .collect();
        let sizing = recommend(&usage, &solar, &AnalysisParameters::default()).unwrap();

        let dir = tempdir().unwrap();
        {
            let mut writer = DataWriter::create(dir.path(), true).unwrap();
            writer.write_sizing(&sizing).unwrap();
            writer.flush().unwrap();
        }

        let contents = fs::read_to_string(dir.path().join(SIZING_FILE_NAME)).unwrap();
        let table: toml::Table = toml::from_str(&contents).unwrap();
        assert!(table.contains_key("heuristic"));
        assert!(table.contains_key("detailed"));
        assert!(table.contains_key("blackout"));

        let rows: Vec<DailyBreakdownRow> = read_rows(&dir.path().join(DAILY_BREAKDOWN_FILE_NAME));
        assert_eq!(
            rows,
            sizing
                .detailed
                .daily
                .iter()
                .map(DailyBreakdownRow::from)
                .collect_vec()
        );
    }
}
