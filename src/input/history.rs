//! Code for reading historical usage and solar data from CSV files.
use super::{input_err_msg, read_csv};
use crate::history::{DailySolar, DailyUsage, SolarHistory, UsageHistory};
use crate::hours::{HOURS_PER_DAY, Hourly};
use crate::units::Energy;
use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const USAGE_FILE_NAME: &str = "usage.csv";
const SOLAR_FILE_NAME: &str = "solar.csv";

/// A row of the usage CSV file
#[derive(Debug, Deserialize, PartialEq)]
struct UsageRow {
    date: NaiveDate,
    hour: usize,
    consumption: f64,
    #[serde(default)]
    feed_in: f64,
}

/// A row of the solar CSV file
#[derive(Debug, Deserialize, PartialEq)]
struct SolarRow {
    date: NaiveDate,
    hour: usize,
    generation: f64,
}

/// Hourly values for one date, filled in as rows are read
struct PartialDay<const N: usize> {
    values: [Hourly<Energy>; N],
    seen: Hourly<bool>,
}

impl<const N: usize> Default for PartialDay<N> {
    fn default() -> Self {
        Self {
            values: [[Energy(0.0); HOURS_PER_DAY]; N],
            seen: [false; HOURS_PER_DAY],
        }
    }
}

/// Group long-format rows into complete days, keyed by date in ascending order.
///
/// Each row supplies `N` values for one hour of one date. Every date must have each hour exactly
/// once and all values must be finite and non-negative.
fn collect_days<const N: usize, I>(rows: I) -> Result<IndexMap<NaiveDate, [Hourly<Energy>; N]>>
where
    I: IntoIterator<Item = (NaiveDate, usize, [(&'static str, f64); N])>,
{
    let mut days: IndexMap<NaiveDate, PartialDay<N>> = IndexMap::new();
    for (date, hour, values) in rows {
        ensure!(
            hour < HOURS_PER_DAY,
            "Invalid hour {hour} for {date}: must be between 0 and 23"
        );
        let day = days.entry(date).or_default();
        ensure!(!day.seen[hour], "Duplicate entry for {date} hour {hour}");
        day.seen[hour] = true;

        for (i, (name, value)) in values.into_iter().enumerate() {
            ensure!(
                value.is_finite() && value >= 0.0,
                "Invalid {name} for {date} hour {hour}: must be a finite, non-negative number"
            );
            day.values[i][hour] = Energy(value);
        }
    }

    for (date, day) in &days {
        let missing = day.seen.iter().filter(|seen| !**seen).count();
        ensure!(missing == 0, "{date} is missing data for {missing} hours");
    }

    days.sort_keys();
    Ok(days.into_iter().map(|(date, day)| (date, day.values)).collect())
}

/// Read the household's metered usage history.
///
/// # Arguments
///
/// * `analysis_dir` - Folder containing analysis input files
pub fn read_usage_history(analysis_dir: &Path) -> Result<UsageHistory> {
    let file_path = analysis_dir.join(USAGE_FILE_NAME);
    let rows: Vec<UsageRow> = read_csv(&file_path)?;
    let days = collect_days(rows.into_iter().map(|row| {
        (
            row.date,
            row.hour,
            [("consumption", row.consumption), ("feed_in", row.feed_in)],
        )
    }))
    .with_context(|| input_err_msg(&file_path))?;

    Ok(days
        .into_iter()
        .map(|(date, [consumption, feed_in])| {
            (
                date,
                DailyUsage {
                    date,
                    consumption,
                    feed_in,
                },
            )
        })
        .collect())
}

/// Read the solar generation history.
///
/// # Arguments
///
/// * `analysis_dir` - Folder containing analysis input files
pub fn read_solar_history(analysis_dir: &Path) -> Result<SolarHistory> {
    let file_path = analysis_dir.join(SOLAR_FILE_NAME);
    let rows: Vec<SolarRow> = read_csv(&file_path)?;
    let days = collect_days(
        rows.into_iter()
            .map(|row| (row.date, row.hour, [("generation", row.generation)])),
    )
    .with_context(|| input_err_msg(&file_path))?;

    Ok(days
        .into_iter()
        .map(|(date, [hourly])| (date, DailySolar { date, hourly }))
        .collect())
}
