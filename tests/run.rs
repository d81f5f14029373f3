//! Integration tests for the `run` command.
use solar_roi::cli::{RunOpts, handle_run_command};
use solar_roi::settings::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the example analysis.
fn get_analysis_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("SOLAR_ROI_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    {
        // Save results to a non-existent directory to check that it is created
        let output_dir = tempdir.path().join("results");
        let opts = RunOpts {
            output_dir: Some(output_dir.clone()),
            overwrite: false,
            debug_output: true,
        };
        handle_run_command(&get_analysis_dir(), &opts, Some(Settings::default())).unwrap();

        for file_name in [
            "seasonal_profiles.csv",
            "yearly_costs.csv",
            "seasonal_breakdown.csv",
            "sizing.toml",
            "debug_daily_breakdown.csv",
            "metadata.toml",
            "solar_roi_info.log",
            "solar_roi_error.log",
        ] {
            assert!(output_dir.join(file_name).is_file(), "{file_name} missing");
        }

        // A row per provider per year, plus the header
        let yearly_costs = fs::read_to_string(output_dir.join("yearly_costs.csv")).unwrap();
        assert_eq!(yearly_costs.lines().count(), 3 * 10 + 1);
    }

    // Second time will fail because the logging is already initialised
    let opts = RunOpts {
        output_dir: Some(tempdir.path().join("again")),
        ..RunOpts::default()
    };
    assert_eq!(
        handle_run_command(&get_analysis_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        "Failed to initialise logging."
    );
}
