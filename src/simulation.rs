//! Functionality for running an analysis end to end.
use crate::analysis::Analysis;
use crate::output::DataWriter;
use crate::output::metadata::write_metadata;
use crate::projection::{ProviderProjection, project};
use crate::season::aggregate;
use crate::sizing::recommend;
use crate::units::Money;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

/// Run the analysis and write the results.
///
/// # Arguments:
///
/// * `analysis` - The loaded inputs
/// * `analysis_path` - The folder the inputs were read from
/// * `output_path` - The folder to write results to
/// * `debug_output` - Whether to also write the per-day replay of the history
pub fn run(
    analysis: &Analysis,
    analysis_path: &Path,
    output_path: &Path,
    debug_output: bool,
) -> Result<()> {
    let parameters = &analysis.parameters;
    let mut writer = DataWriter::create(output_path, debug_output)?;

    let profiles = aggregate(&analysis.usage, &analysis.solar, &parameters.bands);
    for (season, profile) in &profiles {
        info!(
            "{season}: {} days, {:.2} kWh/day consumption, {:.2} kWh/day solar",
            profile.days,
            profile.avg_consumption().value(),
            profile.avg_solar.value()
        );
    }
    writer.write_profiles(&profiles)?;

    let providers = analysis.selected_providers();
    let projection = project(parameters, &profiles, &providers, &analysis.registry)
        .context("Failed to project costs")?;
    for provider in projection.values() {
        log_provider_summary(provider, parameters.upfront_outlay());
    }
    writer.write_projection(&projection)?;

    match recommend(&analysis.usage, &analysis.solar, parameters) {
        Ok(sizing) => {
            info!(
                "Recommended battery: {:.1} kWh with a {:.1} kW inverter \
                 ({}th percentile of {} days)",
                sizing.detailed.battery_kwh.value(),
                sizing.detailed.inverter_kw.value(),
                sizing.detailed.percentile,
                sizing.detailed.days
            );
            info!(
                "A {} h blackout needs {:.1} kWh of storage",
                sizing.blackout.duration_hours,
                sizing.blackout.recommended_kwh.value()
            );
            writer.write_sizing(&sizing)?;
        }
        // Costs can still be projected from the seasonal profiles
        Err(err) => warn!("No system size recommended: {err}"),
    }

    writer.flush()?;
    write_metadata(output_path, analysis_path).context("Failed to save metadata")?;

    Ok(())
}

/// Log a one-line summary of a provider's projection
fn log_provider_summary(provider: &ProviderProjection, outlay: Money) {
    let Some(last) = provider.years.last() else {
        return;
    };

    match provider.payback_year {
        Some(year) => info!(
            "{}: ${:.2} saved over {} years, paying back ${:.2} in year {year}",
            provider.provider_id,
            last.cumulative_savings.value(),
            last.year,
            outlay.value()
        ),
        None if outlay > Money(0.0) => warn!(
            "{}: ${:.2} saved over {} years, which doesn't pay back ${:.2}",
            provider.provider_id,
            last.cumulative_savings.value(),
            last.year,
            outlay.value()
        ),
        None => info!(
            "{}: ${:.2} saved over {} years",
            provider.provider_id,
            last.cumulative_savings.value(),
            last.year
        ),
    }
}
