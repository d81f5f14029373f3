//! Code for reading provider tariffs from `providers.toml`.
use super::{input_err_msg, read_toml};
use crate::id::collect_unique_by_id;
use crate::tariff::recipe::TariffRegistry;
use crate::tariff::{ProviderMap, ProviderTariff};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const PROVIDERS_FILE_NAME: &str = "providers.toml";

/// The contents of the providers file
#[derive(Debug, Deserialize)]
struct ProvidersFile {
    providers: Vec<ProviderTariff>,
}

/// Read the provider tariffs from the analysis directory.
///
/// Each tariff is validated and its component tags are checked against `registry`.
///
/// # Arguments
///
/// * `analysis_dir` - Folder containing analysis input files
/// * `registry` - The recipes available for billing
///
/// # Returns
///
/// The tariffs, keyed by provider ID, in file order
pub fn read_providers(analysis_dir: &Path, registry: &TariffRegistry) -> Result<ProviderMap> {
    let file_path = analysis_dir.join(PROVIDERS_FILE_NAME);
    let file: ProvidersFile = read_toml(&file_path)?;
    read_providers_from_iter(file.providers, registry).with_context(|| input_err_msg(&file_path))
}

fn read_providers_from_iter<I>(iter: I, registry: &TariffRegistry) -> Result<ProviderMap>
where
    I: IntoIterator<Item = ProviderTariff>,
{
    let providers: ProviderMap = collect_unique_by_id(iter)?;
    ensure!(!providers.is_empty(), "No providers defined");

    for (id, tariff) in &providers {
        ensure!(!id.0.trim().is_empty(), "Provider IDs cannot be empty");
        tariff
            .validate()
            .and_then(|()| registry.check_tariff(tariff))
            .with_context(|| format!("Invalid provider {id}"))?;
    }

    Ok(providers)
}
