//! Code for writing a record of how and where results were produced
use anyhow::{Result, anyhow};
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Build details generated by the build script
mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// The short commit hash the program was built from, marked if the tree had local changes
fn git_commit() -> String {
    match (built_info::GIT_COMMIT_HASH_SHORT, built_info::GIT_DIRTY) {
        (None, _) => "unknown".into(),
        (Some(hash), Some(true)) => format!("{hash}-dirty"),
        (Some(hash), _) => hash.into(),
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    analysis: AnalysisRun<'a>,
    build: BuildDetails,
    host: HostDetails,
}

/// When the analysis was run and which inputs it read
#[derive(Serialize)]
struct AnalysisRun<'a> {
    /// Folder containing the analysis inputs
    analysis_path: &'a Path,
    /// Local time at which results were written
    started: String,
}

/// The program build which produced the results
#[derive(Serialize)]
struct BuildDetails {
    package: &'static str,
    version: &'static str,
    target: &'static str,
    debug_build: bool,
    rustc: &'static str,
    built_at_utc: &'static str,
    commit: String,
}

impl BuildDetails {
    fn current() -> Self {
        Self {
            package: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            debug_build: built_info::DEBUG,
            rustc: built_info::RUSTC_VERSION,
            built_at_utc: built_info::BUILT_TIME_UTC,
            commit: git_commit(),
        }
    }
}

/// Operating system details, as reported by [`PlatformInfo`]
#[derive(Serialize)]
struct HostDetails {
    os: String,
    kernel: String,
    kernel_version: String,
    machine: String,
}

impl HostDetails {
    fn detect() -> Result<Self> {
        let info = PlatformInfo::new().map_err(|err| anyhow!("Cannot read platform info: {err}"))?;
        Ok(Self {
            os: info.osname().to_string_lossy().into(),
            kernel: info.sysname().to_string_lossy().into(),
            kernel_version: info.release().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
        })
    }
}

/// Write `metadata.toml` to `output_path`
pub fn write_metadata(output_path: &Path, analysis_path: &Path) -> Result<()> {
    let metadata = Metadata {
        analysis: AnalysisRun {
            analysis_path,
            started: Local::now().to_rfc3339(),
        },
        build: BuildDetails::current(),
        host: HostDetails::detect()?,
    };
    fs::write(
        output_path.join(METADATA_FILE_NAME),
        toml::to_string(&metadata)?,
    )?;

    Ok(())
}
