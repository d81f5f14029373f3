//! Compare electricity providers for a household and estimate the return on a solar and battery
//! system.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod analysis;
pub mod battery;
pub mod cli;
pub mod dispatch;
pub mod finance;
pub mod history;
pub mod hours;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod projection;
pub mod season;
pub mod settings;
pub mod shape;
pub mod simulation;
pub mod sizing;
pub mod tariff;
pub mod units;

#[cfg(test)]
mod fixture;

/// The folder holding the program's settings file.
///
/// Falls back to the current directory on platforms without a standard config location.
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_default()
        .join(env!("CARGO_PKG_NAME"))
}
