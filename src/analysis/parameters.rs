//! Defines the `AnalysisParameters` struct, which represents the contents of `analysis.toml`.
use crate::battery::BatteryConfig;
use crate::hours::TouBands;
use crate::input::{input_err_msg, read_toml};
use crate::tariff::ProviderID;
use crate::units::{Dimensionless, Money, Power};
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use std::path::Path;

const ANALYSIS_PARAMETERS_FILE_NAME: &str = "analysis.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_num_years, u32, 10);
define_param_default!(default_solar_degradation_pct, f64, 0.5);
define_param_default!(default_battery_degradation_pct, f64, 2.0);
define_param_default!(default_coverage_target, f64, 90.0);
define_param_default!(default_blackout_coverage_pct, f64, 100.0);

/// Represents the contents of the entire analysis file.
///
/// Percentages are given in percent, e.g. `3.0` is 3%.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AnalysisParameters {
    /// The providers to compare. If empty, all providers are used in file order.
    #[serde(default)]
    pub selected_providers: Vec<ProviderID>,
    /// Number of years to project costs over
    #[serde(default = "default_num_years")]
    pub num_years: u32,
    /// Yearly increase in import rates and supply charges
    #[serde(default)]
    pub tariff_escalation_pct: f64,
    /// Yearly decline in solar output
    #[serde(default = "default_solar_degradation_pct")]
    pub solar_degradation_pct: f64,
    /// Yearly decline in usable battery capacity
    #[serde(default = "default_battery_degradation_pct")]
    pub battery_degradation_pct: f64,
    /// Yearly decline in feed-in rates
    #[serde(default)]
    pub feed_in_degradation_pct: f64,
    /// Amount borrowed to pay for the system
    #[serde(default)]
    pub loan_amount: Money,
    /// Yearly interest rate on the loan
    #[serde(default)]
    pub loan_interest_rate_pct: f64,
    /// Length of the loan
    #[serde(default)]
    pub loan_term_years: u32,
    /// Rate of return on the alternative use of the up-front outlay.
    ///
    /// If absent, no opportunity cost is calculated.
    #[serde(default)]
    pub discount_rate_pct: Option<f64>,
    /// Up-front price of the proposed system
    #[serde(default)]
    pub system_cost: Money,
    /// The percentage of days that recommended sizes should cover
    #[serde(default = "default_coverage_target")]
    pub coverage_target: f64,
    /// Length of blackout the battery should be able to ride through
    #[serde(default)]
    pub blackout_duration_hours: usize,
    /// The percentage of load to keep supplied during a blackout
    #[serde(default = "default_blackout_coverage_pct")]
    pub blackout_coverage_pct: f64,
    /// The proposed battery
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Size of the solar system which produced the historical generation data
    #[serde(default)]
    pub existing_solar_kw: Power,
    /// Size of the proposed solar system
    #[serde(default)]
    pub new_solar_kw: Power,
    /// Whether the new solar system replaces the existing one (otherwise it is added to it)
    #[serde(default)]
    pub replace_existing_system: bool,
    /// Time-of-use bands used to split historical consumption into periods
    #[serde(default)]
    pub bands: TouBands,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            selected_providers: Vec::new(),
            num_years: default_num_years(),
            tariff_escalation_pct: 0.0,
            solar_degradation_pct: default_solar_degradation_pct(),
            battery_degradation_pct: default_battery_degradation_pct(),
            feed_in_degradation_pct: 0.0,
            loan_amount: Money(0.0),
            loan_interest_rate_pct: 0.0,
            loan_term_years: 0,
            discount_rate_pct: None,
            system_cost: Money(0.0),
            coverage_target: default_coverage_target(),
            blackout_duration_hours: 0,
            blackout_coverage_pct: default_blackout_coverage_pct(),
            battery: BatteryConfig::default(),
            existing_solar_kw: Power(0.0),
            new_solar_kw: Power(0.0),
            replace_existing_system: false,
            bands: TouBands::default(),
        }
    }
}

/// Check that a percentage lies in `[0, 100]`
fn check_percentage(name: &str, value: f64) -> Result<()> {
    ensure!(
        (0.0..=100.0).contains(&value),
        "{name} must be between 0 and 100"
    );

    Ok(())
}

/// Check that the `coverage_target` parameter is valid
fn check_coverage_target(value: f64) -> Result<()> {
    ensure!(
        value > 0.0 && value <= 100.0,
        "coverage_target must be greater than 0 and at most 100"
    );

    Ok(())
}

/// Check that the `num_years` parameter is valid
fn check_num_years(value: u32) -> Result<()> {
    ensure!(value > 0, "num_years cannot be zero");

    Ok(())
}

/// Check that a money amount is finite and non-negative
fn check_money(name: &str, value: Money) -> Result<()> {
    ensure!(
        value.is_finite() && value >= Money(0.0),
        "{name} must be a finite, non-negative number"
    );

    Ok(())
}

impl AnalysisParameters {
    /// Read an analysis file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `analysis_dir` - Folder containing analysis input files
    ///
    /// # Returns
    ///
    /// The file contents as an [`AnalysisParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(analysis_dir: P) -> Result<AnalysisParameters> {
        let file_path = analysis_dir.as_ref().join(ANALYSIS_PARAMETERS_FILE_NAME);
        let parameters: AnalysisParameters = read_toml(&file_path)?;

        parameters
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(parameters)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_num_years(self.num_years)?;

        ensure!(
            self.tariff_escalation_pct.is_finite() && self.tariff_escalation_pct > -100.0,
            "tariff_escalation_pct must be greater than -100"
        );
        check_percentage("solar_degradation_pct", self.solar_degradation_pct)?;
        check_percentage("battery_degradation_pct", self.battery_degradation_pct)?;
        check_percentage("feed_in_degradation_pct", self.feed_in_degradation_pct)?;
        check_percentage("loan_interest_rate_pct", self.loan_interest_rate_pct)?;
        check_percentage("blackout_coverage_pct", self.blackout_coverage_pct)?;
        check_coverage_target(self.coverage_target)?;
        if let Some(rate) = self.discount_rate_pct {
            check_percentage("discount_rate_pct", rate)?;
        }

        check_money("loan_amount", self.loan_amount)?;
        check_money("system_cost", self.system_cost)?;
        if self.loan_amount > Money(0.0) && self.loan_term_years == 0 {
            warn!("loan_amount is set but loan_term_years is zero, so no repayments will be made");
        }

        self.battery.validate().context("Invalid battery")?;
        ensure!(
            self.existing_solar_kw.is_finite() && self.existing_solar_kw >= Power(0.0),
            "existing_solar_kw must be a finite, non-negative number"
        );
        ensure!(
            self.new_solar_kw.is_finite() && self.new_solar_kw >= Power(0.0),
            "new_solar_kw must be a finite, non-negative number"
        );
        self.bands.validate().context("Invalid bands")?;

        Ok(())
    }

    /// Import-rate escalation as a fraction
    pub fn tariff_escalation(&self) -> Dimensionless {
        Dimensionless::from_percent(self.tariff_escalation_pct)
    }

    /// Solar degradation as a fraction
    pub fn solar_degradation(&self) -> Dimensionless {
        Dimensionless::from_percent(self.solar_degradation_pct)
    }

    /// Battery degradation as a fraction
    pub fn battery_degradation(&self) -> Dimensionless {
        Dimensionless::from_percent(self.battery_degradation_pct)
    }

    /// Feed-in rate degradation as a fraction
    pub fn feed_in_degradation(&self) -> Dimensionless {
        Dimensionless::from_percent(self.feed_in_degradation_pct)
    }

    /// Loan interest rate as a fraction
    pub fn loan_interest_rate(&self) -> Dimensionless {
        Dimensionless::from_percent(self.loan_interest_rate_pct)
    }

    /// Discount rate as a fraction, if opportunity cost is enabled
    pub fn discount_rate(&self) -> Option<Dimensionless> {
        self.discount_rate_pct.map(Dimensionless::from_percent)
    }

    /// The part of the system cost paid up front rather than borrowed
    pub fn upfront_outlay(&self) -> Money {
        (self.system_cost - self.loan_amount).max(Money(0.0))
    }

    /// The factor by which historical solar generation is scaled to represent the proposed system.
    ///
    /// Returns `None` if there is no existing system to scale from.
    pub fn solar_scale_factor(&self) -> Option<f64> {
        if self.existing_solar_kw <= Power(0.0) {
            return None;
        }

        let new_total = if self.replace_existing_system {
            self.new_solar_kw
        } else {
            self.existing_solar_kw + self.new_solar_kw
        };
        Some((new_total / self.existing_solar_kw).0)
    }
}
