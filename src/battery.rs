//! Battery specification.
use crate::units::{Dimensionless, Energy, Power};
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// The size of a battery system
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Usable energy capacity
    pub capacity_kwh: Energy,
    /// Maximum charge or discharge power
    pub inverter_kw: Power,
}

impl BatteryConfig {
    /// A battery which can neither store nor move any energy
    pub const NONE: Self = Self {
        capacity_kwh: Energy::new(0.0),
        inverter_kw: Power::new(0.0),
    };

    /// Check that the capacity and inverter power are finite and non-negative
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.capacity_kwh.is_finite() && self.capacity_kwh >= Energy(0.0),
            "Battery capacity must be a finite, non-negative number"
        );
        ensure!(
            self.inverter_kw.is_finite() && self.inverter_kw >= Power(0.0),
            "Inverter power must be a finite, non-negative number"
        );

        Ok(())
    }

    /// The battery after `year - 1` years of capacity fade at `annual_degradation`.
    ///
    /// Inverter power does not degrade.
    pub fn degraded(&self, year: u32, annual_degradation: Dimensionless) -> Self {
        let factor = (Dimensionless(1.0) - annual_degradation).powi(year.saturating_sub(1) as i32);
        Self {
            capacity_kwh: self.capacity_kwh * factor,
            inverter_kw: self.inverter_kw,
        }
    }
}
