//! Rate recipes: the functions which turn a day's energy flows into a bill.
//!
//! Each provider names one import component and one export component by tag. The
//! [`TariffRegistry`] maps tags to [`TariffRecipe`] implementations, so a new tariff shape is added
//! by registering another recipe.
use super::{ComponentTag, ProviderTariff, TIER1_LIMIT_KWH};
use crate::dispatch::DailyEnergyBreakdown;
use crate::finance::degraded_rate;
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::warn;

/// Tag for a single import rate
pub const FLAT_RATE_IMPORT: &str = "FLAT_RATE_IMPORT";
/// Tag for peak/shoulder/off-peak import rates
pub const TIME_OF_USE_IMPORT: &str = "TIME_OF_USE_IMPORT";
/// Tag for a single feed-in rate
pub const FLAT_RATE_FIT: &str = "FLAT_RATE_FIT";
/// Tag for a two-tier feed-in rate
pub const MULTI_TIER_FIT: &str = "MULTI_TIER_FIT";
/// Tag for time-of-use feed-in with a daily bonus allowance
pub const GLOBIRD_COMPLEX_FIT: &str = "GLOBIRD_COMPLEX_FIT";

/// Year-dependent adjustments applied to rates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateAdjustment {
    /// Multiplier applied to import rates
    pub escalation: Dimensionless,
    /// Annual fractional reduction in export rates
    pub feed_in_degradation: Dimensionless,
}

impl Default for RateAdjustment {
    fn default() -> Self {
        Self {
            escalation: Dimensionless(1.0),
            feed_in_degradation: Dimensionless(0.0),
        }
    }
}

impl RateAdjustment {
    /// An import rate with escalation applied
    pub fn escalated(&self, rate: MoneyPerEnergy) -> MoneyPerEnergy {
        rate * self.escalation
    }

    /// An export rate degraded for the given year of the analysis
    pub fn degraded(&self, rate: MoneyPerEnergy, year: u32) -> MoneyPerEnergy {
        degraded_rate(rate, year, self.feed_in_degradation)
    }
}

/// A calculation converting a day's energy breakdown into an amount of money
pub trait TariffRecipe {
    /// The rate-table entries this recipe reads
    fn rate_names(&self) -> &'static [&'static str];

    /// Calculate the day's charge (for import recipes) or credit (for export recipes)
    fn calculate(
        &self,
        tariff: &ProviderTariff,
        breakdown: &DailyEnergyBreakdown,
        year: u32,
        adjustment: &RateAdjustment,
    ) -> Money;
}

/// All grid import at one rate
pub struct FlatRateImport;

impl TariffRecipe for FlatRateImport {
    fn rate_names(&self) -> &'static [&'static str] {
        &["import"]
    }

    fn calculate(
        &self,
        tariff: &ProviderTariff,
        breakdown: &DailyEnergyBreakdown,
        _year: u32,
        adjustment: &RateAdjustment,
    ) -> Money {
        breakdown.total_import() * adjustment.escalated(tariff.rates.rate("import"))
    }
}

/// Grid import billed at the rate for its time-of-use period
pub struct TimeOfUseImport;

impl TariffRecipe for TimeOfUseImport {
    fn rate_names(&self) -> &'static [&'static str] {
        &["peak", "shoulder", "off_peak"]
    }

    fn calculate(
        &self,
        tariff: &ProviderTariff,
        breakdown: &DailyEnergyBreakdown,
        _year: u32,
        adjustment: &RateAdjustment,
    ) -> Money {
        let rates = &tariff.rates;
        let cost = breakdown.peak_kwh * rates.rate("peak")
            + breakdown.shoulder_kwh * rates.rate("shoulder")
            + breakdown.off_peak_kwh * rates.rate("off_peak");
        cost * adjustment.escalation
    }
}

/// All export at one feed-in rate
pub struct FlatRateFit;

impl TariffRecipe for FlatRateFit {
    fn rate_names(&self) -> &'static [&'static str] {
        &["feed_in"]
    }

    fn calculate(
        &self,
        tariff: &ProviderTariff,
        breakdown: &DailyEnergyBreakdown,
        year: u32,
        adjustment: &RateAdjustment,
    ) -> Money {
        breakdown.total_export() * adjustment.degraded(tariff.rates.rate("feed_in"), year)
    }
}

/// Export up to a daily limit at the tier 1 rate, the rest at the tier 2 rate
pub struct MultiTierFit;

impl TariffRecipe for MultiTierFit {
    fn rate_names(&self) -> &'static [&'static str] {
        &["tier1", "tier2", TIER1_LIMIT_KWH]
    }

    fn calculate(
        &self,
        tariff: &ProviderTariff,
        breakdown: &DailyEnergyBreakdown,
        year: u32,
        adjustment: &RateAdjustment,
    ) -> Money {
        let rates = &tariff.rates;
        breakdown.tier1_export_kwh * adjustment.degraded(rates.rate("tier1"), year)
            + breakdown.tier2_export_kwh * adjustment.degraded(rates.rate("tier2"), year)
    }
}

/// Time-of-use export credit plus a bonus on the first part of the day's export.
///
/// The bonus is paid on top of the time-of-use credit for the same energy.
pub struct GloBirdComplexFit;

impl TariffRecipe for GloBirdComplexFit {
    fn rate_names(&self) -> &'static [&'static str] {
        &["bonus", "bonus_limit_kwh"]
    }

    fn calculate(
        &self,
        tariff: &ProviderTariff,
        breakdown: &DailyEnergyBreakdown,
        year: u32,
        adjustment: &RateAdjustment,
    ) -> Money {
        let rates = &tariff.rates;
        let bonus_energy = breakdown
            .total_export()
            .min(rates.energy("bonus_limit_kwh"));
        let bonus = bonus_energy * adjustment.degraded(rates.rate("bonus"), year);

        let time_of_use: Money = breakdown
            .hourly_exports
            .iter()
            .enumerate()
            .filter(|(_, export)| **export > Energy(0.0))
            .map(|(hour, export)| {
                *export * adjustment.degraded(tariff.export_rate_for_hour(hour), year)
            })
            .sum();

        bonus + time_of_use
    }
}

/// A day's bill under one tariff
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailyBill {
    /// Cost of grid import
    pub cost: Money,
    /// Credit for export
    pub credit: Money,
}

/// The known import and export recipes, keyed by component tag
pub struct TariffRegistry {
    imports: IndexMap<ComponentTag, Box<dyn TariffRecipe>>,
    exports: IndexMap<ComponentTag, Box<dyn TariffRecipe>>,
}

impl Default for TariffRegistry {
    /// A registry containing the built-in recipes
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_import(FLAT_RATE_IMPORT, Box::new(FlatRateImport));
        registry.register_import(TIME_OF_USE_IMPORT, Box::new(TimeOfUseImport));
        registry.register_export(FLAT_RATE_FIT, Box::new(FlatRateFit));
        registry.register_export(MULTI_TIER_FIT, Box::new(MultiTierFit));
        registry.register_export(GLOBIRD_COMPLEX_FIT, Box::new(GloBirdComplexFit));
        registry
    }
}

impl TariffRegistry {
    /// A registry with no recipes
    pub fn empty() -> Self {
        Self {
            imports: IndexMap::new(),
            exports: IndexMap::new(),
        }
    }

    /// Add or replace the import recipe for `tag`
    pub fn register_import(&mut self, tag: &str, recipe: Box<dyn TariffRecipe>) {
        self.imports.insert(tag.into(), recipe);
    }

    /// Add or replace the export recipe for `tag`
    pub fn register_export(&mut self, tag: &str, recipe: Box<dyn TariffRecipe>) {
        self.exports.insert(tag.into(), recipe);
    }

    fn import_recipe(&self, tag: &ComponentTag) -> Result<&dyn TariffRecipe> {
        self.imports
            .get(tag)
            .map(|recipe| &**recipe)
            .with_context(|| format!("Unknown import component: {tag}"))
    }

    fn export_recipe(&self, tag: &ComponentTag) -> Result<&dyn TariffRecipe> {
        self.exports
            .get(tag)
            .map(|recipe| &**recipe)
            .with_context(|| format!("Unknown export component: {tag}"))
    }

    /// Check that the tariff's components are known.
    ///
    /// Rate-table entries which the components read but which are missing are evaluated as zero,
    /// so these only produce a warning.
    pub fn check_tariff(&self, tariff: &ProviderTariff) -> Result<()> {
        let import = self.import_recipe(&tariff.import_component)?;
        let export = self.export_recipe(&tariff.export_component)?;

        for name in import.rate_names().iter().chain(export.rate_names()) {
            if !tariff.rates.contains(name) {
                warn!(
                    "Provider {}: rate '{name}' is not set and will be treated as zero",
                    tariff.id
                );
            }
        }

        Ok(())
    }

    /// Calculate the cost of import and credit for export for one day
    pub fn bill(
        &self,
        tariff: &ProviderTariff,
        breakdown: &DailyEnergyBreakdown,
        year: u32,
        adjustment: &RateAdjustment,
    ) -> Result<DailyBill> {
        let import = self.import_recipe(&tariff.import_component)?;
        let export = self.export_recipe(&tariff.export_component)?;

        Ok(DailyBill {
            cost: import.calculate(tariff, breakdown, year, adjustment),
            credit: export.calculate(tariff, breakdown, year, adjustment),
        })
    }
}
