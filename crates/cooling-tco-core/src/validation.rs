use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assumptions::{AssumptionSet, Bound, TypicalPueRanges, ValidationBounds};
use crate::error::{TcoError, Violation, ViolationKind};
use crate::inputs::{
    AirCoolingConfig, EquipmentConfiguration, FinancialParameters, ImmersionCoolingConfig,
};
use crate::types::{Currency, Kilowatts, Money, Rate};
use crate::TcoResult;

// ---------------------------------------------------------------------------
// Normalized parameter set
// ---------------------------------------------------------------------------

/// Air-cooling selection with every default resolved and every bound checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirCoolingSpec {
    pub label: String,
    pub rack_count: u32,
    pub servers_per_rack: u32,
    pub server_power_kw: Kilowatts,
    pub server_height_u: u32,
    pub rack_unit_cost: Money,
    pub hvac_plant_cost_per_kw: Money,
    pub hvac_cop: Decimal,
    pub hvac_efficiency: Rate,
    pub power_distribution_efficiency: Rate,
    pub ups_efficiency: Rate,
    pub maintenance_fraction: Rate,
    pub annual_labor_hours: Decimal,
    pub target_pue: Option<Decimal>,
}

/// Immersion-cooling selection with every default resolved and every bound checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmersionCoolingSpec {
    pub label: String,
    pub tank_count: u32,
    pub servers_per_tank: u32,
    pub server_power_kw: Kilowatts,
    pub server_height_u: u32,
    pub tank_unit_cost: Money,
    pub heat_rejection_cost_per_kw: Money,
    pub coolant_volume_per_server_l: Decimal,
    pub coolant_cost_per_liter: Money,
    pub coolant_replacement_cycle_months: u32,
    pub coolant_replacement_fraction: Rate,
    pub filtration_cycle_months: u32,
    pub filtration_cost_per_tank: Money,
    pub pump_efficiency: Rate,
    pub heat_exchanger_efficiency: Rate,
    pub power_distribution_efficiency: Rate,
    pub maintenance_fraction: Rate,
    pub annual_labor_hours: Decimal,
    pub target_pue: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EquipmentSpec {
    AirCooling(AirCoolingSpec),
    ImmersionCooling(ImmersionCoolingSpec),
}

impl EquipmentSpec {
    pub fn label(&self) -> &str {
        match self {
            EquipmentSpec::AirCooling(s) => &s.label,
            EquipmentSpec::ImmersionCooling(s) => &s.label,
        }
    }

    pub fn cooling_type(&self) -> CoolingType {
        match self {
            EquipmentSpec::AirCooling(_) => CoolingType::AirCooling,
            EquipmentSpec::ImmersionCooling(_) => CoolingType::ImmersionCooling,
        }
    }

    pub fn maintenance_fraction(&self) -> Rate {
        match self {
            EquipmentSpec::AirCooling(s) => s.maintenance_fraction,
            EquipmentSpec::ImmersionCooling(s) => s.maintenance_fraction,
        }
    }

    pub fn annual_labor_hours(&self) -> Decimal {
        match self {
            EquipmentSpec::AirCooling(s) => s.annual_labor_hours,
            EquipmentSpec::ImmersionCooling(s) => s.annual_labor_hours,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoolingType {
    AirCooling,
    ImmersionCooling,
}

/// Financial parameters after defaulting and regional lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialAssumptions {
    pub discount_rate: Rate,
    pub analysis_years: u32,
    pub energy_escalation: Rate,
    pub maintenance_escalation: Rate,
    pub labor_escalation: Rate,
    pub region: Option<String>,
    pub energy_cost_per_kwh: Money,
    pub labor_rate_per_hour: Money,
    pub carbon_intensity_kg_per_kwh: Option<Decimal>,
    pub currency: Currency,
    pub exchange_rate: Decimal,
}

/// Assumption-set constants the calculation consults after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConstants {
    pub installation_fraction: Rate,
    pub hours_per_year: Decimal,
    pub rack_height_u: u32,
    pub tank_height_u: u32,
    pub circulation_power_fraction: Rate,
    pub typical_pue: TypicalPueRanges,
}

/// Output of the parameter validator; the only input downstream components accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedInput {
    pub baseline: EquipmentSpec,
    pub alternative: EquipmentSpec,
    pub financial: FinancialAssumptions,
    pub constants: ModelConstants,
}

impl ModelConstants {
    fn from_assumptions(assumptions: &AssumptionSet) -> Self {
        Self {
            installation_fraction: assumptions.installation_fraction.normalize(),
            hours_per_year: assumptions.hours_per_year.normalize(),
            rack_height_u: assumptions.rack_height_u,
            tank_height_u: assumptions.tank_height_u,
            circulation_power_fraction: assumptions.circulation_power_fraction.normalize(),
            typical_pue: TypicalPueRanges {
                air_cooling: normalized(assumptions.typical_pue.air_cooling),
                immersion_cooling: normalized(assumptions.typical_pue.immersion_cooling),
            },
        }
    }
}

fn normalized(bound: Bound) -> Bound {
    Bound::new(bound.min.normalize(), bound.max.normalize())
}

impl ValidatedInput {
    /// Stable cache key over the complete normalized input tuple.
    pub fn fingerprint(&self) -> TcoResult<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(format!("{:x}", md5::compute(canonical)))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Check every field against its bounds and resolve defaults.
///
/// All violations are collected before returning so a caller sees the full
/// list in one pass.
pub fn validate(
    baseline: &EquipmentConfiguration,
    alternative: &EquipmentConfiguration,
    financial: &FinancialParameters,
    assumptions: &AssumptionSet,
) -> TcoResult<ValidatedInput> {
    let mut checker = Checker::new(&assumptions.bounds);

    let baseline = checker.equipment("baseline", baseline, assumptions);
    let alternative = checker.equipment("alternative", alternative, assumptions);
    let financial = checker.financial(financial, assumptions);

    if !checker.violations.is_empty() {
        debug!(violations = checker.violations.len(), "input rejected");
        return Err(TcoError::Validation(checker.violations));
    }

    Ok(ValidatedInput {
        baseline,
        alternative,
        financial,
        constants: ModelConstants::from_assumptions(assumptions),
    })
}

/// Validate a single equipment configuration, reported under `equipment.`.
pub fn validate_equipment(
    config: &EquipmentConfiguration,
    assumptions: &AssumptionSet,
) -> TcoResult<(EquipmentSpec, ModelConstants)> {
    let mut checker = Checker::new(&assumptions.bounds);
    let spec = checker.equipment("equipment", config, assumptions);
    if !checker.violations.is_empty() {
        return Err(TcoError::Validation(checker.violations));
    }
    Ok((spec, ModelConstants::from_assumptions(assumptions)))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct Checker<'a> {
    bounds: &'a ValidationBounds,
    violations: Vec<Violation>,
}

impl<'a> Checker<'a> {
    fn new(bounds: &'a ValidationBounds) -> Self {
        Self {
            bounds,
            violations: Vec::new(),
        }
    }

    fn push(&mut self, field: String, kind: ViolationKind) {
        self.violations.push(Violation { field, kind });
    }

    fn range(&mut self, field: &str, value: Decimal, bound: Bound) {
        if !bound.contains(value) {
            self.push(
                field.to_string(),
                ViolationKind::OutOfRange {
                    min: bound.min,
                    max: bound.max,
                    actual: value,
                },
            );
        }
    }

    // Missing values yield a zero placeholder; any violation aborts validation,
    // so placeholders never reach the calculation.
    fn decimal(
        &mut self,
        field: &str,
        value: Option<Decimal>,
        fallback: Option<Decimal>,
        bound: Bound,
    ) -> Decimal {
        match value.or(fallback) {
            Some(v) => {
                self.range(field, v, bound);
                v.normalize()
            }
            None => {
                self.push(field.to_string(), ViolationKind::Missing);
                Decimal::ZERO
            }
        }
    }

    fn count(&mut self, field: &str, value: Option<u32>, fallback: Option<u32>, bound: Bound) -> u32 {
        match value.or(fallback) {
            Some(v) => {
                self.range(field, Decimal::from(v), bound);
                v
            }
            None => {
                self.push(field.to_string(), ViolationKind::Missing);
                0
            }
        }
    }

    fn density(&mut self, prefix: &str, server_power_kw: Decimal, server_height_u: u32) {
        if server_height_u == 0 || server_power_kw <= Decimal::ZERO {
            return;
        }
        let density = server_power_kw / Decimal::from(server_height_u);
        self.range(
            &format!("{prefix}.power_density_kw_per_u"),
            density,
            self.bounds.power_density_kw_per_u,
        );
    }

    fn equipment(
        &mut self,
        prefix: &str,
        config: &EquipmentConfiguration,
        assumptions: &AssumptionSet,
    ) -> EquipmentSpec {
        match config {
            EquipmentConfiguration::AirCooling(c) => {
                EquipmentSpec::AirCooling(self.air(prefix, c, config.label(), assumptions))
            }
            EquipmentConfiguration::ImmersionCooling(c) => EquipmentSpec::ImmersionCooling(
                self.immersion(prefix, c, config.label(), assumptions),
            ),
        }
    }

    fn air(
        &mut self,
        prefix: &str,
        c: &AirCoolingConfig,
        label: &str,
        assumptions: &AssumptionSet,
    ) -> AirCoolingSpec {
        let b = self.bounds;
        let d = &assumptions.air;
        let f = |name: &str| format!("{prefix}.{name}");

        let rack_count = self.count(&f("rack_count"), c.rack_count, None, b.rack_count);
        let servers_per_rack =
            self.count(&f("servers_per_rack"), c.servers_per_rack, None, b.servers_per_unit);
        let server_power_kw =
            self.decimal(&f("server_power_kw"), c.server_power_kw, None, b.server_power_kw);
        let server_height_u =
            self.count(&f("server_height_u"), c.server_height_u, None, b.server_height_u);
        self.density(prefix, server_power_kw, server_height_u);

        // Saturates so an oversized product fails the labor-hours bound.
        let default_hours = d
            .labor_hours_per_unit
            .checked_mul(Decimal::from(rack_count))
            .unwrap_or(Decimal::MAX);
        let target_pue = c
            .target_pue
            .map(|p| self.decimal(&f("target_pue"), Some(p), None, b.target_pue));

        AirCoolingSpec {
            label: label.to_string(),
            rack_count,
            servers_per_rack,
            server_power_kw,
            server_height_u,
            rack_unit_cost: self.decimal(
                &f("rack_unit_cost"),
                c.rack_unit_cost,
                Some(d.rack_unit_cost),
                b.unit_cost,
            ),
            hvac_plant_cost_per_kw: self.decimal(
                &f("hvac_plant_cost_per_kw"),
                c.hvac_plant_cost_per_kw,
                Some(d.hvac_plant_cost_per_kw),
                b.unit_cost,
            ),
            hvac_cop: self.decimal(&f("hvac_cop"), c.hvac_cop, Some(d.hvac_cop), b.hvac_cop),
            hvac_efficiency: self.decimal(
                &f("hvac_efficiency"),
                c.hvac_efficiency,
                Some(d.hvac_efficiency),
                b.efficiency,
            ),
            power_distribution_efficiency: self.decimal(
                &f("power_distribution_efficiency"),
                c.power_distribution_efficiency,
                Some(d.power_distribution_efficiency),
                b.efficiency,
            ),
            ups_efficiency: self.decimal(
                &f("ups_efficiency"),
                c.ups_efficiency,
                Some(d.ups_efficiency),
                b.efficiency,
            ),
            maintenance_fraction: self.decimal(
                &f("maintenance_fraction"),
                c.maintenance_fraction,
                Some(d.maintenance_fraction),
                b.maintenance_fraction,
            ),
            annual_labor_hours: self.decimal(
                &f("annual_labor_hours"),
                c.annual_labor_hours,
                Some(default_hours),
                b.annual_labor_hours,
            ),
            target_pue,
        }
    }

    fn immersion(
        &mut self,
        prefix: &str,
        c: &ImmersionCoolingConfig,
        label: &str,
        assumptions: &AssumptionSet,
    ) -> ImmersionCoolingSpec {
        let b = self.bounds;
        let d = &assumptions.immersion;
        let f = |name: &str| format!("{prefix}.{name}");

        let tank_count = self.count(&f("tank_count"), c.tank_count, None, b.tank_count);
        let servers_per_tank =
            self.count(&f("servers_per_tank"), c.servers_per_tank, None, b.servers_per_unit);
        let server_power_kw =
            self.decimal(&f("server_power_kw"), c.server_power_kw, None, b.server_power_kw);
        let server_height_u =
            self.count(&f("server_height_u"), c.server_height_u, None, b.server_height_u);
        self.density(prefix, server_power_kw, server_height_u);

        // Saturates so an oversized product fails the labor-hours bound.
        let default_hours = d
            .labor_hours_per_unit
            .checked_mul(Decimal::from(tank_count))
            .unwrap_or(Decimal::MAX);
        let target_pue = c
            .target_pue
            .map(|p| self.decimal(&f("target_pue"), Some(p), None, b.target_pue));

        ImmersionCoolingSpec {
            label: label.to_string(),
            tank_count,
            servers_per_tank,
            server_power_kw,
            server_height_u,
            tank_unit_cost: self.decimal(
                &f("tank_unit_cost"),
                c.tank_unit_cost,
                Some(d.tank_unit_cost),
                b.unit_cost,
            ),
            heat_rejection_cost_per_kw: self.decimal(
                &f("heat_rejection_cost_per_kw"),
                c.heat_rejection_cost_per_kw,
                Some(d.heat_rejection_cost_per_kw),
                b.unit_cost,
            ),
            coolant_volume_per_server_l: self.decimal(
                &f("coolant_volume_per_server_l"),
                c.coolant_volume_per_server_l,
                Some(d.coolant_volume_per_server_l),
                b.coolant_volume_per_server_l,
            ),
            coolant_cost_per_liter: self.decimal(
                &f("coolant_cost_per_liter"),
                c.coolant_cost_per_liter,
                Some(d.coolant_cost_per_liter),
                b.coolant_cost_per_liter,
            ),
            coolant_replacement_cycle_months: self.count(
                &f("coolant_replacement_cycle_months"),
                c.coolant_replacement_cycle_months,
                Some(d.coolant_replacement_cycle_months),
                b.cycle_months,
            ),
            coolant_replacement_fraction: self.decimal(
                &f("coolant_replacement_fraction"),
                c.coolant_replacement_fraction,
                Some(d.coolant_replacement_fraction),
                b.coolant_replacement_fraction,
            ),
            filtration_cycle_months: self.count(
                &f("filtration_cycle_months"),
                c.filtration_cycle_months,
                Some(d.filtration_cycle_months),
                b.cycle_months,
            ),
            filtration_cost_per_tank: self.decimal(
                &f("filtration_cost_per_tank"),
                c.filtration_cost_per_tank,
                Some(d.filtration_cost_per_tank),
                b.unit_cost,
            ),
            pump_efficiency: self.decimal(
                &f("pump_efficiency"),
                c.pump_efficiency,
                Some(d.pump_efficiency),
                b.efficiency,
            ),
            heat_exchanger_efficiency: self.decimal(
                &f("heat_exchanger_efficiency"),
                c.heat_exchanger_efficiency,
                Some(d.heat_exchanger_efficiency),
                b.efficiency,
            ),
            power_distribution_efficiency: self.decimal(
                &f("power_distribution_efficiency"),
                c.power_distribution_efficiency,
                Some(d.power_distribution_efficiency),
                b.efficiency,
            ),
            maintenance_fraction: self.decimal(
                &f("maintenance_fraction"),
                c.maintenance_fraction,
                Some(d.maintenance_fraction),
                b.maintenance_fraction,
            ),
            annual_labor_hours: self.decimal(
                &f("annual_labor_hours"),
                c.annual_labor_hours,
                Some(default_hours),
                b.annual_labor_hours,
            ),
            target_pue,
        }
    }

    fn financial(
        &mut self,
        p: &FinancialParameters,
        assumptions: &AssumptionSet,
    ) -> FinancialAssumptions {
        let b = self.bounds;

        // Discount rate and horizon travel together.
        let (rate, years) = match (p.discount_rate, p.analysis_years) {
            (Some(r), Some(y)) => (Some(r), Some(y)),
            (None, None) => (
                Some(assumptions.default_discount_rate),
                Some(assumptions.default_analysis_years),
            ),
            (Some(r), None) => (Some(r), None),
            (None, Some(y)) => (None, Some(y)),
        };
        let discount_rate = self.decimal("financial.discount_rate", rate, None, b.discount_rate);
        let analysis_years = self.count("financial.analysis_years", years, None, b.analysis_years);

        // Escalation is never Missing: an omitted rate deserializes to 0 and is
        // range-checked like any supplied value.
        let energy_escalation = self.decimal(
            "financial.energy_escalation",
            Some(p.energy_escalation),
            None,
            b.escalation_rate,
        );
        let maintenance_escalation = self.decimal(
            "financial.maintenance_escalation",
            Some(p.maintenance_escalation),
            None,
            b.escalation_rate,
        );
        let labor_escalation = self.decimal(
            "financial.labor_escalation",
            Some(p.labor_escalation),
            None,
            b.escalation_rate,
        );

        let region = match p.region.as_deref() {
            Some(code) => {
                let found = assumptions.region(code);
                if found.is_none() {
                    self.push(
                        "financial.region".into(),
                        ViolationKind::Unrecognized {
                            value: code.to_string(),
                        },
                    );
                }
                found
            }
            None => None,
        };

        let energy_cost_per_kwh = self.decimal(
            "financial.energy_cost_per_kwh",
            p.energy_cost_per_kwh,
            region.map(|r| r.energy_cost_per_kwh),
            b.energy_cost_per_kwh,
        );
        let labor_rate_per_hour = self.decimal(
            "financial.labor_rate_per_hour",
            p.labor_rate_per_hour,
            region.map(|r| r.labor_rate_per_hour),
            b.labor_rate_per_hour,
        );
        let carbon_intensity_kg_per_kwh = p
            .carbon_intensity_kg_per_kwh
            .or(region.map(|r| r.carbon_intensity_kg_per_kwh))
            .map(|c| {
                self.decimal(
                    "financial.carbon_intensity_kg_per_kwh",
                    Some(c),
                    None,
                    b.carbon_intensity_kg_per_kwh,
                )
            });

        let same_currency = p.currency == assumptions.base_currency;
        let exchange_rate = self.decimal(
            "financial.exchange_rate",
            p.exchange_rate,
            same_currency.then_some(Decimal::ONE),
            b.exchange_rate,
        );

        FinancialAssumptions {
            discount_rate,
            analysis_years,
            energy_escalation,
            maintenance_escalation,
            labor_escalation,
            region: p.region.as_ref().map(|r| r.trim().to_ascii_uppercase()),
            energy_cost_per_kwh,
            labor_rate_per_hour,
            carbon_intensity_kg_per_kwh,
            currency: p.currency.clone(),
            exchange_rate,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
