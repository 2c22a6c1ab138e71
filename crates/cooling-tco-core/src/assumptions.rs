use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Currency, Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Inclusive numeric range used by the parameter validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub min: Decimal,
    pub max: Decimal,
}

impl Bound {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Published validation bounds for every numeric input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationBounds {
    pub rack_count: Bound,
    pub tank_count: Bound,
    pub servers_per_unit: Bound,
    pub server_power_kw: Bound,
    pub server_height_u: Bound,
    /// Server power divided by server height (kW/U)
    pub power_density_kw_per_u: Bound,
    pub hvac_cop: Bound,
    /// Shared by every efficiency coefficient (HVAC, UPS, distribution, pump, heat exchanger)
    pub efficiency: Bound,
    pub target_pue: Bound,
    pub maintenance_fraction: Bound,
    pub annual_labor_hours: Bound,
    /// Shared by every unit-cost input
    pub unit_cost: Bound,
    pub coolant_volume_per_server_l: Bound,
    pub coolant_cost_per_liter: Bound,
    pub coolant_replacement_fraction: Bound,
    pub cycle_months: Bound,
    pub discount_rate: Bound,
    pub analysis_years: Bound,
    pub escalation_rate: Bound,
    pub energy_cost_per_kwh: Bound,
    pub labor_rate_per_hour: Bound,
    pub exchange_rate: Bound,
    pub carbon_intensity_kg_per_kwh: Bound,
}

impl Default for ValidationBounds {
    fn default() -> Self {
        Self {
            rack_count: Bound::new(dec!(1), dec!(1000)),
            tank_count: Bound::new(dec!(1), dec!(500)),
            servers_per_unit: Bound::new(dec!(1), dec!(100)),
            server_power_kw: Bound::new(dec!(0.1), dec!(20)),
            server_height_u: Bound::new(dec!(1), dec!(10)),
            power_density_kw_per_u: Bound::new(dec!(0.5), dec!(5.0)),
            hvac_cop: Bound::new(dec!(1.0), dec!(10.0)),
            efficiency: Bound::new(dec!(0.5), dec!(1.0)),
            target_pue: Bound::new(dec!(1.0), dec!(3.0)),
            maintenance_fraction: Bound::new(dec!(0), dec!(0.20)),
            annual_labor_hours: Bound::new(dec!(0), dec!(100000)),
            unit_cost: Bound::new(dec!(0), dec!(10000000)),
            coolant_volume_per_server_l: Bound::new(dec!(1), dec!(200)),
            coolant_cost_per_liter: Bound::new(dec!(0), dec!(200)),
            coolant_replacement_fraction: Bound::new(dec!(0), dec!(1)),
            cycle_months: Bound::new(dec!(1), dec!(120)),
            discount_rate: Bound::new(dec!(0.01), dec!(0.25)),
            analysis_years: Bound::new(dec!(1), dec!(10)),
            escalation_rate: Bound::new(dec!(0), dec!(0.20)),
            energy_cost_per_kwh: Bound::new(dec!(0.01), dec!(1.0)),
            labor_rate_per_hour: Bound::new(dec!(5), dec!(500)),
            exchange_rate: Bound::new(dec!(0.0001), dec!(100000)),
            carbon_intensity_kg_per_kwh: Bound::new(dec!(0), dec!(2)),
        }
    }
}

/// PUE bands considered typical; estimates outside them raise a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypicalPueRanges {
    pub air_cooling: Bound,
    pub immersion_cooling: Bound,
}

impl Default for TypicalPueRanges {
    fn default() -> Self {
        Self {
            air_cooling: Bound::new(dec!(1.2), dec!(2.0)),
            immersion_cooling: Bound::new(dec!(1.02), dec!(1.05)),
        }
    }
}

/// Regional energy, labor and grid-carbon figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionProfile {
    pub name: String,
    pub energy_cost_per_kwh: Money,
    pub labor_rate_per_hour: Money,
    pub carbon_intensity_kg_per_kwh: Decimal,
}

/// Default air-cooling unit costs and efficiencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirCoolingDefaults {
    pub rack_unit_cost: Money,
    pub hvac_plant_cost_per_kw: Money,
    pub hvac_cop: Decimal,
    pub hvac_efficiency: Rate,
    pub power_distribution_efficiency: Rate,
    pub ups_efficiency: Rate,
    pub maintenance_fraction: Rate,
    /// Technician hours per rack per year
    pub labor_hours_per_unit: Decimal,
}

impl Default for AirCoolingDefaults {
    fn default() -> Self {
        Self {
            rack_unit_cost: dec!(3500),
            hvac_plant_cost_per_kw: dec!(1200),
            hvac_cop: dec!(3.0),
            hvac_efficiency: dec!(0.90),
            power_distribution_efficiency: dec!(0.98),
            ups_efficiency: dec!(0.95),
            maintenance_fraction: dec!(0.05),
            labor_hours_per_unit: dec!(12),
        }
    }
}

/// Default immersion-cooling unit costs, consumables and efficiencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImmersionCoolingDefaults {
    pub tank_unit_cost: Money,
    pub heat_rejection_cost_per_kw: Money,
    pub coolant_volume_per_server_l: Decimal,
    pub coolant_cost_per_liter: Money,
    pub coolant_replacement_cycle_months: u32,
    /// Share of the coolant fill replaced at each replacement cycle
    pub coolant_replacement_fraction: Rate,
    pub filtration_cycle_months: u32,
    pub filtration_cost_per_tank: Money,
    pub pump_efficiency: Rate,
    pub heat_exchanger_efficiency: Rate,
    pub power_distribution_efficiency: Rate,
    pub maintenance_fraction: Rate,
    /// Technician hours per tank per year
    pub labor_hours_per_unit: Decimal,
}

impl Default for ImmersionCoolingDefaults {
    fn default() -> Self {
        Self {
            tank_unit_cost: dec!(40000),
            heat_rejection_cost_per_kw: dec!(400),
            coolant_volume_per_server_l: dec!(40),
            coolant_cost_per_liter: dec!(25),
            coolant_replacement_cycle_months: 60,
            coolant_replacement_fraction: dec!(0.10),
            filtration_cycle_months: 6,
            filtration_cost_per_tank: dec!(250),
            pump_efficiency: dec!(0.85),
            heat_exchanger_efficiency: dec!(0.95),
            power_distribution_efficiency: dec!(0.99),
            maintenance_fraction: dec!(0.03),
            labor_hours_per_unit: dec!(8),
        }
    }
}

/// Every constant table the engine consults, passed explicitly into each run so
/// concurrent sweeps with different assumption sets never interfere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionSet {
    pub bounds: ValidationBounds,
    pub typical_pue: TypicalPueRanges,
    /// Keyed by upper-case region code
    pub regions: BTreeMap<String, RegionProfile>,
    pub air: AirCoolingDefaults,
    pub immersion: ImmersionCoolingDefaults,
    /// Installation cost as a fraction of equipment plus infrastructure
    pub installation_fraction: Rate,
    pub hours_per_year: Decimal,
    pub rack_height_u: u32,
    pub tank_height_u: u32,
    /// Pumping power needed per unit of IT heat load before pump/HX losses
    pub circulation_power_fraction: Rate,
    pub default_discount_rate: Rate,
    pub default_analysis_years: u32,
    /// Currency every monetary figure in this set (and in equipment inputs) is quoted in
    pub base_currency: Currency,
}

impl Default for AssumptionSet {
    fn default() -> Self {
        Self {
            bounds: ValidationBounds::default(),
            typical_pue: TypicalPueRanges::default(),
            regions: default_regions(),
            air: AirCoolingDefaults::default(),
            immersion: ImmersionCoolingDefaults::default(),
            installation_fraction: dec!(0.15),
            hours_per_year: dec!(8760),
            rack_height_u: 42,
            tank_height_u: 48,
            circulation_power_fraction: dec!(0.02),
            default_discount_rate: dec!(0.08),
            default_analysis_years: 5,
            base_currency: Currency::USD,
        }
    }
}

impl AssumptionSet {
    /// Case-insensitive region lookup.
    pub fn region(&self, code: &str) -> Option<&RegionProfile> {
        self.regions.get(&code.trim().to_ascii_uppercase())
    }
}

fn region(name: &str, energy: Decimal, labor: Decimal, carbon: Decimal) -> RegionProfile {
    RegionProfile {
        name: name.to_string(),
        energy_cost_per_kwh: energy,
        labor_rate_per_hour: labor,
        carbon_intensity_kg_per_kwh: carbon,
    }
}

// Rates in USD.
fn default_regions() -> BTreeMap<String, RegionProfile> {
    BTreeMap::from([
        ("US".to_string(), region("United States", dec!(0.12), dec!(75), dec!(0.39))),
        ("EU".to_string(), region("European Union", dec!(0.20), dec!(65), dec!(0.25))),
        ("UK".to_string(), region("United Kingdom", dec!(0.25), dec!(70), dec!(0.21))),
        ("SG".to_string(), region("Singapore", dec!(0.18), dec!(60), dec!(0.41))),
        ("JP".to_string(), region("Japan", dec!(0.22), dec!(55), dec!(0.46))),
        ("AU".to_string(), region("Australia", dec!(0.19), dec!(68), dec!(0.66))),
        ("CA".to_string(), region("Canada", dec!(0.09), dec!(62), dec!(0.12))),
        ("IN".to_string(), region("India", dec!(0.08), dec!(18), dec!(0.71))),
    ])
}
