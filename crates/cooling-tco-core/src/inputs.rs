use serde::{Deserialize, Serialize};

use crate::types::{Currency, Kilowatts, Money, Rate};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// Equipment selection for one cooling scenario.
///
/// Structural fields are optional so that an incomplete payload reaches the
/// validator and is reported as `Missing` instead of failing deserialisation.
/// Cost and efficiency fields left empty fall back to the assumption set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EquipmentConfiguration {
    AirCooling(AirCoolingConfig),
    ImmersionCooling(ImmersionCoolingConfig),
}

impl EquipmentConfiguration {
    pub fn label(&self) -> &str {
        match self {
            EquipmentConfiguration::AirCooling(c) => c.label.as_deref().unwrap_or("Air cooling"),
            EquipmentConfiguration::ImmersionCooling(c) => {
                c.label.as_deref().unwrap_or("Immersion cooling")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirCoolingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers_per_rack: Option<u32>,
    /// Nameplate power per server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_power_kw: Option<Kilowatts>,
    /// Rack units occupied by one server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_height_u: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack_unit_cost: Option<Money>,
    /// CRAH/chiller plant cost per kW of IT load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hvac_plant_cost_per_kw: Option<Money>,
    /// HVAC coefficient of performance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hvac_cop: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hvac_efficiency: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_distribution_efficiency: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ups_efficiency: Option<Rate>,
    /// Annual maintenance as a fraction of CAPEX
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_fraction: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_labor_hours: Option<Decimal>,
    /// Measured or contracted PUE; replaces the derived estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_pue: Option<Decimal>,
}

impl AirCoolingConfig {
    pub fn new(
        rack_count: u32,
        servers_per_rack: u32,
        server_power_kw: Kilowatts,
        server_height_u: u32,
    ) -> Self {
        Self {
            rack_count: Some(rack_count),
            servers_per_rack: Some(servers_per_rack),
            server_power_kw: Some(server_power_kw),
            server_height_u: Some(server_height_u),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImmersionCoolingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tank_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers_per_tank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_power_kw: Option<Kilowatts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_height_u: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tank_unit_cost: Option<Money>,
    /// Dry cooler / CDU cost per kW of IT load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_rejection_cost_per_kw: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coolant_volume_per_server_l: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coolant_cost_per_liter: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coolant_replacement_cycle_months: Option<u32>,
    /// Share of the fill replaced at each replacement cycle (1.0 = full drain)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coolant_replacement_fraction: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtration_cycle_months: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtration_cost_per_tank: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pump_efficiency: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_exchanger_efficiency: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_distribution_efficiency: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_fraction: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_labor_hours: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_pue: Option<Decimal>,
}

impl ImmersionCoolingConfig {
    pub fn new(
        tank_count: u32,
        servers_per_tank: u32,
        server_power_kw: Kilowatts,
        server_height_u: u32,
    ) -> Self {
        Self {
            tank_count: Some(tank_count),
            servers_per_tank: Some(servers_per_tank),
            server_power_kw: Some(server_power_kw),
            server_height_u: Some(server_height_u),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Financial
// ---------------------------------------------------------------------------

/// Discounting, escalation and regional cost parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialParameters {
    /// Must be supplied together with `analysis_years`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_years: Option<u32>,
    /// Annual escalation rates. Unlike the discount rate these have no
    /// assumption-set default: an omitted rate means flat real costs (0).
    #[serde(default)]
    pub energy_escalation: Rate,
    #[serde(default)]
    pub maintenance_escalation: Rate,
    #[serde(default)]
    pub labor_escalation: Rate,
    /// Region code used to look up rates not given explicitly (e.g. "US")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_cost_per_kwh: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labor_rate_per_hour: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbon_intensity_kg_per_kwh: Option<Decimal>,
    /// Reporting currency
    #[serde(default)]
    pub currency: Currency,
    /// Units of `currency` per unit of the assumption-set base currency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Decimal>,
}

/// Full payload for one comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonInput {
    /// Incumbent scenario; savings are measured against it
    pub baseline: EquipmentConfiguration,
    pub alternative: EquipmentConfiguration,
    pub financial: FinancialParameters,
}
