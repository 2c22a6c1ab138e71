use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arithmetic::{add, mul};
use crate::error::TcoError;
use crate::types::{Kilowatts, Money};
use crate::validation::{AirCoolingSpec, EquipmentSpec, ImmersionCoolingSpec, ModelConstants};
use crate::TcoResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Capital expenditure split into the three reported line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapexBreakdown {
    /// Racks or tanks
    pub equipment: Money,
    /// HVAC plant, or coolant fill plus heat rejection
    pub infrastructure: Money,
    pub installation: Money,
    pub total: Money,
}

impl CapexBreakdown {
    fn new(equipment: Money, infrastructure: Money, installation_fraction: Decimal) -> TcoResult<Self> {
        let hardware = add(equipment, infrastructure, "capex")?;
        let installation = mul(hardware, installation_fraction, "installation")?;
        Ok(Self {
            equipment,
            infrastructure,
            installation,
            total: add(hardware, installation, "capex")?,
        })
    }

    /// Same breakdown expressed in another currency.
    pub fn scaled(&self, factor: Decimal) -> TcoResult<Self> {
        let op = "currency conversion";
        Ok(Self {
            equipment: mul(self.equipment, factor, op)?,
            infrastructure: mul(self.infrastructure, factor, op)?,
            installation: mul(self.installation, factor, op)?,
            total: mul(self.total, factor, op)?,
        })
    }
}

/// Resolver output: CAPEX and nameplate IT capacity for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCosts {
    pub capex: CapexBreakdown,
    pub it_power_kw: Kilowatts,
    pub server_count: u32,
    /// Total coolant inventory; zero for air cooling
    pub coolant_fill_liters: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Map an equipment selection to CAPEX line items and IT capacity.
pub fn resolve_equipment(
    spec: &EquipmentSpec,
    constants: &ModelConstants,
) -> TcoResult<EquipmentCosts> {
    let costs = match spec {
        EquipmentSpec::AirCooling(air) => resolve_air(air, constants)?,
        EquipmentSpec::ImmersionCooling(tank) => resolve_immersion(tank, constants)?,
    };

    if costs.it_power_kw <= Decimal::ZERO {
        return Err(TcoError::configuration(
            spec.label(),
            format!("IT power capacity computes to {} kW", costs.it_power_kw),
        ));
    }

    debug!(
        scenario = spec.label(),
        it_power_kw = %costs.it_power_kw,
        capex = %costs.capex.total,
        "resolved equipment"
    );
    Ok(costs)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_fit(
    label: &str,
    unit: &str,
    servers_per_unit: u32,
    server_height_u: u32,
    usable_height_u: u32,
) -> TcoResult<()> {
    let occupied = u64::from(servers_per_unit) * u64::from(server_height_u);
    if occupied > u64::from(usable_height_u) {
        return Err(TcoError::configuration(
            label,
            format!(
                "{servers_per_unit} servers of {server_height_u}U need {occupied}U but a {unit} holds {usable_height_u}U"
            ),
        ));
    }
    Ok(())
}

fn server_count(label: &str, units: u32, servers_per_unit: u32) -> TcoResult<u32> {
    units.checked_mul(servers_per_unit).ok_or_else(|| {
        TcoError::calculation(label, format!("{units} units x {servers_per_unit} servers overflows"))
    })
}

fn resolve_air(spec: &AirCoolingSpec, constants: &ModelConstants) -> TcoResult<EquipmentCosts> {
    check_fit(
        &spec.label,
        "rack",
        spec.servers_per_rack,
        spec.server_height_u,
        constants.rack_height_u,
    )?;

    let server_count = server_count(&spec.label, spec.rack_count, spec.servers_per_rack)?;
    let it_power_kw = mul(Decimal::from(server_count), spec.server_power_kw, "IT power")?;

    let equipment = mul(Decimal::from(spec.rack_count), spec.rack_unit_cost, "rack cost")?;
    let hvac_plant = mul(it_power_kw, spec.hvac_plant_cost_per_kw, "HVAC plant cost")?;

    Ok(EquipmentCosts {
        capex: CapexBreakdown::new(equipment, hvac_plant, constants.installation_fraction)?,
        it_power_kw,
        server_count,
        coolant_fill_liters: Decimal::ZERO,
    })
}

fn resolve_immersion(
    spec: &ImmersionCoolingSpec,
    constants: &ModelConstants,
) -> TcoResult<EquipmentCosts> {
    check_fit(
        &spec.label,
        "tank",
        spec.servers_per_tank,
        spec.server_height_u,
        constants.tank_height_u,
    )?;

    let server_count = server_count(&spec.label, spec.tank_count, spec.servers_per_tank)?;
    let it_power_kw = mul(Decimal::from(server_count), spec.server_power_kw, "IT power")?;

    let coolant_fill_liters = mul(
        Decimal::from(server_count),
        spec.coolant_volume_per_server_l,
        "coolant fill",
    )?;
    let coolant_fill_cost = mul(coolant_fill_liters, spec.coolant_cost_per_liter, "coolant fill")?;
    let heat_rejection = mul(it_power_kw, spec.heat_rejection_cost_per_kw, "heat rejection cost")?;

    let equipment = mul(Decimal::from(spec.tank_count), spec.tank_unit_cost, "tank cost")?;

    Ok(EquipmentCosts {
        capex: CapexBreakdown::new(
            equipment,
            add(coolant_fill_cost, heat_rejection, "immersion infrastructure")?,
            constants.installation_fraction,
        )?,
        it_power_kw,
        server_count,
        coolant_fill_liters,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::AssumptionSet;
    use crate::inputs::{AirCoolingConfig, EquipmentConfiguration, FinancialParameters, ImmersionCoolingConfig};
    use crate::validation::validate;
    use rust_decimal_macros::dec;

    fn resolved() -> (EquipmentSpec, EquipmentSpec, ModelConstants) {
        let v = validate(
            &EquipmentConfiguration::AirCooling(AirCoolingConfig::new(100, 15, dec!(1.0), 1)),
            &EquipmentConfiguration::ImmersionCooling(ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1)),
            &FinancialParameters {
                region: Some("US".into()),
                ..FinancialParameters::default()
            },
            &AssumptionSet::default(),
        )
        .unwrap();
        (v.baseline, v.alternative, v.constants)
    }

    #[test]
    fn test_air_capex_breakdown() {
        let (air, _, constants) = resolved();
        let costs = resolve_equipment(&air, &constants).unwrap();

        assert_eq!(costs.it_power_kw, dec!(1500));
        assert_eq!(costs.server_count, 1500);
        // 100 racks * 3500
        assert_eq!(costs.capex.equipment, dec!(350000));
        // 1500 kW * 1200
        assert_eq!(costs.capex.infrastructure, dec!(1800000));
        // 15% of 2,150,000
        assert_eq!(costs.capex.installation, dec!(322500));
        assert_eq!(costs.capex.total, dec!(2472500));
        assert_eq!(costs.coolant_fill_liters, Decimal::ZERO);
    }

    #[test]
    fn test_immersion_capex_includes_coolant_fill() {
        let (_, tank, constants) = resolved();
        let costs = resolve_equipment(&tank, &constants).unwrap();

        assert_eq!(costs.it_power_kw, dec!(1500));
        // 50 tanks * 40,000
        assert_eq!(costs.capex.equipment, dec!(2000000));
        // 1500 servers * 40 L = 60,000 L
        assert_eq!(costs.coolant_fill_liters, dec!(60000));
        // 60,000 L * 25 + 1500 kW * 400
        assert_eq!(costs.capex.infrastructure, dec!(2100000));
        assert_eq!(costs.capex.total, dec!(4715000));
    }

    #[test]
    fn test_servers_exceeding_rack_height_rejected() {
        let (air, _, constants) = resolved();
        let EquipmentSpec::AirCooling(mut spec) = air else {
            panic!("expected air cooling");
        };
        spec.servers_per_rack = 22;
        spec.server_height_u = 2;
        let err = resolve_equipment(&EquipmentSpec::AirCooling(spec), &constants).unwrap_err();
        assert!(matches!(err, TcoError::Configuration { .. }));
    }

    #[test]
    fn test_zero_it_power_rejected() {
        let (_, tank, constants) = resolved();
        let EquipmentSpec::ImmersionCooling(mut spec) = tank else {
            panic!("expected immersion cooling");
        };
        spec.server_power_kw = Decimal::ZERO;
        let err =
            resolve_equipment(&EquipmentSpec::ImmersionCooling(spec), &constants).unwrap_err();
        assert!(err.to_string().contains("IT power capacity"));
    }

    #[test]
    fn test_capex_scaling() {
        let (air, _, constants) = resolved();
        let capex = resolve_equipment(&air, &constants)
            .unwrap()
            .capex
            .scaled(dec!(2))
            .unwrap();
        assert_eq!(capex.total, dec!(4945000));
        assert_eq!(capex.equipment + capex.infrastructure + capex.installation, capex.total);
    }

    #[test]
    fn test_unit_cost_overflow_is_calculation_error() {
        let (_, tank, constants) = resolved();
        let EquipmentSpec::ImmersionCooling(mut spec) = tank else {
            panic!("expected immersion cooling");
        };
        spec.tank_unit_cost = Decimal::MAX;
        let err =
            resolve_equipment(&EquipmentSpec::ImmersionCooling(spec), &constants).unwrap_err();
        assert!(matches!(err, TcoError::Calculation { .. }), "got {err}");
    }
}
