use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arithmetic::{add, div, mul, sub};
use crate::assumptions::Bound;
use crate::error::TcoError;
use crate::types::Kilowatts;
use crate::validation::{
    AirCoolingSpec, CoolingType, EquipmentSpec, ImmersionCoolingSpec, ModelConstants,
};
use crate::TcoResult;

/// How the reported PUE was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PueSource {
    /// Computed from efficiency coefficients
    Derived,
    /// Supplied as a target/measured figure
    Target,
}

/// Facility power budget at nameplate IT load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PueEstimate {
    pub pue: Decimal,
    pub it_power_kw: Kilowatts,
    pub cooling_overhead_kw: Kilowatts,
    pub distribution_losses_kw: Kilowatts,
    pub total_facility_power_kw: Kilowatts,
    pub source: PueSource,
}

/// Range of PUE values considered typical for a cooling type.
pub fn typical_range(cooling_type: CoolingType, constants: &ModelConstants) -> Bound {
    match cooling_type {
        CoolingType::AirCooling => constants.typical_pue.air_cooling,
        CoolingType::ImmersionCooling => constants.typical_pue.immersion_cooling,
    }
}

/// Estimate effective PUE: total facility power divided by IT power.
///
/// A PUE below 1.0 is physically impossible and fails immediately.
pub fn estimate_pue(
    spec: &EquipmentSpec,
    it_power_kw: Kilowatts,
    constants: &ModelConstants,
) -> TcoResult<PueEstimate> {
    if it_power_kw <= Decimal::ZERO {
        return Err(TcoError::configuration(
            spec.label(),
            "PUE requires a positive IT power",
        ));
    }

    let target = match spec {
        EquipmentSpec::AirCooling(s) => s.target_pue,
        EquipmentSpec::ImmersionCooling(s) => s.target_pue,
    };

    let estimate = match target {
        Some(pue) => PueEstimate {
            pue,
            it_power_kw,
            cooling_overhead_kw: mul(it_power_kw, pue - Decimal::ONE, "cooling overhead")?,
            distribution_losses_kw: Decimal::ZERO,
            total_facility_power_kw: mul(it_power_kw, pue, "facility power")?,
            source: PueSource::Target,
        },
        None => match spec {
            EquipmentSpec::AirCooling(s) => air_budget(s, it_power_kw)?,
            EquipmentSpec::ImmersionCooling(s) => immersion_budget(s, it_power_kw, constants)?,
        },
    };

    if estimate.pue < Decimal::ONE {
        return Err(TcoError::configuration(
            spec.label(),
            format!("PUE of {} is below 1.0", estimate.pue),
        ));
    }

    debug!(scenario = spec.label(), pue = %estimate.pue, "estimated PUE");
    Ok(estimate)
}

/// Warning text when a PUE falls outside the typical band for its cooling type.
pub fn plausibility_warning(
    label: &str,
    cooling_type: CoolingType,
    pue: Decimal,
    constants: &ModelConstants,
) -> Option<String> {
    let band = typical_range(cooling_type, constants);
    if band.contains(pue) {
        return None;
    }
    Some(format!(
        "{label}: PUE {} is outside the typical {}-{} range",
        pue.round_dp(3),
        band.min,
        band.max
    ))
}

fn budget(
    it_power_kw: Kilowatts,
    cooling_overhead_kw: Kilowatts,
    chain_efficiency: Decimal,
    label: &str,
) -> TcoResult<PueEstimate> {
    if chain_efficiency <= Decimal::ZERO {
        return Err(TcoError::configuration(
            label,
            "power distribution efficiency must be positive",
        ));
    }
    let before_losses = add(it_power_kw, cooling_overhead_kw, "facility power")?;
    let total_facility_power_kw = div(before_losses, chain_efficiency, "distribution losses")?;
    Ok(PueEstimate {
        pue: div(total_facility_power_kw, it_power_kw, "PUE")?,
        it_power_kw,
        cooling_overhead_kw,
        distribution_losses_kw: sub(total_facility_power_kw, before_losses, "distribution losses")?,
        total_facility_power_kw,
        source: PueSource::Derived,
    })
}

fn air_budget(spec: &AirCoolingSpec, it_power_kw: Kilowatts) -> TcoResult<PueEstimate> {
    let effective_cop = mul(spec.hvac_cop, spec.hvac_efficiency, "HVAC COP")?;
    if effective_cop <= Decimal::ZERO {
        return Err(TcoError::configuration(
            &spec.label,
            "HVAC COP x efficiency must be positive",
        ));
    }
    let cooling = div(it_power_kw, effective_cop, "cooling overhead")?;
    budget(
        it_power_kw,
        cooling,
        mul(spec.power_distribution_efficiency, spec.ups_efficiency, "distribution chain")?,
        &spec.label,
    )
}

fn immersion_budget(
    spec: &ImmersionCoolingSpec,
    it_power_kw: Kilowatts,
    constants: &ModelConstants,
) -> TcoResult<PueEstimate> {
    let hydraulic = mul(spec.pump_efficiency, spec.heat_exchanger_efficiency, "hydraulic chain")?;
    if hydraulic <= Decimal::ZERO {
        return Err(TcoError::configuration(
            &spec.label,
            "pump x heat-exchanger efficiency must be positive",
        ));
    }
    let circulation = mul(it_power_kw, constants.circulation_power_fraction, "circulation power")?;
    let cooling = div(circulation, hydraulic, "circulation power")?;
    budget(
        it_power_kw,
        cooling,
        spec.power_distribution_efficiency,
        &spec.label,
    )
}
