use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::arithmetic::{add, mul};
use crate::costing::equipment::{CapexBreakdown, EquipmentCosts};
use crate::costing::pue::PueEstimate;
use crate::time_value::escalation_factor;
use crate::types::{CostCategory, KilowattHours, Money};
use crate::validation::{EquipmentSpec, FinancialAssumptions, ImmersionCoolingSpec, ModelConstants};
use crate::TcoResult;

/// Undiscounted amounts for one year, keyed by category.
pub type CostBreakdown = BTreeMap<CostCategory, Money>;

const MONTHS_PER_YEAR: u32 = 12;

/// Operating-cost projection for years 1..=N of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpexProjection {
    /// Index 0 holds year 1
    pub years: Vec<CostBreakdown>,
    /// Facility energy drawn per year at nameplate load
    pub annual_energy_kwh: KilowattHours,
}

/// Year-0 cost lines: capital only.
pub fn capital_costs(capex: &CapexBreakdown) -> CostBreakdown {
    let mut costs = CostBreakdown::new();
    costs.insert(CostCategory::Capital, capex.total);
    costs
}

/// Project energy, maintenance, labor and consumables for every operating year.
///
/// Escalation compounds from year 1. Consumable spikes land in the year whose
/// month window contains the cycle boundary; they are not smoothed.
pub fn project_opex(
    spec: &EquipmentSpec,
    equipment: &EquipmentCosts,
    pue: &PueEstimate,
    financial: &FinancialAssumptions,
    constants: &ModelConstants,
) -> TcoResult<OpexProjection> {
    let facility_kw = mul(equipment.it_power_kw, pue.pue, "facility power")?;
    let annual_energy_kwh = mul(facility_kw, constants.hours_per_year, "annual energy")?;
    let base_energy = mul(annual_energy_kwh, financial.energy_cost_per_kwh, "energy cost")?;
    let base_maintenance = mul(
        equipment.capex.total,
        spec.maintenance_fraction(),
        "maintenance cost",
    )?;
    let base_labor = mul(
        spec.annual_labor_hours(),
        financial.labor_rate_per_hour,
        "labor cost",
    )?;

    let mut years = Vec::with_capacity(financial.analysis_years as usize);
    for year in 1..=financial.analysis_years {
        let mut costs = CostBreakdown::new();
        costs.insert(
            CostCategory::Energy,
            escalate(base_energy, financial.energy_escalation, year, "energy")?,
        );
        costs.insert(
            CostCategory::Maintenance,
            escalate(
                base_maintenance,
                financial.maintenance_escalation,
                year,
                "maintenance",
            )?,
        );
        costs.insert(
            CostCategory::Labor,
            escalate(base_labor, financial.labor_escalation, year, "labor")?,
        );
        let consumables = match spec {
            EquipmentSpec::AirCooling(_) => Decimal::ZERO,
            EquipmentSpec::ImmersionCooling(tank) => consumables_for_year(tank, equipment, year)?,
        };
        costs.insert(CostCategory::Consumables, consumables);
        years.push(costs);
    }

    Ok(OpexProjection {
        years,
        annual_energy_kwh,
    })
}

/// Number of `cycle_months` boundaries falling in months `(12(y-1), 12y]`.
pub fn cycle_events_in_year(cycle_months: u32, year: u32) -> u32 {
    if cycle_months == 0 || year == 0 {
        return 0;
    }
    let end = year.saturating_mul(MONTHS_PER_YEAR);
    let start = end - MONTHS_PER_YEAR;
    end / cycle_months - start / cycle_months
}

fn escalate(base: Money, rate: Decimal, year: u32, category: &str) -> TcoResult<Money> {
    let factor = escalation_factor(rate, year)?;
    mul(base, factor, &format!("{category} escalation in year {year}"))
}

fn consumables_for_year(
    spec: &ImmersionCoolingSpec,
    equipment: &EquipmentCosts,
    year: u32,
) -> TcoResult<Money> {
    let op = "consumables";
    let fill_cost = mul(equipment.coolant_fill_liters, spec.coolant_cost_per_liter, op)?;
    let replacement_cost = mul(fill_cost, spec.coolant_replacement_fraction, op)?;
    let filtration_cost = mul(Decimal::from(spec.tank_count), spec.filtration_cost_per_tank, op)?;

    let replacements = cycle_events_in_year(spec.coolant_replacement_cycle_months, year);
    let filtrations = cycle_events_in_year(spec.filtration_cycle_months, year);

    add(
        mul(replacement_cost, Decimal::from(replacements), op)?,
        mul(filtration_cost, Decimal::from(filtrations), op)?,
        op,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::AssumptionSet;
    use crate::costing::equipment::resolve_equipment;
    use crate::costing::pue::estimate_pue;
    use crate::error::TcoError;
    use crate::inputs::{
        AirCoolingConfig, EquipmentConfiguration, FinancialParameters, ImmersionCoolingConfig,
    };
    use crate::validation::{validate, ValidatedInput};
    use rust_decimal_macros::dec;

    fn validated(financial: FinancialParameters, tank: ImmersionCoolingConfig) -> ValidatedInput {
        validate(
            &EquipmentConfiguration::AirCooling(AirCoolingConfig {
                hvac_cop: Some(dec!(2.5)),
                ..AirCoolingConfig::new(100, 15, dec!(1.0), 1)
            }),
            &EquipmentConfiguration::ImmersionCooling(tank),
            &financial,
            &AssumptionSet::default(),
        )
        .unwrap()
    }

    fn us_financial() -> FinancialParameters {
        FinancialParameters {
            discount_rate: Some(dec!(0.08)),
            analysis_years: Some(5),
            energy_escalation: dec!(0.03),
            maintenance_escalation: dec!(0.025),
            labor_escalation: dec!(0.04),
            region: Some("US".into()),
            ..FinancialParameters::default()
        }
    }

    fn project(v: &ValidatedInput, spec: &EquipmentSpec) -> OpexProjection {
        let eq = resolve_equipment(spec, &v.constants).unwrap();
        let pue = estimate_pue(spec, eq.it_power_kw, &v.constants).unwrap();
        project_opex(spec, &eq, &pue, &v.financial, &v.constants).unwrap()
    }

    #[test]
    fn test_one_entry_per_operating_year() {
        let v = validated(us_financial(), ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1));
        let p = project(&v, &v.baseline);
        assert_eq!(p.years.len(), 5);
        assert!(p.years.iter().all(|y| !y.contains_key(&CostCategory::Capital)));
    }

    #[test]
    fn test_year_one_is_unescalated() {
        let v = validated(us_financial(), ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1));
        let p = project(&v, &v.baseline);
        // 1200 labor hours * $75
        assert_eq!(p.years[0][&CostCategory::Labor], dec!(90000));
        // Year 2 labor escalated once by 4%
        assert_eq!(p.years[1][&CostCategory::Labor], dec!(93600));
        // Year 3 compounds: 90000 * 1.04^2
        assert_eq!(p.years[2][&CostCategory::Labor], dec!(97344));
    }

    #[test]
    fn test_energy_cost_formula() {
        let v = validated(us_financial(), ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1));
        let spec = &v.baseline;
        let eq = resolve_equipment(spec, &v.constants).unwrap();
        let pue = estimate_pue(spec, eq.it_power_kw, &v.constants).unwrap();
        let p = project_opex(spec, &eq, &pue, &v.financial, &v.constants).unwrap();

        let expected = dec!(1500) * pue.pue * dec!(8760) * dec!(0.12);
        assert_eq!(p.years[0][&CostCategory::Energy], expected);
        assert_eq!(p.annual_energy_kwh, dec!(1500) * pue.pue * dec!(8760));
    }

    #[test]
    fn test_zero_escalation_keeps_costs_flat() {
        let mut fin = us_financial();
        fin.energy_escalation = Decimal::ZERO;
        fin.maintenance_escalation = Decimal::ZERO;
        fin.labor_escalation = Decimal::ZERO;
        fin.analysis_years = Some(10);
        // Filtration every 12 months keeps consumables identical across years
        let tank = ImmersionCoolingConfig {
            filtration_cycle_months: Some(12),
            coolant_replacement_cycle_months: Some(12),
            ..ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1)
        };
        let v = validated(fin, tank);
        for spec in [&v.baseline, &v.alternative] {
            let p = project(&v, spec);
            let first: Decimal = p.years[0].values().sum();
            for year in &p.years {
                assert_eq!(year.values().sum::<Decimal>(), first);
            }
        }
    }

    #[test]
    fn test_air_has_no_consumables() {
        let v = validated(us_financial(), ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1));
        let p = project(&v, &v.baseline);
        assert!(p.years.iter().all(|y| y[&CostCategory::Consumables].is_zero()));
    }

    #[test]
    fn test_coolant_replacement_spikes_on_cycle_boundary() {
        let tank = ImmersionCoolingConfig {
            coolant_replacement_cycle_months: Some(24),
            coolant_replacement_fraction: Some(dec!(0.10)),
            filtration_cost_per_tank: Some(Decimal::ZERO),
            ..ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1)
        };
        let v = validated(us_financial(), tank);
        let p = project(&v, &v.alternative);
        let consumables: Vec<Decimal> = p
            .years
            .iter()
            .map(|y| y[&CostCategory::Consumables])
            .collect();
        // 60,000 L * $25 * 10% = 150,000 at months 24 and 48
        assert_eq!(
            consumables,
            vec![
                Decimal::ZERO,
                dec!(150000),
                Decimal::ZERO,
                dec!(150000),
                Decimal::ZERO
            ]
        );
    }

    #[test]
    fn test_cycle_events_window() {
        // 18-month cycle: boundaries at 18, 36, 54
        assert_eq!(cycle_events_in_year(18, 1), 0);
        assert_eq!(cycle_events_in_year(18, 2), 1);
        assert_eq!(cycle_events_in_year(18, 3), 1);
        assert_eq!(cycle_events_in_year(18, 4), 0);
        assert_eq!(cycle_events_in_year(18, 5), 1);
        // Boundary exactly at month 12 belongs to year 1
        assert_eq!(cycle_events_in_year(12, 1), 1);
        // Six-month filtration happens twice a year
        assert_eq!(cycle_events_in_year(6, 3), 2);
        assert_eq!(cycle_events_in_year(0, 3), 0);
    }

    #[test]
    fn test_capital_costs_hold_only_capex() {
        let v = validated(us_financial(), ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1));
        let eq = resolve_equipment(&v.alternative, &v.constants).unwrap();
        let year0 = capital_costs(&eq.capex);
        assert_eq!(year0.len(), 1);
        assert_eq!(year0[&CostCategory::Capital], dec!(4715000));
    }

    #[test]
    fn test_energy_overflow_is_calculation_error() {
        let mut v = validated(us_financial(), ImmersionCoolingConfig::new(50, 30, dec!(1.0), 1));
        v.constants.hours_per_year = Decimal::MAX;
        let spec = &v.baseline;
        let eq = resolve_equipment(spec, &v.constants).unwrap();
        let pue = estimate_pue(spec, eq.it_power_kw, &v.constants).unwrap();
        let err = project_opex(spec, &eq, &pue, &v.financial, &v.constants).unwrap_err();
        assert!(matches!(err, TcoError::Calculation { .. }), "got {err}");
    }
}
