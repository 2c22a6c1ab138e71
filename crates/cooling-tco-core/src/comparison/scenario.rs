use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::arithmetic::{add, mul, sum};
use crate::costing::equipment::{resolve_equipment, CapexBreakdown};
use crate::costing::opex::{capital_costs, project_opex, CostBreakdown};
use crate::costing::pue::{estimate_pue, PueEstimate};
use crate::time_value::discount_series;
use crate::types::{CostCategory, Kilowatts, KilowattHours, Money, Rate};
use crate::validation::{CoolingType, EquipmentSpec, FinancialAssumptions, ModelConstants};
use crate::TcoResult;

/// Costs of one scenario in one year, in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyCashFlow {
    /// 0 = acquisition, 1..=N = operating years
    pub year: u32,
    pub costs: CostBreakdown,
    /// Undiscounted sum of `costs`
    pub total: Money,
    pub discount_factor: Rate,
    pub discounted_total: Money,
}

impl YearlyCashFlow {
    pub fn amount(&self, category: CostCategory) -> Money {
        self.costs.get(&category).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Full cost picture of one cooling strategy over the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub label: String,
    pub cooling_type: CoolingType,
    pub it_power_kw: Kilowatts,
    pub server_count: u32,
    pub pue: PueEstimate,
    pub capex: CapexBreakdown,
    pub annual_energy_kwh: KilowattHours,
    /// Years 0..=N in order
    pub cash_flows: Vec<YearlyCashFlow>,
    pub total_capex: Money,
    pub total_opex: Money,
    /// Undiscounted CAPEX + OPEX
    pub total_cost: Money,
    /// Present value of all costs
    pub npv_cost: Money,
    pub category_totals: BTreeMap<CostCategory, Money>,
}

impl ScenarioResult {
    /// Undiscounted totals per year, index = year.
    pub fn annual_totals(&self) -> Vec<Money> {
        self.cash_flows.iter().map(|cf| cf.total).collect()
    }

    /// Sum of one category across every year.
    pub fn category_total(&self, category: CostCategory) -> Money {
        self.cash_flows.iter().map(|cf| cf.amount(category)).sum()
    }
}

/// Resolve, estimate, project and discount a single scenario.
pub fn build_scenario(
    spec: &EquipmentSpec,
    financial: &FinancialAssumptions,
    constants: &ModelConstants,
) -> TcoResult<ScenarioResult> {
    let equipment = resolve_equipment(spec, constants)?;
    let pue = estimate_pue(spec, equipment.it_power_kw, constants)?;
    let opex = project_opex(spec, &equipment, &pue, financial, constants)?;

    let fx = financial.exchange_rate;
    let mut yearly_costs: Vec<CostBreakdown> = Vec::with_capacity(opex.years.len() + 1);
    yearly_costs.push(capital_costs(&equipment.capex));
    yearly_costs.extend(opex.years);
    for costs in &mut yearly_costs {
        for amount in costs.values_mut() {
            *amount = mul(*amount, fx, "currency conversion")?;
        }
    }

    let totals: Vec<Money> = yearly_costs
        .iter()
        .map(|c| sum(c.values(), "annual total"))
        .collect::<TcoResult<_>>()?;
    let discounted = discount_series(&totals, financial.discount_rate)?;

    let cash_flows: Vec<YearlyCashFlow> = yearly_costs
        .into_iter()
        .zip(totals)
        .zip(discounted.discount_factors.iter().zip(&discounted.present_values))
        .enumerate()
        .map(|(year, ((costs, total), (factor, pv)))| YearlyCashFlow {
            year: year as u32,
            costs,
            total,
            discount_factor: *factor,
            discounted_total: *pv,
        })
        .collect();

    let category_totals: BTreeMap<CostCategory, Money> = CostCategory::ALL
        .iter()
        .map(|&category| -> TcoResult<(CostCategory, Money)> {
            let amounts: Vec<Money> = cash_flows.iter().map(|cf| cf.amount(category)).collect();
            Ok((category, sum(&amounts, "category total")?))
        })
        .collect::<TcoResult<_>>()?;

    let total_capex = category_totals[&CostCategory::Capital];
    let total_opex = sum(
        category_totals
            .iter()
            .filter(|(category, _)| category.is_operating())
            .map(|(_, amount)| amount),
        "operating total",
    )?;

    Ok(ScenarioResult {
        label: spec.label().to_string(),
        cooling_type: spec.cooling_type(),
        it_power_kw: equipment.it_power_kw,
        server_count: equipment.server_count,
        pue,
        capex: equipment.capex.scaled(fx)?,
        annual_energy_kwh: opex.annual_energy_kwh,
        cash_flows,
        total_capex,
        total_opex,
        total_cost: add(total_capex, total_opex, "total cost")?,
        npv_cost: discounted.total,
        category_totals,
    })
}
