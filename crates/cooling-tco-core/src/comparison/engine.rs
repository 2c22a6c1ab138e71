use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::arithmetic::{div, mul, sub};
use crate::assumptions::AssumptionSet;
use crate::comparison::payback::{breakeven_year, cumulative_savings, payback_period};
use crate::comparison::scenario::{build_scenario, ScenarioResult};
use crate::costing::pue::plausibility_warning;
use crate::error::TcoError;
use crate::inputs::{ComparisonInput, EquipmentConfiguration, FinancialParameters};
use crate::time_value::discount_series;
use crate::types::{with_metadata, ComputationOutput, Currency, KilowattHours, Money, Rate, Years};
use crate::validation::{validate, ModelConstants, ValidatedInput};
use crate::TcoResult;

/// Allowed relative gap between the NPV of the savings series and the
/// difference of the two scenario NPVs.
pub const NPV_IDENTITY_TOLERANCE: Decimal = dec!(0.000000001);

const KG_PER_TONNE: Decimal = dec!(1000);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySavings {
    pub year: u32,
    pub baseline_cost: Money,
    pub alternative_cost: Money,
    /// Baseline minus alternative; negative when the alternative costs more
    pub savings: Money,
    pub cumulative_savings: Money,
    pub discounted_savings: Money,
}

/// Side-by-side result of one air-vs-immersion comparison.
///
/// All amounts are unrounded and expressed in `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub baseline: ScenarioResult,
    pub alternative: ScenarioResult,
    pub currency: Currency,
    pub currency_code: String,
    pub analysis_years: u32,
    pub discount_rate: Rate,
    /// Years 0..=N
    pub yearly: Vec<YearlySavings>,
    pub npv_savings: Money,
    pub total_savings: Money,
    /// Undiscounted savings as a percentage of the baseline total cost
    pub savings_pct: Decimal,
    /// Alternative CAPEX minus baseline CAPEX
    pub capex_premium: Money,
    /// `None` when cumulative savings never turn non-negative within the horizon
    pub payback_period_years: Option<Years>,
    pub breakeven_year: Option<u32>,
    pub breakeven: bool,
    pub annual_energy_savings_kwh: KilowattHours,
    /// Baseline PUE minus alternative PUE
    pub pue_improvement: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_co2_savings_tonnes: Option<Decimal>,
    /// NPV of savings divided by the CAPEX premium, when the premium is positive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_on_premium: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the inputs and compare the two scenarios.
///
/// Validation failures surface as `TcoError::Validation` before any cost is
/// computed. An error from either scenario aborts the whole comparison.
#[instrument(skip_all, fields(baseline = baseline.label(), alternative = alternative.label()))]
pub fn compare(
    baseline: &EquipmentConfiguration,
    alternative: &EquipmentConfiguration,
    financial: &FinancialParameters,
    assumptions: &AssumptionSet,
) -> TcoResult<ComparisonResult> {
    let validated = validate(baseline, alternative, financial, assumptions)?;
    compare_validated(&validated)
}

/// Compare two scenarios that have already passed validation.
pub fn compare_validated(input: &ValidatedInput) -> TcoResult<ComparisonResult> {
    let financial = &input.financial;
    let baseline = build_scenario(&input.baseline, financial, &input.constants)?;
    let alternative = build_scenario(&input.alternative, financial, &input.constants)?;

    let savings: Vec<Money> = baseline
        .annual_totals()
        .into_iter()
        .zip(alternative.annual_totals())
        .map(|(base, alt)| sub(base, alt, "annual savings"))
        .collect::<TcoResult<_>>()?;
    let cumulative = cumulative_savings(&savings)?;
    let discounted = discount_series(&savings, financial.discount_rate)?;

    let npv_savings = discounted.total;
    let npv_difference = sub(baseline.npv_cost, alternative.npv_cost, "npv of savings")?;
    check_npv_identity(npv_savings, npv_difference)?;

    let payback_period_years = payback_period(&savings, &cumulative);
    let breakeven_year = breakeven_year(&cumulative);
    debug!(
        npv_savings = %npv_savings,
        payback = ?payback_period_years,
        "compared scenarios"
    );

    let yearly: Vec<YearlySavings> = baseline
        .cash_flows
        .iter()
        .zip(&alternative.cash_flows)
        .zip(savings.iter().zip(&cumulative))
        .zip(&discounted.present_values)
        .map(|(((base, alt), (s, cum)), pv)| YearlySavings {
            year: base.year,
            baseline_cost: base.total,
            alternative_cost: alt.total,
            savings: *s,
            cumulative_savings: *cum,
            discounted_savings: *pv,
        })
        .collect();

    let total_savings = cumulative.last().copied().unwrap_or(Decimal::ZERO);
    let savings_pct = if baseline.total_cost.is_zero() {
        Decimal::ZERO
    } else {
        let share = div(total_savings, baseline.total_cost, "savings percentage")?;
        mul(share, dec!(100), "savings percentage")?
    };
    let capex_premium = sub(alternative.total_capex, baseline.total_capex, "capex premium")?;
    let roi_on_premium = if capex_premium > Decimal::ZERO {
        Some(div(npv_savings, capex_premium, "return on premium")?)
    } else {
        None
    };

    let annual_energy_savings_kwh = sub(
        baseline.annual_energy_kwh,
        alternative.annual_energy_kwh,
        "energy savings",
    )?;
    let annual_co2_savings_tonnes = financial
        .carbon_intensity_kg_per_kwh
        .map(|kg_per_kwh| {
            let kg = mul(annual_energy_savings_kwh, kg_per_kwh, "carbon savings")?;
            div(kg, KG_PER_TONNE, "carbon savings")
        })
        .transpose()?;
    let pue_improvement = baseline.pue.pue - alternative.pue.pue;

    Ok(ComparisonResult {
        currency: financial.currency.clone(),
        currency_code: financial.currency.code().to_string(),
        analysis_years: financial.analysis_years,
        discount_rate: financial.discount_rate,
        yearly,
        npv_savings,
        total_savings,
        savings_pct,
        capex_premium,
        breakeven: payback_period_years.is_some(),
        payback_period_years,
        breakeven_year,
        annual_energy_savings_kwh,
        pue_improvement,
        annual_co2_savings_tonnes,
        roi_on_premium,
        baseline,
        alternative,
    })
}

/// Run a comparison and wrap it with methodology, warnings and timing.
#[instrument(skip_all)]
pub fn analyze(
    input: &ComparisonInput,
    assumptions: &AssumptionSet,
) -> TcoResult<ComputationOutput<ComparisonResult>> {
    let start = Instant::now();

    let validated = validate(
        &input.baseline,
        &input.alternative,
        &input.financial,
        assumptions,
    )?;
    let result = compare_validated(&validated)?;
    let warnings = collect_warnings(&result, &validated.constants);
    for w in &warnings {
        warn!("{w}");
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cooling TCO comparison (discounted cash flow, year-end convention)",
        &validated,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_npv_identity(npv_savings: Money, expected: Money) -> TcoResult<()> {
    let scale = expected.abs().max(Decimal::ONE);
    let gap = sub(npv_savings, expected, "npv of savings")?.abs();
    if gap > mul(NPV_IDENTITY_TOLERANCE, scale, "npv of savings")? {
        return Err(TcoError::calculation(
            "npv of savings",
            format!("savings NPV {npv_savings} differs from scenario NPV difference {expected}"),
        ));
    }
    Ok(())
}

fn collect_warnings(result: &ComparisonResult, constants: &ModelConstants) -> Vec<String> {
    let mut warnings = Vec::new();

    for scenario in [&result.baseline, &result.alternative] {
        let pue = scenario.pue.pue;
        if let Some(w) = plausibility_warning(&scenario.label, scenario.cooling_type, pue, constants) {
            warnings.push(w);
        }
    }
    if result.pue_improvement <= Decimal::ZERO {
        warnings.push(format!(
            "{} PUE {} is not lower than {} PUE {}",
            result.alternative.label,
            result.alternative.pue.pue.round_dp(3),
            result.baseline.label,
            result.baseline.pue.pue.round_dp(3)
        ));
    }
    if result.payback_period_years.is_none() {
        warnings.push(format!(
            "Payback not achieved within the {}-year horizon",
            result.analysis_years
        ));
    }
    if result.npv_savings <= Decimal::ZERO {
        warnings.push(format!(
            "NPV of savings is {} {}; the alternative does not pay off at a discount rate of {}",
            result.npv_savings.round_dp(2),
            result.currency_code,
            result.discount_rate.normalize()
        ));
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
