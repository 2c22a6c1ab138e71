use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::arithmetic::add;
use crate::assumptions::AssumptionSet;
use crate::comparison::engine::compare_validated;
use crate::error::{TcoError, Violation, ViolationKind};
use crate::inputs::{ComparisonInput, FinancialParameters};
use crate::types::{with_metadata, ComputationOutput, Money, SensitivityVariable, Years};
use crate::validation::{validate, FinancialAssumptions};
use crate::TcoResult;

/// Upper bound on evaluated grid points per run.
pub const MAX_GRID_POINTS: usize = 10_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Financial inputs that can be swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    DiscountRate,
    EnergyEscalation,
    MaintenanceEscalation,
    LaborEscalation,
    EnergyCostPerKwh,
    LaborRatePerHour,
}

impl SweepParameter {
    pub const ALL: [SweepParameter; 6] = [
        SweepParameter::DiscountRate,
        SweepParameter::EnergyEscalation,
        SweepParameter::MaintenanceEscalation,
        SweepParameter::LaborEscalation,
        SweepParameter::EnergyCostPerKwh,
        SweepParameter::LaborRatePerHour,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SweepParameter::DiscountRate => "discount_rate",
            SweepParameter::EnergyEscalation => "energy_escalation",
            SweepParameter::MaintenanceEscalation => "maintenance_escalation",
            SweepParameter::LaborEscalation => "labor_escalation",
            SweepParameter::EnergyCostPerKwh => "energy_cost_per_kwh",
            SweepParameter::LaborRatePerHour => "labor_rate_per_hour",
        }
    }

    /// Value the parameter resolves to in the unswept comparison.
    fn base_value(self, financial: &FinancialAssumptions) -> Decimal {
        match self {
            SweepParameter::DiscountRate => financial.discount_rate,
            SweepParameter::EnergyEscalation => financial.energy_escalation,
            SweepParameter::MaintenanceEscalation => financial.maintenance_escalation,
            SweepParameter::LaborEscalation => financial.labor_escalation,
            SweepParameter::EnergyCostPerKwh => financial.energy_cost_per_kwh,
            SweepParameter::LaborRatePerHour => financial.labor_rate_per_hour,
        }
    }

    fn apply(self, financial: &mut FinancialParameters, value: Decimal) {
        match self {
            SweepParameter::DiscountRate => financial.discount_rate = Some(value),
            SweepParameter::EnergyEscalation => financial.energy_escalation = value,
            SweepParameter::MaintenanceEscalation => financial.maintenance_escalation = value,
            SweepParameter::LaborEscalation => financial.labor_escalation = value,
            SweepParameter::EnergyCostPerKwh => financial.energy_cost_per_kwh = Some(value),
            SweepParameter::LaborRatePerHour => financial.labor_rate_per_hour = Some(value),
        }
    }
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepParameter {
    type Err = TcoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SweepParameter::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                TcoError::Validation(vec![Violation {
                    field: "sensitivity.variable".into(),
                    kind: ViolationKind::Unrecognized { value: s.to_string() },
                }])
            })
    }
}

/// One- or two-way sweep over a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub comparison: ComparisonInput,
    /// Rows of the result grid
    pub variable_1: SensitivityVariable,
    /// Columns; omitted for a one-way sweep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_2: Option<SensitivityVariable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_2_name: Option<String>,
    pub variable_1_values: Vec<Decimal>,
    /// Empty for a one-way sweep, whose matrices have a single column
    pub variable_2_values: Vec<Decimal>,
    /// `npv_matrix[i][j]` is the NPV of savings at row i, column j; `None`
    /// where that grid point failed
    pub npv_matrix: Vec<Vec<Option<Money>>>,
    /// Payback years; `None` where the grid point failed or payback was not
    /// achieved within the horizon
    pub payback_matrix: Vec<Vec<Option<Years>>>,
    /// NPV of savings for the unswept input
    pub base_case_value: Money,
    /// Grid cell closest to the unswept input (row, col)
    pub base_case_position: (usize, usize),
    pub failed_points: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate the comparison over a grid of financial parameter values.
///
/// Each grid point is validated independently, so values outside the
/// configured bounds fail that point only. Failures are reported in the
/// warnings and leave an empty cell.
#[instrument(skip_all, fields(variable_1 = %input.variable_1.name))]
pub fn run_sensitivity(
    input: &SensitivityInput,
    assumptions: &AssumptionSet,
) -> TcoResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let p1: SweepParameter = input.variable_1.name.parse()?;
    let p2: Option<SweepParameter> = input
        .variable_2
        .as_ref()
        .map(|v| v.name.parse())
        .transpose()?;
    if p2 == Some(p1) {
        return Err(TcoError::configuration(
            "sensitivity",
            format!("{p1} cannot be swept against itself"),
        ));
    }

    let comparison = &input.comparison;
    let base_input = validate(
        &comparison.baseline,
        &comparison.alternative,
        &comparison.financial,
        assumptions,
    )?;
    let base_result = compare_validated(&base_input)?;

    let v1_values = generate_sweep_values(&input.variable_1)?;
    let v2_values = match &input.variable_2 {
        Some(var) => generate_sweep_values(var)?,
        None => Vec::new(),
    };
    // One-way sweeps evaluate a single column at the base value.
    let columns: Vec<Option<Decimal>> = if p2.is_some() {
        v2_values.iter().copied().map(Some).collect()
    } else {
        vec![None]
    };
    let points = v1_values.len() * columns.len();
    if points > MAX_GRID_POINTS {
        return Err(TcoError::configuration(
            "sensitivity",
            format!("{points} grid points exceed the limit of {MAX_GRID_POINTS}"),
        ));
    }

    // Pin the horizon so a swept discount rate never trips the pairing rule.
    let mut pinned = comparison.financial.clone();
    pinned.discount_rate = Some(base_input.financial.discount_rate);
    pinned.analysis_years = Some(base_input.financial.analysis_years);

    let mut npv_matrix = Vec::with_capacity(v1_values.len());
    let mut payback_matrix = Vec::with_capacity(v1_values.len());
    let mut failed_points = 0;

    for v1 in &v1_values {
        let mut npv_row = Vec::with_capacity(columns.len());
        let mut payback_row = Vec::with_capacity(columns.len());
        for v2 in &columns {
            let mut financial = pinned.clone();
            p1.apply(&mut financial, *v1);
            if let (Some(p2), Some(v2)) = (p2, v2) {
                p2.apply(&mut financial, *v2);
            }

            let evaluated = validate(
                &comparison.baseline,
                &comparison.alternative,
                &financial,
                assumptions,
            )
            .and_then(|v| compare_validated(&v));

            match evaluated {
                Ok(result) => {
                    npv_row.push(Some(result.npv_savings));
                    payback_row.push(result.payback_period_years);
                }
                Err(e) => {
                    failed_points += 1;
                    warnings.push(match (p2, v2) {
                        (Some(p2), Some(v2)) => {
                            format!("Evaluation failed at ({p1} = {v1}, {p2} = {v2}): {e}")
                        }
                        _ => format!("Evaluation failed at {p1} = {v1}: {e}"),
                    });
                    npv_row.push(None);
                    payback_row.push(None);
                }
            }
        }
        npv_matrix.push(npv_row);
        payback_matrix.push(payback_row);
    }
    debug!(points, failed_points, "sensitivity grid evaluated");

    let base_row = closest_index(&v1_values, p1.base_value(&base_input.financial));
    let base_col = match p2 {
        Some(p2) => closest_index(&v2_values, p2.base_value(&base_input.financial)),
        None => 0,
    };

    let output = SensitivityOutput {
        variable_1_name: p1.name().to_string(),
        variable_2_name: p2.map(|p| p.name().to_string()),
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        npv_matrix,
        payback_matrix,
        base_case_value: base_result.npv_savings,
        base_case_position: (base_row, base_col),
        failed_points,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        if p2.is_some() {
            "Two-way sensitivity of cooling TCO savings"
        } else {
            "One-way sensitivity of cooling TCO savings"
        },
        &serde_json::json!({
            "variable_1": input.variable_1,
            "variable_2": input.variable_2,
            "base": base_input,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Sweep values from min to max inclusive; max is appended when the step
/// does not land on it.
fn generate_sweep_values(var: &SensitivityVariable) -> TcoResult<Vec<Decimal>> {
    let context = format!("sensitivity variable {}", var.name);
    if var.step <= Decimal::ZERO {
        return Err(TcoError::configuration(context, "step must be positive"));
    }
    if var.min > var.max {
        return Err(TcoError::configuration(context, "min must be <= max"));
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        if values.len() > MAX_GRID_POINTS {
            return Err(TcoError::configuration(context, "too many sweep values for step"));
        }
        current = add(current, var.step, &context)?;
    }
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }
    Ok(values)
}

fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| v.checked_sub(target).map_or(Decimal::MAX, |d| d.abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
