use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use cooling_tco_core::sensitivity::{run_sensitivity as sweep, SensitivityInput};
use cooling_tco_core::{AssumptionSet, SensitivityVariable};

use crate::commands::compare::read_comparison;

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// First sensitivity variable in format name:min:max:step
    /// (e.g. "discount_rate:0.04:0.12:0.02"). Names: discount_rate, energy_escalation,
    /// maintenance_escalation, labor_escalation, energy_cost_per_kwh, labor_rate_per_hour
    #[arg(long)]
    pub var1: String,

    /// Second sensitivity variable (optional, creates a 2D table)
    #[arg(long)]
    pub var2: Option<String>,

    /// Path to JSON or YAML file with the base comparison (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Serialize)]
struct SensitivityReport {
    var1_name: String,
    var2_name: Option<String>,
    base_case_npv: Decimal,
    failed_points: usize,
    results: Vec<SensitivityRow>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SensitivityRow {
    var1_value: Decimal,
    var2_value: Option<Decimal>,
    npv_savings: Option<Decimal>,
    payback_years: Option<Decimal>,
}

fn parse_sens_var(spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            spec
        )
        .into());
    }
    Ok(SensitivityVariable {
        name: parts[0].to_string(),
        min: parts[1].parse()?,
        max: parts[2].parse()?,
        step: parts[3].parse()?,
    })
}

pub fn run_sensitivity(
    args: SensitivityArgs,
    assumptions: &AssumptionSet,
) -> Result<Value, Box<dyn std::error::Error>> {
    let variable_1 = parse_sens_var(&args.var1)?;
    let variable_2 = args.var2.as_deref().map(parse_sens_var).transpose()?;
    let comparison = read_comparison(args.input.as_deref())?;

    let output = sweep(
        &SensitivityInput {
            comparison,
            variable_1,
            variable_2,
        },
        assumptions,
    )?;
    let grid = output.result;

    let mut results = Vec::new();
    for (i, v1) in grid.variable_1_values.iter().enumerate() {
        for (j, (npv, payback)) in grid.npv_matrix[i].iter().zip(&grid.payback_matrix[i]).enumerate() {
            results.push(SensitivityRow {
                var1_value: *v1,
                var2_value: grid.variable_2_values.get(j).copied(),
                npv_savings: *npv,
                payback_years: *payback,
            });
        }
    }

    let report = SensitivityReport {
        var1_name: grid.variable_1_name,
        var2_name: grid.variable_2_name,
        base_case_npv: grid.base_case_value,
        failed_points: grid.failed_points,
        results,
        warnings: output.warnings,
    };
    Ok(serde_json::to_value(report)?)
}
