use clap::Args;
use serde_json::{json, Value};

use cooling_tco_core::AssumptionSet;

use crate::input;

/// Arguments for printing the active assumption set
#[derive(Args)]
pub struct AssumptionsArgs {
    /// Print only the regional rate table
    #[arg(long)]
    pub regions: bool,
}

/// Load an assumption set from a JSON/YAML file, or fall back to the built-in defaults.
///
/// Fields absent from the file keep their default values.
pub fn load_assumptions(path: Option<&str>) -> Result<AssumptionSet, Box<dyn std::error::Error>> {
    match path {
        Some(path) => input::file::read_document(path),
        None => Ok(AssumptionSet::default()),
    }
}

pub fn run_assumptions(
    args: AssumptionsArgs,
    assumptions: &AssumptionSet,
) -> Result<Value, Box<dyn std::error::Error>> {
    if args.regions {
        let rows: Vec<Value> = assumptions
            .regions
            .iter()
            .map(|(code, region)| {
                json!({
                    "code": code,
                    "name": region.name,
                    "energy_cost_per_kwh": region.energy_cost_per_kwh,
                    "labor_rate_per_hour": region.labor_rate_per_hour,
                    "carbon_intensity_kg_per_kwh": region.carbon_intensity_kg_per_kwh,
                })
            })
            .collect();
        return Ok(Value::Array(rows));
    }
    Ok(serde_json::to_value(assumptions)?)
}
