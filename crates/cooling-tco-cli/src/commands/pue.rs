use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use cooling_tco_core::costing::equipment::{resolve_equipment, CapexBreakdown};
use cooling_tco_core::costing::pue::{estimate_pue, plausibility_warning, typical_range, PueEstimate};
use cooling_tco_core::inputs::EquipmentConfiguration;
use cooling_tco_core::validation::{validate_equipment, CoolingType};
use cooling_tco_core::AssumptionSet;

use crate::input;

/// Arguments for estimating the PUE of one configuration
#[derive(Args)]
pub struct PueArgs {
    /// Path to JSON or YAML file with one equipment configuration
    /// (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Serialize)]
struct PueReport {
    label: String,
    cooling_type: CoolingType,
    server_count: u32,
    #[serde(flatten)]
    estimate: PueEstimate,
    typical_low: Decimal,
    typical_high: Decimal,
    capex: CapexBreakdown,
}

#[derive(Serialize)]
struct PueOutput {
    result: PueReport,
    warnings: Vec<String>,
}

pub fn run_pue(args: PueArgs, assumptions: &AssumptionSet) -> Result<Value, Box<dyn std::error::Error>> {
    let config: EquipmentConfiguration = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("Provide --input <file> or pipe an equipment configuration on stdin".into());
    };

    let (spec, constants) = validate_equipment(&config, assumptions)?;
    let equipment = resolve_equipment(&spec, &constants)?;
    let estimate = estimate_pue(&spec, equipment.it_power_kw, &constants)?;

    let cooling_type = spec.cooling_type();
    let typical = typical_range(cooling_type, &constants);
    let warnings = plausibility_warning(spec.label(), cooling_type, estimate.pue, &constants)
        .into_iter()
        .collect();

    let output = PueOutput {
        result: PueReport {
            label: spec.label().to_string(),
            cooling_type,
            server_count: equipment.server_count,
            estimate,
            typical_low: typical.min,
            typical_high: typical.max,
            capex: equipment.capex,
        },
        warnings,
    };
    Ok(serde_json::to_value(output)?)
}
