use std::path::PathBuf;

use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::info;

use cooling_tco_core::comparison::analyze;
use cooling_tco_core::inputs::ComparisonInput;
use cooling_tco_core::validation::validate;
use cooling_tco_core::AssumptionSet;

use crate::cache::ResultCache;
use crate::input;

/// Arguments for an air-vs-immersion comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON or YAML file with baseline, alternative and financial sections
    /// (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Discount rate override (e.g. 0.08 for 8%)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Analysis horizon override in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Region code override (e.g. US, EU, UK)
    #[arg(long)]
    pub region: Option<String>,

    /// Directory holding results keyed by input fingerprint
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

pub fn read_comparison(path: Option<&str>) -> Result<ComparisonInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_document(path)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(serde_json::from_value(data)?)
    } else {
        Err("Provide --input <file> or pipe a comparison document on stdin".into())
    }
}

pub fn run_compare(
    args: CompareArgs,
    assumptions: &AssumptionSet,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut comparison = read_comparison(args.input.as_deref())?;
    if let Some(rate) = args.discount_rate {
        comparison.financial.discount_rate = Some(rate);
    }
    if let Some(years) = args.years {
        comparison.financial.analysis_years = Some(years);
    }
    if let Some(region) = args.region {
        comparison.financial.region = Some(region);
    }

    let cache = match args.cache_dir {
        Some(dir) => {
            let validated = validate(
                &comparison.baseline,
                &comparison.alternative,
                &comparison.financial,
                assumptions,
            )?;
            Some((ResultCache::new(dir), validated.fingerprint()?))
        }
        None => None,
    };

    if let Some((cache, fingerprint)) = &cache {
        if let Some(hit) = cache.read(fingerprint) {
            info!(%fingerprint, "using cached result");
            return Ok(hit);
        }
    }

    let output = serde_json::to_value(analyze(&comparison, assumptions)?)?;
    if let Some((cache, fingerprint)) = &cache {
        cache.write(fingerprint, &output);
    }
    Ok(output)
}
