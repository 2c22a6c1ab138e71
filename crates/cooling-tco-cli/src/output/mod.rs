pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use clap::ValueEnum;
use serde_json::Value;

/// Rendering for command results on stdout.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Full result envelope as pretty JSON
    #[default]
    Json,
    /// Field/value table plus one table per row section (yearly savings, grid rows)
    Table,
    /// Row sections as CSV, else field/value records
    Csv,
    /// Headline figure only (NPV of savings, PUE)
    Minimal,
}

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}
