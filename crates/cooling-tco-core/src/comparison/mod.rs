pub mod engine;
pub mod payback;
pub mod scenario;

pub use engine::{analyze, compare, compare_validated, ComparisonResult, YearlySavings};
pub use scenario::{build_scenario, ScenarioResult, YearlyCashFlow};
