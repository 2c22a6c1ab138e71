pub mod sweep;

pub use sweep::{run_sensitivity, SensitivityInput, SensitivityOutput, SweepParameter};
