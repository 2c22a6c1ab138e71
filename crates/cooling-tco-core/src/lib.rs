mod arithmetic;
pub mod assumptions;
pub mod comparison;
pub mod costing;
pub mod error;
pub mod inputs;
pub mod time_value;
pub mod types;
pub mod validation;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use assumptions::AssumptionSet;
pub use comparison::{analyze, compare, ComparisonResult};
pub use error::TcoError;
pub use types::*;

/// Standard result type for all cooling-tco operations
pub type TcoResult<T> = Result<T, TcoError>;
