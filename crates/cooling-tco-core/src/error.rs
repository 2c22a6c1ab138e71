use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TcoError {
    #[error("Validation failed: {}", format_violations(.0))]
    Validation(Vec<Violation>),

    #[error("Configuration error in {context}: {reason}")]
    Configuration { context: String, reason: String },

    #[error("Calculation error in {operation}: {detail}")]
    Calculation { operation: String, detail: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl TcoError {
    pub fn configuration(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn calculation(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Calculation {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    /// Violations carried by a validation failure; empty for other kinds.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation(violations) => violations,
            _ => &[],
        }
    }
}

impl From<serde_json::Error> for TcoError {
    fn from(e: serde_json::Error) -> Self {
        TcoError::SerializationError(e.to_string())
    }
}

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted path of the offending field, e.g. `baseline.rack_count`
    pub field: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required value was absent
    Missing,
    /// Value outside the documented inclusive range
    OutOfRange {
        min: Decimal,
        max: Decimal,
        actual: Decimal,
    },
    /// Value is not one of the recognised options (e.g. unknown region code)
    Unrecognized { value: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Missing => write!(f, "{} is required", self.field),
            ViolationKind::OutOfRange { min, max, actual } => write!(
                f,
                "{} = {actual} is outside [{min}, {max}]",
                self.field
            ),
            ViolationKind::Unrecognized { value } => {
                write!(f, "{} has unrecognised value '{value}'", self.field)
            }
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validation_message_lists_every_field() {
        let err = TcoError::Validation(vec![
            Violation {
                field: "baseline.rack_count".into(),
                kind: ViolationKind::OutOfRange {
                    min: dec!(1),
                    max: dec!(1000),
                    actual: dec!(0),
                },
            },
            Violation {
                field: "financial.analysis_years".into(),
                kind: ViolationKind::Missing,
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("baseline.rack_count = 0 is outside [1, 1000]"));
        assert!(msg.contains("financial.analysis_years is required"));
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_non_validation_errors_have_no_violations() {
        let err = TcoError::configuration("pue", "PUE below 1.0");
        assert!(err.violations().is_empty());
        assert_eq!(err.to_string(), "Configuration error in pue: PUE below 1.0");
    }
}
