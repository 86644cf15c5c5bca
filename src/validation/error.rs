use std::fmt;
use thiserror::Error;

use crate::loader::LoadError;

/// A single validation violation with structured context
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// JSON pointer to the violating value in the data
    pub instance_path: String,
    /// JSON pointer to the violated keyword in the schema
    pub schema_path: String,
    pub message: String,
    /// For `oneOf`/`anyOf` failures, the errors of the individual branches
    pub branches: Vec<Violation>,
}

impl Violation {
    pub fn is_combinator(&self) -> bool {
        self.schema_path.ends_with("/oneOf") || self.schema_path.ends_with("/anyOf")
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = if self.instance_path.is_empty() {
            "(root)"
        } else {
            &self.instance_path
        };
        write!(f, "  {at}: {} [{}]", self.message, self.schema_path)?;
        for branch in &self.branches {
            let at = if branch.instance_path.is_empty() {
                "(root)"
            } else {
                &branch.instance_path
            };
            write!(f, "\n    - {at}: {} [{}]", branch.message, branch.schema_path)?;
        }
        Ok(())
    }
}

/// Collection of validation violations
#[derive(Debug, Clone, Default)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The data did not conform to the schema
    #[error("Validation failed against {schema}:\n{violations}")]
    ValidationFailed {
        schema: String,
        violations: ValidationViolations,
    },

    #[error("Failed to load {what}: {source}")]
    Load {
        what: &'static str,
        #[source]
        source: LoadError,
    },

    #[error("Failed to compile schema {schema}: {reason}")]
    ValidatorBuild { schema: String, reason: String },

    #[error("Invalid base URI '{uri}': {reason}")]
    InvalidBaseUri { uri: String, reason: String },
}

impl SchemaValidationError {
    /// The violations, if this is a validation failure
    pub fn violations(&self) -> Option<&ValidationViolations> {
        match self {
            SchemaValidationError::ValidationFailed { violations, .. } => Some(violations),
            _ => None,
        }
    }
}
