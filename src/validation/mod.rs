//! Schema validation: strictification, local `$ref` resolution and reporting

mod error;
pub mod error_reporter;
mod resolver;
mod strict;
mod validator;

#[cfg(test)]
mod tests;

pub use error::{SchemaValidationError, ValidationViolations, Violation};
pub use error_reporter::{SpannedDocument, ViolationDiagnostic};
pub use resolver::{DEFAULT_BASE_URI, LocalSchemaRetriever, ReferenceStore, SkippedSchema};
pub use strict::{enforce_no_additional_properties, is_object_schema, strictify};
pub use validator::{SchemaValidator, ValidatorOptions, validate_yaml};
