pub mod dataset;
pub mod error_utils;
pub mod loader;
pub mod validation;

pub use loader::{DocumentLoader, LoadError, LoaderOptions, Source, load_yaml};
pub use validation::{SchemaValidationError, SchemaValidator, ValidatorOptions, validate_yaml};
