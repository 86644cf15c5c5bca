use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::{SchemaValidationError, ValidationViolations, Violation};
use super::resolver::{DEFAULT_BASE_URI, ReferenceStore};
use super::strict::enforce_no_additional_properties;
use crate::loader::{DocumentLoader, LoaderOptions, Source};

#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    /// Namespace that schema files are registered under
    pub base_uri: String,
    /// Extensions of files registered in the reference store
    pub schema_extensions: Vec<String>,
    /// Close every object schema against undeclared properties
    pub strict: bool,
    /// Directory scanned for referenced schemas; defaults to the directory
    /// containing the schema file
    pub schema_root: Option<PathBuf>,
    pub loader: LoaderOptions,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            schema_extensions: vec!["json".into(), "yaml".into(), "yml".into()],
            strict: true,
            schema_root: None,
            loader: LoaderOptions::default(),
        }
    }
}

/// Loads data and schema, closes the schema, wires up the reference store
/// and runs JSON Schema validation
pub struct SchemaValidator {
    options: ValidatorOptions,
    loader: DocumentLoader,
}

impl SchemaValidator {
    pub fn new(options: ValidatorOptions) -> Result<Self, SchemaValidationError> {
        let loader = DocumentLoader::new(options.loader.clone()).map_err(|source| {
            SchemaValidationError::Load {
                what: "loader configuration",
                source,
            }
        })?;
        Ok(Self { options, loader })
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }

    /// Validate `data` against `schema`; either may be a path or a loaded tree
    pub fn validate(
        &self,
        data: impl Into<Source>,
        schema: impl Into<Source>,
    ) -> Result<(), SchemaValidationError> {
        let data = data.into();
        let schema = schema.into();
        let schema_file = schema.path().map(Path::to_path_buf);
        let schema_name = schema_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<in-memory schema>".to_string());

        let data = self
            .loader
            .load(data)
            .map_err(|source| SchemaValidationError::Load {
                what: "data",
                source,
            })?;
        let mut schema = self
            .loader
            .load(schema)
            .map_err(|source| SchemaValidationError::Load {
                what: "schema",
                source,
            })?;

        if self.options.strict {
            enforce_no_additional_properties(&mut schema);
        }

        let schema_root = self
            .options
            .schema_root
            .clone()
            .or_else(|| schema_file.as_deref().map(containing_dir));

        let mut store = ReferenceStore::new(&self.options.base_uri)?;
        if let Some(root) = &schema_root {
            store.scan(root, &self.options.schema_extensions, &self.loader)?;
            debug!(
                "Reference store for {}: {} schema(s), {} skipped",
                root.display(),
                store.len(),
                store.skipped().len()
            );
        }

        let referrer_uri = match (&schema_file, &schema_root) {
            (Some(file), Some(root)) => {
                let relative = file
                    .strip_prefix(root)
                    .ok()
                    .map(Path::to_path_buf)
                    .or_else(|| file.file_name().map(PathBuf::from))
                    .unwrap_or_default();
                store.uri_for(&relative)?
            }
            _ => store.base_uri().to_string(),
        };
        assign_identifier(&mut schema, &referrer_uri);

        let retriever = store.into_retriever(referrer_uri, schema.clone());
        let validator = jsonschema::options()
            .with_retriever(retriever)
            .build(&schema)
            .map_err(|e| SchemaValidationError::ValidatorBuild {
                schema: schema_name.clone(),
                reason: e.to_string(),
            })?;

        let violations = collect_violations(&validator, &data);
        if violations.is_empty() {
            info!("✓ Validation passed against {schema_name}");
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema: schema_name,
                violations: ValidationViolations::new(violations),
            })
        }
    }
}

/// Validate with default options
pub fn validate_yaml(
    data: impl Into<Source>,
    schema: impl Into<Source>,
) -> Result<(), SchemaValidationError> {
    SchemaValidator::new(ValidatorOptions::default())?.validate(data, schema)
}

fn containing_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Give the root schema an identifier inside the synthetic namespace so its
/// relative `$ref`s resolve against the reference store
fn assign_identifier(schema: &mut Value, uri: &str) {
    if let Some(map) = schema.as_object_mut()
        && !map.contains_key("$id")
        && !map.contains_key("id")
    {
        map.insert("$id".to_string(), Value::String(uri.to_string()));
    }
}

fn collect_violations(validator: &jsonschema::Validator, data: &Value) -> Vec<Violation> {
    let mut violations: Vec<Violation> = validator
        .iter_errors(data)
        .map(|e| Violation {
            instance_path: e.instance_path.to_string(),
            schema_path: e.schema_path.to_string(),
            message: e.to_string(),
            branches: Vec::new(),
        })
        .collect();

    if !violations.iter().any(Violation::is_combinator) {
        return violations;
    }

    let units = output_units(validator, data);
    for violation in violations.iter_mut().filter(|v| v.is_combinator()) {
        violation.branches = branch_errors(violation, &units);
    }
    violations
}

/// Errors of the individual branches under a failed `oneOf`/`anyOf`
fn branch_errors(violation: &Violation, units: &[Violation]) -> Vec<Violation> {
    let below = |unit: &Violation| {
        unit.instance_path == violation.instance_path
            || unit
                .instance_path
                .starts_with(&format!("{}/", violation.instance_path))
    };

    let prefix = format!("{}/", violation.schema_path);
    let direct: Vec<Violation> = units
        .iter()
        .filter(|unit| unit.schema_path.starts_with(&prefix) && below(unit))
        .cloned()
        .collect();
    if !direct.is_empty() {
        return direct;
    }

    // Keyword locations may also record `$ref` hops the schema path omits
    let keyword = violation.schema_path.rsplit('/').next().unwrap_or_default();
    let marker = format!("/{keyword}/");
    units
        .iter()
        .filter(|unit| unit.schema_path.contains(&marker) && below(unit))
        .cloned()
        .collect()
}

/// Every error unit of the basic output format
fn output_units(validator: &jsonschema::Validator, data: &Value) -> Vec<Violation> {
    let output = validator.apply(data).basic();
    let Ok(serialized) = serde_json::to_value(output) else {
        return Vec::new();
    };

    serialized
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|unit| {
                    Some(Violation {
                        instance_path: unit.get("instanceLocation")?.as_str()?.to_string(),
                        schema_path: unit.get("keywordLocation")?.as_str()?.to_string(),
                        message: unit
                            .get("error")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        branches: Vec::new(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
