use anyhow::Result;
use colored::Colorize;
use docval::validation::SpannedDocument;
use docval::{SchemaValidationError, SchemaValidator, ValidatorOptions};
use std::path::Path;

pub fn validate_command(data: &Path, schema: &Path, options: ValidatorOptions) -> Result<()> {
    let validator = SchemaValidator::new(options)?;

    match validator.validate(data, schema) {
        Ok(()) => {
            println!(
                "{} {} is valid against {}",
                "✓".green().bold(),
                data.display(),
                schema.display()
            );
            Ok(())
        }
        Err(SchemaValidationError::ValidationFailed { violations, .. }) => {
            match SpannedDocument::new(data) {
                Ok(document) => {
                    for violation in violations.violations() {
                        eprintln!("{:?}", miette::Report::new(document.diagnostic(violation)));
                    }
                }
                // Dataset containers and JSON with unusual layout have no spans
                Err(_) => eprintln!("{violations}"),
            }
            anyhow::bail!(
                "{} failed validation with {} violation(s)",
                data.display(),
                violations.len()
            );
        }
        Err(SchemaValidationError::Load { what, source }) => {
            eprintln!("{:?}", miette::Report::new(source));
            anyhow::bail!("Failed to load {what}");
        }
        Err(err) => Err(err.into()),
    }
}
