use anyhow::{Context, Result};
use colored::Colorize;
use docval::dataset::{self, Dataset};
use docval::{DocumentLoader, LoaderOptions};
use std::path::Path;

use super::{OutputFormat, print_tree};

pub fn dump_command(path: &Path, format: OutputFormat) -> Result<()> {
    let dataset = Dataset::read_from(path)?;
    let mapping = dataset::dataset_to_mapping(&dataset)
        .with_context(|| format!("Failed to convert {}", path.display()))?;
    print_tree(&mapping, format)
}

pub fn pack_command(file: &Path, output: &Path, options: LoaderOptions) -> Result<()> {
    let loader = DocumentLoader::new(options)?;
    let tree = match loader.load(file) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            anyhow::bail!("Failed to load {}", file.display());
        }
    };

    let dataset = dataset::mapping_to_dataset(&tree, Some(output))
        .with_context(|| format!("Failed to convert {}", file.display()))?;

    println!(
        "{} Wrote {} ({} coordinate(s), {} variable(s))",
        "✓".green().bold(),
        output.display(),
        dataset.coords.len(),
        dataset.data_vars.len()
    );
    Ok(())
}
