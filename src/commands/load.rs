use anyhow::Result;
use docval::{DocumentLoader, LoaderOptions};
use std::path::Path;

use super::{OutputFormat, print_tree};

pub fn load_command(file: &Path, format: OutputFormat, options: LoaderOptions) -> Result<()> {
    let loader = DocumentLoader::new(options)?;
    let tree = match loader.load(file) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            anyhow::bail!("Failed to load {}", file.display());
        }
    };
    print_tree(&tree, format)
}
