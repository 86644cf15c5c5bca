mod dataset;
mod load;
mod validate;

pub use dataset::{dump_command, pack_command};
pub use load::load_command;
pub use validate::validate_command;

use anyhow::Result;
use serde_json::Value;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

fn print_tree(tree: &Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(tree)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(tree)?),
    }
    Ok(())
}
