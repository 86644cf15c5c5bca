use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::OutputFormat;

#[derive(Parser)]
#[command(
    name = "docval",
    about = "Loads YAML documents with includes and validates them against strict JSON schemas",
    version,
    author,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Tag marking an include directive
    #[arg(long, global = true, env = "DOCVAL_INCLUDE_TAG", default_value = "!include")]
    include_tag: String,

    /// Enable verbose output (use -vv for debug output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a data file against a schema
    Validate {
        /// Data file (YAML, JSON or dataset container)
        data: PathBuf,

        /// Root schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// Namespace that schema files are registered under
        #[arg(long, env = "DOCVAL_BASE_URI")]
        base_uri: Option<String>,

        /// Directory scanned for referenced schemas (defaults to the schema's directory)
        #[arg(long)]
        schema_root: Option<PathBuf>,

        /// Allow properties the schema does not declare
        #[arg(long)]
        no_strict: bool,
    },

    /// Print a document with all includes expanded
    Load {
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },

    /// Print the mapping form of a dataset container
    Dump {
        dataset: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },

    /// Convert a YAML mapping into a dataset container
    Pack {
        file: PathBuf,

        /// Path of the dataset container to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let loader_options = docval::LoaderOptions {
        include_tag: cli.include_tag,
        ..docval::LoaderOptions::default()
    };

    match cli.command {
        Commands::Validate {
            data,
            schema,
            base_uri,
            schema_root,
            no_strict,
        } => {
            let mut options = docval::ValidatorOptions {
                strict: !no_strict,
                schema_root,
                loader: loader_options,
                ..docval::ValidatorOptions::default()
            };
            if let Some(base_uri) = base_uri {
                options.base_uri = base_uri;
            }
            commands::validate_command(&data, &schema, options)?;
        }
        Commands::Load { file, format } => {
            commands::load_command(&file, format, loader_options)?;
        }
        Commands::Dump { dataset, format } => {
            commands::dump_command(&dataset, format)?;
        }
        Commands::Pack { file, output } => {
            commands::pack_command(&file, &output, loader_options)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbose {
        0 => EnvFilter::new("docval=warn"), // Default: warnings and errors only
        1 => EnvFilter::new("docval=info"), // -v: info messages
        _ => EnvFilter::new("docval=debug"), // -vv or more: full debug
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
