//! Document loader that expands include directives into a single tree
//!
//! A YAML file may contain `!include <relative path>` nodes. Each one is
//! replaced by the parsed content of the target, resolved against the
//! directory of the file that contains the directive. Dataset container
//! files are bridged into the equivalent nested mapping, so inclusion is
//! format-agnostic from the caller's point of view.

pub mod context;
pub mod error;
pub mod file_scanner;
mod parser;
pub mod scalar;


use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use self::context::IncludeContext;
use self::file_scanner::FileScanner;
use self::parser::TreeBuilder;
use crate::dataset::{self, Dataset};

pub use self::error::{IncludeChain, LoadError, ParseDiagnostic};

/// Explicit parser configuration
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Tag marking an include directive
    pub include_tag: String,
    /// Regex sources for plain scalars that must resolve as numbers
    pub extra_numeric_patterns: Vec<String>,
    /// Extensions parsed as YAML (JSON is a subset)
    pub yaml_extensions: Vec<String>,
    /// Extensions read as dataset containers
    pub dataset_extensions: Vec<String>,
    /// Maximum nesting of includes before loading fails
    pub max_include_depth: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            include_tag: "!include".to_string(),
            extra_numeric_patterns: vec![scalar::DEFAULT_NUMERIC_PATTERN.to_string()],
            yaml_extensions: vec!["yaml".into(), "yml".into(), "json".into()],
            dataset_extensions: std::iter::once(dataset::DATASET_EXTENSION)
                .chain(dataset::NETCDF_EXTENSIONS.iter().copied())
                .map(String::from)
                .collect(),
            max_include_depth: 64,
        }
    }
}

/// Where a document comes from
#[derive(Debug, Clone)]
pub enum Source {
    Path(PathBuf),
    /// An already loaded tree, returned unchanged
    Tree(Value),
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<&PathBuf> for Source {
    fn from(path: &PathBuf) -> Self {
        Source::Path(path.clone())
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Source::Path(PathBuf::from(path))
    }
}

impl From<Value> for Source {
    fn from(tree: Value) -> Self {
        Source::Tree(tree)
    }
}

impl Source {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Source::Path(path) => Some(path),
            Source::Tree(_) => None,
        }
    }
}

pub struct DocumentLoader {
    options: LoaderOptions,
    numeric: Vec<Regex>,
}

impl DocumentLoader {
    pub fn new(options: LoaderOptions) -> Result<Self, LoadError> {
        let numeric = options
            .extra_numeric_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| LoadError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { options, numeric })
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub(crate) fn numeric_patterns(&self) -> &[Regex] {
        &self.numeric
    }

    /// Load a source into a fully expanded document tree
    pub fn load(&self, source: impl Into<Source>) -> Result<Value, LoadError> {
        match source.into() {
            Source::Tree(tree) => Ok(tree),
            Source::Path(path) => self.load_file(&path),
        }
    }

    /// Load a file, bridging it first if it is a dataset container
    pub fn load_file(&self, path: &Path) -> Result<Value, LoadError> {
        let ctx = IncludeContext::root(path);
        if self.is_dataset(path) {
            return self.load_dataset(&ctx);
        }
        self.load_yaml(&ctx)
    }

    /// Parse YAML text as if it were the content of `origin`
    ///
    /// Includes resolve against the directory of `origin`; the file itself
    /// does not need to exist.
    pub fn load_str(&self, content: &str, origin: &Path) -> Result<Value, LoadError> {
        let ctx = IncludeContext::root(origin);
        TreeBuilder::new(self, &ctx, content)?.build()
    }

    pub(crate) fn load_include(
        &self,
        parent: &IncludeContext,
        payload: &str,
    ) -> Result<Value, LoadError> {
        let path = parent.resolve(payload);
        let ctx = parent.enter(&path);
        debug!("Including {} from {}", path.display(), parent.file().display());

        if ctx.depth() > self.options.max_include_depth {
            return Err(LoadError::IncludeDepthExceeded {
                path,
                limit: self.options.max_include_depth,
                chain: parent.chain(),
            });
        }

        if self.is_dataset(&path) {
            self.load_dataset(&ctx)
        } else if FileScanner::has_extension(&path, &self.options.yaml_extensions) {
            self.load_yaml(&ctx)
        } else {
            Err(LoadError::UnsupportedInclude {
                path,
                chain: ctx.chain(),
            })
        }
    }

    fn is_dataset(&self, path: &Path) -> bool {
        FileScanner::has_extension(path, &self.options.dataset_extensions)
    }

    fn load_yaml(&self, ctx: &IncludeContext) -> Result<Value, LoadError> {
        let content = read_source(ctx)?;
        TreeBuilder::new(self, ctx, &content)?.build()
    }

    fn load_dataset(&self, ctx: &IncludeContext) -> Result<Value, LoadError> {
        let path = ctx.file();
        if !path.is_file() {
            return Err(LoadError::FileNotFound {
                path: path.to_path_buf(),
                chain: ctx.chain(),
            });
        }
        let dataset = Dataset::read_from(path).map_err(|source| LoadError::Dataset {
            path: path.to_path_buf(),
            chain: ctx.chain(),
            source,
        })?;
        dataset::dataset_to_mapping(&dataset).map_err(|source| LoadError::Format {
            path: path.to_path_buf(),
            chain: ctx.chain(),
            source,
        })
    }
}

fn read_source(ctx: &IncludeContext) -> Result<String, LoadError> {
    std::fs::read_to_string(ctx.file()).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::FileNotFound {
                path: ctx.file().to_path_buf(),
                chain: ctx.chain(),
            }
        } else {
            LoadError::Io {
                path: ctx.file().to_path_buf(),
                source,
            }
        }
    })
}

/// Load a source with the default loader configuration
pub fn load_yaml(source: impl Into<Source>) -> Result<Value, LoadError> {
    DocumentLoader::new(LoaderOptions::default())?.load(source)
}
