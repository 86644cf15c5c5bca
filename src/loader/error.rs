//! Loader error types with miette integration

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::dataset::{FormatError, StorageError};

/// The files being parsed when an error occurred, outermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeChain(pub Vec<PathBuf>);

impl IncludeChain {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.0
    }
}

impl fmt::Display for IncludeChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<top level>");
        }
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}

/// A syntax error located inside a document
#[derive(Error, Debug, Diagnostic)]
#[error("Failed to parse {path}: {reason}")]
pub struct ParseDiagnostic {
    #[source_code]
    pub src: NamedSource<String>,

    #[label("{reason}")]
    pub span: SourceSpan,

    pub path: String,
    pub reason: String,
    pub line: usize,
    pub column: usize,

    #[help]
    pub help: Option<String>,
}

impl ParseDiagnostic {
    pub fn new(
        path: &Path,
        content: &str,
        offset: usize,
        line: usize,
        column: usize,
        reason: impl Into<String>,
        chain: &IncludeChain,
    ) -> Self {
        let offset = offset.min(content.len());
        let help = (chain.files().len() > 1).then(|| format!("included via {chain}"));
        Self {
            src: crate::error_utils::create_named_source(path, content.to_string()),
            span: SourceSpan::new(offset.into(), 0),
            path: path.display().to_string(),
            reason: reason.into(),
            line,
            column,
            help,
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum LoadError {
    #[error("File not found: {} (include chain: {chain})", path.display())]
    FileNotFound { path: PathBuf, chain: IncludeChain },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(ParseDiagnostic),

    #[error("Invalid include in {} at line {line}: {reason}", path.display())]
    InvalidInclude {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Cannot include {}: unrecognized file extension (include chain: {chain})", path.display())]
    UnsupportedInclude { path: PathBuf, chain: IncludeChain },

    #[error("Include depth limit of {limit} exceeded at {} (include chain: {chain})", path.display())]
    IncludeDepthExceeded {
        path: PathBuf,
        limit: usize,
        chain: IncludeChain,
    },

    #[error("Invalid numeric pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Dataset {} could not be bridged: {source} (include chain: {chain})", path.display())]
    Format {
        path: PathBuf,
        chain: IncludeChain,
        #[source]
        source: FormatError,
    },

    #[error("Failed to read dataset {}: {source} (include chain: {chain})", path.display())]
    Dataset {
        path: PathBuf,
        chain: IncludeChain,
        #[source]
        source: StorageError,
    },
}

impl LoadError {
    /// The position of a parse error as (line, column), both 1-based
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            LoadError::Parse(diagnostic) => Some((diagnostic.line, diagnostic.column)),
            LoadError::InvalidInclude { line, .. } => Some((*line, 1)),
            _ => None,
        }
    }
}
