//! Per-file parse context threaded through nested include resolution

use std::path::{Path, PathBuf};

use super::error::IncludeChain;

/// The file currently being parsed, plus every file that included it.
///
/// Each nested load derives a fresh context from the file it actually
/// opens, so relative include payloads always resolve against the
/// directory of the including file.
#[derive(Debug, Clone)]
pub struct IncludeContext {
    file: PathBuf,
    chain: Vec<PathBuf>,
}

impl IncludeContext {
    pub fn root(file: &Path) -> Self {
        Self {
            file: file.to_path_buf(),
            chain: vec![file.to_path_buf()],
        }
    }

    /// Context for a file included from this one
    pub fn enter(&self, file: &Path) -> Self {
        let mut chain = self.chain.clone();
        chain.push(file.to_path_buf());
        Self {
            file: file.to_path_buf(),
            chain,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Directory that relative include payloads are joined onto
    pub fn dir(&self) -> &Path {
        self.file.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Number of files on the include stack, including this one
    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    pub fn resolve(&self, payload: &str) -> PathBuf {
        self.dir().join(payload)
    }

    pub fn chain(&self) -> IncludeChain {
        IncludeChain(self.chain.clone())
    }
}
