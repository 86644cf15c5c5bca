use std::path::PathBuf;
use thiserror::Error;

/// A dataset and a nested mapping could not be converted into each other
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("variable '{name}' declares {dims} dimension(s) but its data has {ndim}")]
    DimensionMismatch {
        name: String,
        dims: usize,
        ndim: usize,
    },

    #[error("dimension '{dim}' has length {found} in '{name}' but {expected} elsewhere")]
    ConflictingDimension {
        dim: String,
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("'{name}' is ragged: sub-arrays at depth {depth} differ in length")]
    RaggedArray { name: String, depth: usize },

    #[error("'{name}' mixes element types ({first} and {second})")]
    MixedTypes {
        name: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("'{name}' contains an unsupported element: {reason}")]
    UnsupportedElement { name: String, reason: String },

    #[error("attribute '{attr}' of '{name}' has an unsupported value: {reason}")]
    UnsupportedAttribute {
        name: String,
        attr: String,
        reason: String,
    },

    #[error("'{name}' holds {len} value(s) but its shape {shape:?} needs {expected}")]
    ShapeMismatch {
        name: String,
        shape: Vec<usize>,
        len: usize,
        expected: usize,
    },

    #[error("'{name}' must be a sequence of dimension names")]
    InvalidDims { name: String },

    #[error("a dataset document must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    #[error("coordinate '{name}' is a mapping without 'data'")]
    InvalidCoordinate { name: String },
}

/// Reading or writing a dataset container failed
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Dataset file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to access dataset {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a dataset container", path.display())]
    BadMagic { path: PathBuf },

    #[error(
        "{} is a {format} file, which cannot be read; convert it to a .bds dataset container",
        path.display()
    )]
    UnsupportedFormat { path: PathBuf, format: &'static str },

    #[error("{} uses container version {found}, expected {expected}", path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u16,
        expected: u16,
    },

    #[error("Failed to decode dataset {}: {source}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("Dataset {} is inconsistent: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// Reverse bridging with persistence can fail on either side
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
