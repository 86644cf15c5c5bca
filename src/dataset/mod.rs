//! Array-oriented datasets and their bridge to document trees

mod bridge;
mod error;
mod model;
mod storage;

pub use bridge::{dataset_to_mapping, mapping_to_dataset, prune_empty};
pub use error::{DatasetError, FormatError, StorageError};
pub use model::{ArrayValues, AttrValue, Attrs, Dataset, Variable};

/// File extension of dataset container files
pub const DATASET_EXTENSION: &str = "bds";

/// Extensions recognized as netCDF, which is detected but not decoded
pub const NETCDF_EXTENSIONS: &[&str] = &["nc", "nc4", "cdf"];
