//! Binary dataset container: a magic tag, a format version and a bincode body

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

use super::error::StorageError;
use super::model::Dataset;

const MAGIC: &[u8; 4] = b"DVDS";
const FORMAT_VERSION: u16 = 1;

/// netCDF classic (CDF-1, CDF-2, CDF-5) and netCDF-4 (HDF5) signatures
const NETCDF_SIGNATURES: &[&[u8]] = &[
    b"CDF\x01",
    b"CDF\x02",
    b"CDF\x05",
    b"\x89HDF\r\n\x1a\n",
];

#[derive(Serialize, Deserialize)]
struct Container {
    version: u16,
    dataset: Dataset,
}

#[derive(Deserialize)]
struct Header {
    version: u16,
}

impl Dataset {
    /// Read a dataset container, releasing the file before decoding
    pub fn read_from(path: &Path) -> Result<Self, StorageError> {
        let bytes = {
            let mut file = File::open(path).map_err(|source| io_error(path, source))?;
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)
                .map_err(|source| io_error(path, source))?;
            bytes
        };

        if is_netcdf(path, &bytes) {
            return Err(StorageError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: "netCDF",
            });
        }

        let body = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or_else(|| StorageError::BadMagic {
                path: path.to_path_buf(),
            })?;

        let header: Header = bincode::deserialize(body).map_err(|source| StorageError::Codec {
            path: path.to_path_buf(),
            source,
        })?;
        if header.version != FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: header.version,
                expected: FORMAT_VERSION,
            });
        }

        let container: Container =
            bincode::deserialize(body).map_err(|source| StorageError::Codec {
                path: path.to_path_buf(),
                source,
            })?;
        container
            .dataset
            .check()
            .map_err(|source| StorageError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            "Read dataset {} ({} coordinate(s), {} variable(s))",
            path.display(),
            container.dataset.coords.len(),
            container.dataset.data_vars.len()
        );
        Ok(container.dataset)
    }

    /// Write this dataset as a container file, replacing any existing file
    pub fn write_to(&self, path: &Path) -> Result<(), StorageError> {
        let file = File::create(path).map_err(|source| io_error(path, source))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(MAGIC)
            .map_err(|source| io_error(path, source))?;

        let container = Container {
            version: FORMAT_VERSION,
            dataset: self.clone(),
        };
        bincode::serialize_into(&mut writer, &container).map_err(|source| {
            StorageError::Codec {
                path: path.to_path_buf(),
                source,
            }
        })?;
        writer.flush().map_err(|source| io_error(path, source))
    }
}

fn is_netcdf(path: &Path, bytes: &[u8]) -> bool {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            super::NETCDF_EXTENSIONS
                .iter()
                .any(|nc| nc.eq_ignore_ascii_case(ext))
        });
    by_extension || NETCDF_SIGNATURES.iter().any(|sig| bytes.starts_with(sig))
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    if source.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
