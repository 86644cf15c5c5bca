//! Local reference store for cross-file `$ref` resolution
//!
//! Every schema file under a root directory is registered under a synthetic
//! URI: the base URI joined with the file's path relative to the root. A
//! `$ref: shared/defs.yaml#/definitions/Foo` inside `root.yaml` therefore
//! resolves to the parsed content of `<root>/shared/defs.yaml` without any
//! network access, whatever the working directory.

use jsonschema::{Retrieve, Uri};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

use super::error::SchemaValidationError;
use crate::loader::DocumentLoader;
use crate::loader::file_scanner::FileScanner;

/// Placeholder namespace for schema URIs; never fetched
pub const DEFAULT_BASE_URI: &str = "https://www.example.com/schemas/";

/// Base URI jsonschema assigns to schemas without an identifier
const DEFAULT_SCHEMA_BASE: &str = "json-schema:///";

/// A schema file that could not be read while building the store
#[derive(Debug, Clone)]
pub struct SkippedSchema {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ReferenceStore {
    base: Url,
    documents: BTreeMap<String, Value>,
    skipped: Vec<SkippedSchema>,
}

impl ReferenceStore {
    pub fn new(base_uri: &str) -> Result<Self, SchemaValidationError> {
        let base = Url::parse(base_uri).map_err(|e| SchemaValidationError::InvalidBaseUri {
            uri: base_uri.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            base,
            documents: BTreeMap::new(),
            skipped: Vec::new(),
        })
    }

    /// Register every schema file under `root` with one of `extensions`
    ///
    /// A file that fails to parse is logged and recorded as skipped; the
    /// scan carries on with the remaining files.
    pub fn scan(
        &mut self,
        root: &Path,
        extensions: &[String],
        loader: &DocumentLoader,
    ) -> Result<(), SchemaValidationError> {
        for path in FileScanner::scan_recursive(root, extensions) {
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            match read_schema(&path, loader) {
                Ok(document) => {
                    let uri = self.uri_for(&relative)?;
                    debug!("Registered {} as {uri}", path.display());
                    self.documents.insert(uri, document);
                }
                Err(reason) => {
                    let name = path.file_name().unwrap_or(path.as_os_str());
                    warn!("Reading {} failed: {reason}", name.to_string_lossy());
                    self.skipped.push(SkippedSchema { path, reason });
                }
            }
        }
        Ok(())
    }

    /// URI of a schema file given its path relative to the schema root
    pub fn uri_for(&self, relative: &Path) -> Result<String, SchemaValidationError> {
        let segments: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect();
        let joined = segments.join("/");

        self.base
            .join(&joined)
            .map(String::from)
            .map_err(|e| SchemaValidationError::InvalidBaseUri {
                uri: format!("{}{joined}", self.base),
                reason: e.to_string(),
            })
    }

    pub fn base_uri(&self) -> &str {
        self.base.as_str()
    }

    pub fn insert(&mut self, uri: impl Into<String>, document: Value) {
        self.documents.insert(uri.into(), document);
    }

    pub fn get(&self, uri: &str) -> Option<&Value> {
        self.documents.get(uri)
    }

    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn skipped(&self) -> &[SkippedSchema] {
        &self.skipped
    }

    /// Retriever over this store that falls back to `referrer` for its own URI
    pub fn into_retriever(self, referrer_uri: String, referrer: Value) -> LocalSchemaRetriever {
        LocalSchemaRetriever {
            base: self.base.to_string(),
            documents: self.documents.into_iter().collect(),
            referrer_uri,
            referrer,
        }
    }
}

fn read_schema(path: &Path, loader: &DocumentLoader) -> Result<Value, String> {
    if FileScanner::extension(path).as_deref() == Some("json") {
        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        return serde_json::from_str(&content).map_err(|e| e.to_string());
    }
    loader.load_file(path).map_err(|e| e.to_string())
}

/// Resolves `$ref` URIs against the reference store, never the network
pub struct LocalSchemaRetriever {
    base: String,
    documents: HashMap<String, Value>,
    referrer_uri: String,
    referrer: Value,
}

impl LocalSchemaRetriever {
    fn lookup(&self, uri: &str) -> Option<&Value> {
        let uri = uri.split('#').next().unwrap_or(uri);
        if let Some(document) = self.documents.get(uri) {
            return Some(document);
        }
        // A referrer without `$id`/`id` keeps jsonschema's default base
        if let Some(relative) = uri.strip_prefix(DEFAULT_SCHEMA_BASE)
            && let Some(document) = self.documents.get(&format!("{}{relative}", self.base))
        {
            return Some(document);
        }
        if uri == self.referrer_uri.split('#').next().unwrap_or_default() {
            return Some(&self.referrer);
        }
        None
    }
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<String>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        match self.lookup(uri.as_str()) {
            Some(document) => Ok(document.clone()),
            None => Err(format!("Unknown schema URI: {uri}").into()),
        }
    }
}
