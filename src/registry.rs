use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::schema::{RuleDocument, ValidationError, validate};

/// File extensions picked up by [`ParserRegistry::load_dir`].
pub const DOCUMENT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid rule document {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

/// Validated rule documents by parser name, in registration order.
#[derive(Debug, Default)]
pub struct ParserRegistry {
    documents: Vec<RuleDocument>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            documents: Vec::new(),
        }
    }

    /// Registers a document under its parser name. An earlier document with the
    /// same name is replaced in place.
    pub fn register(&mut self, document: RuleDocument) {
        match self
            .documents
            .iter_mut()
            .find(|existing| existing.name() == document.name())
        {
            Some(existing) => {
                warn!(parser = %document.name(), "replacing registered parser");
                *existing = document;
            }
            None => {
                debug!(parser = %document.name(), "registered parser");
                self.documents.push(document);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&RuleDocument> {
        self.documents.iter().find(|document| document.name() == name)
    }

    /// First registered document whose pattern matches `url`.
    pub fn find_for_url(&self, url: &str) -> Option<&RuleDocument> {
        self.documents.iter().find(|document| document.is_match(url))
    }

    pub fn names(&self) -> Vec<&str> {
        self.documents.iter().map(RuleDocument::name).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Loads every rule document in `dir`, in file-name order. Stops at the
    /// first file that can not be read, decoded or validated.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, RegistryError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| RegistryError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| RegistryError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            let known = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext));
            if known && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.register(load_document(path)?);
        }

        debug!(loaded = paths.len(), total = self.len(), "loaded rule documents");
        Ok(paths.len())
    }
}

/// Reads and validates a single YAML or JSON rule document.
pub fn load_document(path: impl AsRef<Path>) -> Result<RuleDocument, RegistryError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&text, path)
}

/// Decodes `text` (YAML, or JSON as a subset of it) and validates the result.
pub fn parse_document(text: &str, path: &Path) -> Result<RuleDocument, RegistryError> {
    let raw: serde_json::Value =
        serde_yaml::from_str(text).map_err(|source| RegistryError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    validate(&raw).map_err(|source| RegistryError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}
