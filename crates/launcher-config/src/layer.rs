//! A single parsed YAML layer plus its original text
//!
//! The raw text is kept verbatim: it is what `pups` receives inside the
//! container, so it must not be re-serialized from the parsed form.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::ConfigDoc;

/// Where a layer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerOrigin {
    Template,
    Base,
}

/// One parsed config document and its provenance
#[derive(Debug, Clone)]
pub struct Layer {
    origin: LayerOrigin,
    path: PathBuf,
    /// SHA-256 of the raw bytes, hex encoded
    digest: String,
    raw: String,
    doc: ConfigDoc,
}

impl Layer {
    /// Read and parse a layer from disk.
    pub fn read(path: &Path, origin: LayerOrigin) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| match origin {
            LayerOrigin::Base => ConfigError::NotFound {
                path: path.to_path_buf(),
                source,
            },
            LayerOrigin::Template => ConfigError::TemplateNotFound {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::parse(path, origin, raw)
    }

    /// Parse a layer from text already in memory.
    pub fn parse(path: &Path, origin: LayerOrigin, raw: String) -> ConfigResult<Self> {
        let doc = ConfigDoc::from_yaml(&raw).map_err(|source| match origin {
            LayerOrigin::Base => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            LayerOrigin::Template => ConfigError::TemplateParse {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let digest = hex::encode(Sha256::digest(raw.as_bytes()));
        tracing::debug!(path = %path.display(), ?origin, %digest, "loaded config layer");

        Ok(Self {
            origin,
            path: path.to_path_buf(),
            digest,
            raw,
            doc,
        })
    }

    pub fn origin(&self) -> LayerOrigin {
        self.origin
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Original source text, byte for byte.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn doc(&self) -> &ConfigDoc {
        &self.doc
    }
}
