//! The box collection seam and a directory-backed implementation.
//!
//! The catalog proper is outside this pipeline; the trait mirrors its
//! contract, and [`DirCollection`] is the minimal filesystem-backed catalog
//! the CLI wires in.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// An installed box as reported by the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogBox {
    pub name: String,
    pub version: String,
    pub provider: String,
    pub architecture: Option<String>,
    pub metadata_url: Option<String>,
    pub directory: PathBuf,
}

/// Options for [`BoxCollection::add`].
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    pub architecture: Option<String>,
    pub metadata_url: Option<String>,
    pub force: bool,
    pub providers: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("invalid box index: {0}")]
    Index(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait BoxCollection: Send {
    /// Look up an installed box. An empty provider list matches any
    /// provider; an absent architecture matches any architecture.
    fn find(
        &self,
        name: &str,
        providers: &[String],
        version: &str,
        architecture: Option<&str>,
    ) -> Result<Option<CatalogBox>, CollectionError>;

    /// Install a verified archive into the collection.
    fn add(
        &mut self,
        path: &Path,
        name: &str,
        version: &str,
        opts: &AddOptions,
    ) -> Result<CatalogBox, CollectionError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    name: String,
    version: String,
    provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata_url: Option<String>,
    file: PathBuf,
}

/// A directory of box archives plus a JSON index.
pub struct DirCollection {
    root: PathBuf,
}

impl DirCollection {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn load_index(&self) -> Result<Vec<IndexEntry>, CollectionError> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&std::fs::read(path)?)?)
    }

    fn store_index(&self, index: &[IndexEntry]) -> Result<(), CollectionError> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.index_path(), serde_json::to_vec_pretty(index)?)?;
        Ok(())
    }

    fn entry_to_box(&self, entry: &IndexEntry) -> CatalogBox {
        CatalogBox {
            name: entry.name.clone(),
            version: entry.version.clone(),
            provider: entry.provider.clone(),
            architecture: entry.architecture.clone(),
            metadata_url: entry.metadata_url.clone(),
            directory: self.root.clone(),
        }
    }
}

impl BoxCollection for DirCollection {
    fn find(
        &self,
        name: &str,
        providers: &[String],
        version: &str,
        architecture: Option<&str>,
    ) -> Result<Option<CatalogBox>, CollectionError> {
        let index = self.load_index()?;
        Ok(index
            .iter()
            .find(|entry| {
                entry.name == name
                    && entry.version == version
                    && (providers.is_empty() || providers.iter().any(|p| *p == entry.provider))
                    && architecture.map_or(true, |a| entry.architecture.as_deref() == Some(a))
            })
            .map(|entry| self.entry_to_box(entry)))
    }

    fn add(
        &mut self,
        path: &Path,
        name: &str,
        version: &str,
        opts: &AddOptions,
    ) -> Result<CatalogBox, CollectionError> {
        std::fs::create_dir_all(&self.root)?;

        let provider = opts
            .providers
            .first()
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let file = self.root.join(format!(
            "{}-{}-{}.box",
            name.replace('/', "-"),
            version,
            provider
        ));
        std::fs::copy(path, &file)?;

        let mut index = self.load_index()?;
        index.retain(|entry| {
            !(entry.name == name
                && entry.version == version
                && entry.provider == provider
                && entry.architecture.as_deref() == opts.architecture.as_deref())
        });
        index.push(IndexEntry {
            name: name.to_string(),
            version: version.to_string(),
            provider: provider.clone(),
            architecture: opts.architecture.clone(),
            metadata_url: opts.metadata_url.clone(),
            file,
        });
        self.store_index(&index)?;

        Ok(CatalogBox {
            name: name.to_string(),
            version: version.to_string(),
            provider,
            architecture: opts.architecture.clone(),
            metadata_url: opts.metadata_url.clone(),
            directory: self.root.clone(),
        })
    }
}
