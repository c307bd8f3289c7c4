//! Catalog metadata: index position → label and image path.

use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::types::CatalogEntry;

/// Read-only list of catalog entries, positioned like the index rows.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Wrap an already-built entry list.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Load a JSON array of `{"label": ..., "path": ...}` objects.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Catalog {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(&content).map_err(|e| PipelineError::Catalog {
                path: path.to_path_buf(),
                message: format!("Invalid catalog metadata: {e}"),
            })?;

        tracing::info!("Loaded catalog: {} entries from {:?}", entries.len(), path);
        Ok(Self { entries })
    }

    /// Entry at an index position.
    pub fn get(&self, id: usize) -> Option<&CatalogEntry> {
        self.entries.get(id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in index order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Resolve an entry's image path against the data directory.
    pub fn resolve_image_path(entry: &CatalogEntry, data_dir: &Path) -> PathBuf {
        let path = Path::new(&entry.image_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            data_dir.join(path)
        }
    }
}
