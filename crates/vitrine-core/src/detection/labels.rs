//! Class id → label names from a model's `config.json`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::PipelineError;

#[derive(Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Class names for a detection head.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    names: HashMap<usize, String>,
}

impl LabelMap {
    /// Read `id2label` from a Hugging Face style `config.json`.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Model {
            message: format!("Failed to read detector config {:?}: {e}", path),
        })?;
        Self::from_json(&content)
    }

    /// Parse `id2label` out of a config document.
    pub fn from_json(content: &str) -> Result<Self, PipelineError> {
        let config: ModelConfig =
            serde_json::from_str(content).map_err(|e| PipelineError::Model {
                message: format!("Invalid detector config: {e}"),
            })?;

        let mut names = HashMap::with_capacity(config.id2label.len());
        for (id, name) in config.id2label {
            let id: usize = id.trim().parse().map_err(|_| PipelineError::Model {
                message: format!("Non-numeric id2label key: {id:?}"),
            })?;
            names.insert(id, name);
        }
        Ok(Self { names })
    }

    /// Build from explicit pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (usize, &'a str)>) -> Self {
        Self {
            names: pairs
                .into_iter()
                .map(|(id, name)| (id, name.to_string()))
                .collect(),
        }
    }

    /// Name for a class id, `LABEL_{id}` when unnamed.
    pub fn name(&self, id: usize) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{id}"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
