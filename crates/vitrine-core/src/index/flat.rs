//! Exact inner-product index over a flat embedding matrix.
//!
//! The matrix is stored N×D row-major. On disk it is raw little-endian `f32`
//! with a `.meta` sidecar (`count=`, `dim=`) so a truncated or mismatched file
//! is caught at load time instead of silently mis-ranking.

use std::path::Path;

use crate::error::PipelineError;
use crate::math::{dot, l2_normalize_in_place};

use super::{Neighbor, VectorIndex};

/// Brute-force cosine index. Rows are unit-normalized on construction.
#[derive(Clone, Debug)]
pub struct FlatIndex {
    /// Flat matrix: N × D stored row-major.
    matrix: Vec<f32>,
    dim: usize,
    count: usize,
}

impl FlatIndex {
    /// Build an index from a row-major matrix.
    pub fn from_matrix(mut matrix: Vec<f32>, dim: usize) -> Result<Self, PipelineError> {
        if dim == 0 || matrix.len() % dim != 0 {
            return Err(PipelineError::Index {
                message: format!(
                    "Matrix of {} values is not a whole number of {}-dim rows",
                    matrix.len(),
                    dim
                ),
            });
        }
        for row in matrix.chunks_exact_mut(dim) {
            l2_normalize_in_place(row);
        }
        Ok(Self {
            count: matrix.len() / dim,
            matrix,
            dim,
        })
    }

    /// Build an index from one vector per row.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, PipelineError> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != dim) {
            return Err(PipelineError::Index {
                message: format!("Row {} has {} dims, expected {}", bad, rows[bad].len(), dim),
            });
        }
        Self::from_matrix(rows.concat(), dim)
    }

    /// Save the matrix as raw f32 plus a `.meta` sidecar.
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let bytes: Vec<u8> = self.matrix.iter().flat_map(|f| f.to_le_bytes()).collect();
        std::fs::write(path, &bytes).map_err(|e| PipelineError::Index {
            message: format!("Failed to save index to {:?}: {}", path, e),
        })?;

        let meta_path = path.with_extension("meta");
        let meta = format!("count={}\ndim={}\n", self.count, self.dim);
        std::fs::write(&meta_path, meta).map_err(|e| PipelineError::Index {
            message: format!("Failed to save index metadata to {:?}: {}", meta_path, e),
        })?;

        tracing::info!(
            "Saved index to {:?} ({} rows x {} dims, {:.1} MB)",
            path,
            self.count,
            self.dim,
            bytes.len() as f64 / 1_000_000.0
        );
        Ok(())
    }

    /// Load an index written by [`FlatIndex::save`].
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let meta_path = path.with_extension("meta");
        let meta = std::fs::read_to_string(&meta_path).map_err(|e| PipelineError::Index {
            message: format!("Failed to read index metadata {:?}: {}", meta_path, e),
        })?;
        let count = meta_value(&meta, "count")?;
        let dim = meta_value(&meta, "dim")?;

        let bytes = std::fs::read(path).map_err(|e| PipelineError::Index {
            message: format!("Failed to read index from {:?}: {}", path, e),
        })?;

        let expected_len = count
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| PipelineError::Index {
                message: format!("Index metadata overflows: {} rows x {} dims", count, dim),
            })?;
        if bytes.len() != expected_len {
            return Err(PipelineError::Index {
                message: format!(
                    "Index size mismatch: expected {} bytes ({} rows x {} dims), got {} bytes",
                    expected_len,
                    count,
                    dim,
                    bytes.len()
                ),
            });
        }

        let matrix: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        tracing::info!("Loaded index: {} rows x {} dims from {:?}", count, dim, path);
        Self::from_matrix(matrix, dim)
    }
}

fn meta_value(meta: &str, key: &str) -> Result<usize, PipelineError> {
    meta.lines()
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .and_then(|(_, v)| v.trim().parse().ok())
        .ok_or_else(|| PipelineError::Index {
            message: format!("Index metadata is missing a valid `{}` entry", key),
        })
}

impl VectorIndex for FlatIndex {
    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.count
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, PipelineError> {
        if query.len() != self.dim {
            return Err(PipelineError::Index {
                message: format!(
                    "Query has {} dims, index has {}",
                    query.len(),
                    self.dim
                ),
            });
        }

        let mut scored: Vec<Neighbor> = self
            .matrix
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(id, row)| Neighbor {
                id,
                score: dot(query, row),
            })
            .collect();

        // Descending score, lower id first on ties.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        scored.truncate(k);
        Ok(scored)
    }
}
