//! Nearest-neighbor lookup over catalog embeddings.

pub mod build;
pub mod catalog;
pub mod flat;

pub use build::build_index;
pub use catalog::Catalog;
pub use flat::FlatIndex;

use crate::error::PipelineError;

/// One index hit: row id and similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row position, also the catalog position
    pub id: usize,
    /// Inner product with the query (cosine for unit vectors)
    pub score: f32,
}

/// A similarity index over unit-normalized vectors.
///
/// Implementations return at most `k` hits ordered by descending score.
pub trait VectorIndex: Send + Sync {
    /// Dimension of the stored vectors.
    fn dim(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    /// Whether the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k` nearest vectors to `query`.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, PipelineError>;
}
