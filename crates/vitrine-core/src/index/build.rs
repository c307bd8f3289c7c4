//! Building the embedding index from catalog images.

use std::path::Path;

use crate::embedding::Embedder;
use crate::error::PipelineError;

use super::{Catalog, FlatIndex};

/// Embed every catalog image, in catalog order.
///
/// Relative image paths resolve against `data_dir`. The first unreadable
/// image aborts the build.
pub fn build_index(
    embedder: &dyn Embedder,
    catalog: &Catalog,
    data_dir: &Path,
) -> Result<FlatIndex, PipelineError> {
    let mut rows = Vec::with_capacity(catalog.len());

    for (i, entry) in catalog.entries().iter().enumerate() {
        let path = Catalog::resolve_image_path(entry, data_dir);
        let image = image::open(&path).map_err(|e| PipelineError::Catalog {
            path: path.clone(),
            message: format!("Failed to open catalog image: {e}"),
        })?;
        rows.push(embedder.embed_image(&image)?);

        if (i + 1) % 100 == 0 {
            tracing::info!("Embedded {}/{} catalog images", i + 1, catalog.len());
        }
    }

    if rows.is_empty() {
        return Err(PipelineError::Index {
            message: "Catalog is empty, nothing to index".to_string(),
        });
    }
    FlatIndex::from_rows(&rows)
}
