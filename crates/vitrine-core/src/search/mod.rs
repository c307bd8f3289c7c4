//! Cross-modal catalog retrieval.
//!
//! A search resolves its inputs into a [`SearchQuery`], turns that into a
//! single unit-length query vector, asks the index once and maps the hits to
//! catalog entries.

mod query;

pub use query::SearchQuery;

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::error::{PipelineError, PipelineResult};
use crate::index::{Catalog, VectorIndex};
use crate::math;
use crate::types::SearchResult;

/// Embeds queries, queries the index and maps hits to catalog entries.
pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    catalog: Arc<Catalog>,
}

impl RetrievalEngine {
    /// Pair an index with its catalog. Both must describe the same items.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        catalog: Arc<Catalog>,
    ) -> PipelineResult<Self> {
        if index.len() != catalog.len() {
            return Err(PipelineError::Index {
                message: format!(
                    "Index has {} vectors but the catalog has {} entries",
                    index.len(),
                    catalog.len()
                ),
            });
        }
        Ok(Self {
            embedder,
            index,
            catalog,
        })
    }

    /// Number of searchable items.
    pub fn catalog_size(&self) -> usize {
        self.catalog.len()
    }

    /// Build the unit-length query vector, or `None` for an empty query.
    pub fn query_vector(&self, query: &SearchQuery<'_>) -> PipelineResult<Option<Vec<f32>>> {
        let vector = match *query {
            SearchQuery::Empty => return Ok(None),
            SearchQuery::Image(image) => math::l2_normalize(&self.embedder.embed_image(image)?),
            SearchQuery::Text(text) => math::l2_normalize(&self.embedder.embed_text(text)?),
            SearchQuery::Fused { image, text, alpha } => {
                let image_vec = math::l2_normalize(&self.embedder.embed_image(image)?);
                let text_vec = math::l2_normalize(&self.embedder.embed_text(text)?);
                if image_vec.len() != text_vec.len() {
                    return Err(PipelineError::Embedding {
                        message: format!(
                            "Image embedding has {} dims but text embedding has {}",
                            image_vec.len(),
                            text_vec.len()
                        ),
                    });
                }
                math::fuse(&text_vec, &image_vec, alpha)
            }
        };
        Ok(Some(vector))
    }

    /// Run a query and return at most `top_k` results, best first.
    pub fn search(&self, query: &SearchQuery<'_>, top_k: usize) -> PipelineResult<Vec<SearchResult>> {
        let Some(vector) = self.query_vector(query)? else {
            tracing::debug!("Empty search query, returning no results");
            return Ok(Vec::new());
        };

        let hits = self.index.search(&vector, top_k)?;
        tracing::debug!(kind = query.kind(), top_k, hits = hits.len(), "Search complete");

        hits.into_iter()
            .map(|hit| {
                let entry = self.catalog.get(hit.id).ok_or_else(|| PipelineError::Index {
                    message: format!(
                        "Index returned id {} outside a catalog of {} entries",
                        hit.id,
                        self.catalog.len()
                    ),
                })?;
                Ok(SearchResult {
                    label: entry.label.clone(),
                    image_path: entry.image_path.clone(),
                    score: hit.score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{FlatIndex, Neighbor};
    use crate::types::CatalogEntry;
    use image::{DynamicImage, Rgb, RgbImage};

    /// Image vector from the top-left pixel, text vector from character codes.
    struct PixelEmbedder;

    impl Embedder for PixelEmbedder {
        fn embed_image(&self, image: &DynamicImage) -> PipelineResult<Vec<f32>> {
            let px = image.to_rgb8().get_pixel(0, 0).0;
            Ok(math::l2_normalize(&[
                px[0] as f32 + 1.0,
                px[1] as f32,
                px[2] as f32,
                1.0,
            ]))
        }

        fn embed_texts(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = [0.5f32; 4];
                    for (i, b) in t.bytes().enumerate() {
                        v[i % 4] += (b % 7) as f32;
                    }
                    math::l2_normalize(&v)
                })
                .collect())
        }
    }

    fn catalog(n: usize) -> Catalog {
        Catalog::new(
            (0..n)
                .map(|i| CatalogEntry {
                    label: format!("item-{i}"),
                    image_path: format!("images/{i}.jpg"),
                })
                .collect(),
        )
    }

    fn engine() -> RetrievalEngine {
        let rows = vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
            vec![0.5, 0.5, 0.5, 0.5],
            vec![0.9, 0.1, 0.3, 0.2],
            vec![0.1, 0.8, 0.6, 0.1],
        ];
        let index = FlatIndex::from_rows(&rows).unwrap();
        RetrievalEngine::new(
            Arc::new(PixelEmbedder),
            Arc::new(index),
            Arc::new(catalog(rows.len())),
        )
        .unwrap()
    }

    fn image(color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb(color)))
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let results = engine().search(&SearchQuery::resolve(None, None, 0.5), 6).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_alpha_zero_equals_image_search() {
        let engine = engine();
        let img = image([200, 10, 40]);
        let baseline = engine.search(&SearchQuery::resolve(Some(&img), None, 0.5), 5).unwrap();
        for text in ["red coat", "sneakers", "x"] {
            let fused = engine
                .search(&SearchQuery::resolve(Some(&img), Some(text), 0.0), 5)
                .unwrap();
            assert_eq!(fused, baseline);
        }
    }

    #[test]
    fn test_alpha_one_equals_text_search() {
        let engine = engine();
        let baseline = engine.search(&SearchQuery::resolve(None, Some("denim"), 0.5), 5).unwrap();
        for color in [[0, 0, 0], [255, 255, 255], [10, 200, 30]] {
            let img = image(color);
            let fused = engine
                .search(&SearchQuery::resolve(Some(&img), Some("denim"), 1.0), 5)
                .unwrap();
            assert_eq!(fused, baseline);
        }
    }

    #[test]
    fn test_result_length_and_ordering() {
        let engine = engine();
        let img = image([30, 60, 90]);
        for top_k in [1, 3, 7, 20] {
            let results = engine
                .search(&SearchQuery::resolve(Some(&img), Some("bag"), 0.3), top_k)
                .unwrap();
            assert_eq!(results.len(), top_k.min(engine.catalog_size()));
            assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[test]
    fn test_fused_query_vector_is_unit_length() {
        let engine = engine();
        let img = image([120, 5, 220]);
        for step in 0..=10 {
            let alpha = step as f32 / 10.0;
            let v = engine
                .query_vector(&SearchQuery::resolve(Some(&img), Some("silk scarf"), alpha))
                .unwrap()
                .unwrap();
            assert!((math::l2_norm(&v) - 1.0).abs() < 1e-5, "alpha={alpha}");
        }
    }

    #[test]
    fn test_results_carry_catalog_metadata() {
        let engine = engine();
        let results = engine.search(&SearchQuery::Text("abc"), 1).unwrap();
        let id: usize = results[0].label.trim_start_matches("item-").parse().unwrap();
        assert_eq!(results[0].image_path, format!("images/{id}.jpg"));
    }

    #[test]
    fn test_catalog_size_mismatch_is_rejected() {
        let index = FlatIndex::from_rows(&[vec![1.0, 0.0]]).unwrap();
        let result = RetrievalEngine::new(Arc::new(PixelEmbedder), Arc::new(index), Arc::new(catalog(2)));
        assert!(matches!(result, Err(PipelineError::Index { .. })));
    }

    struct RogueIndex;

    impl VectorIndex for RogueIndex {
        fn dim(&self) -> usize {
            4
        }
        fn len(&self) -> usize {
            1
        }
        fn search(&self, _query: &[f32], _k: usize) -> PipelineResult<Vec<Neighbor>> {
            Ok(vec![Neighbor { id: 42, score: 0.9 }])
        }
    }

    #[test]
    fn test_out_of_range_id_is_a_server_error() {
        let engine =
            RetrievalEngine::new(Arc::new(PixelEmbedder), Arc::new(RogueIndex), Arc::new(catalog(1)))
                .unwrap();
        let err = engine.search(&SearchQuery::Text("coat"), 3).unwrap_err();
        assert!(!err.is_client_error());
    }
}
