//! Vitrine Core - fashion vision services as a library.
//!
//! Four services share one set of loaded models:
//!
//! ```text
//! upload → Decode ─┬→ Embed (CLIP) → Fuse → Index → Catalog   (search)
//!                  ├→ Embed image + label prompts → Softmax   (classify)
//!                  ├→ DETR → boxes                            (detect)
//!                  └→ SCHP (ATR, LIP) → color masks           (segment)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use vitrine_core::{Config, Vitrine};
//!
//! let vitrine = Vitrine::load(Config::load()?)?;
//! let decoded = vitrine.decode(bytes).await?;
//! let results = vitrine.search(Some(&decoded.image), Some("red coat"), 0.5, 6)?;
//! ```

pub mod classify;
pub mod config;
pub mod credits;
pub mod detection;
pub mod embedding;
pub mod error;
pub mod index;
pub mod math;
mod onnx;
pub mod search;
pub mod segmentation;
pub mod types;
pub mod upload;

pub use config::Config;
pub use credits::CreditGate;
pub use error::{ConfigError, CreditError, PipelineError, PipelineResult, Result, VitrineError};
pub use search::SearchQuery;
pub use types::{CatalogEntry, DetectedObject, LabelScore, SearchResult, SegmentationReport};
pub use upload::DecodedImage;

use std::sync::Arc;

use image::DynamicImage;

use classify::ZeroShotClassifier;
use detection::{DetrDetector, ObjectDetector};
use embedding::{ClipEngine, Embedder};
use index::{Catalog, FlatIndex, VectorIndex};
use search::RetrievalEngine;
use segmentation::{HumanParser, SegmentationEngine};
use upload::ImageDecoder;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The inference backends a [`Vitrine`] is assembled from.
pub struct Backends {
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub catalog: Arc<Catalog>,
    pub detector: Arc<dyn ObjectDetector>,
    pub atr: Arc<dyn HumanParser>,
    pub lip: Arc<dyn HumanParser>,
}

/// All services, loaded once and shared across requests.
pub struct Vitrine {
    config: Config,
    decoder: ImageDecoder,
    retrieval: RetrievalEngine,
    classifier: ZeroShotClassifier,
    detector: Arc<dyn ObjectDetector>,
    segmentation: SegmentationEngine,
}

impl Vitrine {
    /// Load every model, the index and the catalog from the configured paths.
    ///
    /// Blocks while ONNX sessions initialize; call from a blocking context.
    pub fn load(config: Config) -> Result<Self> {
        let model_dir = config.model_dir();
        tracing::info!("Initializing Vitrine v{} (models: {:?})", VERSION, model_dir);

        let embedder = ClipEngine::load(&config.embedding, &model_dir)?;
        let index = FlatIndex::load(&config.embeddings_path())?;
        let catalog = Catalog::load(&config.metadata_path())?;
        let detector = DetrDetector::load(&config.detection, &model_dir)?;

        let (atr, lip) = SegmentationEngine::load_parsers(&config.segmentation, &model_dir)?;

        Self::from_parts(
            config,
            Backends {
                embedder: Arc::new(embedder),
                index: Arc::new(index),
                catalog: Arc::new(catalog),
                detector: Arc::new(detector),
                atr: Arc::new(atr),
                lip: Arc::new(lip),
            },
        )
    }

    /// Assemble from already-built backends.
    pub fn from_parts(config: Config, backends: Backends) -> Result<Self> {
        let retrieval =
            RetrievalEngine::new(backends.embedder.clone(), backends.index, backends.catalog)?;
        let classifier = ZeroShotClassifier::new(backends.embedder, &config.classification);

        tracing::info!("Vitrine ready ({} catalog items)", retrieval.catalog_size());
        Ok(Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            retrieval,
            classifier,
            detector: backends.detector,
            segmentation: SegmentationEngine::new(backends.atr, backends.lip),
            config,
        })
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of searchable catalog items.
    pub fn catalog_size(&self) -> usize {
        self.retrieval.catalog_size()
    }

    /// Validate and decode an upload. Runs off the async executor, under a timeout.
    pub async fn decode(&self, bytes: Vec<u8>) -> PipelineResult<DecodedImage> {
        self.decoder.decode(bytes).await
    }

    /// Retrieve catalog items for an image, a text, or both.
    ///
    /// `alpha` weights the text side of a fused query and must lie in [0, 1];
    /// `top_k` must be at least 1; the result holds `min(top_k, catalog_size)` items.
    pub fn search(
        &self,
        image: Option<&DynamicImage>,
        text: Option<&str>,
        alpha: f32,
        top_k: usize,
    ) -> PipelineResult<Vec<SearchResult>> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(PipelineError::InvalidRequest(format!(
                "alpha must be between 0 and 1, got {alpha}"
            )));
        }
        if top_k == 0 {
            return Err(PipelineError::InvalidRequest(
                "top_k must be at least 1".to_string(),
            ));
        }

        let query = SearchQuery::resolve(image, text, alpha);
        self.retrieval.search(&query, top_k)
    }

    /// Score candidate labels against an image.
    pub fn classify(&self, image: &DynamicImage, labels: &[String]) -> PipelineResult<Vec<LabelScore>> {
        self.classifier.classify(image, labels)
    }

    /// Detect fashion items at the configured threshold.
    pub fn detect(&self, image: &DynamicImage) -> PipelineResult<Vec<DetectedObject>> {
        self.detector.detect(image, self.config.detection.threshold)
    }

    /// Segment body parts and garments under both taxonomies.
    pub fn segment(&self, image: &DynamicImage) -> PipelineResult<SegmentationReport> {
        self.segmentation.segment(image)
    }
}
