//! Query resolution: which modalities a search actually uses.

use image::DynamicImage;

/// A retrieval query after deciding which inputs take part.
///
/// `alpha` is the text weight of a fused query. The endpoints collapse to the
/// single-modality variants, so `alpha = 0` is exactly an image search and
/// `alpha = 1` exactly a text search.
#[derive(Debug, Clone, Copy)]
pub enum SearchQuery<'a> {
    /// Neither image nor text was supplied.
    Empty,
    Image(&'a DynamicImage),
    Text(&'a str),
    Fused {
        image: &'a DynamicImage,
        text: &'a str,
        alpha: f32,
    },
}

impl<'a> SearchQuery<'a> {
    /// Pick the variant for the supplied inputs. Blank text counts as absent.
    pub fn resolve(image: Option<&'a DynamicImage>, text: Option<&'a str>, alpha: f32) -> Self {
        let text = text.map(str::trim).filter(|t| !t.is_empty());
        match (image, text) {
            (None, None) => SearchQuery::Empty,
            (Some(image), None) => SearchQuery::Image(image),
            (None, Some(text)) => SearchQuery::Text(text),
            (Some(image), Some(_)) if alpha <= 0.0 => SearchQuery::Image(image),
            (Some(_), Some(text)) if alpha >= 1.0 => SearchQuery::Text(text),
            (Some(image), Some(text)) => SearchQuery::Fused { image, text, alpha },
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchQuery::Empty => "empty",
            SearchQuery::Image(_) => "image",
            SearchQuery::Text(_) => "text",
            SearchQuery::Fused { .. } => "fused",
        }
    }
}
