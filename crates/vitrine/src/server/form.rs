//! Multipart upload parsing shared by every API route.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;

use super::error::{ApiError, ApiResult};

/// Fields of a multipart request: the `image` file plus plain text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub image: Option<Vec<u8>>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain a multipart body. An empty `image` part counts as absent.
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "image" {
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.image = Some(bytes.to_vec());
                }
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// A text field, `None` when missing.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Parse a field, falling back to `default` when missing or blank.
    pub fn parse_or<T: FromStr>(&self, name: &str, default: T) -> ApiResult<T> {
        match self.text(name).map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("Invalid value for '{name}': {raw:?}"))),
        }
    }

    /// The image bytes, or a 400 when the route requires one.
    pub fn require_image(&mut self) -> ApiResult<Vec<u8>> {
        self.image
            .take()
            .ok_or_else(|| ApiError::BadRequest("Missing required 'image' file".to_string()))
    }

    /// A required, non-blank text field.
    pub fn require_text(&self, name: &str) -> ApiResult<&str> {
        self.text(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest(format!("Missing required '{name}' field")))
    }
}
