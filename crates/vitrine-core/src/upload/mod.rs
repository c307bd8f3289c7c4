//! Upload handling: validation and decoding of image payloads.
//!
//! Decoding returns a `Result` that callers check before any model runs, so a
//! broken upload never reaches a backend.

pub mod decode;
pub mod validate;

pub use decode::{DecodedImage, ImageDecoder};
pub use validate::Validator;
