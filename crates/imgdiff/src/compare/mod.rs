pub mod aggregate;
pub mod kernel;
pub mod pair;
pub mod pixels;

use std::path::PathBuf;

use image::DynamicImage;
use thiserror::Error;

pub use self::aggregate::{Aggregator, ScanSummary};
pub use self::pair::PairScorer;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(String);

/// Turns encoded file bytes into a decoded image.
pub trait Decoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError>;
}

/// Decoder backed by the `image` crate's format sniffing.
pub struct ImageDecoder;

impl Decoder for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        image::load_from_memory(bytes).map_err(|e| DecodeError(e.to_string()))
    }
}

/// One differing pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRecord {
    pub left: PathBuf,
    pub right: PathBuf,
    /// 0.0 = identical, 1.0 = maximal difference, infinity = different dimensions.
    pub score: f64,
    /// `Some((left_w, left_h, right_w, right_h))` when images have different dimensions.
    pub dimension_mismatch: Option<(u32, u32, u32, u32)>,
}
