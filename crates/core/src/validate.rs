//! Product-photo heuristic based on border whiteness.
//!
//! E-commerce product shots almost always sit on a seamless white background,
//! so the border of the frame is a cheap proxy for "isolated product". The
//! validator samples a fixed-width band along all four edges, counts pixels
//! whose red, green and blue channels all exceed a brightness threshold, and
//! accepts the image when that fraction is strictly above 0.95.
//!
//! Known blind spots: off-white or textured studio backgrounds are rejected,
//! and banners that happen to have white padding are accepted.
//!
//! Validation never fails. Anything that cannot be decoded or sampled is
//! reported as `{ is_product_photo: false, background_score: 0.0 }`.

use std::path::Path;

use image::{DynamicImage, GenericImageView};

/// Thickness of each sampled edge band in pixels.
pub const BORDER_PX: u32 = 5;

/// A channel must be strictly above this value for the pixel to count as near-white.
pub const NEAR_WHITE_THRESHOLD: u8 = 230;

/// The background score must be strictly above this to accept.
pub const MIN_BACKGROUND_SCORE: f64 = 0.95;

/// Outcome of validating one candidate image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationResult {
    pub is_product_photo: bool,
    /// Fraction of border pixels that are near-white, in [0, 1].
    pub background_score: f64,
}

impl ValidationResult {
    /// Fail-closed result for undecodable or unsampleable images.
    pub const REJECTED: Self = Self { is_product_photo: false, background_score: 0.0 };
}

/// Border-whiteness validator.
#[derive(Debug, Clone)]
pub struct ProductPhotoValidator {
    border: u32,
    threshold: u8,
    min_score: f64,
}

impl Default for ProductPhotoValidator {
    fn default() -> Self {
        Self { border: BORDER_PX, threshold: NEAR_WHITE_THRESHOLD, min_score: MIN_BACKGROUND_SCORE }
    }
}

impl ProductPhotoValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score an already decoded image.
    pub fn validate_image(&self, image: &DynamicImage) -> ValidationResult {
        match self.background_score(image) {
            Some(background_score) => {
                ValidationResult { is_product_photo: background_score > self.min_score, background_score }
            }
            None => ValidationResult::REJECTED,
        }
    }

    /// Decode `bytes` and score the result.
    pub fn validate_bytes(&self, bytes: &[u8]) -> ValidationResult {
        match image::load_from_memory(bytes) {
            Ok(image) => self.validate_image(&image),
            Err(e) => {
                tracing::debug!(error = %e, "failed to decode candidate bytes");
                ValidationResult::REJECTED
            }
        }
    }

    /// Decode the file at `path` on a blocking worker and score it.
    pub async fn validate_path(&self, path: &Path) -> ValidationResult {
        let validator = self.clone();
        let owned = path.to_path_buf();

        let joined = tokio::task::spawn_blocking(move || match decode_file(&owned) {
            Ok(image) => validator.validate_image(&image),
            Err(e) => {
                tracing::debug!(path = %owned.display(), error = %e, "failed to decode candidate file");
                ValidationResult::REJECTED
            }
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "validation task failed");
                ValidationResult::REJECTED
            }
        }
    }

    /// Fraction of near-white pixels in the border band.
    ///
    /// Each border pixel is visited once: full-width rows for the top and
    /// bottom bands, then the left and right bands for the rows in between.
    /// The pixel count therefore equals `2*w*b + 2*h*b - 4*b*b`.
    ///
    /// Returns None when the image is too small for the bands to be disjoint.
    pub fn background_score(&self, image: &DynamicImage) -> Option<f64> {
        let (width, height) = image.dimensions();
        let b = self.border;

        if b == 0 || width < 2 * b || height < 2 * b {
            tracing::debug!(width, height, border = b, "image too small to sample border");
            return None;
        }

        let mut white = 0u64;
        let mut sample = |x: u32, y: u32| {
            let [r, g, bl, _] = image.get_pixel(x, y).0;
            if r > self.threshold && g > self.threshold && bl > self.threshold {
                white += 1;
            }
        };

        for y in (0..b).chain(height - b..height) {
            for x in 0..width {
                sample(x, y);
            }
        }
        for y in b..height - b {
            for x in (0..b).chain(width - b..width) {
                sample(x, y);
            }
        }

        let (w, h, b) = (u64::from(width), u64::from(height), u64::from(b));
        let total = 2 * w * b + 2 * h * b - 4 * b * b;

        Some(white as f64 / total as f64)
    }
}

/// Decode a file, trusting its magic bytes over its extension.
fn decode_file(path: &Path) -> image::ImageResult<DynamicImage> {
    image::ImageReader::open(path)?.with_guessed_format()?.decode()
}
