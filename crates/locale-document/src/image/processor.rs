// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, reduce and fingerprint in-memory images using the
// `image` crate.

use image::{DynamicImage, ImageFormat};
use locale_core::error::{LocaleError, Result};
use locale_core::types::Fingerprint;
use tracing::{debug, instrument};

/// Side length of the reduced image an average hash is computed from.
const HASH_SIDE: u32 = 8;

/// Image pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so calls
/// chain:
///
/// ```ignore
/// let thumbnail = ImageProcessor::from_bytes(&png)?
///     .grayscale()
///     .resize_exact(8, 8)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (PNG, JPEG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(LocaleError::InvalidImage("image data is empty".into()));
        }
        let img = image::load_from_memory(data)
            .map_err(|err| LocaleError::InvalidImage(format!("failed to decode image: {err}")))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Convert to grayscale (luma).
    pub fn grayscale(self) -> Self {
        Self {
            image: self.image.grayscale(),
        }
    }

    /// Resize to exactly `width` x `height`, ignoring aspect ratio.
    pub fn resize_exact(self, width: u32, height: u32) -> Self {
        let resized =
            self.image
                .resize_exact(width, height, image::imageops::FilterType::Lanczos3);
        Self { image: resized }
    }

    // -- Fingerprint ----------------------------------------------------------

    /// 64-bit average hash.
    ///
    /// The image is reduced to 8x8 grayscale; each bit is set when its pixel
    /// is brighter than the mean of all 64. Bits are row-major, most
    /// significant first. Re-encoding and uniform rescaling leave the hash
    /// unchanged; a different picture changes it.
    pub fn average_hash(self) -> Fingerprint {
        let reduced = self
            .grayscale()
            .resize_exact(HASH_SIDE, HASH_SIDE)
            .into_dynamic()
            .to_luma8();

        let pixels: Vec<u32> = reduced.pixels().map(|p| u32::from(p.0[0])).collect();
        let total: u32 = pixels.iter().sum();
        let count = pixels.len().max(1) as u32;

        let bits = pixels.iter().fold(0u64, |acc, &value| {
            // value > total / count, kept in integers
            (acc << 1) | u64::from(value * count > total)
        });
        Fingerprint(bits)
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| LocaleError::InvalidImage(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }
}

fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| LocaleError::InvalidImage(format!("image encoding failed: {err}")))?;
    Ok(buffer)
}
