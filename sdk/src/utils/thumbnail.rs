// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

#[cfg(all(not(target_arch = "wasm32"), feature = "add_thumbnails"))]
use std::io::Cursor;

#[cfg(all(not(target_arch = "wasm32"), feature = "add_thumbnails"))]
use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat, ImageReader,
};
#[cfg(all(not(target_arch = "wasm32"), feature = "add_thumbnails"))]
use log::debug;

#[cfg(all(not(target_arch = "wasm32"), feature = "add_thumbnails"))]
use crate::settings::ThumbnailSettings;
use crate::Result;

// scale factors are SCALE_NUM / SCALE_DENOM, largest first
const SCALE_DENOM: u32 = 8;
const SCALE_NUM_MAX: u32 = 7;

/// Produces the thumbnail JPEG whose bytes are spliced into manifest segments.
///
/// The thumbnail hash is signed into the manifest ahead of time, so an
/// implementation must return identical bytes for identical input.
pub trait ThumbnailGenerator {
    fn generate(&self, image: &[u8]) -> Result<Vec<u8>>;
}

impl<F> ThumbnailGenerator for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>>,
{
    fn generate(&self, image: &[u8]) -> Result<Vec<u8>> {
        self(image)
    }
}

/// Pick the largest `k / 8` scale, `k < 8`, that brings the longest edge to
/// `long_edge` or below, and return the scaled dimensions.
///
/// The longest edge is compared after truncation; the returned dimensions
/// are rounded to nearest, ties up. `k` never drops below 1.
pub fn scaled_dimensions(width: u32, height: u32, long_edge: u32) -> (u32, u32) {
    let max = u64::from(width.max(height));

    let mut scale = SCALE_NUM_MAX;
    while scale > 1 && max * u64::from(scale) / u64::from(SCALE_DENOM) > u64::from(long_edge) {
        scale -= 1;
    }

    let apply = |dim: u32| -> u32 {
        let scaled = (u64::from(dim) * u64::from(scale) * 2 + u64::from(SCALE_DENOM))
            / (2 * u64::from(SCALE_DENOM));
        scaled.max(1) as u32
    };

    (apply(width), apply(height))
}

/// Deterministic thumbnailer built on the `image` crate.
///
/// Decodes a JPEG, scales it by a fixed eighth and re-encodes it as a
/// baseline JPEG.
#[cfg(all(not(target_arch = "wasm32"), feature = "add_thumbnails"))]
#[derive(Clone, Debug, Default)]
pub struct ReproducibleThumbnailer {
    settings: ThumbnailSettings,
}

#[cfg(all(not(target_arch = "wasm32"), feature = "add_thumbnails"))]
impl ReproducibleThumbnailer {
    pub fn new(settings: ThumbnailSettings) -> Self {
        ReproducibleThumbnailer { settings }
    }
}

#[cfg(all(not(target_arch = "wasm32"), feature = "add_thumbnails"))]
impl ThumbnailGenerator for ReproducibleThumbnailer {
    fn generate(&self, image: &[u8]) -> Result<Vec<u8>> {
        // pixels stay in stored order, EXIF orientation is left to the viewer
        let img = ImageReader::with_format(Cursor::new(image), ImageFormat::Jpeg).decode()?;

        let (width, height) = scaled_dimensions(img.width(), img.height(), self.settings.long_edge);
        debug!(
            "thumbnail {}x{} -> {width}x{height}",
            img.width(),
            img.height()
        );

        let thumbnail =
            DynamicImage::ImageRgb8(img.resize_exact(width, height, FilterType::Triangle).to_rgb8());

        let mut cursor = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut cursor, self.settings.jpeg_quality);
        encoder.encode_image(&thumbnail)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
#[cfg(all(not(target_arch = "wasm32"), feature = "add_thumbnails"))]
mod tests {
    #![allow(clippy::unwrap_used)]

    use image::{ImageBuffer, Rgb, RgbImage};

    use super::*;
    use crate::Error;

    fn test_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut jpeg_data = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg_data, 90)
            .encode_image(&img)
            .unwrap();
        jpeg_data
    }

    #[test]
    fn test_scaled_dimensions() {
        // 4000 * 2/8 = 1000
        assert_eq!(scaled_dimensions(4000, 3000, 1024), (1000, 750));
        // 1170 * 7/8 = 1023.75, truncated for the check and rounded for the result
        assert_eq!(scaled_dimensions(1170, 800, 1024), (1024, 700));
        // already small images are still scaled by 7/8
        assert_eq!(scaled_dimensions(200, 100, 1024), (175, 88));
        // never below 1/8
        assert_eq!(scaled_dimensions(100_000, 8, 1024), (12500, 1));
    }

    #[test]
    fn test_thumbnail_is_reproducible() {
        let source = test_jpeg(320, 200);
        let thumbnailer = ReproducibleThumbnailer::new(ThumbnailSettings {
            long_edge: 100,
            jpeg_quality: 80,
        });

        let first = thumbnailer.generate(&source).unwrap();
        let second = thumbnailer.generate(&source).unwrap();
        assert_eq!(first, second);

        let decoded = image::load_from_memory(&first).unwrap();
        // 320 * 2/8 = 80
        assert_eq!((decoded.width(), decoded.height()), (80, 50));
    }

    #[test]
    fn test_closure_generator() {
        let generator = |image: &[u8]| -> Result<Vec<u8>> { Ok(image[..2].to_vec()) };
        assert_eq!(generator.generate(&[1, 2, 3]).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_not_a_jpeg() {
        let thumbnailer = ReproducibleThumbnailer::default();
        assert!(matches!(
            thumbnailer.generate(b"not an image"),
            Err(Error::ImageError(_))
        ));
    }
}
