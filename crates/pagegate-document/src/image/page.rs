// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page image — the immutable RGB raster every analysis runs on. Decoding goes
// through the `image` crate; transparent pixels are flattened onto white paper.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use pagegate_core::error::PagegateError;
use tracing::{debug, instrument};

/// A rendered document page.
///
/// Construction rejects zero-area buffers, so every `PageImage` can be analysed
/// without further checks. Nothing in the engine mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    rgb: RgbImage,
}

impl PageImage {
    // -- Construction ---------------------------------------------------------

    /// Wrap an RGB buffer.
    pub fn new(rgb: RgbImage) -> Result<Self, PagegateError> {
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(PagegateError::InvalidImage { width, height });
        }
        Ok(Self { rgb })
    }

    /// Convert any decoded image, compositing alpha onto a white page.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, PagegateError> {
        if !image.color().has_alpha() {
            return Self::new(image.to_rgb8());
        }

        let rgba = image.to_rgba8();
        let flattened = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            let over_white = |channel: u8| -> u8 {
                let alpha = a as u32;
                ((channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8
            };
            Rgb([over_white(r), over_white(g), over_white(b)])
        });
        Self::new(flattened)
    }

    /// Decode a page from encoded bytes (PNG, JPEG, TIFF, BMP, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PagegateError> {
        let decoded = image::load_from_memory(data).map_err(|err| {
            PagegateError::ImageError(format!("failed to decode page image: {}", err))
        })?;
        debug!(
            width = decoded.width(),
            height = decoded.height(),
            "Page image decoded from bytes"
        );
        Self::from_dynamic(decoded)
    }

    /// Load a page image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, PagegateError> {
        let decoded = image::open(path.as_ref()).map_err(|err| {
            PagegateError::ImageError(format!(
                "failed to open page image {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(
            width = decoded.width(),
            height = decoded.height(),
            "Page image loaded"
        );
        Self::from_dynamic(decoded)
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Borrow the RGB buffer.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Luma conversion used by both the contrast statistic and the ink mask.
    pub fn to_gray(&self) -> GrayImage {
        image::imageops::grayscale(&self.rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    #[test]
    fn zero_area_is_invalid() {
        let result = PageImage::new(RgbImage::new(0, 10));
        match result {
            Err(PagegateError::InvalidImage { width, height }) => {
                assert_eq!((width, height), (0, 10));
            }
            other => panic!("expected InvalidImage, got {other:?}"),
        }
    }

    /// Fully transparent pixels become paper white, opaque ones keep their colour.
    #[test]
    fn alpha_is_flattened_onto_white() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let page = PageImage::from_dynamic(DynamicImage::ImageRgba8(rgba)).expect("valid page");

        assert_eq!(*page.as_rgb().get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*page.as_rgb().get_pixel(1, 0), Rgb([10, 20, 30]));
    }

    #[test]
    fn decodes_png_bytes() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(7, 5, Rgb([255, 255, 255])));
        let mut bytes = Vec::new();
        source
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");

        let page = PageImage::from_bytes(&bytes).expect("decode png");
        assert_eq!(page.dimensions(), (7, 5));
        assert_eq!(page.pixel_count(), 35);
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        let result = PageImage::from_bytes(b"definitely not an image");
        assert!(matches!(result, Err(PagegateError::ImageError(_))));
    }

    #[test]
    fn gray_of_black_and_white() {
        let mut rgb = RgbImage::from_pixel(2, 1, Rgb([255, 255, 255]));
        rgb.put_pixel(0, 0, Rgb([0, 0, 0]));
        let gray = PageImage::new(rgb).expect("valid page").to_gray();
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(gray.get_pixel(1, 0).0[0], 255);
    }
}
