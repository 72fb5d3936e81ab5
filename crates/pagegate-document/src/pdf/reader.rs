// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open scanned PDFs and pull the raster image behind each page
// using the `lopdf` crate. Vector pages are not rendered here.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pagegate_core::error::PagegateError;
use tracing::{debug, info, instrument, warn};

use crate::image::page::PageImage;

/// How far to follow nested form XObjects when looking for a page raster.
const MAX_FORM_DEPTH: usize = 4;

/// Reads scanned PDF files.
///
/// Wraps `lopdf::Document`; each page is expected to carry its scan as an
/// embedded image XObject.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PagegateError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            PagegateError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.display().to_string()),
        })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, PagegateError> {
        let document = Document::load_mem(data).map_err(|err| {
            PagegateError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    // -- Extraction -----------------------------------------------------------

    /// Decode the largest raster image drawn on a page (1-indexed).
    ///
    /// Resources inherited from ancestors in the page tree are honoured. A page
    /// with no image XObject fails with [`PagegateError::NoPageRaster`].
    #[instrument(skip(self), fields(page_number))]
    pub fn page_image(&self, page_number: u32) -> Result<PageImage, PagegateError> {
        let pages = self.document.get_pages();
        let page_id: ObjectId = *pages.get(&page_number).ok_or_else(|| {
            PagegateError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        let resources = self
            .page_resources(page_id)
            .ok_or(PagegateError::NoPageRaster { page: page_number })?;

        let mut images = Vec::new();
        self.collect_images(resources, 0, &mut images);
        let stream = images
            .into_iter()
            .max_by_key(|stream| {
                let (width, height) = image_size(stream).unwrap_or((0, 0));
                width as u64 * height as u64
            })
            .ok_or(PagegateError::NoPageRaster { page: page_number })?;

        let decoded = decode_image(self, stream)?;
        debug!(
            page_number,
            width = decoded.width(),
            height = decoded.height(),
            "Page raster decoded"
        );
        PageImage::from_dynamic(decoded)
    }

    // -- Helpers --------------------------------------------------------------

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => match self.document.get_object(*id) {
                Ok(resolved) => Some(resolved),
                Err(err) => {
                    warn!(?id, %err, "Cannot resolve reference");
                    None
                }
            },
            other => Some(other),
        }
    }

    fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(object)? {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    /// The page's `/Resources`, or the nearest ancestor's.
    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut node = self.document.get_dictionary(page_id).ok()?;
        // A malformed tree could loop through /Parent; bound the walk.
        for _ in 0..64 {
            if let Ok(resources) = node.get(b"Resources") {
                return self.resolve_dict(resources);
            }
            node = self.resolve_dict(node.get(b"Parent").ok()?)?;
        }
        None
    }

    /// Every image XObject reachable from `resources`, descending into form
    /// XObjects.
    fn collect_images<'a>(
        &'a self,
        resources: &'a Dictionary,
        depth: usize,
        images: &mut Vec<&'a Stream>,
    ) {
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|xobjects| self.resolve_dict(xobjects))
        else {
            return;
        };

        for (_, entry) in xobjects.iter() {
            let Some(Object::Stream(stream)) = self.resolve(entry) else {
                continue;
            };
            match stream.dict.get(b"Subtype").and_then(Object::as_name) {
                Ok(b"Image") => images.push(stream),
                Ok(b"Form") if depth < MAX_FORM_DEPTH => {
                    if let Some(nested) = stream
                        .dict
                        .get(b"Resources")
                        .ok()
                        .and_then(|nested| self.resolve_dict(nested))
                    {
                        self.collect_images(nested, depth + 1, images);
                    }
                }
                _ => {}
            }
        }
    }
}

fn image_size(stream: &Stream) -> Option<(u32, u32)> {
    let width = stream.dict.get(b"Width").and_then(Object::as_i64).ok()?;
    let height = stream.dict.get(b"Height").and_then(Object::as_i64).ok()?;
    Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}

/// Filter names in application order.
fn filters(stream: &Stream) -> Vec<&[u8]> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.as_slice()],
        Ok(Object::Array(names)) => names.iter().filter_map(|n| n.as_name().ok()).collect(),
        _ => Vec::new(),
    }
}

/// Channels of a `/ColorSpace`, for the device spaces and ICC profiles
/// scanners emit.
fn color_channels(reader: &PdfReader, stream: &Stream) -> Option<usize> {
    match reader.resolve(stream.dict.get(b"ColorSpace").ok()?)? {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(1),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(3),
            _ => None,
        },
        Object::Array(parts) => match parts.first()?.as_name().ok()? {
            b"CalGray" => Some(1),
            b"CalRGB" => Some(3),
            b"ICCBased" => {
                let profile = reader.resolve_dict(parts.get(1)?)?;
                let n = profile.get(b"N").and_then(Object::as_i64).ok()?;
                usize::try_from(n).ok()
            }
            _ => None,
        },
        _ => None,
    }
}

fn decode_error(message: impl Into<String>) -> PagegateError {
    PagegateError::PdfError(message.into())
}

fn decode_image(reader: &PdfReader, stream: &Stream) -> Result<DynamicImage, PagegateError> {
    let filters = filters(stream);
    match filters.as_slice() {
        [b"DCTDecode"] => {
            return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .map_err(|err| decode_error(format!("failed to decode JPEG page image: {err}")));
        }
        [] | [b"FlateDecode"] => {}
        other => {
            let names: Vec<String> = other
                .iter()
                .map(|name| String::from_utf8_lossy(name).into_owned())
                .collect();
            return Err(decode_error(format!(
                "unsupported image filter chain: [{}]",
                names.join(", ")
            )));
        }
    }

    let samples = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|err| decode_error(format!("failed to inflate page image: {err}")))?
    };

    let (width, height) =
        image_size(stream).ok_or_else(|| decode_error("image is missing /Width or /Height"))?;
    let is_mask = matches!(stream.dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let bits = if is_mask {
        1
    } else {
        stream
            .dict
            .get(b"BitsPerComponent")
            .and_then(Object::as_i64)
            .unwrap_or(8)
    };
    let channels = if is_mask {
        Some(1)
    } else {
        color_channels(reader, stream)
    };

    match (channels, bits) {
        (Some(1), 8) => {
            let len = width as usize * height as usize;
            let data = samples
                .get(..len)
                .ok_or_else(|| decode_error("gray image data is truncated"))?
                .to_vec();
            GrayImage::from_raw(width, height, data)
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| decode_error("gray image buffer has the wrong size"))
        }
        (Some(3), 8) => {
            let len = width as usize * height as usize * 3;
            let data = samples
                .get(..len)
                .ok_or_else(|| decode_error("RGB image data is truncated"))?
                .to_vec();
            RgbImage::from_raw(width, height, data)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| decode_error("RGB image buffer has the wrong size"))
        }
        (Some(1), 1) => unpack_bilevel(&samples, width, height).map(DynamicImage::ImageLuma8),
        (channels, bits) => Err(decode_error(format!(
            "unsupported image layout: {} channel(s) at {} bit(s)",
            channels.map_or_else(|| "unknown".to_string(), |c| c.to_string()),
            bits
        ))),
    }
}

/// Expand 1-bit samples (rows padded to whole bytes, 0 = black) to 8-bit gray.
fn unpack_bilevel(samples: &[u8], width: u32, height: u32) -> Result<GrayImage, PagegateError> {
    let stride = (width as usize).div_ceil(8);
    if samples.len() < stride * height as usize {
        return Err(decode_error("bilevel image data is truncated"));
    }
    Ok(GrayImage::from_fn(width, height, |x, y| {
        let byte = samples[y as usize * stride + x as usize / 8];
        let bit = (byte >> (7 - (x % 8))) & 1;
        Luma([if bit == 1 { 255 } else { 0 }])
    }))
}
