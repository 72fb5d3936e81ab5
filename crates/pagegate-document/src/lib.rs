// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagegate-document — Page analysis for the Pagegate template-compliance engine.
//
// Provides the page image and ink mask types, the two-stage compliance check
// (colour composition + two-rule layout detection), and raster extraction from
// scanned PDFs. Everything here is synchronous and free of side effects apart
// from `tracing` events; callers own file handling and log sinks.

pub mod image;
pub mod pdf;
pub mod scan;

// Re-export the primary entry points so callers can use `pagegate_document::evaluate_page` etc.
pub use crate::image::mask::InkMask;
pub use crate::image::page::PageImage;
pub use pdf::reader::PdfReader;
pub use scan::compliance::{LineDetection, aggregate, detect_lines, evaluate_page};

#[cfg(test)]
pub(crate) mod testing;
