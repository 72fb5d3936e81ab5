// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagegate.
//
// Only conditions that stop a page from being analysed at all live here. A page
// that is analysed and found non-compliant is reported through
// `ComplianceResult`, never through this type.

use thiserror::Error;

/// Top-level error type for all Pagegate operations.
#[derive(Debug, Error)]
pub enum PagegateError {
    // -- Page input --
    #[error("invalid page image: {width}x{height} has no pixels")]
    InvalidImage { width: u32, height: u32 },

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("page {page} has no embedded raster image")]
    NoPageRaster { page: u32 },

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagegateError>;
