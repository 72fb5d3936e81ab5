// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — the immutable page raster and the binary ink mask derived from it.

pub mod mask;
pub mod page;

pub use mask::InkMask;
pub use page::PageImage;
