// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagegate — Core types, thresholds, and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ComplianceConfig, LinePolicy, Profile, ReconnectPasses};
pub use error::PagegateError;
pub use types::*;
