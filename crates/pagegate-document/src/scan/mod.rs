// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compliance pipeline — colour composition, row-run scanning, gap reconnection,
// rule candidate selection, two-rule picking, and the final aggregation.
//
//   page ─┬─ color::analyze ───────────────────────────────────────┐
//         └─ ink mask ─ runs::scan ─ candidates::select ─ picker::pick ─┴─ compliance::aggregate
//                  └─ (fallback) reconnect::reconnect ─ runs::scan ─ ...

pub mod candidates;
pub mod color;
pub mod compliance;
pub mod picker;
pub mod reconnect;
pub mod runs;

pub use compliance::{LineDetection, aggregate, detect_lines, evaluate_page};
