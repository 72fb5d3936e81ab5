// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Two-rule picking — greedy clustering of ranked candidates, then the existence
// and magnitude checks on the two longest independent rules.

use pagegate_core::{
    AcceptedLinePair, ComplianceConfig, FailureReason, LineCandidate, LinePolicy, LinePosition,
    LineVerdict,
};
use tracing::{debug, instrument};

/// Candidates that are pairwise at least `separation_px` apart, picked greedily
/// in the given (longest-first) order. Each one stands for an independent rule.
pub fn independent_lines(candidates: &[LineCandidate], separation_px: f64) -> Vec<LineCandidate> {
    let mut accepted: Vec<LineCandidate> = Vec::new();
    for candidate in candidates {
        let separated = accepted
            .iter()
            .all(|line| (line.y_center - candidate.y_center).abs() >= separation_px);
        if separated {
            accepted.push(*candidate);
        }
    }
    accepted
}

/// Decide whether the ranked candidates contain the template's two rules.
///
/// Existence failures are reported first (none, one, too many under
/// [`LinePolicy::Exact`]); only once two independent rules exist are their
/// lengths and spacing checked.
#[instrument(skip_all, fields(candidates = candidates.len(), page_height = page_height))]
pub fn pick(candidates: &[LineCandidate], page_height: u32, config: &ComplianceConfig) -> LineVerdict {
    let separation_px = config.line_separation_ratio * page_height as f64;
    let lines = independent_lines(candidates, separation_px);
    debug!(independent = lines.len(), separation_px, "Candidates clustered");

    let (first, second) = match lines.as_slice() {
        [] => return LineVerdict::Rejected(FailureReason::NoLineFound),
        [_] => return LineVerdict::Rejected(FailureReason::OnlyOneLine),
        [_, _, _, ..] if config.line_policy == LinePolicy::Exact => {
            return LineVerdict::Rejected(FailureReason::Ambiguous {
                clusters: lines.len(),
            });
        }
        [first, second, ..] => (*first, *second),
    };

    let pair = AcceptedLinePair::new(first, second, page_height);
    let required_width = config.min_line_width_ratio;
    for (position, line) in [
        (LinePosition::Upper, &pair.line1),
        (LinePosition::Lower, &pair.line2),
    ] {
        if line.width_ratio < required_width {
            return LineVerdict::Rejected(FailureReason::LineTooShort {
                position,
                width_ratio: line.width_ratio,
                required: required_width,
            });
        }
    }

    if pair.distance_ratio < config.min_line_distance_ratio {
        return LineVerdict::Rejected(FailureReason::LinesTooClose {
            distance_ratio: pair.distance_ratio,
            required: config.min_line_distance_ratio,
        });
    }

    LineVerdict::Accepted(pair)
}
