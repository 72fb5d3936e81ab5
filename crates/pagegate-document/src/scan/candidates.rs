// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rule candidate selection — one candidate per row whose longest run is long
// enough, measured for vertical thickness so bold text rows can be rejected.

use std::cmp::Ordering;

use pagegate_core::{ComplianceConfig, LineCandidate, RowRun};
use tracing::{debug, instrument};

use super::runs::RowRuns;
use crate::image::mask::InkMask;

/// Width ratio at which the length term of the quality score saturates.
const QUALITY_REFERENCE_RATIO: f64 = 0.9;
const QUALITY_LENGTH_WEIGHT: f64 = 0.4;
const QUALITY_THINNESS_WEIGHT: f64 = 0.4;
const QUALITY_POSITION_WEIGHT: f64 = 0.2;
/// Candidates within this fraction of the top or bottom edge score lower.
const EDGE_BAND_RATIO: f64 = 0.1;
const MIN_PROBE_ROWS: u32 = 5;

/// Rank every row that could be a rule, longest first.
///
/// `runs` must have been scanned from `mask`; the mask is probed above and
/// below each candidate row to measure its thickness.
#[instrument(skip_all, fields(width = mask.width(), height = mask.height()))]
pub fn select(runs: &RowRuns, mask: &InkMask, config: &ComplianceConfig) -> Vec<LineCandidate> {
    let width = mask.width();
    let height = mask.height();
    let min_length = ((config.candidate_width_ratio * width as f64).ceil() as u32).max(1);
    let max_thickness = max_thickness_px(height, config);
    let reach = probe_reach(height, max_thickness);

    let mut too_thick = 0usize;
    let mut candidates: Vec<LineCandidate> = (0..height)
        .filter_map(|y| runs.longest(y))
        .filter(|run| run.length >= min_length)
        .filter_map(|run| {
            let (top, bottom) = vertical_extent(mask, &run, reach, config.probe_coverage_min);
            let thickness = bottom - top + 1;
            if thickness > max_thickness {
                too_thick += 1;
                return None;
            }
            Some(build_candidate(&run, top, bottom, width, height))
        })
        .collect();

    candidates.sort_by(rank);

    debug!(
        candidates = candidates.len(),
        rejected_thick = too_thick,
        min_length,
        max_thickness,
        "Rule candidates selected"
    );
    candidates
}

/// Thickest rule accepted, in pixels. Never below one pixel.
pub fn max_thickness_px(height: u32, config: &ComplianceConfig) -> u32 {
    ((config.max_line_vertical_thickness_ratio * height as f64).floor() as u32).max(1)
}

/// How many rows to probe in each direction.
///
/// At least `max(5, height / 100)`, and never less than the thickness limit, so
/// that even a probe from the first row of a thick block sees past the limit.
fn probe_reach(height: u32, max_thickness: u32) -> u32 {
    MIN_PROBE_ROWS.max(height / 100).max(max_thickness)
}

/// Top and bottom rows (inclusive) over which the run's span stays covered.
fn vertical_extent(mask: &InkMask, run: &RowRun, reach: u32, coverage_min: f64) -> (u32, u32) {
    let covered = |y: u32| {
        let ink = mask.ink_in_span(y, run.start_col, run.end_col);
        ink as f64 / run.length as f64 >= coverage_min
    };

    let mut top = run.row;
    while run.row - top < reach && top > 0 && covered(top - 1) {
        top -= 1;
    }

    let mut bottom = run.row;
    while bottom - run.row < reach && bottom + 1 < mask.height() && covered(bottom + 1) {
        bottom += 1;
    }

    (top, bottom)
}

fn build_candidate(run: &RowRun, top: u32, bottom: u32, width: u32, height: u32) -> LineCandidate {
    let thickness = bottom - top + 1;
    let y_center = (top + bottom) as f64 / 2.0;
    let width_ratio = run.length as f64 / width as f64;

    let length_term = (width_ratio / QUALITY_REFERENCE_RATIO).min(1.0);
    let thinness_term = 1.0 / thickness as f64;
    let edge_band = EDGE_BAND_RATIO * height as f64;
    let position_term = if y_center < edge_band || y_center > height as f64 - edge_band {
        0.5
    } else {
        1.0
    };

    LineCandidate {
        y_center,
        x_start: run.start_col,
        x_end: run.end_col,
        length_px: run.length,
        width_ratio,
        vertical_thickness_px: thickness,
        quality_score: QUALITY_LENGTH_WEIGHT * length_term
            + QUALITY_THINNESS_WEIGHT * thinness_term
            + QUALITY_POSITION_WEIGHT * position_term,
    }
}

/// Longest first; ties go to the higher quality, then to the upper row.
fn rank(a: &LineCandidate, b: &LineCandidate) -> Ordering {
    b.length_px
        .cmp(&a.length_px)
        .then_with(|| b.quality_score.total_cmp(&a.quality_score))
        .then_with(|| a.y_center.total_cmp(&b.y_center))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::runs;
    use crate::testing::{BLACK, blank, fill, page, rule, two_rule_canvas};

    fn candidates_of(canvas: image::RgbImage, config: &ComplianceConfig) -> Vec<LineCandidate> {
        let mask = InkMask::from_page(&page(canvas), config.ink_threshold);
        let runs = runs::scan(&mask);
        select(&runs, &mask, config)
    }

    #[test]
    fn both_rows_of_a_two_pixel_rule_share_a_centre() {
        let config = ComplianceConfig::strict();
        let candidates = candidates_of(two_rule_canvas(750), &config);

        assert_eq!(candidates.len(), 4);
        let centres: Vec<f64> = candidates.iter().map(|c| c.y_center).collect();
        assert_eq!(centres, vec![300.5, 300.5, 1044.5, 1044.5]);
        for candidate in &candidates {
            assert_eq!(candidate.vertical_thickness_px, 2);
            assert_eq!(candidate.length_px, 750);
            assert_eq!((candidate.x_start, candidate.x_end), (25, 774));
            assert!((candidate.width_ratio - 0.9375).abs() < 1e-12);
        }
    }

    #[test]
    fn ordered_longest_first() {
        let config = ComplianceConfig::strict();
        let candidates = candidates_of(two_rule_canvas(200), &config);

        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0].length_px, 750);
        assert_eq!(candidates[1].length_px, 750);
        assert_eq!(candidates[2].length_px, 200);
        assert_eq!(candidates[2].y_center, 1044.5);
    }

    #[test]
    fn short_rows_are_not_candidates() {
        let config = ComplianceConfig::strict();
        let mut canvas = blank(800, 1200);
        // 100 px is 12.5% of the width, under the 15% candidate gate.
        rule(&mut canvas, 100, 500, 100, 2);
        assert!(candidates_of(canvas, &config).is_empty());
    }

    /// A near-full-width block of bold ink is far thicker than 2% of the page:
    /// none of its rows, not even the first or last, survive.
    #[test]
    fn thick_text_block_is_not_a_rule() {
        let config = ComplianceConfig::strict();
        let mut canvas = blank(800, 1200);
        fill(&mut canvas, 20, 400, 760, 60, BLACK);
        assert!(candidates_of(canvas, &config).is_empty());
    }

    #[test]
    fn rule_at_the_thickness_limit_survives() {
        let config = ComplianceConfig::strict();
        let mut canvas = blank(800, 1200);
        // 2% of 1200 is 24 rows.
        rule(&mut canvas, 0, 600, 800, 24);
        let candidates = candidates_of(canvas, &config);
        assert_eq!(candidates.len(), 24);
        assert!(candidates.iter().all(|c| c.vertical_thickness_px == 24));
        assert!(candidates.iter().all(|c| c.y_center == 611.5));
    }

    /// Sparse ink below a rule (under 30% of the span) does not count toward
    /// its thickness.
    #[test]
    fn sparse_neighbour_rows_stop_the_probe() {
        let config = ComplianceConfig::strict();
        let mut canvas = blank(800, 1200);
        rule(&mut canvas, 0, 600, 800, 1);
        fill(&mut canvas, 0, 601, 100, 1, BLACK);
        let candidates = candidates_of(canvas, &config);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].vertical_thickness_px, 1);
        assert_eq!(candidates[0].y_center, 600.0);
    }

    #[test]
    fn quality_prefers_thin_central_rules() {
        let central = build_candidate(&RowRun::new(600, 0, 719), 600, 600, 800, 1200);
        let edge = build_candidate(&RowRun::new(20, 0, 719), 20, 23, 800, 1200);

        // 0.4 * 1.0 + 0.4 * 1.0 + 0.2 * 1.0
        assert!((central.quality_score - 1.0).abs() < 1e-12);
        // 0.4 * 1.0 + 0.4 * 0.25 + 0.2 * 0.5
        assert!((edge.quality_score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn probe_reach_covers_the_limit() {
        assert_eq!(probe_reach(1200, 24), 24);
        assert_eq!(probe_reach(200, 4), 5);
        assert_eq!(probe_reach(5000, 20), 50);
    }
}
