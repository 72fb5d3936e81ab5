// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page evaluation — runs the colour analyzer and the rule detector (with its
// reconnection fallback) and folds both into one ComplianceResult.

use pagegate_core::{
    ColorStats, ComplianceConfig, ComplianceFailure, ComplianceResult, DetectionPass, LineVerdict,
};
use tracing::{debug, info, instrument};

use super::{candidates, color, picker, reconnect, runs};
use crate::image::mask::InkMask;
use crate::image::page::PageImage;

/// Reason recorded on a passing page.
pub const PASS_REASON: &str = "page matches the template";

/// Rule detector outcome together with the mask that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LineDetection {
    pub verdict: LineVerdict,
    pub pass: DetectionPass,
    /// Candidate rows considered by the winning pass.
    pub candidates: usize,
}

/// Runs, candidates and pick over a single mask.
pub fn detect_in_mask(mask: &InkMask, config: &ComplianceConfig, pass: DetectionPass) -> LineDetection {
    let runs = runs::scan(mask);
    let ranked = candidates::select(&runs, mask, config);
    let verdict = picker::pick(&ranked, mask.height(), config);
    LineDetection {
        verdict,
        pass,
        candidates: ranked.len(),
    }
}

/// Detect the two rules, retrying on reconnected ink when the direct pass
/// finds no pair.
#[instrument(skip_all, fields(width = page.width(), height = page.height()))]
pub fn detect_lines(page: &PageImage, config: &ComplianceConfig) -> LineDetection {
    let mask = InkMask::from_page(page, config.ink_threshold);
    let direct = detect_in_mask(&mask, config, DetectionPass::Direct);
    if direct.verdict.is_accepted() || !config.reconnect {
        return direct;
    }

    let joined = reconnect::reconnect(&mask, &config.reconnect_passes);
    let reconnected = detect_in_mask(&joined, config, DetectionPass::Reconnected);
    debug!(
        direct_lines = direct.verdict.lines_found(),
        reconnected_lines = reconnected.verdict.lines_found(),
        reconnected_accepted = reconnected.verdict.is_accepted(),
        "Reconnection pass complete"
    );
    prefer(direct, reconnected)
}

/// An accepted reconnected pair wins; otherwise the pass that saw more
/// independent rules, with ties going to the direct pass.
fn prefer(direct: LineDetection, reconnected: LineDetection) -> LineDetection {
    if reconnected.verdict.is_accepted()
        || reconnected.verdict.lines_found() > direct.verdict.lines_found()
    {
        reconnected
    } else {
        direct
    }
}

/// Fold colour statistics and the rule verdict into a result.
///
/// Failures are listed colour checks first, then the rule failure; `reason`
/// quotes the first one.
pub fn aggregate(
    (page_width, page_height): (u32, u32),
    color_stats: ColorStats,
    detection: LineDetection,
    config: &ComplianceConfig,
) -> ComplianceResult {
    let mut failures: Vec<ComplianceFailure> = color::check(&color_stats, config)
        .into_iter()
        .map(ComplianceFailure::Color)
        .collect();
    if let Some(reason) = detection.verdict.failure() {
        failures.push(ComplianceFailure::Lines(reason.clone()));
    }

    let reason = failures
        .first()
        .map_or_else(|| PASS_REASON.to_string(), ToString::to_string);

    ComplianceResult {
        passed: failures.is_empty(),
        page_width,
        page_height,
        color_stats,
        line_result: detection.verdict,
        detection_pass: detection.pass,
        failures,
        reason,
    }
}

/// Evaluate one page against the template.
#[instrument(skip_all, fields(width = page.width(), height = page.height()))]
pub fn evaluate_page(page: &PageImage, config: &ComplianceConfig) -> ComplianceResult {
    let color_stats = color::analyze(page, config);
    let detection = detect_lines(page, config);
    let result = aggregate(page.dimensions(), color_stats, detection, config);

    info!(
        passed = result.passed,
        detection_pass = ?result.detection_pass,
        failures = result.failures.len(),
        reason = %result.reason,
        "Page evaluated"
    );
    result
}
