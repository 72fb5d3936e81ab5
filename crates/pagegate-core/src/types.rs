// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagegate compliance engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whole-page pixel statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStats {
    /// Fraction of pixels with every channel at or above `white_bg_min`.
    pub white_bg_ratio: f64,
    /// Fraction of pixels with every channel at or below `black_text_max`.
    pub black_text_ratio: f64,
    /// Fraction of pixels that are neither background nor black/gray ink.
    pub colored_ink_ratio: f64,
    /// Standard deviation of the grayscale page.
    pub contrast: f64,
    /// Mean of per-pixel channel means, in [0, 255].
    pub mean_brightness: f64,
}

/// One maximal horizontal ink run within a single row. `end_col` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRun {
    pub row: u32,
    pub start_col: u32,
    pub end_col: u32,
    pub length: u32,
}

impl RowRun {
    pub fn new(row: u32, start_col: u32, end_col: u32) -> Self {
        Self {
            row,
            start_col,
            end_col,
            length: end_col - start_col + 1,
        }
    }
}

/// A row that may be one of the template's horizontal rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineCandidate {
    /// Centre of the probed vertical extent, in pixels from the top.
    pub y_center: f64,
    pub x_start: u32,
    pub x_end: u32,
    pub length_px: u32,
    /// `length_px / page_width`.
    pub width_ratio: f64,
    pub vertical_thickness_px: u32,
    pub quality_score: f64,
}

/// Exactly two accepted rules, `line1` above `line2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptedLinePair {
    pub line1: LineCandidate,
    pub line2: LineCandidate,
    pub distance_px: f64,
    pub distance_ratio: f64,
}

impl AcceptedLinePair {
    /// Order two candidates top to bottom and measure their spacing.
    pub fn new(a: LineCandidate, b: LineCandidate, page_height: u32) -> Self {
        let (line1, line2) = if a.y_center <= b.y_center { (a, b) } else { (b, a) };
        let distance_px = line2.y_center - line1.y_center;
        Self {
            line1,
            line2,
            distance_px,
            distance_ratio: distance_px / page_height as f64,
        }
    }
}

/// Which accepted rule a magnitude check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePosition {
    Upper,
    Lower,
}

impl fmt::Display for LinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upper => f.write_str("upper"),
            Self::Lower => f.write_str("lower"),
        }
    }
}

/// Why the rule detector did not accept a pair. Existence failures come first,
/// magnitude failures only once two separated rules were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    NoLineFound,
    OnlyOneLine,
    Ambiguous {
        clusters: usize,
    },
    LineTooShort {
        position: LinePosition,
        width_ratio: f64,
        required: f64,
    },
    LinesTooClose {
        distance_ratio: f64,
        required: f64,
    },
}

impl FailureReason {
    /// Number of independent rules the detector saw before failing.
    pub fn lines_found(&self) -> usize {
        match self {
            Self::NoLineFound => 0,
            Self::OnlyOneLine => 1,
            Self::Ambiguous { clusters } => *clusters,
            Self::LineTooShort { .. } | Self::LinesTooClose { .. } => 2,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoLineFound => f.write_str("no long dark line found"),
            Self::OnlyOneLine => f.write_str("only one long line found"),
            Self::Ambiguous { .. } => f.write_str("ambiguous: more than two qualifying lines"),
            Self::LineTooShort {
                position,
                width_ratio,
                required,
            } => write!(
                f,
                "line too short: {position} line spans {:.1}% of page width (minimum {:.1}%)",
                width_ratio * 100.0,
                required * 100.0
            ),
            Self::LinesTooClose {
                distance_ratio,
                required,
            } => write!(
                f,
                "lines too close: spacing is {:.1}% of page height (minimum {:.1}%)",
                distance_ratio * 100.0,
                required * 100.0
            ),
        }
    }
}

/// Outcome of the rule detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum LineVerdict {
    Accepted(AcceptedLinePair),
    Rejected(FailureReason),
}

impl LineVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn pair(&self) -> Option<&AcceptedLinePair> {
        match self {
            Self::Accepted(pair) => Some(pair),
            Self::Rejected(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(reason) => Some(reason),
        }
    }

    pub fn lines_found(&self) -> usize {
        match self {
            Self::Accepted(_) => 2,
            Self::Rejected(reason) => reason.lines_found(),
        }
    }
}

/// Which ink mask produced the line verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionPass {
    /// The thresholded page as rendered.
    Direct,
    /// The page after the gap-bridging closing passes.
    Reconnected,
}

/// A failed colour sub-check, with the measured value and the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum ColorCheck {
    WhiteBackground { ratio: f64, required: f64 },
    BlackText { ratio: f64, required: f64 },
    Brightness { mean: f64, required: f64 },
    Contrast { contrast: f64, required: f64 },
    ColoredInk { ratio: f64, maximum: f64 },
}

impl fmt::Display for ColorCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WhiteBackground { ratio, required } => write!(
                f,
                "white background covers {:.2}% of the page (minimum {:.2}%)",
                ratio * 100.0,
                required * 100.0
            ),
            Self::BlackText { ratio, required } => write!(
                f,
                "black text covers {:.3}% of the page (minimum {:.3}%)",
                ratio * 100.0,
                required * 100.0
            ),
            Self::Brightness { mean, required } => {
                write!(f, "mean brightness {mean:.1} is below {required:.1}")
            }
            Self::Contrast { contrast, required } => {
                write!(f, "contrast {contrast:.1} is below {required:.1}")
            }
            Self::ColoredInk { ratio, maximum } => write!(
                f,
                "colored ink covers {:.2}% of the page (maximum {:.2}%)",
                ratio * 100.0,
                maximum * 100.0
            ),
        }
    }
}

/// Any failed sub-check, in the order the aggregator evaluates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "failure", rename_all = "snake_case")]
pub enum ComplianceFailure {
    Color(ColorCheck),
    Lines(FailureReason),
}

impl fmt::Display for ComplianceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(check) => fmt::Display::fmt(check, f),
            Self::Lines(reason) => fmt::Display::fmt(reason, f),
        }
    }
}

/// Terminal artifact of one page evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub passed: bool,
    pub page_width: u32,
    pub page_height: u32,
    pub color_stats: ColorStats,
    pub line_result: LineVerdict,
    pub detection_pass: DetectionPass,
    /// Every failed sub-check; empty when `passed`.
    pub failures: Vec<ComplianceFailure>,
    /// The first failed sub-check, or a pass message.
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(y_center: f64) -> LineCandidate {
        LineCandidate {
            y_center,
            x_start: 25,
            x_end: 774,
            length_px: 750,
            width_ratio: 0.9375,
            vertical_thickness_px: 2,
            quality_score: 0.8,
        }
    }

    #[test]
    fn pair_orders_top_to_bottom() {
        let pair = AcceptedLinePair::new(candidate(1044.5), candidate(300.5), 1200);
        assert!(pair.line1.y_center < pair.line2.y_center);
        assert_eq!(pair.distance_px, 744.0);
        assert!((pair.distance_ratio - 0.62).abs() < 1e-9);
    }

    #[test]
    fn failure_reason_messages() {
        assert_eq!(FailureReason::NoLineFound.to_string(), "no long dark line found");
        assert_eq!(FailureReason::OnlyOneLine.to_string(), "only one long line found");
        assert_eq!(
            FailureReason::Ambiguous { clusters: 3 }.to_string(),
            "ambiguous: more than two qualifying lines"
        );
        let short = FailureReason::LineTooShort {
            position: LinePosition::Lower,
            width_ratio: 0.25,
            required: 0.7,
        };
        assert_eq!(
            short.to_string(),
            "line too short: lower line spans 25.0% of page width (minimum 70.0%)"
        );
    }

    #[test]
    fn verdict_serializes_with_status_tag() {
        let verdict = LineVerdict::Rejected(FailureReason::OnlyOneLine);
        let json = serde_json::to_value(&verdict).expect("serialize");
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["detail"]["kind"], "only_one_line");
    }

    #[test]
    fn lines_found_counts() {
        assert_eq!(FailureReason::NoLineFound.lines_found(), 0);
        assert_eq!(FailureReason::Ambiguous { clusters: 4 }.lines_found(), 4);
        let accepted =
            LineVerdict::Accepted(AcceptedLinePair::new(candidate(10.0), candidate(900.0), 1000));
        assert_eq!(accepted.lines_found(), 2);
        assert!(accepted.pair().is_some());
        assert!(accepted.failure().is_none());
    }
}
