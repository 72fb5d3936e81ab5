// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compliance thresholds. Every number the engine compares against lives here.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PagegateError, Result};

/// Named bundle of thresholds selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Full-width rules far apart, sparse text, no contrast requirement beyond
    /// what two thin rules on white produce.
    #[default]
    Strict,
    /// Older tuning: short rules accepted, close spacing accepted, but the page
    /// must carry a substantial amount of dark text.
    Legacy,
}

impl Profile {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Legacy => "legacy",
        }
    }
}

/// What to do when more than two well-separated rules qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePolicy {
    /// The template has exactly two rules; a third independent one rejects the page.
    Exact,
    /// Keep the two longest and ignore the rest.
    TopTwo,
}

/// Structuring sizes for the three closing passes of the reconnection fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPasses {
    /// Pass 1 width is `page_width / coarse_width_divisor`.
    pub coarse_width_divisor: u32,
    pub coarse_height: u32,
    pub medium_width: u32,
    pub medium_height: u32,
    pub fine_width: u32,
    pub fine_height: u32,
    /// Shave one pixel off every vertical ink run after the last pass.
    pub vertical_trim: bool,
}

impl Default for ReconnectPasses {
    fn default() -> Self {
        Self {
            coarse_width_divisor: 8,
            coarse_height: 1,
            medium_width: 50,
            medium_height: 3,
            fine_width: 20,
            fine_height: 1,
            vertical_trim: true,
        }
    }
}

/// Thresholds for one compliance run. Treat as immutable for a whole batch.
///
/// Deserialization fills missing fields from the strict profile, so a JSON
/// override file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    // -- Pixel classes --
    /// A pixel is background when every channel is at least this value.
    pub white_bg_min: u8,
    /// A pixel is black text when every channel is at most this value.
    pub black_text_max: u8,
    /// Grayscale values strictly below this are ink in the line mask.
    pub ink_threshold: u8,
    pub colored_channel_margin: u8,
    pub colored_channel_floor: u8,
    pub colored_spread_min: u8,

    // -- Colour predicate --
    pub bg_ratio_min: f64,
    pub text_ratio_min: f64,
    pub contrast_min: f64,
    pub brightness_min: f64,
    pub colored_text_max: f64,

    // -- Line detection --
    /// Rows whose longest run is shorter than this fraction of the width are
    /// never candidates.
    pub candidate_width_ratio: f64,
    /// Both accepted rules must span at least this fraction of the width.
    pub min_line_width_ratio: f64,
    /// Candidates closer than this fraction of the height belong to one rule.
    pub line_separation_ratio: f64,
    /// The accepted rules must be at least this fraction of the height apart.
    pub min_line_distance_ratio: f64,
    pub max_line_vertical_thickness_ratio: f64,
    /// Minimum ink coverage of a neighbouring row for it to count as part of
    /// the same rule when measuring thickness.
    pub probe_coverage_min: f64,
    pub line_policy: LinePolicy,
    /// Retry with gap-bridged ink when the direct pass finds no pair.
    pub reconnect: bool,
    pub reconnect_passes: ReconnectPasses,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self::strict()
    }
}

impl ComplianceConfig {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Strict => Self::strict(),
            Profile::Legacy => Self::legacy(),
        }
    }

    pub fn strict() -> Self {
        Self {
            white_bg_min: 200,
            black_text_max: 80,
            ink_threshold: 80,
            colored_channel_margin: 50,
            colored_channel_floor: 120,
            colored_spread_min: 60,
            bg_ratio_min: 0.95,
            text_ratio_min: 0.001,
            contrast_min: 10.0,
            brightness_min: 244.0,
            colored_text_max: 0.05,
            candidate_width_ratio: 0.15,
            min_line_width_ratio: 0.70,
            line_separation_ratio: 0.45,
            min_line_distance_ratio: 0.55,
            max_line_vertical_thickness_ratio: 0.02,
            probe_coverage_min: 0.30,
            line_policy: LinePolicy::Exact,
            reconnect: true,
            reconnect_passes: ReconnectPasses::default(),
        }
    }

    pub fn legacy() -> Self {
        Self {
            text_ratio_min: 0.02,
            contrast_min: 30.0,
            candidate_width_ratio: 0.15,
            min_line_width_ratio: 0.15,
            line_separation_ratio: 0.10,
            min_line_distance_ratio: 0.10,
            line_policy: LinePolicy::TopTwo,
            ..Self::strict()
        }
    }

    /// Parse a JSON override on top of the strict profile and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Apply a JSON override on top of `self` (typically a named profile) and
    /// validate the result. Nested objects merge key by key.
    pub fn with_overrides(&self, json: &str) -> Result<Self> {
        let mut merged = serde_json::to_value(self)?;
        let overrides: serde_json::Value = serde_json::from_str(json)?;
        if !overrides.is_object() {
            return Err(PagegateError::InvalidConfig(
                "override must be a JSON object".to_string(),
            ));
        }
        merge_json(&mut merged, overrides);

        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that cannot describe a page.
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("bg_ratio_min", self.bg_ratio_min),
            ("text_ratio_min", self.text_ratio_min),
            ("colored_text_max", self.colored_text_max),
            ("candidate_width_ratio", self.candidate_width_ratio),
            ("min_line_width_ratio", self.min_line_width_ratio),
            ("line_separation_ratio", self.line_separation_ratio),
            ("min_line_distance_ratio", self.min_line_distance_ratio),
            (
                "max_line_vertical_thickness_ratio",
                self.max_line_vertical_thickness_ratio,
            ),
            ("probe_coverage_min", self.probe_coverage_min),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(PagegateError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if !(0.0..=255.0).contains(&self.brightness_min) {
            return Err(PagegateError::InvalidConfig(format!(
                "brightness_min must be within [0, 255], got {}",
                self.brightness_min
            )));
        }
        if !self.contrast_min.is_finite() || self.contrast_min < 0.0 {
            return Err(PagegateError::InvalidConfig(format!(
                "contrast_min must be a non-negative number, got {}",
                self.contrast_min
            )));
        }
        if self.black_text_max >= self.white_bg_min {
            return Err(PagegateError::InvalidConfig(format!(
                "black_text_max ({}) must be below white_bg_min ({})",
                self.black_text_max, self.white_bg_min
            )));
        }
        if self.candidate_width_ratio > self.min_line_width_ratio {
            return Err(PagegateError::InvalidConfig(format!(
                "candidate_width_ratio ({}) must not exceed min_line_width_ratio ({})",
                self.candidate_width_ratio, self.min_line_width_ratio
            )));
        }

        let passes = &self.reconnect_passes;
        let sizes = [
            ("coarse_width_divisor", passes.coarse_width_divisor),
            ("coarse_height", passes.coarse_height),
            ("medium_width", passes.medium_width),
            ("medium_height", passes.medium_height),
            ("fine_width", passes.fine_width),
            ("fine_height", passes.fine_height),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(PagegateError::InvalidConfig(format!(
                    "reconnect_passes.{name} must be at least 1"
                )));
            }
        }

        Ok(())
    }
}

fn merge_json(base: &mut serde_json::Value, overrides: serde_json::Value) {
    match (base, overrides) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
