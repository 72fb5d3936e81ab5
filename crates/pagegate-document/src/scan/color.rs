// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour composition — whole-page pixel statistics and the clean-page
// predicate. Independent of the rule detector.

use image::Rgb;
use imageproc::stats::histogram;
use pagegate_core::{ColorCheck, ColorStats, ComplianceConfig};
use tracing::{debug, instrument};

use crate::image::page::PageImage;

/// Pixel class used for the ratio statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelClass {
    Background,
    BlackText,
    Colored,
    /// Anti-aliased edges, gray ink, pale tints.
    Other,
}

/// Classify one pixel against the configured thresholds.
pub fn classify(pixel: &Rgb<u8>, config: &ComplianceConfig) -> PixelClass {
    let Rgb(channels) = *pixel;
    if channels.iter().all(|&c| c >= config.white_bg_min) {
        return PixelClass::Background;
    }
    if channels.iter().all(|&c| c <= config.black_text_max) {
        return PixelClass::BlackText;
    }
    if is_colored(channels, config) {
        PixelClass::Colored
    } else {
        PixelClass::Other
    }
}

/// High channel spread, or one channel clearly dominating the other two.
fn is_colored(channels: [u8; 3], config: &ComplianceConfig) -> bool {
    let max = channels.iter().copied().max().unwrap_or(0);
    let min = channels.iter().copied().min().unwrap_or(0);
    if max - min > config.colored_spread_min {
        return true;
    }

    let margin = config.colored_channel_margin as i32;
    (0..3).any(|i| {
        let dominant = channels[i] as i32;
        dominant >= config.colored_channel_floor as i32
            && (0..3)
                .filter(|&j| j != i)
                .all(|j| dominant - channels[j] as i32 >= margin)
    })
}

/// Compute [`ColorStats`] over every pixel of the page.
#[instrument(skip_all, fields(width = page.width(), height = page.height()))]
pub fn analyze(page: &PageImage, config: &ComplianceConfig) -> ColorStats {
    let total = page.pixel_count() as f64;

    let mut background = 0u64;
    let mut black = 0u64;
    let mut colored = 0u64;
    let mut channel_sum = 0u64;
    for pixel in page.as_rgb().pixels() {
        let Rgb([r, g, b]) = *pixel;
        channel_sum += r as u64 + g as u64 + b as u64;
        match classify(pixel, config) {
            PixelClass::Background => background += 1,
            PixelClass::BlackText => black += 1,
            PixelClass::Colored => colored += 1,
            PixelClass::Other => {}
        }
    }

    let stats = ColorStats {
        white_bg_ratio: background as f64 / total,
        black_text_ratio: black as f64 / total,
        colored_ink_ratio: colored as f64 / total,
        contrast: gray_std_dev(page),
        mean_brightness: channel_sum as f64 / (3.0 * total),
    };
    debug!(
        white = stats.white_bg_ratio,
        black = stats.black_text_ratio,
        colored = stats.colored_ink_ratio,
        contrast = stats.contrast,
        brightness = stats.mean_brightness,
        "Colour statistics computed"
    );
    stats
}

/// Population standard deviation of the grayscale page.
fn gray_std_dev(page: &PageImage) -> f64 {
    let gray = page.to_gray();
    let hist = histogram(&gray);
    let bins = &hist.channels[0];

    let count: f64 = bins.iter().map(|&n| n as f64).sum();
    if count == 0.0 {
        return 0.0;
    }
    let mean = bins
        .iter()
        .enumerate()
        .map(|(value, &n)| value as f64 * n as f64)
        .sum::<f64>()
        / count;
    let variance = bins
        .iter()
        .enumerate()
        .map(|(value, &n)| {
            let delta = value as f64 - mean;
            delta * delta * n as f64
        })
        .sum::<f64>()
        / count;
    variance.sqrt()
}

/// Every failed sub-check, in evaluation order: background, text, brightness,
/// contrast, coloured ink. Empty means the page is clean.
pub fn check(stats: &ColorStats, config: &ComplianceConfig) -> Vec<ColorCheck> {
    let mut failures = Vec::new();
    if stats.white_bg_ratio < config.bg_ratio_min {
        failures.push(ColorCheck::WhiteBackground {
            ratio: stats.white_bg_ratio,
            required: config.bg_ratio_min,
        });
    }
    if stats.black_text_ratio < config.text_ratio_min {
        failures.push(ColorCheck::BlackText {
            ratio: stats.black_text_ratio,
            required: config.text_ratio_min,
        });
    }
    if stats.mean_brightness < config.brightness_min {
        failures.push(ColorCheck::Brightness {
            mean: stats.mean_brightness,
            required: config.brightness_min,
        });
    }
    if stats.contrast < config.contrast_min {
        failures.push(ColorCheck::Contrast {
            contrast: stats.contrast,
            required: config.contrast_min,
        });
    }
    if stats.colored_ink_ratio > config.colored_text_max {
        failures.push(ColorCheck::ColoredInk {
            ratio: stats.colored_ink_ratio,
            maximum: config.colored_text_max,
        });
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BLACK, blank, fill, page, two_rule_canvas};

    #[test]
    fn blank_page_is_all_background() {
        let config = ComplianceConfig::strict();
        let stats = analyze(&page(blank(100, 100)), &config);

        assert_eq!(stats.white_bg_ratio, 1.0);
        assert_eq!(stats.black_text_ratio, 0.0);
        assert_eq!(stats.colored_ink_ratio, 0.0);
        assert_eq!(stats.contrast, 0.0);
        assert_eq!(stats.mean_brightness, 255.0);

        // Clean but empty: no text, no contrast.
        let failures = check(&stats, &config);
        assert!(matches!(failures[0], ColorCheck::BlackText { .. }));
        assert!(matches!(failures[1], ColorCheck::Contrast { .. }));
        assert_eq!(failures.len(), 2);
    }

    #[test]
    fn half_black_page() {
        let config = ComplianceConfig::strict();
        let mut canvas = blank(100, 100);
        fill(&mut canvas, 0, 0, 100, 50, BLACK);
        let stats = analyze(&page(canvas), &config);

        assert_eq!(stats.white_bg_ratio, 0.5);
        assert_eq!(stats.black_text_ratio, 0.5);
        assert!((stats.contrast - 127.5).abs() < 1e-9);
        assert!((stats.mean_brightness - 127.5).abs() < 1e-9);
    }

    #[test]
    fn pixel_classes() {
        let config = ComplianceConfig::strict();
        assert_eq!(classify(&Rgb([250, 250, 250]), &config), PixelClass::Background);
        assert_eq!(classify(&Rgb([30, 30, 40]), &config), PixelClass::BlackText);
        assert_eq!(classify(&Rgb([200, 40, 40]), &config), PixelClass::Colored);
        assert_eq!(classify(&Rgb([40, 60, 210]), &config), PixelClass::Colored);
        // Mid gray: no spread, no dominant channel.
        assert_eq!(classify(&Rgb([128, 128, 128]), &config), PixelClass::Other);
        // Pale yellow highlight: spread 60 is not above the minimum, and the
        // blue channel keeps red and green from dominating.
        assert_eq!(classify(&Rgb([255, 255, 195]), &config), PixelClass::Other);
    }

    #[test]
    fn dominance_needs_the_floor() {
        let config = ComplianceConfig::strict();
        // Red leads by 55 but sits under the 120 floor; spread stays at 55.
        assert_eq!(classify(&Rgb([110, 55, 55]), &config), PixelClass::Other);
        // Same lead above the floor.
        assert_eq!(classify(&Rgb([150, 95, 95]), &config), PixelClass::Colored);
    }

    #[test]
    fn reference_page_is_clean() {
        let config = ComplianceConfig::strict();
        let stats = analyze(&page(two_rule_canvas(750)), &config);

        assert!((stats.black_text_ratio - 0.003125).abs() < 1e-12);
        assert!(stats.white_bg_ratio > 0.99);
        assert!(stats.mean_brightness > 254.0);
        assert!((stats.contrast - 14.23).abs() < 0.01, "contrast {}", stats.contrast);
        assert!(check(&stats, &config).is_empty());
    }

    #[test]
    fn colored_blobs_fail_in_order() {
        let config = ComplianceConfig::strict();
        let mut canvas = two_rule_canvas(750);
        // Two saturated patches covering 10% of the page.
        fill(&mut canvas, 100, 400, 300, 160, Rgb([220, 30, 30]));
        fill(&mut canvas, 400, 600, 300, 160, Rgb([30, 30, 220]));
        let stats = analyze(&page(canvas), &config);

        assert!((stats.colored_ink_ratio - 0.1).abs() < 1e-12);
        let failures = check(&stats, &config);
        assert!(matches!(failures.first(), Some(ColorCheck::WhiteBackground { .. })));
        assert!(matches!(failures.last(), Some(ColorCheck::ColoredInk { .. })));
    }

    #[test]
    fn failure_messages_quote_measured_values() {
        let failure = ColorCheck::ColoredInk {
            ratio: 0.1,
            maximum: 0.05,
        };
        assert_eq!(
            failure.to_string(),
            "colored ink covers 10.00% of the page (maximum 5.00%)"
        );
    }
}
