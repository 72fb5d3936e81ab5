// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gap reconnection — binary closing with wide, short rectangular structuring
// elements, to rejoin rules broken up by anti-aliasing, compression noise, or
// dashed construction.

use pagegate_core::ReconnectPasses;
use tracing::{debug, instrument};

use crate::image::mask::InkMask;

#[derive(Debug, Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Dilate,
    Erode,
}

/// Three closings of decreasing width, then an optional vertical trim.
///
/// 1. `width / coarse_width_divisor` x `coarse_height` bridges the long gaps of
///    a rule split into many short dashes.
/// 2. `medium_width` x `medium_height` bridges medium gaps.
/// 3. `fine_width` x `fine_height` cleans up, and the trim undoes the
///    thickening the 3-px pass can cause between tightly stacked rows.
#[instrument(skip_all, fields(width = mask.width(), height = mask.height()))]
pub fn reconnect(mask: &InkMask, passes: &ReconnectPasses) -> InkMask {
    let coarse_width = (mask.width() / passes.coarse_width_divisor.max(1)).max(1);

    let coarse = close_brick(mask, coarse_width, passes.coarse_height);
    let medium = close_brick(&coarse, passes.medium_width, passes.medium_height);
    let mut fine = close_brick(&medium, passes.fine_width, passes.fine_height);
    if passes.vertical_trim {
        trim_vertical(&mut fine);
    }

    debug!(
        coarse_width,
        ink_before = mask.ink_count(),
        ink_after = fine.ink_count(),
        "Reconnection passes complete"
    );
    fine
}

/// Closing (dilation then erosion) with a `width` x `height` brick.
///
/// The mask is padded with background by the brick size before closing and
/// cropped afterwards, so ink never grows out to the page border and ink on
/// the border is never eroded.
pub fn close_brick(mask: &InkMask, width: u32, height: u32) -> InkMask {
    if width <= 1 && height <= 1 {
        return mask.clone();
    }
    let padded = pad(mask, width, height);
    let dilated = dilate_brick(&padded, width, height);
    let closed = erode_brick(&dilated, width, height);
    crop(&closed, width, height, mask.width(), mask.height())
}

/// Dilation with a centred `width` x `height` brick, done separably.
pub fn dilate_brick(mask: &InkMask, width: u32, height: u32) -> InkMask {
    let horizontal = sweep(mask, width, Axis::Horizontal, Op::Dilate);
    sweep(&horizontal, height, Axis::Vertical, Op::Dilate)
}

/// Erosion with a centred `width` x `height` brick, done separably.
pub fn erode_brick(mask: &InkMask, width: u32, height: u32) -> InkMask {
    let horizontal = sweep(mask, width, Axis::Horizontal, Op::Erode);
    sweep(&horizontal, height, Axis::Vertical, Op::Erode)
}

/// Remove the bottom pixel of every vertical ink run longer than one pixel.
///
/// A 1-px rule survives untouched; a 2-px rule becomes 1 px.
pub fn trim_vertical(mask: &mut InkMask) {
    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let data = mask.as_mut_slice();

    for x in 0..width {
        let mut run_length = 0usize;
        for y in 0..=height {
            let ink = y < height && data[y * width + x];
            if ink {
                run_length += 1;
                continue;
            }
            if run_length > 1 {
                data[(y - 1) * width + x] = false;
            }
            run_length = 0;
        }
    }
}

fn pad(mask: &InkMask, pad_x: u32, pad_y: u32) -> InkMask {
    let mut padded = InkMask::new(mask.width() + 2 * pad_x, mask.height() + 2 * pad_y);
    for y in 0..mask.height() {
        for (x, &ink) in mask.row(y).iter().enumerate() {
            if ink {
                padded.set(x as u32 + pad_x, y + pad_y, true);
            }
        }
    }
    padded
}

fn crop(mask: &InkMask, left: u32, top: u32, width: u32, height: u32) -> InkMask {
    let mut out = InkMask::new(width, height);
    for y in 0..height {
        let row = &mask.row(y + top)[left as usize..(left + width) as usize];
        for (x, &ink) in row.iter().enumerate() {
            if ink {
                out.set(x as u32, y, true);
            }
        }
    }
    out
}

/// One-dimensional dilation or erosion along every row or every column.
///
/// The element covers `before` pixels on the low side and `after` on the high
/// side of its origin. Dilation looks back `after` and forward `before`;
/// erosion the reverse, which keeps `close_brick` extensive for even sizes.
/// Pixels past the ends of a line count as background when dilating and as
/// ink when eroding.
fn sweep(mask: &InkMask, size: u32, axis: Axis, op: Op) -> InkMask {
    if size <= 1 {
        return mask.clone();
    }

    let width = mask.width() as usize;
    let height = mask.height() as usize;
    let (lines, len, line_step, pixel_step) = match axis {
        Axis::Horizontal => (height, width, width, 1),
        Axis::Vertical => (width, height, 1, width),
    };

    let size = size as usize;
    let before = (size - 1) / 2;
    let after = size - 1 - before;
    let (back, forward) = match op {
        Op::Dilate => (after, before),
        Op::Erode => (before, after),
    };

    let src = mask.as_slice();
    let mut out = InkMask::new(mask.width(), mask.height());
    let dst = out.as_mut_slice();
    let mut prefix = vec![0u32; len + 1];

    for line in 0..lines {
        let base = line * line_step;
        for i in 0..len {
            prefix[i + 1] = prefix[i] + src[base + i * pixel_step] as u32;
        }
        for i in 0..len {
            let lo = i.saturating_sub(back);
            let hi = (i + forward).min(len - 1);
            let ink = (prefix[hi + 1] - prefix[lo]) as usize;
            dst[base + i * pixel_step] = match op {
                Op::Dilate => ink > 0,
                Op::Erode => ink == hi - lo + 1,
            };
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::runs;
    use crate::testing::{mask_from_rows, mask_to_rows};

    #[test]
    fn closing_bridges_gaps_narrower_than_the_brick() {
        let mask = mask_from_rows(&["###..###...###"]);
        let closed = close_brick(&mask, 3, 1);
        assert_eq!(mask_to_rows(&closed), vec!["########...###"]);

        let wider = close_brick(&mask, 4, 1);
        assert_eq!(mask_to_rows(&wider), vec!["##############"]);
    }

    #[test]
    fn closing_is_extensive() {
        let mask = mask_from_rows(&[
            "#..#....#.",
            ".##...#...",
            "#.......##",
            "...#.#....",
        ]);
        for (w, h) in [(1, 1), (2, 1), (3, 3), (4, 2), (5, 1)] {
            let closed = close_brick(&mask, w, h);
            for y in 0..mask.height() {
                for x in 0..mask.width() {
                    if mask.get(x, y) {
                        assert!(closed.get(x, y), "ink lost at ({x},{y}) with {w}x{h}");
                    }
                }
            }
        }
    }

    /// Ink near the border stays put: out-of-mask pixels never erode it.
    #[test]
    fn closing_keeps_border_ink() {
        let mask = mask_from_rows(&["#.........", "..........", ".........#"]);
        let closed = close_brick(&mask, 3, 3);
        assert!(closed.get(0, 0));
        assert!(closed.get(9, 2));
    }

    #[test]
    fn dilate_and_erode_are_duals_on_a_solid_bar() {
        let mask = mask_from_rows(&["..........", "...####...", ".........."]);
        let dilated = dilate_brick(&mask, 3, 1);
        assert_eq!(mask_to_rows(&dilated)[1], "..######..");
        let eroded = erode_brick(&dilated, 3, 1);
        assert_eq!(mask_to_rows(&eroded)[1], "...####...");
    }

    #[test]
    fn vertical_closing_does_not_join_distant_rows() {
        let mask = mask_from_rows(&["######", "......", "......", "......", "######"]);
        let closed = close_brick(&mask, 1, 3);
        assert_eq!(mask_to_rows(&closed), mask_to_rows(&mask));
    }

    #[test]
    fn trim_keeps_single_pixel_rows() {
        let mut mask = mask_from_rows(&["#.#", "..#", "#..", "#.#"]);
        trim_vertical(&mut mask);
        assert_eq!(mask_to_rows(&mask), vec!["#.#", "...", "#..", "..#"]);
    }

    /// A dashed rule comes back as one run spanning the full dash extent.
    #[test]
    fn reconnect_joins_a_dashed_rule() {
        let mut canvas = crate::testing::blank(400, 60);
        crate::testing::dashed_rule(&mut canvas, 20, 30, 360, 2, 12, 6);
        let mask = InkMask::from_page(&crate::testing::page(canvas), 80);

        let direct = runs::scan(&mask);
        assert!(direct.longest(30).expect("ink on row 30").length < 20);

        let joined = reconnect(&mask, &ReconnectPasses::default());
        let runs = runs::scan(&joined);
        let longest = runs.longest(30).expect("ink on row 30");
        assert_eq!(longest.start_col, 20);
        assert!(longest.length >= 354, "got {}", longest.length);
    }
}
