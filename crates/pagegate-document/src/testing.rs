// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic pages shared by the unit tests.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::image::mask::InkMask;
use crate::image::page::PageImage;

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

pub fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

/// Fill a `width` x `height` rectangle with its top-left corner at (x, y).
pub fn fill(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    draw_filled_rect_mut(
        canvas,
        Rect::at(x as i32, y as i32).of_size(width, height),
        color,
    );
}

/// A black horizontal rule starting at `top`.
pub fn rule(canvas: &mut RgbImage, x: u32, top: u32, length: u32, thickness: u32) {
    fill(canvas, x, top, length, thickness, BLACK);
}

/// A horizontal rule built from `dash`-pixel dashes separated by `gap` pixels.
pub fn dashed_rule(
    canvas: &mut RgbImage,
    x: u32,
    top: u32,
    length: u32,
    thickness: u32,
    dash: u32,
    gap: u32,
) {
    let mut offset = 0;
    while offset < length {
        let run = dash.min(length - offset);
        fill(canvas, x + offset, top, run, thickness, BLACK);
        offset += dash + gap;
    }
}

pub fn page(canvas: RgbImage) -> PageImage {
    PageImage::new(canvas).expect("synthetic page has pixels")
}

/// The reference page: 800x1200, 750 px rules at rows 300 and 1044, 2 px thick.
pub fn two_rule_canvas(second_length: u32) -> RgbImage {
    let mut canvas = blank(800, 1200);
    rule(&mut canvas, 25, 300, 750, 2);
    rule(&mut canvas, 25, 1044, second_length, 2);
    canvas
}

/// Parse a mask from rows of `#` (ink) and `.` (background).
pub fn mask_from_rows(rows: &[&str]) -> InkMask {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |row| row.len()) as u32;
    let mut mask = InkMask::new(width, height);
    for (y, row) in rows.iter().enumerate() {
        for (x, cell) in row.bytes().enumerate() {
            mask.set(x as u32, y as u32, cell == b'#');
        }
    }
    mask
}

pub fn mask_to_rows(mask: &InkMask) -> Vec<String> {
    (0..mask.height())
        .map(|y| {
            mask.row(y)
                .iter()
                .map(|&ink| if ink { '#' } else { '.' })
                .collect()
        })
        .collect()
}
