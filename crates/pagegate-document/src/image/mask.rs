// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ink mask — a row-major boolean grid marking dark pixels.

use image::GrayImage;

use super::page::PageImage;

/// Binary image, `true` where the page is ink. Same dimensions as its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InkMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl InkMask {
    /// An all-background mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    /// Mark every gray value strictly below `threshold` as ink.
    pub fn from_gray(gray: &GrayImage, threshold: u8) -> Self {
        let (width, height) = gray.dimensions();
        let data = gray.as_raw().iter().map(|&value| value < threshold).collect();
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_page(page: &PageImage, threshold: u8) -> Self {
        Self::from_gray(&page.to_gray(), threshold)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, ink: bool) {
        let index = self.index(x, y);
        self.data[index] = ink;
    }

    /// One row as a slice, left to right.
    pub fn row(&self, y: u32) -> &[bool] {
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }

    /// Number of ink pixels in columns `x_start..=x_end` of row `y`.
    pub fn ink_in_span(&self, y: u32, x_start: u32, x_end: u32) -> u32 {
        self.row(y)[x_start as usize..=x_end as usize]
            .iter()
            .filter(|&&ink| ink)
            .count() as u32
    }

    pub fn ink_count(&self) -> usize {
        self.data.iter().filter(|&&ink| ink).count()
    }

    pub(crate) fn as_slice(&self) -> &[bool] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [bool] {
        &mut self.data
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
