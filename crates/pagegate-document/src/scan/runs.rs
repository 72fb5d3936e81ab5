// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Row-run scanning — maximal horizontal ink runs, per row.

use pagegate_core::RowRun;

use crate::image::mask::InkMask;

/// Runs of every row of a mask, indexed by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRuns {
    width: u32,
    rows: Vec<Vec<RowRun>>,
}

impl RowRuns {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Runs of row `y`, left to right. Empty for rows without ink.
    pub fn row(&self, y: u32) -> &[RowRun] {
        &self.rows[y as usize]
    }

    /// The longest run of row `y`; the leftmost wins a tie.
    pub fn longest(&self, y: u32) -> Option<RowRun> {
        self.row(y).iter().copied().reduce(|best, run| {
            if run.length > best.length { run } else { best }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[RowRun])> {
        self.rows
            .iter()
            .enumerate()
            .map(|(y, runs)| (y as u32, runs.as_slice()))
    }

    pub fn total_runs(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// Walk every row left to right and record each maximal ink run.
pub fn scan(mask: &InkMask) -> RowRuns {
    let rows = (0..mask.height())
        .map(|y| {
            let mut runs = Vec::new();
            let mut open: Option<u32> = None;
            for (x, &ink) in mask.row(y).iter().enumerate() {
                match (ink, open) {
                    (true, None) => open = Some(x as u32),
                    (false, Some(start)) => {
                        runs.push(RowRun::new(y, start, x as u32 - 1));
                        open = None;
                    }
                    _ => {}
                }
            }
            if let Some(start) = open {
                runs.push(RowRun::new(y, start, mask.width() - 1));
            }
            runs
        })
        .collect();

    RowRuns {
        width: mask.width(),
        rows,
    }
}
