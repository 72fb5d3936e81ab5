// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch triage — evaluate documents in parallel, then copy the passing ones
// into the output directory.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use pagegate_core::error::PagegateError;
use pagegate_core::{ComplianceConfig, ComplianceResult};
use pagegate_document::{PageImage, PdfReader, evaluate_page};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::discover::DocumentKind;
use crate::integrity::hash_bytes;

/// Overall verdict for one input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// At least one evaluated page matched the template.
    Passed,
    /// Pages were evaluated and none matched.
    Failed,
    /// The document, or every page of it, could not be loaded.
    Error,
}

/// One evaluated (or unloadable) page.
#[derive(Debug, Clone, Serialize)]
pub struct PageOutcome {
    /// 1-indexed page number.
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ComplianceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageOutcome {
    fn passed(&self) -> bool {
        self.result.as_ref().is_some_and(|result| result.passed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    pub sha256: Option<String>,
    /// Pages in the document; 1 for images.
    pub page_count: Option<usize>,
    pub pages: Vec<PageOutcome>,
    /// Why the document could not be loaded at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied_to: Option<PathBuf>,
    /// Earlier passing input with identical bytes; this one was not copied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_error: Option<String>,
}

impl DocumentOutcome {
    fn new(path: &Path, kind: DocumentKind) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            status: DocumentStatus::Error,
            sha256: None,
            page_count: None,
            pages: Vec::new(),
            error: None,
            copied_to: None,
            duplicate_of: None,
            copy_error: None,
        }
    }
}

// -- Evaluation ---------------------------------------------------------------

/// Evaluate the first `max_pages` pages of one document (all pages when 0).
///
/// Never fails: load errors are recorded on the outcome.
#[instrument(skip(path, config), fields(path = %path.display()))]
pub fn evaluate_document(path: &Path, config: &ComplianceConfig, max_pages: u32) -> DocumentOutcome {
    let kind = DocumentKind::of(path).unwrap_or(DocumentKind::Image);
    let mut outcome = DocumentOutcome::new(path, kind);

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%err, "Cannot read document");
            outcome.error = Some(PagegateError::from(err).to_string());
            return outcome;
        }
    };
    outcome.sha256 = Some(hash_bytes(&bytes));

    let loaded = match kind {
        DocumentKind::Pdf => evaluate_pdf(&bytes, config, max_pages),
        DocumentKind::Image => PageImage::from_bytes(&bytes).map(|image| {
            let page = PageOutcome {
                page: 1,
                result: Some(evaluate_page(&image, config)),
                error: None,
            };
            (1, vec![page])
        }),
    };

    match loaded {
        Ok((page_count, pages)) => {
            outcome.page_count = Some(page_count);
            outcome.pages = pages;
        }
        Err(err) => {
            warn!(%err, "Cannot load document");
            outcome.error = Some(err.to_string());
            return outcome;
        }
    }

    outcome.status = if outcome.pages.iter().any(PageOutcome::passed) {
        DocumentStatus::Passed
    } else if outcome.pages.iter().any(|page| page.result.is_some()) {
        DocumentStatus::Failed
    } else {
        DocumentStatus::Error
    };
    debug!(status = ?outcome.status, pages = outcome.pages.len(), "Document evaluated");
    outcome
}

fn evaluate_pdf(
    bytes: &[u8],
    config: &ComplianceConfig,
    max_pages: u32,
) -> Result<(usize, Vec<PageOutcome>), PagegateError> {
    let reader = PdfReader::from_bytes(bytes)?;
    let page_count = reader.page_count();
    let limit = if max_pages == 0 {
        page_count
    } else {
        page_count.min(max_pages as usize)
    };

    let mut pages = Vec::with_capacity(limit);
    for page_number in 1..=limit as u32 {
        let outcome = match reader.page_image(page_number) {
            Ok(page) => PageOutcome {
                page: page_number,
                result: Some(evaluate_page(&page, config)),
                error: None,
            },
            Err(err) => {
                warn!(page_number, %err, "Cannot extract page raster");
                PageOutcome {
                    page: page_number,
                    result: None,
                    error: Some(err.to_string()),
                }
            }
        };
        let passed = outcome.passed();
        pages.push(outcome);
        if passed {
            // One passing page is enough for the document.
            break;
        }
    }
    Ok((page_count, pages))
}

/// Evaluate every document on the current rayon pool, keeping input order.
pub fn evaluate_all(
    paths: &[PathBuf],
    config: &ComplianceConfig,
    max_pages: u32,
) -> Vec<DocumentOutcome> {
    info!(documents = paths.len(), "Evaluating documents");
    paths
        .par_iter()
        .map(|path| evaluate_document(path, config, max_pages))
        .collect()
}

// -- Output -------------------------------------------------------------------

/// `dir/name`, or `dir/stem-N.ext` with the smallest free N when taken.
pub fn unique_destination(dir: &Path, file_name: &OsStr) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
    let extension = name
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned());

    (1u32..)
        .map(|n| match &extension {
            Some(ext) => dir.join(format!("{stem}-{n}.{ext}")),
            None => dir.join(format!("{stem}-{n}")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

/// Copy every passing document into `output`, in input order.
///
/// Byte-identical inputs are copied once. With `dry_run` nothing is written,
/// but duplicates are still marked. A failed copy is recorded on its outcome.
/// Returns the number of files copied.
#[instrument(skip(outcomes), fields(documents = outcomes.len()))]
pub fn copy_passing(
    outcomes: &mut [DocumentOutcome],
    output: &Path,
    dry_run: bool,
) -> Result<usize, PagegateError> {
    if !dry_run {
        fs::create_dir_all(output)?;
    }

    let mut first_by_hash: HashMap<String, PathBuf> = HashMap::new();
    let mut copied = 0;
    for outcome in outcomes
        .iter_mut()
        .filter(|outcome| outcome.status == DocumentStatus::Passed)
    {
        if let Some(hash) = &outcome.sha256 {
            if let Some(first) = first_by_hash.get(hash) {
                debug!(path = %outcome.path.display(), first = %first.display(), "Duplicate input");
                outcome.duplicate_of = Some(first.clone());
                continue;
            }
            first_by_hash.insert(hash.clone(), outcome.path.clone());
        }
        if dry_run {
            continue;
        }

        let Some(file_name) = outcome.path.file_name() else {
            outcome.copy_error = Some("input has no file name".to_string());
            continue;
        };
        let destination = unique_destination(output, file_name);
        match fs::copy(&outcome.path, &destination) {
            Ok(_) => {
                debug!(from = %outcome.path.display(), to = %destination.display(), "Copied");
                outcome.copied_to = Some(destination);
                copied += 1;
            }
            Err(err) => {
                warn!(path = %outcome.path.display(), %err, "Copy failed");
                outcome.copy_error = Some(err.to_string());
            }
        }
    }

    info!(copied, dry_run, "Passing documents copied");
    Ok(copied)
}
