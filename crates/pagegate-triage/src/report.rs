// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Triage report — JSON summary of one batch run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pagegate_core::error::PagegateError;
use pagegate_core::{ComplianceConfig, Profile};
use serde::Serialize;
use tracing::info;

use crate::triage::{DocumentOutcome, DocumentStatus};

/// Default report file name inside the output directory.
pub const DEFAULT_REPORT_NAME: &str = "triage-report.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub documents: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub pages_evaluated: usize,
    pub copied: usize,
    pub duplicates: usize,
}

impl Totals {
    pub fn from_outcomes(outcomes: &[DocumentOutcome]) -> Self {
        let mut totals = Self {
            documents: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.status {
                DocumentStatus::Passed => totals.passed += 1,
                DocumentStatus::Failed => totals.failed += 1,
                DocumentStatus::Error => totals.errors += 1,
            }
            totals.pages_evaluated += outcome
                .pages
                .iter()
                .filter(|page| page.result.is_some())
                .count();
            totals.copied += usize::from(outcome.copied_to.is_some());
            totals.duplicates += usize::from(outcome.duplicate_of.is_some());
        }
        totals
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TriageReport {
    pub generated_at: DateTime<Utc>,
    pub tool_version: &'static str,
    pub profile: Profile,
    /// JSON override file applied on top of the profile, if any.
    pub config_file: Option<PathBuf>,
    /// The thresholds actually used.
    pub config: ComplianceConfig,
    pub max_pages: u32,
    pub dry_run: bool,
    pub totals: Totals,
    pub documents: Vec<DocumentOutcome>,
}

impl TriageReport {
    pub fn new(
        profile: Profile,
        config_file: Option<PathBuf>,
        config: ComplianceConfig,
        max_pages: u32,
        dry_run: bool,
        documents: Vec<DocumentOutcome>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION"),
            profile,
            config_file,
            config,
            max_pages,
            dry_run,
            totals: Totals::from_outcomes(&documents),
            documents,
        }
    }

    /// Write the report as pretty-printed JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), PagegateError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), "Triage report written");
        Ok(())
    }
}
