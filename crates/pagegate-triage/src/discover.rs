// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input discovery — expand files and directories into the sorted list of
// documents to evaluate.

use std::fs;
use std::path::{Path, PathBuf};

use pagegate_core::error::PagegateError;
use serde::Serialize;
use tracing::{debug, warn};

/// How a document's pages are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Scanned PDF; each page carries an embedded raster.
    Pdf,
    /// A single rendered page.
    Image,
}

impl DocumentKind {
    /// Classify by extension, case-insensitively. `None` for unsupported files.
    pub fn of(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" => Some(Self::Image),
            _ => None,
        }
    }
}

/// Every supported document under `inputs`, sorted and without repeats.
///
/// Directories are walked recursively. Anything under `exclude` (the output
/// directory, when it sits inside an input) is skipped so reruns do not pick up
/// earlier copies. A named file with an unsupported extension is skipped with
/// a warning; a missing input is an error.
pub fn discover(inputs: &[PathBuf], exclude: Option<&Path>) -> Result<Vec<PathBuf>, PagegateError> {
    let exclude = exclude.and_then(|dir| fs::canonicalize(dir).ok());
    let mut found = Vec::new();

    for input in inputs {
        let metadata = fs::metadata(input).map_err(|err| {
            PagegateError::Io(std::io::Error::new(
                err.kind(),
                format!("cannot read input {}: {}", input.display(), err),
            ))
        })?;
        if metadata.is_dir() {
            walk(input, exclude.as_deref(), &mut found)?;
        } else if DocumentKind::of(input).is_some() {
            found.push(input.clone());
        } else {
            warn!(path = %input.display(), "Skipping unsupported input file");
        }
    }

    found.sort();
    found.dedup();
    debug!(documents = found.len(), "Inputs discovered");
    Ok(found)
}

fn walk(dir: &Path, exclude: Option<&Path>, found: &mut Vec<PathBuf>) -> Result<(), PagegateError> {
    if let Some(excluded) = exclude
        && fs::canonicalize(dir).is_ok_and(|canonical| canonical.starts_with(excluded))
    {
        debug!(dir = %dir.display(), "Skipping output directory");
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, exclude, found)?;
        } else if DocumentKind::of(&path).is_some() {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, b"x").expect("write file");
    }

    #[test]
    fn kinds_by_extension() {
        assert_eq!(DocumentKind::of(Path::new("a/scan.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::of(Path::new("page.jpeg")), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::of(Path::new("page.tif")), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::of(Path::new("notes.txt")), None);
        assert_eq!(DocumentKind::of(Path::new("Makefile")), None);
    }

    #[test]
    fn walks_directories_sorted() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = dir.path();
        touch(&root.join("b.png"));
        touch(&root.join("a.pdf"));
        touch(&root.join("nested/c.jpg"));
        touch(&root.join("nested/readme.md"));

        let found = discover(&[root.to_path_buf()], None).expect("discover");
        assert_eq!(
            found,
            vec![root.join("a.pdf"), root.join("b.png"), root.join("nested/c.jpg")]
        );
    }

    #[test]
    fn explicit_files_are_deduplicated() {
        let dir = tempfile::tempdir().expect("temp dir");
        let page = dir.path().join("page.png");
        touch(&page);

        let found = discover(&[page.clone(), page.clone(), dir.path().to_path_buf()], None)
            .expect("discover");
        assert_eq!(found, vec![page]);
    }

    #[test]
    fn output_directory_is_excluded() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = dir.path();
        touch(&root.join("in.png"));
        touch(&root.join("accepted/in.png"));

        let found =
            discover(&[root.to_path_buf()], Some(&root.join("accepted"))).expect("discover");
        assert_eq!(found, vec![root.join("in.png")]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = discover(&[dir.path().join("nope")], None);
        assert!(matches!(result, Err(PagegateError::Io(_))));
    }
}
