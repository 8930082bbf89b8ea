//! Maps image references to files on disk and assigns their gist filenames.

use crate::naming::{sanitize_filename, TakenNames};
use percent_encoding::percent_decode_str;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// A reference that points at a readable file inside the Markdown directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// The target exactly as written in the document.
    pub reference: String,
    /// Flat filename the image is uploaded under.
    pub name: String,
    /// Canonical path of the image on disk.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OutsideDirectory,
    NotFound,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::OutsideDirectory => {
                f.write_str("Referenced image outside markdown directory, skipping")
            }
            SkipReason::NotFound => f.write_str("Referenced image not found, skipping"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedReference {
    pub reference: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedImage),
    Skipped(SkippedReference),
}

/// Returns the canonical directory containing `markdown_file`.
///
/// Only the parent is canonicalized, so a symlinked Markdown file resolves its
/// images next to the link rather than next to its target.
pub fn markdown_dir(markdown_file: &Path) -> io::Result<PathBuf> {
    let parent = match markdown_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::canonicalize(parent)
}

/// Resolves one reference relative to `markdown_dir`, which must be canonical.
///
/// The target is percent-decoded, joined onto the directory and checked to stay
/// inside it both lexically and after symlinks are resolved. Only existing
/// regular files resolve; a name is claimed in `taken` only for those.
pub fn resolve_reference(
    reference: &str,
    markdown_dir: &Path,
    taken: &mut TakenNames,
) -> Resolution {
    let decoded = percent_decode_str(reference).decode_utf8_lossy();
    let joined = normalize_lexically(&markdown_dir.join(&*decoded));

    let skip = |reason: SkipReason| {
        log::debug!("skipping {reference}: {reason}");
        Resolution::Skipped(SkippedReference {
            reference: reference.to_string(),
            reason,
        })
    };

    if !joined.starts_with(markdown_dir) {
        return skip(SkipReason::OutsideDirectory);
    }
    if !joined.is_file() {
        return skip(SkipReason::NotFound);
    }

    let canonical = match fs::canonicalize(&joined) {
        Ok(path) => path,
        Err(_) => return skip(SkipReason::NotFound),
    };
    if !canonical.starts_with(markdown_dir) {
        return skip(SkipReason::OutsideDirectory);
    }

    let name = sanitize_filename(&decoded, taken);
    log::debug!("resolved {reference} to {} as {name}", canonical.display());
    Resolution::Resolved(ResolvedImage {
        reference: reference.to_string(),
        name,
        path: canonical,
    })
}

/// Folds `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// The outcome of resolving every reference found in a document.
///
/// Resolutions keep the order of their references; that order also decides
/// which duplicate basename receives the `-2` suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewritePlan {
    resolutions: Vec<Resolution>,
}

impl RewritePlan {
    pub fn build<I, S>(references: I, markdown_dir: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut taken = TakenNames::new();
        let resolutions = references
            .into_iter()
            .map(|reference| resolve_reference(reference.as_ref(), markdown_dir, &mut taken))
            .collect();
        Self { resolutions }
    }

    /// Every reference in document order, resolved or not.
    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    pub fn images(&self) -> impl Iterator<Item = &ResolvedImage> + '_ {
        self.resolutions.iter().filter_map(|resolution| match resolution {
            Resolution::Resolved(image) => Some(image),
            Resolution::Skipped(_) => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &SkippedReference> + '_ {
        self.resolutions.iter().filter_map(|resolution| match resolution {
            Resolution::Skipped(skipped) => Some(skipped),
            Resolution::Resolved(_) => None,
        })
    }

    /// `true` when no reference resolved to an uploadable image.
    pub fn is_empty(&self) -> bool {
        self.images().next().is_none()
    }

    /// Number of images to upload.
    pub fn len(&self) -> usize {
        self.images().count()
    }

    /// Gist filename assigned to `reference`, if it resolved.
    pub fn name_for(&self, reference: &str) -> Option<&str> {
        self.images()
            .find(|image| image.reference == reference)
            .map(|image| image.name.as_str())
    }
}
