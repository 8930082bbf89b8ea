//! Filename rules for files stored in a gist.
//!
//! A gist is titled after its alphabetically-first filename. The Markdown file
//! is therefore prefixed with a UTC timestamp (digits sort before letters) and
//! every uploaded image is prefixed with `_` so it sorts after it.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;

/// `strftime` pattern prepended to the gist's Markdown filename.
pub const TIMESTAMP_PREFIX_FORMAT: &str = "%Y-%m-%dT%H%M%SZ-";

const MARKDOWN_EXTENSION: &str = ".md";

/// Filenames already assigned to uploaded images during one run.
#[derive(Debug, Default, Clone)]
pub struct TakenNames {
    names: HashSet<String>,
}

impl TakenNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn claim(&mut self, name: String) -> String {
        self.names.insert(name.clone());
        name
    }
}

/// Flattens a (decoded) reference path to a unique gist filename.
///
/// The basename gets a leading `_` and its spaces become hyphens. When that
/// name is taken, `-2`, `-3`, ... is inserted before the extension until the
/// name is free. The chosen name is recorded in `taken`.
pub fn sanitize_filename(path: &str, taken: &mut TakenNames) -> String {
    let basename = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let base = format!("_{}", basename.replace(' ', "-"));

    if !taken.contains(&base) {
        return taken.claim(base);
    }

    let (stem, ext) = split_extension(&base);
    let mut counter = 2usize;
    loop {
        let candidate = format!("{stem}-{counter}{ext}");
        if !taken.contains(&candidate) {
            return taken.claim(candidate);
        }
        counter += 1;
    }
}

/// Splits `name` at its last `.`, keeping the dot with the extension.
/// A dot in the first position does not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Builds the gist filename for the Markdown document.
///
/// `name_override` wins over the original basename; the result always ends in
/// `.md` and is prefixed with the UTC timestamp of `now`.
pub fn gist_markdown_name(
    name_override: Option<&str>,
    original_basename: &str,
    now: DateTime<Utc>,
) -> String {
    let mut name = name_override.unwrap_or(original_basename).to_string();
    if !name.ends_with(MARKDOWN_EXTENSION) {
        name.push_str(MARKDOWN_EXTENSION);
    }
    format!("{}{name}", now.format(TIMESTAMP_PREFIX_FORMAT))
}
