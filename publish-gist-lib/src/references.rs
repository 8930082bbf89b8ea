//! Finds local image references in Markdown text.
//!
//! Two syntaxes are recognised: the Markdown image form `![alt](target)` and
//! the `src` attribute of an HTML `<img>` element. Matching is purely textual;
//! references inside code fences are picked up like any other text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Captures the target of `![alt](target)`.
pub(crate) static MARKDOWN_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*\]\(([^)]+)\)").expect("valid markdown image regex"));

/// Captures the quoted `src` of an `<img>` element, case-insensitively.
pub(crate) static HTML_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).expect("valid html image regex")
});

/// Returns `true` if the target points at a remote resource.
pub fn is_remote(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Extracts the unique local image targets referenced by `content`.
///
/// Markdown-syntax targets come first in document order, followed by HTML
/// `<img>` targets. Later duplicates of a target are dropped.
pub fn find_local_image_refs(content: &str) -> Vec<String> {
    let markdown = MARKDOWN_IMAGE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1));
    let html = HTML_IMAGE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1));

    let mut seen = HashSet::new();
    markdown
        .chain(html)
        .map(|m| m.as_str())
        .filter(|target| !is_remote(target))
        .filter(|target| seen.insert(*target))
        .map(str::to_string)
        .collect()
}
