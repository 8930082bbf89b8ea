//! Points image references at the copies uploaded to the gist.
//!
//! Substitution is regex based, not a Markdown parse: the `![alt](...)` pass
//! runs first, then the `<img src="...">` pass. A reference split across lines
//! is not matched, and references inside code fences are rewritten as well.

use crate::resolve::RewritePlan;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};

/// Host serving raw gist content.
pub const RAW_HOST: &str = "gist.githubusercontent.com";

const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Builds the revision-less raw URL of `filename` in a gist.
///
/// Without a commit hash the URL always serves the latest pushed content.
pub fn raw_url(owner: &str, gist_id: &str, filename: &str) -> String {
    let encoded = utf8_percent_encode(filename, FILENAME_ENCODE_SET);
    format!("https://{RAW_HOST}/{owner}/{gist_id}/raw/{encoded}")
}

/// Returns `content` with every resolved reference replaced by its raw URL.
///
/// Only occurrences used as an image target are touched; the surrounding
/// syntax, alt text and quote characters are preserved.
pub fn rewrite_references(
    content: &str,
    plan: &RewritePlan,
    owner: &str,
    gist_id: &str,
) -> String {
    let mut rewritten = content.to_string();
    for image in plan.images() {
        let url = raw_url(owner, gist_id, &image.name);
        let escaped = regex::escape(&image.reference);

        let markdown = Regex::new(&format!(r"(!\[[^\]]*\]\()({escaped})(\))"))
            .expect("escaped reference forms a valid regex");
        rewritten = replace_target(&markdown, &rewritten, &url);

        let html = Regex::new(&format!(r#"(?i)(<img[^>]+src=["'])({escaped})(["'])"#))
            .expect("escaped reference forms a valid regex");
        rewritten = replace_target(&html, &rewritten, &url);
    }
    rewritten
}

fn replace_target(pattern: &Regex, text: &str, url: &str) -> String {
    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            format!("{}{url}{}", &caps[1], &caps[3])
        })
        .into_owned()
}
