//! `publish-gist-lib` publishes a Markdown file as a GitHub Gist together with
//! the local images it references.
//!
//! The pipeline is strictly sequential: references are extracted from the
//! Markdown ([`references`]), resolved against the document's directory and
//! given flat gist filenames ([`resolve`], [`naming`]), then the [`Publisher`]
//! creates the gist, pushes the images through its git repository and replaces
//! the Markdown with a copy pointing at the uploaded files ([`rewrite`]).
//! External tools are reached through the [`SnippetService`] and
//! [`VersionControl`] capabilities.
//!
//! # Example
//!
//! ```rust
//! use publish_gist_lib::references::find_local_image_refs;
//! use publish_gist_lib::rewrite::raw_url;
//!
//! let refs = find_local_image_refs("![plot](out/plot.png) ![logo](https://example.com/l.png)");
//! assert_eq!(refs, vec!["out/plot.png".to_string()]);
//!
//! assert_eq!(
//!     raw_url("octocat", "0a1b2c", "_plot.png"),
//!     "https://gist.githubusercontent.com/octocat/0a1b2c/raw/_plot.png"
//! );
//! ```

pub mod error;
pub mod gist;
pub mod naming;
pub mod publish;
pub mod references;
pub mod resolve;
pub mod rewrite;
pub mod service;

pub use crate::error::PublishError;
pub use crate::publish::{Console, PublishOutcome, PublishRequest, Publisher};
pub use crate::resolve::RewritePlan;
pub use crate::service::{GhCli, GitCli, SnippetService, VersionControl};
