//! Orchestrates creating a gist, uploading images and rewriting the document.
//!
//! `gh gist create` only accepts text files, so the gist is first created with
//! the Markdown alone. Images are then pushed through the gist's git
//! repository and the Markdown is replaced with a copy whose references point
//! at the uploaded files. A failure after creation leaves the Markdown-only
//! gist in place.

use crate::error::PublishError;
use crate::gist::GistUrl;
use crate::resolve::{Resolution, RewritePlan};
use crate::rewrite::rewrite_references;
use crate::service::{CreateGist, SnippetService, VersionControl};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Commit message used when pushing images to the gist repository.
pub const COMMIT_MESSAGE: &str = "Add images";

/// Destination for user-facing progress lines.
pub struct Console<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

impl<'a> Console<'a> {
    pub fn new(out: &'a mut dyn Write, err: &'a mut dyn Write) -> Self {
        Self { out, err }
    }
}

/// Everything needed to publish one document.
#[derive(Debug, Clone, Copy)]
pub struct PublishRequest<'a> {
    /// Markdown text as read from disk.
    pub content: &'a str,
    /// Filename of the Markdown file inside the gist.
    pub gist_filename: &'a str,
    pub plan: &'a RewritePlan,
    pub public: bool,
    pub description: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub gist: GistUrl,
    /// The Markdown as finally stored in the gist, when it had to be rewritten.
    pub rewritten: Option<String>,
}

pub struct Publisher<'a, S: ?Sized, V: ?Sized> {
    service: &'a S,
    vcs: &'a V,
}

impl<'a, S, V> Publisher<'a, S, V>
where
    S: SnippetService + ?Sized,
    V: VersionControl + ?Sized,
{
    pub fn new(service: &'a S, vcs: &'a V) -> Self {
        Self { service, vcs }
    }

    pub fn publish(
        &self,
        request: &PublishRequest<'_>,
        console: &mut Console<'_>,
    ) -> Result<PublishOutcome, PublishError> {
        writeln!(console.out, "\nCreating gist...")?;
        let gist = self.create(request)?;
        writeln!(console.out, "Gist created: {gist}")?;

        if request.plan.is_empty() {
            return Ok(PublishOutcome {
                gist,
                rewritten: None,
            });
        }

        let clone_dir = tempfile::Builder::new()
            .prefix("publish-gist-clone-")
            .tempdir()?;
        let rewritten = self.upload_and_rewrite(request, &gist, &clone_dir, console)?;

        Ok(PublishOutcome {
            gist,
            rewritten: Some(rewritten),
        })
    }

    /// Stages the Markdown alone under the gist filename and creates the gist.
    fn create(&self, request: &PublishRequest<'_>) -> Result<GistUrl, PublishError> {
        let staging = tempfile::Builder::new()
            .prefix("publish-gist-stage-")
            .tempdir()?;
        let staged = staging.path().join(request.gist_filename);
        fs::write(&staged, request.content)?;

        let output = self.service.create(&CreateGist {
            file: &staged,
            public: request.public,
            description: request.description,
        })?;
        GistUrl::parse(&output)
    }

    fn upload_and_rewrite(
        &self,
        request: &PublishRequest<'_>,
        gist: &GistUrl,
        clone_dir: &TempDir,
        console: &mut Console<'_>,
    ) -> Result<String, PublishError> {
        let repo = clone_dir.path();

        writeln!(console.out, "Cloning gist repo...")?;
        self.service.clone_into(gist.id(), repo)?;

        for image in request.plan.images() {
            copy_image(&image.path, &repo.join(&image.name))?;
        }

        self.vcs.add_all(repo)?;
        self.vcs.commit(repo, COMMIT_MESSAGE)?;
        writeln!(console.out, "Pushing images to gist...")?;
        self.vcs.push(repo)?;

        let owner = self.service.owner_login(gist.id())?;
        let rewritten = rewrite_references(request.content, request.plan, &owner, gist.id());

        let markdown_path = repo.join(request.gist_filename);
        fs::write(&markdown_path, &rewritten)?;

        writeln!(console.out, "Updating markdown with image URLs...")?;
        self.service
            .edit_file(gist.id(), request.gist_filename, &markdown_path)?;
        writeln!(console.out, "Gist updated with embedded image URLs")?;

        Ok(rewritten)
    }
}

/// Prints one line per reference: its gist filename, or why it was skipped.
pub fn report_plan(plan: &RewritePlan, console: &mut Console<'_>) -> Result<(), PublishError> {
    for resolution in plan.resolutions() {
        match resolution {
            Resolution::Resolved(image) => {
                writeln!(console.out, "  {} -> {}", image.reference, image.name)?;
            }
            Resolution::Skipped(skipped) => {
                writeln!(
                    console.err,
                    "  Warning: {}: {}",
                    skipped.reason, skipped.reference
                )?;
            }
        }
    }
    Ok(())
}

fn copy_image(source: &Path, destination: &Path) -> Result<(), PublishError> {
    fs::copy(source, destination).map_err(|err| {
        PublishError::Io(format!(
            "failed to copy {} to {}: {err}",
            source.display(),
            destination.display()
        ))
    })?;
    Ok(())
}
