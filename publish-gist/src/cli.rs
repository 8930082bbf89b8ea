//! Defines the command-line interface for the application.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "publish-gist",
    version,
    about = "Publish a Markdown file as a GitHub Gist, uploading the local images it references."
)]
pub struct Cli {
    /// The Markdown file to publish.
    #[arg(value_name = "MARKDOWN_FILE")]
    pub markdown_file: PathBuf,

    /// Filename for the Markdown file in the gist [default: the original filename].
    /// GitHub titles a gist after its alphabetically-first filename, so this
    /// controls what the gist is called. `.md` is appended when missing.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Make the gist publicly listed instead of secret.
    #[arg(long)]
    pub public: bool,

    /// Description for the gist.
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    pub desc: Option<String>,

    /// Open the gist in a browser once it is published.
    #[arg(long)]
    pub web: bool,

    /// Show which images would be uploaded without contacting GitHub.
    #[arg(long)]
    pub dry_run: bool,
}
