//! Capabilities of the external tools the publisher drives.
//!
//! [`SnippetService`] covers the gist side (`gh`) and [`VersionControl`] the
//! repository side (`git`). [`GhCli`] and [`GitCli`] implement them by running
//! the binaries synchronously; tests substitute recording doubles.

use crate::error::PublishError;
use crate::gist::owner_login_from_json;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Binaries that must be on `PATH` before publishing.
pub const REQUIRED_TOOLS: [&str; 2] = ["gh", "git"];

/// Options for creating a gist.
#[derive(Debug, Clone, Copy)]
pub struct CreateGist<'a> {
    /// The staged Markdown file; its filename becomes the gist filename.
    pub file: &'a Path,
    pub public: bool,
    pub description: Option<&'a str>,
}

pub trait SnippetService {
    /// Succeeds when the CLI has an authenticated session.
    fn auth_status(&self) -> Result<(), PublishError>;

    /// Creates a gist and returns the raw command output (the gist URL).
    fn create(&self, request: &CreateGist<'_>) -> Result<String, PublishError>;

    /// Clones the gist's backing repository into the existing empty `dir`.
    fn clone_into(&self, gist_id: &str, dir: &Path) -> Result<(), PublishError>;

    /// Login of the account that owns the gist.
    fn owner_login(&self, gist_id: &str) -> Result<String, PublishError>;

    /// Replaces the content of `filename` in the gist with the file at `source`.
    fn edit_file(&self, gist_id: &str, filename: &str, source: &Path) -> Result<(), PublishError>;

    fn open_in_browser(&self, gist_id: &str) -> Result<(), PublishError>;
}

pub trait VersionControl {
    fn add_all(&self, repo: &Path) -> Result<(), PublishError>;
    fn commit(&self, repo: &Path, message: &str) -> Result<(), PublishError>;
    fn push(&self, repo: &Path) -> Result<(), PublishError>;
}

/// [`SnippetService`] backed by the GitHub CLI.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: OsString,
}

impl GhCli {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.program)
    }
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl SnippetService for GhCli {
    fn auth_status(&self) -> Result<(), PublishError> {
        let mut cmd = self.command();
        cmd.args(["auth", "status"]);
        run(&mut cmd).map_err(|err| match err {
            PublishError::CommandFailed { .. } => PublishError::NotAuthenticated,
            other => other,
        })?;
        Ok(())
    }

    fn create(&self, request: &CreateGist<'_>) -> Result<String, PublishError> {
        let mut cmd = self.command();
        cmd.args(["gist", "create"]);
        if request.public {
            cmd.arg("--public");
        }
        if let Some(description) = request.description {
            cmd.arg("--desc").arg(description);
        }
        cmd.arg(request.file);
        run(&mut cmd)
    }

    fn clone_into(&self, gist_id: &str, dir: &Path) -> Result<(), PublishError> {
        let mut cmd = self.command();
        cmd.args(["gist", "clone", gist_id]).arg(dir);
        run(&mut cmd).map(drop)
    }

    fn owner_login(&self, gist_id: &str) -> Result<String, PublishError> {
        let mut cmd = self.command();
        cmd.arg("api").arg(format!("gists/{gist_id}"));
        let json = run(&mut cmd)?;
        owner_login_from_json(&json)
    }

    fn edit_file(&self, gist_id: &str, filename: &str, source: &Path) -> Result<(), PublishError> {
        let mut cmd = self.command();
        cmd.args(["gist", "edit", gist_id, "-f", filename]).arg(source);
        run(&mut cmd).map(drop)
    }

    fn open_in_browser(&self, gist_id: &str) -> Result<(), PublishError> {
        let mut cmd = self.command();
        cmd.args(["gist", "view", gist_id, "--web"]);
        run(&mut cmd).map(drop)
    }
}

/// [`VersionControl`] backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: OsString,
}

impl GitCli {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, repo: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(repo);
        cmd
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl VersionControl for GitCli {
    fn add_all(&self, repo: &Path) -> Result<(), PublishError> {
        run(self.command(repo).args(["add", "."])).map(drop)
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<(), PublishError> {
        run(self.command(repo).args(["commit", "-m", message])).map(drop)
    }

    fn push(&self, repo: &Path) -> Result<(), PublishError> {
        run(self.command(repo).arg("push")).map(drop)
    }
}

/// Runs `cmd` to completion and returns its trimmed stdout.
///
/// A non-zero exit becomes [`PublishError::CommandFailed`] carrying the last
/// non-empty line of stderr, or the exit status when stderr is blank.
fn run(cmd: &mut Command) -> Result<String, PublishError> {
    let rendered = render_command(cmd);
    log::debug!("running: {rendered}");

    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| PublishError::CommandSpawn {
            command: rendered.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::debug!("{rendered} failed: {}", stderr.trim_end());
        let reason = last_line(&stderr)
            .map(str::to_string)
            .unwrap_or_else(|| output.status.to_string());
        return Err(PublishError::CommandFailed {
            command: rendered,
            stderr: reason,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rfind(|line| !line.is_empty())
}

fn render_command(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Looks `name` up on `PATH` the way a shell would.
pub fn find_program(name: &str) -> Option<PathBuf> {
    find_program_in(name, &env::var_os("PATH")?)
}

/// Looks `name` up in the directories of a `PATH`-style list.
pub fn find_program_in(name: &str, path: &OsStr) -> Option<PathBuf> {
    env::split_paths(path).find_map(|dir| {
        executable_candidates(&dir, name)
            .into_iter()
            .find(|candidate| is_executable(candidate))
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(windows)]
fn executable_candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let exts = env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.CMD;.BAT".to_string());
    std::iter::once(dir.join(name))
        .chain(exts.split(';').map(|ext| dir.join(format!("{name}{ext}"))))
        .collect()
}

#[cfg(not(windows))]
fn executable_candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    vec![dir.join(name)]
}

/// Verifies every required tool is installed and `service` is logged in.
pub fn check_dependencies<S: SnippetService + ?Sized>(service: &S) -> Result<(), PublishError> {
    for tool in REQUIRED_TOOLS {
        if find_program(tool).is_none() {
            return Err(PublishError::MissingTool(tool.to_string()));
        }
    }
    service.auth_status()
}
