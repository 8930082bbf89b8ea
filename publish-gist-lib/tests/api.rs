use assert_fs::prelude::*;
use publish_gist_lib::error::PublishError;
use publish_gist_lib::references::find_local_image_refs;
use publish_gist_lib::service::CreateGist;
use publish_gist_lib::{
    Console, PublishOutcome, PublishRequest, Publisher, RewritePlan, SnippetService, VersionControl,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

const GIST_URL: &str = "https://gist.github.com/octocat/f00dfeed";

/// Records every call and keeps what would have been sent to the service.
#[derive(Default)]
struct FakeGist {
    calls: RefCell<Vec<String>>,
    created: RefCell<Option<(String, String)>>,
    edited: RefCell<Option<(String, String)>>,
    clone_dir: RefCell<Option<PathBuf>>,
    create_output: Option<String>,
}

impl FakeGist {
    fn new() -> Self {
        Self::default()
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl SnippetService for FakeGist {
    fn auth_status(&self) -> Result<(), PublishError> {
        self.calls.borrow_mut().push("auth".into());
        Ok(())
    }

    fn create(&self, request: &CreateGist<'_>) -> Result<String, PublishError> {
        let name = request.file.file_name().unwrap().to_string_lossy().into_owned();
        let content = fs::read_to_string(request.file).unwrap();
        self.calls.borrow_mut().push(format!(
            "create public={} desc={:?}",
            request.public, request.description
        ));
        *self.created.borrow_mut() = Some((name, content));
        Ok(self
            .create_output
            .clone()
            .unwrap_or_else(|| format!("{GIST_URL}\n")))
    }

    fn clone_into(&self, gist_id: &str, dir: &Path) -> Result<(), PublishError> {
        assert!(dir.is_dir(), "clone target must exist");
        assert_eq!(fs::read_dir(dir).unwrap().count(), 0, "clone target must be empty");
        self.calls.borrow_mut().push(format!("clone {gist_id}"));
        *self.clone_dir.borrow_mut() = Some(dir.to_path_buf());
        Ok(())
    }

    fn owner_login(&self, gist_id: &str) -> Result<String, PublishError> {
        self.calls.borrow_mut().push(format!("owner {gist_id}"));
        Ok("octocat".into())
    }

    fn edit_file(&self, gist_id: &str, filename: &str, source: &Path) -> Result<(), PublishError> {
        self.calls
            .borrow_mut()
            .push(format!("edit {gist_id} {filename}"));
        let content = fs::read_to_string(source).unwrap();
        *self.edited.borrow_mut() = Some((filename.to_string(), content));
        Ok(())
    }

    fn open_in_browser(&self, gist_id: &str) -> Result<(), PublishError> {
        self.calls.borrow_mut().push(format!("open {gist_id}"));
        Ok(())
    }
}

#[derive(Default)]
struct FakeGit {
    calls: RefCell<Vec<String>>,
    pushed_files: RefCell<Vec<String>>,
    fail_push: bool,
}

impl VersionControl for FakeGit {
    fn add_all(&self, _repo: &Path) -> Result<(), PublishError> {
        self.calls.borrow_mut().push("add".into());
        Ok(())
    }

    fn commit(&self, _repo: &Path, message: &str) -> Result<(), PublishError> {
        self.calls.borrow_mut().push(format!("commit {message}"));
        Ok(())
    }

    fn push(&self, repo: &Path) -> Result<(), PublishError> {
        self.calls.borrow_mut().push("push".into());
        if self.fail_push {
            return Err(PublishError::CommandFailed {
                command: "git push".into(),
                stderr: "remote rejected".into(),
            });
        }
        let mut files: Vec<String> = fs::read_dir(repo)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        *self.pushed_files.borrow_mut() = files;
        Ok(())
    }
}

struct Fixture {
    _temp: assert_fs::TempDir,
    dir: PathBuf,
}

fn fixture(files: &[&str]) -> Fixture {
    let temp = assert_fs::TempDir::new().unwrap();
    for file in files {
        temp.child(file).write_binary(b"\x89PNG").unwrap();
    }
    let dir = fs::canonicalize(temp.path()).unwrap();
    Fixture { _temp: temp, dir }
}

fn publish(
    service: &FakeGist,
    git: &FakeGit,
    content: &str,
    plan: &RewritePlan,
) -> (Result<PublishOutcome, PublishError>, String) {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let request = PublishRequest {
        content,
        gist_filename: "2026-01-02T030405Z-notes.md",
        plan,
        public: false,
        description: Some("Weekly notes"),
    };
    let result = {
        let mut console = Console::new(&mut out, &mut err);
        Publisher::new(service, git).publish(&request, &mut console)
    };
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn duplicate_reference_is_uploaded_once_and_rewritten_everywhere() {
    let fx = fixture(&["diagram.png"]);
    let content = "![diagram](diagram.png)\n![diagram](diagram.png)";
    let plan = RewritePlan::build(&find_local_image_refs(content), &fx.dir);
    assert_eq!(plan.len(), 1);

    let service = FakeGist::new();
    let git = FakeGit::default();
    let (result, stdout) = publish(&service, &git, content, &plan);
    let outcome = result.unwrap();

    let url = "https://gist.githubusercontent.com/octocat/f00dfeed/raw/_diagram.png";
    let expected = format!("![diagram]({url})\n![diagram]({url})");
    assert_eq!(outcome.gist.id(), "f00dfeed");
    assert_eq!(outcome.rewritten.as_deref(), Some(expected.as_str()));

    assert_eq!(
        service.calls(),
        vec![
            "create public=false desc=Some(\"Weekly notes\")",
            "clone f00dfeed",
            "owner f00dfeed",
            "edit f00dfeed 2026-01-02T030405Z-notes.md",
        ]
    );
    assert_eq!(
        git.calls.borrow().clone(),
        vec!["add", "commit Add images", "push"]
    );
    assert_eq!(git.pushed_files.borrow().clone(), vec!["_diagram.png"]);

    let (created_name, created_content) = service.created.borrow().clone().unwrap();
    assert_eq!(created_name, "2026-01-02T030405Z-notes.md");
    assert_eq!(created_content, content);

    let (edited_name, edited_content) = service.edited.borrow().clone().unwrap();
    assert_eq!(edited_name, "2026-01-02T030405Z-notes.md");
    assert_eq!(edited_content, expected);

    assert!(stdout.contains(&format!("Gist created: {GIST_URL}")));
    assert!(stdout.contains("Gist updated with embedded image URLs"));
}

#[test]
fn colliding_basenames_are_uploaded_under_distinct_names() {
    let fx = fixture(&["a/img.png", "b/img.png"]);
    let content = "![one](a/img.png)\n<img src=\"b/img.png\">";
    let plan = RewritePlan::build(&find_local_image_refs(content), &fx.dir);

    let service = FakeGist::new();
    let git = FakeGit::default();
    let (result, _) = publish(&service, &git, content, &plan);
    let outcome = result.unwrap();

    assert_eq!(
        git.pushed_files.borrow().clone(),
        vec!["_img-2.png", "_img.png"]
    );
    assert_eq!(
        outcome.rewritten.unwrap(),
        "![one](https://gist.githubusercontent.com/octocat/f00dfeed/raw/_img.png)\n\
         <img src=\"https://gist.githubusercontent.com/octocat/f00dfeed/raw/_img-2.png\">"
    );
}

#[test]
fn document_without_local_images_only_creates_the_gist() {
    let fx = fixture(&[]);
    let content = "# Title\n\n![remote](https://example.com/x.png)\n![gone](missing.png)\n";
    let plan = RewritePlan::build(&find_local_image_refs(content), &fx.dir);
    assert!(plan.is_empty());

    let service = FakeGist::new();
    let git = FakeGit::default();
    let (result, _) = publish(&service, &git, content, &plan);
    let outcome = result.unwrap();

    assert!(outcome.rewritten.is_none());
    assert_eq!(service.calls().len(), 1);
    assert!(git.calls.borrow().is_empty());
}

#[test]
fn push_failure_aborts_and_cleans_up_clone() {
    let fx = fixture(&["diagram.png"]);
    let content = "![d](diagram.png)";
    let plan = RewritePlan::build(&find_local_image_refs(content), &fx.dir);

    let service = FakeGist::new();
    let git = FakeGit {
        fail_push: true,
        ..FakeGit::default()
    };
    let (result, _) = publish(&service, &git, content, &plan);

    assert!(matches!(result, Err(PublishError::CommandFailed { .. })));
    assert!(service.created.borrow().is_some());
    assert!(service.edited.borrow().is_none());
    assert!(!service.calls().iter().any(|call| call.starts_with("owner")));

    let clone_dir = service.clone_dir.borrow().clone().unwrap();
    assert!(!clone_dir.exists(), "temporary clone must be removed");
}

#[test]
fn unexpected_create_output_is_fatal() {
    let fx = fixture(&["diagram.png"]);
    let content = "![d](diagram.png)";
    let plan = RewritePlan::build(&find_local_image_refs(content), &fx.dir);

    let service = FakeGist {
        create_output: Some("something went sideways".into()),
        ..FakeGist::new()
    };
    let git = FakeGit::default();
    let (result, _) = publish(&service, &git, content, &plan);

    match result {
        Err(PublishError::UnexpectedCreateResponse(text)) => {
            assert_eq!(text, "something went sideways");
        }
        other => panic!("expected create failure, got {other:?}"),
    }
    assert_eq!(service.calls().len(), 1);
}
