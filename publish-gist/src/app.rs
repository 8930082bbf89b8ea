use crate::cli::Cli;
use anyhow::{anyhow, Context};
use chrono::Utc;
use clap::Parser;
use publish_gist_lib::naming::gist_markdown_name;
use publish_gist_lib::publish::report_plan;
use publish_gist_lib::references::find_local_image_refs;
use publish_gist_lib::resolve::markdown_dir;
use publish_gist_lib::service::check_dependencies;
use publish_gist_lib::{
    Console, GhCli, GitCli, PublishError, PublishRequest, Publisher, RewritePlan, SnippetService,
    VersionControl,
};
use std::fs;
use std::io::{self, Write};

pub fn run() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let mut console = Console::new(&mut out, &mut err);

    publish_file(cli, &GhCli::default(), &GitCli::default(), &mut console)
}

fn publish_file<S, V>(
    cli: Cli,
    service: &S,
    vcs: &V,
    console: &mut Console<'_>,
) -> anyhow::Result<()>
where
    S: SnippetService,
    V: VersionControl,
{
    let Cli {
        markdown_file,
        name,
        public,
        desc,
        web,
        dry_run,
    } = cli;

    if !markdown_file.is_file() {
        return Err(PublishError::InputNotFound(markdown_file).into());
    }

    if !dry_run {
        check_dependencies(service)?;
    }

    let dir = markdown_dir(&markdown_file).with_context(|| {
        format!(
            "Could not determine directory of {}",
            markdown_file.display()
        )
    })?;
    let basename = markdown_file
        .file_name()
        .map(|file_name| file_name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Invalid markdown path: {}", markdown_file.display()))?;
    let gist_filename = gist_markdown_name(name.as_deref(), &basename, Utc::now());
    log::debug!(
        "publishing {} from {} as {gist_filename}",
        basename,
        dir.display()
    );

    let content = fs::read_to_string(&markdown_file)
        .with_context(|| format!("Failed to read input file: {}", markdown_file.display()))?;
    let references = find_local_image_refs(&content);

    writeln!(console.out, "Processing: {}", markdown_file.display())?;
    if gist_filename != basename {
        writeln!(console.out, "Gist filename: {gist_filename}")?;
    }
    writeln!(
        console.out,
        "Found {} local image reference(s)",
        references.len()
    )?;

    let plan = RewritePlan::build(&references, &dir);
    report_plan(&plan, console)?;

    if dry_run {
        writeln!(
            console.out,
            "\nDry run: {} image(s) would be uploaded, nothing was published.",
            plan.len()
        )?;
        return Ok(());
    }

    let request = PublishRequest {
        content: &content,
        gist_filename: &gist_filename,
        plan: &plan,
        public,
        description: desc.as_deref(),
    };
    let outcome = Publisher::new(service, vcs).publish(&request, console)?;

    writeln!(console.out, "\nDone! Gist URL: {}", outcome.gist)?;

    if web {
        writeln!(console.out, "Opening in browser...")?;
        service.open_in_browser(outcome.gist.id())?;
    }

    Ok(())
}
