use std::path::Path;
use std::sync::Arc;

use amp_agent::{run_logged, AgentContext, BasicEngine, EchoModel};
use amp_runlog::{FileRunLogger, RunLogger};
use amp_sdk::{AddArtifact, Amp, AppendVersion, ItemKind, MimeType, VerifyIssue};
use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let data = cli.data.as_path();
    let format = cli.format;
    match cli.command {
        Command::Project(args) => cmd_project(data, format, args.action),
        Command::Artifact(args) => cmd_artifact(data, format, args.action),
        Command::Folder(args) => cmd_folder(data, format, args.action),
        Command::Items(args) => cmd_items(data, format, args),
        Command::Rm(args) => cmd_rm(data, args),
        Command::Run(args) => cmd_run(data, format, args),
        Command::Fsck(_) => cmd_fsck(data, format),
        Command::Gc(_) => cmd_gc(data, format),
    }
}

fn open(data: &Path) -> anyhow::Result<Amp> {
    Amp::open(data).with_context(|| format!("failed to open data directory {}", data.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_project(data: &Path, format: OutputFormat, action: ProjectAction) -> anyhow::Result<()> {
    let amp = open(data)?;
    match action {
        ProjectAction::Create { name } => {
            let project = amp.create_project(&name)?;
            match format {
                OutputFormat::Json => print_json(&project)?,
                OutputFormat::Text => println!("{}", project.id),
            }
        }
        ProjectAction::List => {
            let projects = amp.list_projects()?;
            match format {
                OutputFormat::Json => print_json(&projects)?,
                OutputFormat::Text if projects.is_empty() => println!("(none)"),
                OutputFormat::Text => {
                    for p in &projects {
                        println!("{}\t{}", p.id.as_str().yellow(), p.name);
                    }
                }
            }
        }
        ProjectAction::Show { id } => {
            let Some(project) = amp.get_project(&id)? else {
                bail!("project not found: {id}");
            };
            print_json(&project)?;
        }
        ProjectAction::Delete { id } => {
            amp.delete_project(&id)
                .with_context(|| format!("failed to delete project {id}"))?;
            println!("{} Deleted project {}", "✓".green(), id.as_str().yellow());
        }
    }
    Ok(())
}

fn cmd_artifact(data: &Path, format: OutputFormat, action: ArtifactAction) -> anyhow::Result<()> {
    let amp = open(data)?;
    match action {
        ArtifactAction::Add(args) => {
            let added = amp
                .add_artifact_from_file(
                    &args.project_id,
                    &args.path,
                    AddArtifact {
                        name: args.name,
                        comment: args.comment,
                        parent: args.parent,
                        ..AddArtifact::default()
                    },
                )
                .with_context(|| format!("failed to add {}", args.path.display()))?;
            match format {
                OutputFormat::Json => print_json(&added)?,
                OutputFormat::Text => {
                    println!("{}\t{}\tv{}", added.artifact_id, added.item_id, added.version)
                }
            }
        }
        ArtifactAction::Append(args) => {
            let added = amp
                .append_version_from_file(
                    &args.artifact_id,
                    &args.path,
                    AppendVersion {
                        comment: args.comment,
                        ..AppendVersion::default()
                    },
                )
                .with_context(|| format!("failed to append {}", args.path.display()))?;
            match format {
                OutputFormat::Json => print_json(&added)?,
                OutputFormat::Text => {
                    println!("{}\t{}\tv{}", added.artifact_id, added.item_id, added.version)
                }
            }
        }
        ArtifactAction::History { artifact_id } => {
            let rows = amp.history(&artifact_id)?;
            match format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Text if rows.is_empty() => println!("(none)"),
                OutputFormat::Text => {
                    for r in &rows {
                        let comment = r
                            .comment
                            .as_deref()
                            .map(|c| format!("  # {c}"))
                            .unwrap_or_default();
                        println!(
                            "{}\t{}B\t{}...\t{}{}",
                            format!("v{}", r.version).yellow(),
                            r.size_bytes,
                            r.sha256.short_hex().dimmed(),
                            r.rel_path,
                            comment
                        );
                    }
                }
            }
        }
        ArtifactAction::Export(args) => {
            let path = amp
                .export_version(&args.artifact_id, args.version, args.out.as_deref())
                .with_context(|| {
                    format!("failed to export {} {}", args.artifact_id, args.version)
                })?;
            match format {
                OutputFormat::Json => print_json(&json!({ "path": path }))?,
                OutputFormat::Text => println!("{}", path.display()),
            }
        }
        ArtifactAction::Show(args) => {
            let text = amp.render_version(&args.artifact_id, args.version)?;
            match format {
                OutputFormat::Json => print_json(&json!({
                    "artifactId": args.artifact_id,
                    "version": args.version,
                    "content": text,
                }))?,
                OutputFormat::Text => print!("{text}"),
            }
        }
    }
    Ok(())
}

fn cmd_folder(data: &Path, format: OutputFormat, action: FolderAction) -> anyhow::Result<()> {
    let amp = open(data)?;
    match action {
        FolderAction::Create { project_id, name, parent } => {
            let folder = amp.create_folder(&project_id, &name, parent.as_ref())?;
            match format {
                OutputFormat::Json => print_json(&folder)?,
                OutputFormat::Text => println!("{}\t{}", folder.id, folder.slug),
            }
        }
    }
    Ok(())
}

fn cmd_items(data: &Path, format: OutputFormat, args: ItemsArgs) -> anyhow::Result<()> {
    let amp = open(data)?;
    let items = amp.list_items(&args.project_id)?;
    match format {
        OutputFormat::Json => print_json(&items)?,
        OutputFormat::Text if items.is_empty() => println!("(none)"),
        OutputFormat::Text => {
            for item in &items {
                let indent = if item.parent_id.is_some() { "  " } else { "" };
                let slug = match item.kind {
                    ItemKind::Folder => format!("{}/", item.slug).blue().bold(),
                    ItemKind::File => item.slug.normal(),
                };
                println!("{indent}{}\t{}\t{}", slug, item.id.as_str().dimmed(), item.name);
            }
        }
    }
    Ok(())
}

fn cmd_rm(data: &Path, args: RmArgs) -> anyhow::Result<()> {
    let amp = open(data)?;
    amp.remove_item(&args.item_id)?;
    println!("{} Removed {}", "✓".green(), args.item_id.as_str().yellow());
    Ok(())
}

fn cmd_run(data: &Path, format: OutputFormat, args: RunArgs) -> anyhow::Result<()> {
    let amp = open(data)?;
    if amp.get_project(&args.project_id)?.is_none() {
        bail!("project not found: {}", args.project_id);
    }

    let run_id = amp.ids().run_id();
    let logger = Arc::new(
        FileRunLogger::create(data, run_id.clone(), Some(args.project_id.clone()))
            .context("failed to open run log")?,
    );
    let ctx = AgentContext::new(
        args.project_id.clone(),
        args.input.clone(),
        Arc::new(EchoModel),
        logger.clone(),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let outcome = runtime.block_on(run_logged(&BasicEngine, &ctx, &args.assistant_id));
    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            logger.close()?;
            return Err(e).context("run failed");
        }
    };
    let reply = result.first_text().to_string();

    let saved = if args.save {
        let added = amp.add_artifact_bytes(
            &args.project_id,
            &format!("{run_id}.md"),
            reply.as_bytes(),
            AddArtifact {
                name: Some(format!("Run {run_id}")),
                comment: Some(format!("reply from {}", args.assistant_id)),
                source_run_id: Some(run_id.clone()),
                exported_as: Some(MimeType::Markdown.format_tag().to_string()),
                ..AddArtifact::default()
            },
        )?;
        logger.event(
            "artifact.saved",
            Some(json!({ "artifactId": added.artifact_id, "version": added.version })),
        );
        Some(added)
    } else {
        None
    };
    logger.close()?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "runId": run_id,
            "reply": reply,
            "log": logger.path(),
            "artifact": saved,
        }))?,
        OutputFormat::Text => {
            println!("{reply}");
            if let Some(added) = saved {
                eprintln!("{} Saved as {} v{}", "✓".green(), added.artifact_id, added.version);
            }
        }
    }
    Ok(())
}

fn cmd_fsck(data: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let amp = open(data)?;
    let report = amp.verify_all()?;
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            for issue in &report.issues {
                match issue {
                    VerifyIssue::Missing { rel_path, .. } => {
                        println!("{} missing {}", "✗".red().bold(), rel_path)
                    }
                    VerifyIssue::InvalidPath { rel_path, .. } => {
                        println!("{} invalid path {}", "✗".red().bold(), rel_path)
                    }
                    VerifyIssue::Corrupt { rel_path, expected, actual, .. } => println!(
                        "{} corrupt {} (expected {}, got {})",
                        "✗".red().bold(),
                        rel_path,
                        expected,
                        actual
                    ),
                }
            }
            for orphan in &report.orphans {
                println!("{} orphan {}", "!".yellow(), orphan);
            }
            if report.is_clean() {
                println!("{} {} versions verified", "✓".green().bold(), report.checked);
            }
        }
    }
    if !report.is_clean() {
        bail!("{} of {} versions failed verification", report.issues.len(), report.checked);
    }
    Ok(())
}

fn cmd_gc(data: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let amp = open(data)?;
    let report = amp.collect_garbage()?;
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => println!(
            "{} GC: {} blobs removed, {} bytes freed",
            "✓".green(),
            report.removed.len(),
            report.bytes_freed
        ),
    }
    Ok(())
}
