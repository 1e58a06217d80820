use std::path::PathBuf;

use amp_types::{ArtifactId, ItemId, ProjectId, VersionSelector};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "amp",
    about = "Amp: versioned artifact store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Data directory
    #[arg(long, global = true, env = "AMP_DATA_DIR", default_value = ".amp")]
    pub data: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create, list, show or delete projects
    Project(ProjectArgs),
    /// Add, append, inspect and export artifacts
    Artifact(ArtifactArgs),
    /// Manage folders
    Folder(FolderArgs),
    /// List the items of a project
    Items(ItemsArgs),
    /// Hide an item from listings
    Rm(RmArgs),
    /// Run an assistant against a project
    Run(RunArgs),
    /// Verify every stored version against its digest
    Fsck(FsckArgs),
    /// Remove blobs no version refers to
    Gc(GcArgs),
}

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    Create { name: String },
    List,
    Show { id: ProjectId },
    Delete { id: ProjectId },
}

#[derive(Args)]
pub struct ArtifactArgs {
    #[command(subcommand)]
    pub action: ArtifactAction,
}

#[derive(Subcommand)]
pub enum ArtifactAction {
    /// Add a file as a new versioned artifact
    Add(ArtifactAddArgs),
    /// Append a new version to an artifact
    Append(ArtifactAppendArgs),
    /// Show artifact versions
    History { artifact_id: ArtifactId },
    /// Export an artifact version to a file
    Export(ArtifactExportArgs),
    /// Print an artifact version
    Show(ArtifactShowArgs),
}

#[derive(Args)]
pub struct ArtifactAddArgs {
    pub project_id: ProjectId,
    pub path: PathBuf,
    /// Display name (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub comment: Option<String>,
    /// Folder to place the artifact in
    #[arg(long)]
    pub parent: Option<ItemId>,
}

#[derive(Args)]
pub struct ArtifactAppendArgs {
    pub artifact_id: ArtifactId,
    pub path: PathBuf,
    #[arg(long)]
    pub comment: Option<String>,
}

#[derive(Args)]
pub struct ArtifactExportArgs {
    pub artifact_id: ArtifactId,
    /// `latest`, `N` or `vN`
    #[arg(long, default_value = "latest")]
    pub version: VersionSelector,
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct ArtifactShowArgs {
    pub artifact_id: ArtifactId,
    #[arg(long, default_value = "latest")]
    pub version: VersionSelector,
}

#[derive(Args)]
pub struct FolderArgs {
    #[command(subcommand)]
    pub action: FolderAction,
}

#[derive(Subcommand)]
pub enum FolderAction {
    Create {
        project_id: ProjectId,
        name: String,
        #[arg(long)]
        parent: Option<ItemId>,
    },
}

#[derive(Args)]
pub struct ItemsArgs {
    pub project_id: ProjectId,
}

#[derive(Args)]
pub struct RmArgs {
    pub item_id: ItemId,
}

#[derive(Args)]
pub struct RunArgs {
    pub assistant_id: String,
    pub project_id: ProjectId,
    #[arg(long, default_value = "")]
    pub input: String,
    /// Store the reply as a new artifact
    #[arg(long)]
    pub save: bool,
}

#[derive(Args)]
pub struct FsckArgs {}
#[derive(Args)]
pub struct GcArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn parse_project_create() {
        let cli = parse(&["amp", "project", "create", "Demo"]);
        let Command::Project(ProjectArgs { action }) = cli.command else {
            panic!("wrong command");
        };
        assert!(matches!(action, ProjectAction::Create { name } if name == "Demo"));
    }

    #[test]
    fn parse_project_show_validates_id() {
        assert!(Cli::try_parse_from(["amp", "project", "show", "proj_ab12cd34"]).is_ok());
        assert!(Cli::try_parse_from(["amp", "project", "show", "art_ab12cd34"]).is_err());
    }

    #[test]
    fn parse_artifact_add() {
        let cli = parse(&[
            "amp", "artifact", "add", "proj_1", "notes.md", "--name", "Notes", "--comment", "first",
        ]);
        let Command::Artifact(ArtifactArgs { action: ArtifactAction::Add(args) }) = cli.command
        else {
            panic!("wrong command");
        };
        assert_eq!(args.project_id.as_str(), "proj_1");
        assert_eq!(args.path, PathBuf::from("notes.md"));
        assert_eq!(args.name, Some("Notes".into()));
        assert_eq!(args.comment, Some("first".into()));
        assert!(args.parent.is_none());
    }

    fn export_args(args: &[&str]) -> ArtifactExportArgs {
        match parse(args).command {
            Command::Artifact(ArtifactArgs { action: ArtifactAction::Export(args) }) => args,
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn parse_artifact_export_versions() {
        let args = export_args(&["amp", "artifact", "export", "art_1"]);
        assert_eq!(args.version, VersionSelector::Latest);
        assert!(args.out.is_none());

        let args = export_args(&[
            "amp", "artifact", "export", "art_1", "--version", "v3", "--out", "x.md",
        ]);
        assert_eq!(args.version, VersionSelector::Number(3));
        assert_eq!(args.out, Some(PathBuf::from("x.md")));

        let zero = ["amp", "artifact", "export", "art_1", "--version", "0"];
        assert!(Cli::try_parse_from(zero).is_err());
    }

    #[test]
    fn parse_artifact_show() {
        let cli = parse(&["amp", "artifact", "show", "art_1", "--version", "2"]);
        let Command::Artifact(ArtifactArgs { action: ArtifactAction::Show(args) }) = cli.command
        else {
            panic!("wrong command");
        };
        assert_eq!(args.artifact_id.as_str(), "art_1");
        assert_eq!(args.version, VersionSelector::Number(2));
    }

    #[test]
    fn parse_run_with_save() {
        let cli = parse(&["amp", "run", "asst_1", "proj_1", "--input", "hi", "--save"]);
        let Command::Run(args) = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(args.assistant_id, "asst_1");
        assert_eq!(args.input, "hi");
        assert!(args.save);
    }

    #[test]
    fn parse_run_defaults_to_empty_input() {
        let Command::Run(args) = parse(&["amp", "run", "asst_1", "proj_1"]).command else {
            panic!("wrong command");
        };
        assert_eq!(args.input, "");
        assert!(!args.save);
    }

    #[test]
    fn parse_folder_create_with_parent() {
        let cli = parse(&["amp", "folder", "create", "proj_1", "Drafts", "--parent", "itm_9"]);
        let Command::Folder(FolderArgs { action: FolderAction::Create { parent, name, .. } }) =
            cli.command
        else {
            panic!("wrong command");
        };
        assert_eq!(name, "Drafts");
        assert_eq!(parent.unwrap().as_str(), "itm_9");
    }

    #[test]
    fn parse_global_flags() {
        let cli = parse(&["amp", "--data", "/tmp/amp", "--verbose", "--format", "json", "fsck"]);
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.data, PathBuf::from("/tmp/amp"));
        assert!(matches!(cli.command, Command::Fsck(_)));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = parse(&["amp", "gc", "--data", "d"]);
        assert_eq!(cli.data, PathBuf::from("d"));
    }
}
