use crate::github::types::MergeMethod;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "orgsweep", about = "Bulk maintenance across a GitHub organization", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// GitHub organization to work on
    #[arg(long, global = true)]
    pub org: Option<String>,

    /// Directory holding (or receiving) the local clones
    #[arg(long, global = true)]
    pub root_dir: Option<PathBuf>,

    /// Where run logs and exports are written
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Only consider public repositories
    #[arg(short = 'P', long, global = true)]
    pub exclude_private: bool,

    /// Show the diff and ask before every push
    #[arg(short, long, global = true)]
    pub interactive: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clone every repository of the org, or pull the default branch of existing clones
    CheckoutAll,

    /// Create or update a label on every repository
    Label {
        #[arg(long)]
        name: String,

        /// Six hex digits, leading '#' optional
        #[arg(long)]
        color: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Copy one file into every repository and open a PR for it
    CopyFile {
        #[arg(long)]
        branch: String,

        /// File to copy
        #[arg(long)]
        src: PathBuf,

        /// Destination relative to each repository root
        #[arg(long)]
        dest: String,

        /// Commit message, also used as the PR title
        #[arg(long)]
        message: String,

        #[arg(long)]
        body: Option<String>,

        /// Only process these repositories
        #[arg(long = "select", value_name = "REPO")]
        select: Vec<String>,

        /// Commit on the already existing branch and open no PR
        #[arg(long)]
        commit_on_existing: bool,
    },

    /// Replace strings across repositories, one commit per pair
    Replace {
        /// OLD NEW MESSAGE, may be repeated
        #[arg(long, num_args = 3, value_names = ["OLD", "NEW", "MESSAGE"])]
        swap: Vec<String>,

        /// TOML file with [[swap]] tables (old, new, message)
        #[arg(long)]
        pairs_file: Option<PathBuf>,

        /// Branch to create (or reuse with --existing); ignored with --query
        #[arg(long)]
        branch: Option<String>,

        /// Commit on an existing branch instead of creating one
        #[arg(long)]
        existing: bool,

        /// Open a PR with this title
        #[arg(long)]
        pr_title: Option<String>,

        #[arg(long)]
        pr_body: Option<String>,

        /// Work on the head branches of the PRs matched by this search (e.g. 'is:pr is:open author:me')
        #[arg(long)]
        query: Option<String>,

        /// Only process these repositories
        #[arg(long = "select", value_name = "REPO")]
        select: Vec<String>,
    },

    /// Distribute the DEPR workflow (and issue overrides where Issues are off)
    DeprWorkflow {
        #[arg(long, default_value = crate::edit::depr::DEFAULT_BRANCH)]
        branch: String,

        /// Directory with workflow-templates/, ISSUE_TEMPLATE/ and override_config.yml
        #[arg(long)]
        templates_dir: Option<PathBuf>,
    },

    /// Re-open the PRs listed in a failed.json from an earlier run
    RetryPrs {
        file: PathBuf,
    },

    /// Merge every PR URL listed in a JSON file
    MergePrs {
        file: PathBuf,

        /// Commit title of the merge
        #[arg(long, default_value = "Merge DEPR automation workflow")]
        title: String,

        /// Merge method; without one GitHub's default is used, falling back to rebase
        #[arg(long, value_enum)]
        method: Option<MergeMethod>,
    },

    /// Export issues (not PRs) of one or more repositories
    ExportIssues {
        #[arg(required = true)]
        repos: Vec<String>,

        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Keep every field GitHub returns
        #[arg(short, long)]
        raw: bool,

        /// Only issues carrying this label
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Report which repositories carry which license
    Licenses,

    /// List the PRs matched by a search query as [url, repo(, head branch)]
    SearchPrs {
        #[arg(short, long)]
        query: String,

        /// Add the PR's head branch to each entry
        #[arg(short = 'B', long)]
        branch_name: bool,
    },

    /// Print the remaining API rate limit
    RateLimit,

    /// Pull PR URLs out of a saved run log
    ExtractPrs {
        log: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_takes_triples() {
        let cli = Cli::try_parse_from([
            "orgsweep",
            "replace",
            "--branch",
            "fix-org",
            "--swap",
            "edx/",
            "openedx/",
            "fix: org url",
            "--swap",
            "a",
            "b",
            "c",
        ])
        .unwrap();
        match cli.command {
            Command::Replace { swap, branch, .. } => {
                assert_eq!(swap.len(), 6);
                assert_eq!(swap[2], "fix: org url");
                assert_eq!(branch.as_deref(), Some("fix-org"));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["orgsweep", "licenses", "--org", "acme", "-P"]).unwrap();
        assert_eq!(cli.global.org.as_deref(), Some("acme"));
        assert!(cli.global.exclude_private);
    }

    #[test]
    fn export_requires_repos() {
        assert!(Cli::try_parse_from(["orgsweep", "export-issues"]).is_err());
        let cli = Cli::try_parse_from(["orgsweep", "export-issues", "a", "b", "--format", "csv"]).unwrap();
        match cli.command {
            Command::ExportIssues { repos, format, .. } => {
                assert_eq!(repos, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(format, ExportFormat::Csv);
            }
            _ => panic!("wrong command"),
        }
    }
}
