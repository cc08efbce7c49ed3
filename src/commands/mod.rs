pub mod checkout;
pub mod copy_file;
pub mod depr;
pub mod export;
pub mod extract;
pub mod label;
pub mod licenses;
pub mod merge;
pub mod rate_limit;
pub mod replace;
pub mod retry;
pub mod search;

use crate::cli::{Command, GlobalArgs};
use crate::config::Config;
use crate::error::Result;
use crate::git::auth::GitAuth;
use crate::git::repo::CommitAuthor;
use crate::github::client::GitHubClient;
use crate::pipeline::PipelineContext;
use crate::prompt::{PushPrompt, TerminalPrompt};
use std::time::Duration;

/// Everything a command needs once configuration is resolved.
pub struct Session {
    pub config: Config,
    pub client: GitHubClient,
    pub exclude_private: bool,
    pub interactive: bool,
}

impl Session {
    pub fn new(config: Config, global: &GlobalArgs) -> Result<Self> {
        let token = config.require_token()?;
        let client = GitHubClient::new(token, &config.api_base, config.per_page)?;
        Ok(Self {
            client,
            exclude_private: global.exclude_private,
            interactive: global.interactive,
            config,
        })
    }

    pub fn org(&self) -> Result<&str> {
        self.config.require_org()
    }

    pub fn auth(&self) -> GitAuth {
        GitAuth::new(self.config.github_token.clone())
    }

    pub fn author(&self) -> CommitAuthor {
        CommitAuthor {
            name: self.config.commit_author_name.clone(),
            email: self.config.commit_author_email.clone(),
        }
    }

    pub fn pipeline(&self, select: Vec<String>, open_prs: bool) -> PipelineContext<'_> {
        let prompt: Option<Box<dyn PushPrompt>> = if self.interactive {
            Some(Box::new(TerminalPrompt))
        } else {
            None
        };
        PipelineContext {
            client: &self.client,
            root_dir: self.config.root_dir.clone(),
            auth: self.auth(),
            author: self.author(),
            pause: Duration::from_secs(self.config.pause_secs),
            select,
            open_prs,
            prompt,
        }
    }
}

pub async fn execute(command: Command, config: Config, global: &GlobalArgs) -> Result<()> {
    // the only command that never talks to GitHub
    if let Command::ExtractPrs { log } = &command {
        return extract::run(&config, log);
    }

    let session = Session::new(config, global)?;
    match command {
        Command::CheckoutAll => checkout::run(&session).await,
        Command::Label {
            name,
            color,
            description,
        } => label::run(&session, &name, &color, &description).await,
        Command::CopyFile {
            branch,
            src,
            dest,
            message,
            body,
            select,
            commit_on_existing,
        } => {
            let args = copy_file::CopyFileArgs {
                branch,
                src,
                dest,
                message,
                body,
                select,
                commit_on_existing,
            };
            copy_file::run(&session, args).await
        }
        Command::Replace {
            swap,
            pairs_file,
            branch,
            existing,
            pr_title,
            pr_body,
            query,
            select,
        } => {
            let args = replace::ReplaceArgs {
                swap,
                pairs_file,
                branch,
                existing,
                pr_title,
                pr_body,
                query,
                select,
            };
            replace::run(&session, args).await
        }
        Command::DeprWorkflow {
            branch,
            templates_dir,
        } => depr::run(&session, &branch, templates_dir).await,
        Command::RetryPrs { file } => retry::run(&session, &file).await,
        Command::MergePrs {
            file,
            title,
            method,
        } => merge::run(&session, &file, &title, method).await,
        Command::ExportIssues {
            repos,
            format,
            raw,
            label,
        } => export::run(&session, &repos, format, raw, label.as_deref()).await,
        Command::Licenses => licenses::run(&session).await,
        Command::SearchPrs { query, branch_name } => search::run(&session, &query, branch_name).await,
        Command::RateLimit => rate_limit::run(&session).await,
        Command::ExtractPrs { .. } => Ok(()),
    }
}
