//! The bulk cross-repository mutation loop.
//!
//! For each target repository: sync the local checkout, let the edit decide
//! whether the repo is in scope, make or check out the working branch, apply
//! the edit (one commit per step), push, and open a pull request. Every
//! outcome lands in a [`RunReport`], which is written once the loop ends,
//! including when the operator quits from the interactive prompt.

use crate::error::{Result, SweepError};
use crate::git::auth::GitAuth;
use crate::git::repo::{self, CommitAuthor};
use crate::github::client::GitHubClient;
use crate::github::types::{FailedPr, OrgRepo, PrDetails};
use crate::output;
use crate::prompt::{Decision, PushPrompt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A transformation applied to each checkout.
pub trait RepoEdit {
    /// Reason to leave the repository alone, checked before any branch is made.
    fn precheck(&self, _repo: &OrgRepo, _path: &Path) -> Result<Option<String>> {
        Ok(None)
    }

    /// Number of steps; each step that changes something becomes one commit.
    fn steps(&self) -> usize {
        1
    }

    /// Applies `step` and returns its commit message, or `None` when the
    /// step had nothing to do in this repository.
    fn apply(&self, step: usize, repo: &OrgRepo, path: &Path) -> Result<Option<String>>;

    fn pr_details(&self, repo: &OrgRepo) -> Option<PrDetails>;
}

#[derive(Debug, Clone)]
pub struct Target {
    pub org: String,
    pub repo: OrgRepo,
    pub branch: String,
}

impl Target {
    pub fn for_org(org: &str, repos: Vec<OrgRepo>, branch: &str) -> Vec<Target> {
        repos
            .into_iter()
            .map(|repo| Target {
                org: org.to_string(),
                repo,
                branch: branch.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchMode {
    /// Make a fresh branch; repos where it already exists are skipped.
    Create,
    /// Commit on a branch that already exists; no pull request is opened.
    Existing,
}

pub struct PipelineContext<'a> {
    pub client: &'a GitHubClient,
    pub root_dir: PathBuf,
    pub auth: GitAuth,
    pub author: CommitAuthor,
    pub pause: Duration,
    pub select: Vec<String>,
    pub open_prs: bool,
    pub prompt: Option<Box<dyn PushPrompt + 'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub repo: String,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub processed: usize,
    pub prs: Vec<String>,
    pub failed: Vec<FailedPr>,
    pub skipped: Vec<Skipped>,
    pub commits: Vec<String>,
    pub notes: BTreeMap<String, Vec<String>>,
    pub aborted: bool,
}

impl RunReport {
    fn skip(&mut self, repo: &str, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::info!(repo, %reason, "skipping");
        self.skipped.push(Skipped {
            repo: repo.to_string(),
            reason,
        });
    }

    pub fn summary(&self) -> String {
        format!(
            "processed {} repos; {} PRs opened, {} PR failures, {} commits without a PR, {} skipped{}",
            self.processed,
            self.prs.len(),
            self.failed.len(),
            self.commits.len(),
            self.skipped.len(),
            if self.aborted { " (aborted)" } else { "" },
        )
    }

    /// Writes `prs.json` and `failed.json` (the retry input) plus the full
    /// report as `<label>_<timestamp>.json`. Returns the full report's path.
    pub fn write(&self, dir: &Path, label: &str) -> Result<PathBuf> {
        output::write_json(dir, "prs.json", &self.prs)?;
        output::write_json(dir, "failed.json", &self.failed)?;
        output::write_json(dir, &format!("{label}_{}.json", output::timestamp()), self)
    }
}

enum Outcome {
    Skipped(String),
    Committed,
    Opened(String),
    PrFailed(FailedPr, SweepError),
}

async fn pause(ctx: &PipelineContext<'_>) {
    // secondary rate limits kick in after ~30 quick PRs
    if !ctx.pause.is_zero() {
        tokio::time::sleep(ctx.pause).await;
    }
}

async fn process(
    ctx: &mut PipelineContext<'_>,
    target: &Target,
    mode: BranchMode,
    edit: &dyn RepoEdit,
    notes: &mut Vec<String>,
    quit: &mut bool,
) -> Result<Outcome> {
    let repo = &target.repo;
    let path = repo::sync_checkout(&ctx.root_dir, repo, &ctx.auth)?;

    if let Some(reason) = edit.precheck(repo, &path)? {
        return Ok(Outcome::Skipped(reason));
    }

    match mode {
        BranchMode::Create => {
            if !repo::create_branch(&path, &target.branch, &ctx.auth)? {
                return Ok(Outcome::Skipped("branch exists".to_string()));
            }
        }
        BranchMode::Existing => {
            if !repo::checkout_branch(&path, &target.branch)? {
                return Ok(Outcome::Skipped("branch missing".to_string()));
            }
        }
    }

    let mut committed = 0;
    let mut declined = false;
    for step in 0..edit.steps() {
        let Some(message) = edit.apply(step, repo, &path)? else {
            continue;
        };

        if let Some(prompt) = ctx.prompt.as_mut() {
            let diff = repo::diff_text(&path)?;
            let decision = prompt.confirm(&repo.name, &diff)?;
            if decision != Decision::Push {
                repo::discard_changes(&path)?;
                declined = true;
                *quit = decision == Decision::Quit;
                break;
            }
        }

        if repo::commit_all(&path, &message, &ctx.author)?.is_some() {
            repo::push_current(&path, false, &ctx.auth)?;
            notes.push(format!("CREATED: {message}"));
            committed += 1;
        }
    }

    if committed == 0 {
        return match (declined, *quit) {
            (_, true) => Err(SweepError::Aborted),
            (true, false) => Ok(Outcome::Skipped("declined at prompt".to_string())),
            (false, false) => Ok(Outcome::Skipped("no changes".to_string())),
        };
    }
    if *quit {
        // already pushed; record it, but open nothing more
        notes.push("quit before the remaining steps".to_string());
        return Ok(Outcome::Committed);
    }

    let details = match edit.pr_details(repo) {
        Some(details) if ctx.open_prs && mode == BranchMode::Create => details,
        _ => return Ok(Outcome::Committed),
    };

    tracing::info!(repo = %repo.name, "making a pull request");
    match ctx
        .client
        .create_pull(&target.org, &repo.name, &target.branch, &repo.default_branch, &details)
        .await
    {
        Ok(url) => Ok(Outcome::Opened(url)),
        Err(e) => Ok(Outcome::PrFailed(
            FailedPr {
                org: target.org.clone(),
                repo: repo.name.clone(),
                branch: target.branch.clone(),
                base: repo.default_branch.clone(),
                details,
            },
            e,
        )),
    }
}

pub async fn run(
    ctx: &mut PipelineContext<'_>,
    targets: &[Target],
    mode: BranchMode,
    edit: &dyn RepoEdit,
) -> RunReport {
    let mut report = RunReport::default();

    for target in targets {
        let name = target.repo.name.clone();
        tracing::info!("******* CHECKING REPO: {} ({}) *******", name, target.repo.count);
        report.processed += 1;

        if !ctx.select.is_empty() && !ctx.select.contains(&name) {
            report.skip(&name, "not on list");
            continue;
        }

        let mut notes = Vec::new();
        let mut quit = false;
        let outcome = process(ctx, target, mode, edit, &mut notes, &mut quit).await;
        let stop = quit || matches!(outcome, Err(SweepError::Aborted));

        match outcome {
            Ok(Outcome::Skipped(reason)) => report.skip(&name, reason),
            Ok(Outcome::Committed) => {
                tracing::info!(repo = %name, "committed to branch with no PR");
                report.commits.push(name.clone());
                pause(ctx).await;
            }
            Ok(Outcome::Opened(url)) => {
                notes.push(format!("PR: {url}"));
                report.prs.push(url);
                pause(ctx).await;
            }
            Ok(Outcome::PrFailed(failed, err)) => {
                tracing::warn!(repo = %name, error = %err, "failed to open PR");
                notes.push(format!("FAILED: {err}"));
                report.failed.push(failed);
                pause(ctx).await;
            }
            Err(SweepError::Aborted) => {
                tracing::info!("received quit, cancelling run");
                report.aborted = true;
            }
            Err(e) => {
                tracing::warn!(repo = %name, error = %e, "repo failed");
                report.skip(&name, e.to_string());
            }
        }

        if !notes.is_empty() {
            report.notes.insert(name, notes);
        }
        if stop {
            report.aborted = true;
            break;
        }
    }

    tracing::info!("{}", report.summary());
    report
}

/// Re-opens pull requests recorded in a previous run's `failed.json`. The
/// branches are assumed to be pushed already.
pub async fn retry(ctx: &mut PipelineContext<'_>, failed: &[FailedPr]) -> RunReport {
    let mut report = RunReport::default();

    for (i, entry) in failed.iter().enumerate() {
        tracing::info!("******* CHECKING REPO: {} ({}) *******", entry.repo, i + 1);
        report.processed += 1;

        let path = repo::repo_path(&ctx.root_dir, &entry.repo);
        if path.exists() {
            match repo::checkout_branch(&path, &entry.branch) {
                Ok(true) => {}
                Ok(false) => tracing::warn!(repo = %entry.repo, branch = %entry.branch, "branch not found locally"),
                Err(e) => tracing::warn!(repo = %entry.repo, error = %e, "checkout failed"),
            }
        }

        match ctx
            .client
            .create_pull(&entry.org, &entry.repo, &entry.branch, &entry.base, &entry.details)
            .await
        {
            Ok(url) => report.prs.push(url),
            Err(e) => {
                tracing::warn!(repo = %entry.repo, error = %e, "failed to open PR");
                report.failed.push(entry.clone());
            }
        }
        pause(ctx).await;
    }

    tracing::info!("{}", report.summary());
    report
}
