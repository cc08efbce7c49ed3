use crate::commands::Session;
use crate::edit::{ReplaceEdit, SwapPair};
use crate::error::{Result, SweepError};
use crate::github::types::PrDetails;
use crate::pipeline::{self, BranchMode, Target};
use itertools::Itertools;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub struct ReplaceArgs {
    pub swap: Vec<String>,
    pub pairs_file: Option<PathBuf>,
    pub branch: Option<String>,
    pub existing: bool,
    pub pr_title: Option<String>,
    pub pr_body: Option<String>,
    pub query: Option<String>,
    pub select: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PairsFile {
    #[serde(default)]
    swap: Vec<SwapPair>,
}

/// Command-line triples first, then the `[[swap]]` tables of the pairs file.
pub fn collect_pairs(swap: Vec<String>, pairs_file: Option<&Path>) -> Result<Vec<SwapPair>> {
    let mut pairs: Vec<SwapPair> = swap
        .into_iter()
        .tuples::<(String, String, String)>()
        .map(|(old, new, message)| SwapPair { old, new, message })
        .collect();

    if let Some(path) = pairs_file {
        let text = std::fs::read_to_string(path)?;
        let file: PairsFile = toml::from_str(&text)
            .map_err(|e| SweepError::InvalidInput(format!("{}: {e}", path.display())))?;
        pairs.extend(file.swap);
    }

    if let Some(pair) = pairs.iter().find(|p| p.old.is_empty()) {
        return Err(SweepError::InvalidInput(format!(
            "empty search string for \"{}\"",
            pair.message
        )));
    }
    if pairs.is_empty() {
        return Err(SweepError::InvalidInput(
            "nothing to replace; give --swap or --pairs-file".to_string(),
        ));
    }
    Ok(pairs)
}

/// One target per matched pull request, on that PR's head branch.
async fn targets_from_search(session: &Session, query: &str) -> Result<Vec<Target>> {
    if !query.split_whitespace().any(|term| term == "is:pr") {
        return Err(SweepError::InvalidInput(format!(
            "query must be restricted to pull requests with 'is:pr': {query}"
        )));
    }

    let items = session.client.search_issues(query).await?;
    let mut targets = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let (org, name) = (item.org_name(), item.repo_name());
        let branch = session.client.pull_head_ref(org, name, item.number).await?;
        let repo = session.client.get_repo(org, name, i + 1).await?;
        targets.push(Target {
            org: org.to_string(),
            repo,
            branch,
        });
    }
    Ok(targets
        .into_iter()
        .unique_by(|t| (t.org.clone(), t.repo.name.clone(), t.branch.clone()))
        .collect())
}

pub async fn run(session: &Session, args: ReplaceArgs) -> Result<()> {
    let pairs = collect_pairs(args.swap, args.pairs_file.as_deref())?;

    let (targets, mode) = match args.query.as_deref() {
        Some(query) => (targets_from_search(session, query).await?, BranchMode::Existing),
        None => {
            let branch = args.branch.as_deref().ok_or_else(|| {
                SweepError::InvalidInput("--branch is required without --query".to_string())
            })?;
            let org = session.org()?;
            let repos = session
                .client
                .list_org_repos(org, session.exclude_private)
                .await?;
            let mode = if args.existing {
                BranchMode::Existing
            } else {
                BranchMode::Create
            };
            (Target::for_org(org, repos, branch), mode)
        }
    };

    let pr = args.pr_title.map(|title| PrDetails {
        title,
        body: args.pr_body,
    });
    let open_prs = pr.is_some() && mode == BranchMode::Create;
    let edit = ReplaceEdit { pairs, pr };

    tracing::info!(targets = targets.len(), pairs = edit.pairs.len(), "starting replace");
    let mut ctx = session.pipeline(args.select, open_prs);
    let report = pipeline::run(&mut ctx, &targets, mode, &edit).await;
    let path = report.write(&session.config.output_dir, "replace")?;
    tracing::info!(path = %path.display(), "full output logged");
    Ok(())
}
