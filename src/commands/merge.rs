use crate::commands::Session;
use crate::error::{Result, SweepError};
use crate::github::client::{parse_pr_url, GitHubClient};
use crate::github::types::MergeMethod;
use crate::output;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

const MERGE_COMMITS_DISALLOWED: &str = "Merge commits are not allowed on this repository.";

#[derive(Debug, Serialize)]
struct MergeFailure {
    url: String,
    status: Option<u16>,
    message: String,
}

/// Merges one PR; repositories that forbid merge commits are retried once
/// with a rebase.
pub async fn merge_one(
    client: &GitHubClient,
    url: &str,
    title: &str,
    method: Option<MergeMethod>,
) -> Result<()> {
    let (org, repo, number) = parse_pr_url(url)?;
    match client.merge_pull(&org, &repo, number, title, method).await {
        Err(SweepError::Api { message, .. })
            if message == MERGE_COMMITS_DISALLOWED && method != Some(MergeMethod::Rebase) =>
        {
            tracing::info!(%url, "merge commits disallowed, rebasing");
            client
                .merge_pull(&org, &repo, number, title, Some(MergeMethod::Rebase))
                .await
        }
        other => other,
    }
}

pub async fn run(
    session: &Session,
    file: &Path,
    title: &str,
    method: Option<MergeMethod>,
) -> Result<()> {
    let urls: Vec<String> = output::read_json(file)?;
    let pause = Duration::from_secs(session.config.merge_pause_secs);
    let mut failures = Vec::new();

    for (i, url) in urls.iter().enumerate() {
        tracing::info!("********* Merging ({}/{}): {}", i + 1, urls.len(), url);
        match merge_one(&session.client, url, title, method).await {
            Ok(()) => tracing::info!(%url, "merged"),
            Err(e) => {
                tracing::warn!(%url, error = %e, "merge failed");
                failures.push(MergeFailure {
                    url: url.clone(),
                    status: e.status(),
                    message: e.to_string(),
                });
            }
        }
        tokio::time::sleep(pause).await;
    }

    tracing::info!(
        merged = urls.len() - failures.len(),
        failed = failures.len(),
        "merge finished"
    );
    let name = format!("merge_failures_{}.json", output::timestamp());
    let path = output::write_json(&session.config.output_dir, &name, &failures)?;
    tracing::info!(path = %path.display(), "wrote failures");
    Ok(())
}
