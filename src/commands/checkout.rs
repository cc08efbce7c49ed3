use crate::commands::Session;
use crate::error::Result;
use crate::git::repo;
use crate::output;
use crate::pipeline::Skipped;

/// Clones every repository of the org under the root dir; existing clones
/// are switched to their default branch and fast-forwarded.
pub async fn run(session: &Session) -> Result<()> {
    let org = session.org()?;
    let repos = session
        .client
        .list_org_repos(org, session.exclude_private)
        .await?;
    let auth = session.auth();
    let mut failures = Vec::new();

    for r in &repos {
        tracing::info!("******* CHECKING REPO: {} ({}) *******", r.name, r.count);
        if let Err(e) = repo::sync_checkout(&session.config.root_dir, r, &auth) {
            tracing::warn!(repo = %r.name, error = %e, "sync failed");
            failures.push(Skipped {
                repo: r.name.clone(),
                reason: e.to_string(),
            });
        }
    }

    tracing::info!(
        synced = repos.len() - failures.len(),
        failed = failures.len(),
        "checkout finished"
    );
    if !failures.is_empty() {
        let name = format!("checkout_failures_{}.json", output::timestamp());
        let path = output::write_json(&session.config.output_dir, &name, &failures)?;
        tracing::info!(path = %path.display(), "wrote failures");
    }
    Ok(())
}
