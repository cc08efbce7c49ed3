use crate::commands::Session;
use crate::error::Result;
use crate::github::client::validate_color;
use crate::github::types::LabelSpec;
use crate::output;
use crate::pipeline::Skipped;

pub async fn run(session: &Session, name: &str, color: &str, description: &str) -> Result<()> {
    let spec = LabelSpec {
        name: name.to_string(),
        color: validate_color(color)?,
        description: description.to_string(),
    };
    let org = session.org()?;
    let repos = session
        .client
        .list_org_repos(org, session.exclude_private)
        .await?;
    let mut failures = Vec::new();

    for repo in &repos {
        tracing::info!("******* CHECKING REPO: {} ({}) *******", repo.name, repo.count);
        match session.client.upsert_label(org, &repo.name, &spec).await {
            Ok(_) => tracing::info!(repo = %repo.name, "label applied"),
            Err(e) => {
                tracing::warn!(repo = %repo.name, error = %e, "label failed");
                failures.push(Skipped {
                    repo: repo.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        label = %spec.name,
        applied = repos.len() - failures.len(),
        failed = failures.len(),
        "labels done"
    );
    if !failures.is_empty() {
        let file = format!("label_failures_{}.json", output::timestamp());
        let path = output::write_json(&session.config.output_dir, &file, &failures)?;
        tracing::info!(path = %path.display(), "wrote failures");
    }
    Ok(())
}
