use crate::commands::Session;
use crate::edit::depr::missing_templates;
use crate::edit::DeprEdit;
use crate::error::{Result, SweepError};
use crate::pipeline::{self, BranchMode, Target};
use std::path::PathBuf;

/// Opens a PR adding the DEPR workflow to every repository without an
/// issue-template config; repos with Issues disabled also get the default
/// issue overrides.
pub async fn run(session: &Session, branch: &str, templates_dir: Option<PathBuf>) -> Result<()> {
    let templates_dir = templates_dir.unwrap_or_else(|| session.config.resolved_templates_dir());
    let missing = missing_templates(&templates_dir);
    if !missing.is_empty() {
        let list = missing
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(SweepError::InvalidInput(format!("DEPR templates not found: {list}")));
    }

    let org = session.org()?;
    let repos = session
        .client
        .list_org_repos(org, session.exclude_private)
        .await?;
    let targets = Target::for_org(org, repos, branch);
    let edit = DeprEdit { templates_dir };

    let mut ctx = session.pipeline(Vec::new(), true);
    let report = pipeline::run(&mut ctx, &targets, BranchMode::Create, &edit).await;
    let path = report.write(&session.config.output_dir, "depr_workflow")?;
    tracing::info!(path = %path.display(), "full output logged");
    Ok(())
}
