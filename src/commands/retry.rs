use crate::commands::Session;
use crate::error::Result;
use crate::github::types::FailedPr;
use crate::output;
use crate::pipeline;
use std::path::Path;

pub async fn run(session: &Session, file: &Path) -> Result<()> {
    let failed: Vec<FailedPr> = output::read_json(file)?;
    tracing::info!(count = failed.len(), file = %file.display(), "retrying PRs");

    let mut ctx = session.pipeline(Vec::new(), true);
    let report = pipeline::retry(&mut ctx, &failed).await;
    let path = report.write(&session.config.output_dir, "retry_prs")?;
    tracing::info!(path = %path.display(), "full output logged");
    Ok(())
}
