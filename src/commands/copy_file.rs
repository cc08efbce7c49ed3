use crate::commands::Session;
use crate::edit::CopyFileEdit;
use crate::error::{Result, SweepError};
use crate::pipeline::{self, BranchMode, Target};
use std::path::PathBuf;

pub struct CopyFileArgs {
    pub branch: String,
    pub src: PathBuf,
    pub dest: String,
    pub message: String,
    pub body: Option<String>,
    pub select: Vec<String>,
    pub commit_on_existing: bool,
}

pub async fn run(session: &Session, args: CopyFileArgs) -> Result<()> {
    if !args.src.is_file() {
        return Err(SweepError::InvalidInput(format!(
            "source file {} does not exist",
            args.src.display()
        )));
    }

    let org = session.org()?;
    let repos = session
        .client
        .list_org_repos(org, session.exclude_private)
        .await?;
    let targets = Target::for_org(org, repos, &args.branch);

    let mode = if args.commit_on_existing {
        BranchMode::Existing
    } else {
        BranchMode::Create
    };
    let edit = CopyFileEdit {
        src: args.src,
        dest: args.dest,
        commit_message: args.message,
        pr_body: args.body,
    };

    let mut ctx = session.pipeline(args.select, mode == BranchMode::Create);
    let report = pipeline::run(&mut ctx, &targets, mode, &edit).await;
    let path = report.write(&session.config.output_dir, "copy_file")?;
    tracing::info!(path = %path.display(), "full output logged");
    Ok(())
}
