use crate::error::{Result, SweepError};
use crate::github::types::{OrgRepo, PrDetails};
use crate::pipeline::RepoEdit;
use std::path::{Path, PathBuf};

/// Copies `src` to `dest_rel` inside the checkout, creating any missing
/// parent directories. A `dest_rel` ending in `/` or naming an existing
/// directory receives the file under its own name.
pub fn copy_into(repo_path: &Path, src: &Path, dest_rel: &str) -> Result<PathBuf> {
    if Path::new(dest_rel).is_absolute() {
        return Err(SweepError::InvalidInput(format!(
            "destination must be relative to the repo: {dest_rel}"
        )));
    }

    let mut dest = repo_path.join(dest_rel);
    if dest_rel.ends_with('/') || dest.is_dir() {
        let file_name = src
            .file_name()
            .ok_or_else(|| SweepError::InvalidInput(format!("{} is not a file", src.display())))?;
        dest = dest.join(file_name);
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(src, &dest)?;
    Ok(dest)
}

/// Drops one file into every repository.
#[derive(Debug, Clone)]
pub struct CopyFileEdit {
    pub src: PathBuf,
    pub dest: String,
    pub commit_message: String,
    pub pr_body: Option<String>,
}

impl RepoEdit for CopyFileEdit {
    fn apply(&self, _step: usize, _repo: &OrgRepo, path: &Path) -> Result<Option<String>> {
        copy_into(path, &self.src, &self.dest)?;
        Ok(Some(self.commit_message.clone()))
    }

    fn pr_details(&self, _repo: &OrgRepo) -> Option<PrDetails> {
        Some(PrDetails {
            title: self.commit_message.clone(),
            body: self.pr_body.clone(),
        })
    }
}
