//! Distribution of the DEPR (deprecation tracking) workflow.
//!
//! Every repository gets the workflow that files DEPR tickets onto the
//! shared project board. Repositories with Issues disabled also get the
//! DEPR issue template plus an issue `config.yml` that turns off every other
//! issue type, so Issues can be enabled for DEPR tickets alone.

use crate::edit::copy::copy_into;
use crate::error::Result;
use crate::github::types::{OrgRepo, PrDetails};
use crate::pipeline::RepoEdit;
use std::path::{Path, PathBuf};

pub const DEFAULT_BRANCH: &str = "depr-automation-workflow";
pub const WORKFLOW_TEMPLATE: &str = "add-depr-ticket-to-depr-board.yml";
pub const ISSUE_TEMPLATE: &str = "depr-ticket.yml";
pub const OVERRIDE_CONFIG: &str = "override_config.yml";

const COMMIT_MESSAGE: &str = "build: add DEPR workflow automation";
const PR_TITLE: &str = "Add DEPR workflow automation";
const PR_BODY: &str = "## This PR was autogenerated\n\n\
This PR introduces workflow automation which allows us to put DEPR tickets from this repo \
onto the global DEPR project board.";
const ISSUE_SUFFIX: &str = " & default issue overrides";
const ISSUE_PARAGRAPH: &str = "\n\nSince this repo currently does not have Issues enabled, a \
special override configuration has been added to turn off all issue types except DEPR \
tickets. This will allow us to turn on Issues in this repo without opening the gates for \
other types of reports.";

pub fn issue_config_path(repo_path: &Path) -> PathBuf {
    repo_path.join(".github").join("ISSUE_TEMPLATE").join("config.yml")
}

pub fn issue_config_exists(repo_path: &Path) -> bool {
    issue_config_path(repo_path).exists()
}

fn workflow_source(templates_dir: &Path) -> PathBuf {
    templates_dir.join("workflow-templates").join(WORKFLOW_TEMPLATE)
}

fn issue_template_source(templates_dir: &Path) -> PathBuf {
    templates_dir.join("ISSUE_TEMPLATE").join(ISSUE_TEMPLATE)
}

/// Template files absent from `templates_dir`; all three must exist before
/// any branch is pushed.
pub fn missing_templates(templates_dir: &Path) -> Vec<PathBuf> {
    [
        workflow_source(templates_dir),
        issue_template_source(templates_dir),
        templates_dir.join(OVERRIDE_CONFIG),
    ]
    .into_iter()
    .filter(|p| !p.is_file())
    .collect()
}

/// Copies the DEPR files from `templates_dir` into the checkout.
pub fn add_depr_files(templates_dir: &Path, repo_path: &Path, has_issues: bool) -> Result<()> {
    copy_into(
        repo_path,
        &workflow_source(templates_dir),
        &format!(".github/workflows/{WORKFLOW_TEMPLATE}"),
    )?;

    if !has_issues {
        copy_into(
            repo_path,
            &issue_template_source(templates_dir),
            &format!(".github/ISSUE_TEMPLATE/{ISSUE_TEMPLATE}"),
        )?;
        copy_into(
            repo_path,
            &templates_dir.join(OVERRIDE_CONFIG),
            ".github/ISSUE_TEMPLATE/config.yml",
        )?;
    }
    Ok(())
}

pub fn commit_message(has_issues: bool) -> String {
    if has_issues {
        COMMIT_MESSAGE.to_string()
    } else {
        format!("{COMMIT_MESSAGE}{ISSUE_SUFFIX}")
    }
}

pub fn pr_details(has_issues: bool) -> PrDetails {
    if has_issues {
        PrDetails {
            title: PR_TITLE.to_string(),
            body: Some(PR_BODY.to_string()),
        }
    } else {
        PrDetails {
            title: format!("{PR_TITLE}{ISSUE_SUFFIX}"),
            body: Some(format!("{PR_BODY}{ISSUE_PARAGRAPH}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeprEdit {
    pub templates_dir: PathBuf,
}

impl RepoEdit for DeprEdit {
    fn precheck(&self, _repo: &OrgRepo, path: &Path) -> Result<Option<String>> {
        if issue_config_exists(path) {
            return Ok(Some("config exists".to_string()));
        }
        Ok(None)
    }

    fn apply(&self, _step: usize, repo: &OrgRepo, path: &Path) -> Result<Option<String>> {
        add_depr_files(&self.templates_dir, path, repo.has_issues)?;
        Ok(Some(commit_message(repo.has_issues)))
    }

    fn pr_details(&self, repo: &OrgRepo) -> Option<PrDetails> {
        Some(pr_details(repo.has_issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates(dir: &Path) -> PathBuf {
        let t = dir.join("templates");
        std::fs::create_dir_all(t.join("workflow-templates")).unwrap();
        std::fs::create_dir_all(t.join("ISSUE_TEMPLATE")).unwrap();
        std::fs::write(t.join("workflow-templates").join(WORKFLOW_TEMPLATE), "name: depr\n").unwrap();
        std::fs::write(t.join("ISSUE_TEMPLATE").join(ISSUE_TEMPLATE), "name: DEPR\n").unwrap();
        std::fs::write(t.join(OVERRIDE_CONFIG), "blank_issues_enabled: false\n").unwrap();
        t
    }

    #[test]
    fn repo_with_issues_gets_workflow_only() {
        let dir = tempfile::tempdir().unwrap();
        let t = templates(dir.path());
        let repo = dir.path().join("repo");
        std::fs::create_dir(&repo).unwrap();

        add_depr_files(&t, &repo, true).unwrap();
        assert!(repo.join(".github/workflows").join(WORKFLOW_TEMPLATE).exists());
        assert!(!issue_config_exists(&repo));
        assert_eq!(commit_message(true), "build: add DEPR workflow automation");
    }

    #[test]
    fn repo_without_issues_gets_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let t = templates(dir.path());
        let repo = dir.path().join("repo");
        std::fs::create_dir(&repo).unwrap();

        add_depr_files(&t, &repo, false).unwrap();
        assert!(repo.join(".github/ISSUE_TEMPLATE").join(ISSUE_TEMPLATE).exists());
        assert_eq!(
            std::fs::read_to_string(issue_config_path(&repo)).unwrap(),
            "blank_issues_enabled: false\n"
        );

        let details = pr_details(false);
        assert!(details.title.ends_with("& default issue overrides"));
        assert!(details.body.unwrap().contains("does not have Issues enabled"));
    }

    #[test]
    fn every_template_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let t = templates(dir.path());
        assert!(missing_templates(&t).is_empty());

        std::fs::remove_file(t.join(OVERRIDE_CONFIG)).unwrap();
        std::fs::remove_file(t.join("ISSUE_TEMPLATE").join(ISSUE_TEMPLATE)).unwrap();
        assert_eq!(
            missing_templates(&t),
            vec![t.join("ISSUE_TEMPLATE").join(ISSUE_TEMPLATE), t.join(OVERRIDE_CONFIG)]
        );
    }

    #[test]
    fn existing_issue_config_skips_repo() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(repo.join(".github/ISSUE_TEMPLATE")).unwrap();
        std::fs::write(issue_config_path(&repo), "x").unwrap();

        let edit = DeprEdit {
            templates_dir: dir.path().to_path_buf(),
        };
        let target = crate::test_utils::org_repo("widgets", &repo);
        assert_eq!(
            edit.precheck(&target, &repo).unwrap().as_deref(),
            Some("config exists")
        );
    }
}
