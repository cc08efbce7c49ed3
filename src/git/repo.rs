use crate::error::{Result, SweepError};
use crate::git::auth::GitAuth;
use crate::github::types::OrgRepo;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{BranchType, DiffFormat, DiffOptions, IndexAddOption, Oid, Repository, ResetType, Signature};
use std::path::{Path, PathBuf};

/// Identity used for commits when the checkout has no `user.name` configured.
#[derive(Clone, Debug)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

pub fn repo_path(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

pub fn open_repo(path: &Path) -> Result<Repository> {
    Repository::open(path).map_err(SweepError::from)
}

/// Clones the repo under `root` when missing; otherwise switches to its
/// default branch and fast-forwards it from `origin`.
pub fn sync_checkout(root: &Path, repo: &OrgRepo, auth: &GitAuth) -> Result<PathBuf> {
    let path = repo_path(root, &repo.name);

    if !path.exists() {
        std::fs::create_dir_all(root)?;
        tracing::info!(repo = %repo.name, url = %repo.ssh_url, "cloning");
        let mut builder = RepoBuilder::new();
        builder.fetch_options(auth.fetch_options());
        builder.clone(&repo.ssh_url, &path)?;
    } else {
        let r = open_repo(&path)?;
        tracing::debug!(repo = %repo.name, branch = %repo.default_branch, "pulling");
        switch_to(&r, &repo.default_branch)?;
        pull_fast_forward(&r, &repo.default_branch, auth)?;
    }

    Ok(path)
}

fn switch_to(repo: &Repository, branch: &str) -> Result<()> {
    let refname = format!("refs/heads/{branch}");
    let target = repo.revparse_single(&refname)?;
    repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
    repo.set_head(&refname)?;
    Ok(())
}

fn pull_fast_forward(repo: &Repository, branch: &str, auth: &GitAuth) -> Result<()> {
    let mut remote = repo.find_remote("origin")?;
    remote.fetch(&[] as &[&str], Some(&mut auth.fetch_options()), None)?;
    fast_forward(repo, branch)
}

/// Moves the checked-out `branch` up to `origin/<branch>`, work tree and
/// index included. A branch ahead of its remote is left alone.
fn fast_forward(repo: &Repository, branch: &str) -> Result<()> {
    let upstream = repo.find_reference(&format!("refs/remotes/origin/{branch}"))?;
    let incoming = repo.reference_to_annotated_commit(&upstream)?;
    let (analysis, _) = repo.merge_analysis(&[&incoming])?;

    if analysis.is_up_to_date() {
        return Ok(());
    }
    if !analysis.is_fast_forward() {
        return Err(SweepError::NotFastForward(branch.to_string()));
    }

    // the tree has to move before the ref, or checkout sees no difference
    let target = repo.find_object(incoming.id(), None)?;
    repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;

    let refname = format!("refs/heads/{branch}");
    let mut local = repo.find_reference(&refname)?;
    local.set_target(incoming.id(), "orgsweep: fast-forward")?;
    repo.set_head(&refname)?;
    Ok(())
}

/// Creates `name` from HEAD, checks it out and publishes it to `origin`.
/// Returns `false` without touching anything when the branch already exists.
pub fn create_branch(path: &Path, name: &str, auth: &GitAuth) -> Result<bool> {
    let repo = open_repo(path)?;
    if repo.find_branch(name, BranchType::Local).is_ok() {
        return Ok(false);
    }

    let head = repo.head()?.peel_to_commit()?;
    repo.branch(name, &head, false)?;
    switch_to(&repo, name)?;
    push_branch(&repo, name, false, auth)?;

    let mut config = repo.config()?;
    config.set_str(&format!("branch.{name}.remote"), "origin")?;
    config.set_str(&format!("branch.{name}.merge"), &format!("refs/heads/{name}"))?;
    Ok(true)
}

/// Checks out an existing branch, creating the local branch from
/// `origin/<name>` when only the remote one exists and fast-forwarding it
/// when the remote one has moved on.
pub fn checkout_branch(path: &Path, name: &str) -> Result<bool> {
    let repo = open_repo(path)?;
    let remote_name = format!("origin/{name}");
    let remote = repo.find_branch(&remote_name, BranchType::Remote).ok();

    if repo.find_branch(name, BranchType::Local).is_err() {
        let Some(remote) = remote else {
            return Ok(false);
        };
        let commit = remote.get().peel_to_commit()?;
        let mut local = repo.branch(name, &commit, false)?;
        local.set_upstream(Some(&remote_name))?;
        switch_to(&repo, name)?;
        return Ok(true);
    }

    switch_to(&repo, name)?;
    if remote.is_some() {
        fast_forward(&repo, name)?;
    }
    Ok(true)
}

pub fn current_branch(path: &Path) -> Result<String> {
    let repo = open_repo(path)?;
    let head = repo.head()?;
    let name = head
        .shorthand()
        .filter(|_| head.is_branch())
        .map(String::from);
    name.ok_or_else(|| SweepError::InvalidInput(format!("{}: HEAD is detached", path.display())))
}

/// Stages every new, modified and deleted file and commits it on HEAD.
/// Returns `None` when the work tree matches HEAD.
pub fn commit_all(path: &Path, message: &str, author: &CommitAuthor) -> Result<Option<Oid>> {
    let repo = open_repo(path)?;
    let mut index = repo.index()?;
    index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"].iter(), None)?;
    index.write()?;

    let tree_id = index.write_tree()?;
    let parent = repo.head()?.peel_to_commit()?;
    if parent.tree_id() == tree_id {
        return Ok(None);
    }

    let tree = repo.find_tree(tree_id)?;
    let signature = match repo.signature() {
        Ok(sig) => sig,
        Err(_) => Signature::now(&author.name, &author.email)?,
    };
    let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?;
    tracing::debug!(%oid, "committed");
    Ok(Some(oid))
}

pub fn push_current(path: &Path, force: bool, auth: &GitAuth) -> Result<()> {
    let branch = current_branch(path)?;
    let repo = open_repo(path)?;
    push_branch(&repo, &branch, force, auth)
}

fn push_branch(repo: &Repository, branch: &str, force: bool, auth: &GitAuth) -> Result<()> {
    let mut remote = repo.find_remote("origin")?;
    let prefix = if force { "+" } else { "" };
    let refspec = format!("{prefix}refs/heads/{branch}:refs/heads/{branch}");
    remote.push(&[refspec.as_str()], Some(&mut auth.push_options()))?;
    Ok(())
}

/// `git reset --hard HEAD~n`
pub fn reset_hard(path: &Path, n: usize) -> Result<()> {
    let repo = open_repo(path)?;
    let target = repo.revparse_single(&format!("HEAD~{n}"))?;
    repo.reset(&target, ResetType::Hard, None)?;
    Ok(())
}

/// Throws away every uncommitted change, untracked files included.
/// Ignored files stay.
pub fn discard_changes(path: &Path) -> Result<()> {
    reset_hard(path, 0)?;
    let repo = open_repo(path)?;
    repo.checkout_head(Some(CheckoutBuilder::new().force().remove_untracked(true)))?;
    Ok(())
}

/// Patch text of the work tree (untracked files included) against HEAD.
pub fn diff_text(path: &Path) -> Result<String> {
    let repo = open_repo(path)?;
    let head_tree = repo.head()?.peel_to_tree()?;
    let mut opts = DiffOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .show_untracked_content(true);
    let diff = repo.diff_tree_to_workdir_with_index(Some(&head_tree), Some(&mut opts))?;

    let mut out = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            out.push(line.origin());
        }
        out.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{make_origin, org_repo, test_author};

    #[test]
    fn clone_then_pull_fast_forwards() {
        let dir = tempfile::tempdir().unwrap();
        let origin = make_origin(dir.path(), &[("README.md", "hello\n")]);
        let root = dir.path().join("checkouts");
        let repo = org_repo("widgets", &origin);
        let auth = GitAuth::default();

        let path = sync_checkout(&root, &repo, &auth).unwrap();
        assert_eq!(std::fs::read_to_string(path.join("README.md")).unwrap(), "hello\n");

        // A second checkout pushes a new commit to origin.
        let other_root = dir.path().join("other");
        let other = sync_checkout(&other_root, &repo, &auth).unwrap();
        std::fs::write(other.join("NEW.md"), "new\n").unwrap();
        commit_all(&other, "add new", &test_author()).unwrap().unwrap();
        push_current(&other, false, &auth).unwrap();

        sync_checkout(&root, &repo, &auth).unwrap();
        assert!(path.join("NEW.md").exists());
        assert_eq!(current_branch(&path).unwrap(), "main");
        // index follows the work tree, so nothing upstream gets reverted
        assert!(commit_all(&path, "nothing", &test_author()).unwrap().is_none());
    }

    #[test]
    fn create_branch_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let origin = make_origin(dir.path(), &[("README.md", "hello\n")]);
        let auth = GitAuth::default();
        let path = sync_checkout(&dir.path().join("co"), &org_repo("widgets", &origin), &auth).unwrap();

        assert!(create_branch(&path, "bulk/update", &auth).unwrap());
        assert_eq!(current_branch(&path).unwrap(), "bulk/update");
        assert!(!create_branch(&path, "bulk/update", &auth).unwrap());

        let bare = Repository::open_bare(&origin).unwrap();
        assert!(bare.find_branch("bulk/update", BranchType::Local).is_ok());
    }

    #[test]
    fn checkout_branch_tracks_remote_only_branch() {
        let dir = tempfile::tempdir().unwrap();
        let origin = make_origin(dir.path(), &[("README.md", "hello\n")]);
        let auth = GitAuth::default();
        let repo = org_repo("widgets", &origin);

        let first = sync_checkout(&dir.path().join("a"), &repo, &auth).unwrap();
        create_branch(&first, "feature", &auth).unwrap();

        let second = sync_checkout(&dir.path().join("b"), &repo, &auth).unwrap();
        assert!(checkout_branch(&second, "feature").unwrap());
        assert_eq!(current_branch(&second).unwrap(), "feature");
        assert!(!checkout_branch(&second, "missing").unwrap());
    }

    #[test]
    fn checkout_branch_fast_forwards_stale_local_branch() {
        let dir = tempfile::tempdir().unwrap();
        let origin = make_origin(dir.path(), &[("README.md", "hello\n")]);
        let auth = GitAuth::default();
        let repo = org_repo("widgets", &origin);

        let first = sync_checkout(&dir.path().join("a"), &repo, &auth).unwrap();
        create_branch(&first, "pr-branch", &auth).unwrap();

        let second = sync_checkout(&dir.path().join("b"), &repo, &auth).unwrap();
        assert!(checkout_branch(&second, "pr-branch").unwrap());
        std::fs::write(second.join("REVIEW.md"), "addressed\n").unwrap();
        commit_all(&second, "address review", &test_author()).unwrap().unwrap();
        push_current(&second, false, &auth).unwrap();

        // first still has pr-branch at the old tip; a sync fetches the new one
        sync_checkout(&dir.path().join("a"), &repo, &auth).unwrap();
        assert!(checkout_branch(&first, "pr-branch").unwrap());
        assert!(first.join("REVIEW.md").exists());

        std::fs::write(first.join("README.md"), "more\n").unwrap();
        commit_all(&first, "follow up", &test_author()).unwrap().unwrap();
        push_current(&first, false, &auth).unwrap();

        let bare = Repository::open_bare(&origin).unwrap();
        let tip = bare
            .find_branch("pr-branch", BranchType::Local)
            .unwrap()
            .get()
            .peel_to_commit()
            .unwrap();
        assert_eq!(tip.message(), Some("follow up"));
        assert_eq!(tip.parent(0).unwrap().message(), Some("address review"));
    }

    #[test]
    fn discard_changes_removes_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let origin = make_origin(dir.path(), &[("README.md", "hello\n")]);
        let path = sync_checkout(&dir.path().join("co"), &org_repo("widgets", &origin), &GitAuth::default())
            .unwrap();

        std::fs::write(path.join("README.md"), "changed\n").unwrap();
        std::fs::create_dir_all(path.join(".github")).unwrap();
        std::fs::write(path.join(".github/CODEOWNERS"), "* @acme\n").unwrap();

        discard_changes(&path).unwrap();
        assert_eq!(std::fs::read_to_string(path.join("README.md")).unwrap(), "hello\n");
        assert!(!path.join(".github/CODEOWNERS").exists());
        assert!(commit_all(&path, "nothing", &test_author()).unwrap().is_none());
    }

    #[test]
    fn commit_all_skips_clean_tree_and_reset_undoes() {
        let dir = tempfile::tempdir().unwrap();
        let origin = make_origin(dir.path(), &[("README.md", "hello\n")]);
        let path = sync_checkout(&dir.path().join("co"), &org_repo("widgets", &origin), &GitAuth::default())
            .unwrap();

        assert!(commit_all(&path, "nothing", &test_author()).unwrap().is_none());

        std::fs::write(path.join("README.md"), "changed\n").unwrap();
        let diff = diff_text(&path).unwrap();
        assert!(diff.contains("-hello"));
        assert!(diff.contains("+changed"));

        assert!(commit_all(&path, "change", &test_author()).unwrap().is_some());
        reset_hard(&path, 1).unwrap();
        assert_eq!(std::fs::read_to_string(path.join("README.md")).unwrap(), "hello\n");
    }
}
