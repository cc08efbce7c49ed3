#![cfg(test)]

use crate::git::repo::CommitAuthor;
use crate::github::client::GitHubClient;
use crate::github::types::OrgRepo;
use git2::{Repository, Signature};
use std::path::{Path, PathBuf};

/// Bare repository at `dir/origin.git` whose `main` holds the given
/// top-level files.
pub fn make_origin(dir: &Path, files: &[(&str, &str)]) -> PathBuf {
    let bare_path = dir.join("origin.git");
    let bare = Repository::init_bare(&bare_path).unwrap();
    let sig = Signature::now("test", "test@example.com").unwrap();

    let mut builder = bare.treebuilder(None).unwrap();
    for (name, content) in files {
        let blob = bare.blob(content.as_bytes()).unwrap();
        builder.insert(name, blob, 0o100644).unwrap();
    }
    let tree_id = builder.write().unwrap();
    let tree = bare.find_tree(tree_id).unwrap();
    bare.commit(Some("refs/heads/main"), &sig, &sig, "initial", &tree, &[])
        .unwrap();
    bare.set_head("refs/heads/main").unwrap();

    bare_path
}

pub fn org_repo(name: &str, origin: &Path) -> OrgRepo {
    OrgRepo {
        name: name.to_string(),
        ssh_url: origin.to_string_lossy().to_string(),
        default_branch: "main".to_string(),
        has_issues: true,
        private: false,
        license: None,
        count: 1,
    }
}

pub fn test_author() -> CommitAuthor {
    CommitAuthor {
        name: "test".to_string(),
        email: "test@example.com".to_string(),
    }
}

pub fn test_client(base: &str, per_page: u8) -> GitHubClient {
    GitHubClient::new("test-token", base, per_page).unwrap()
}
