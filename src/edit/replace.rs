use crate::error::{Result, SweepError};
use crate::github::types::{OrgRepo, PrDetails};
use crate::pipeline::RepoEdit;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// One literal substitution and the message of the commit that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SwapPair {
    pub old: String,
    pub new: String,
    pub message: String,
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name() == ".git"
}

fn files_under(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_git_dir(e)) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

// Non-UTF-8 files are treated as binary and left alone.
fn read_text(path: &Path) -> Result<Option<String>> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8(bytes).ok())
}

fn check_needle(needle: &str) -> Result<()> {
    if needle.is_empty() {
        return Err(SweepError::InvalidInput("search string is empty".to_string()));
    }
    Ok(())
}

/// Whether any text file in the tree (outside `.git/`) contains `needle`.
pub fn contains_string(root: &Path, needle: &str) -> Result<bool> {
    check_needle(needle)?;
    for file in files_under(root)? {
        if let Some(text) = read_text(&file)? {
            if text.contains(needle) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Replaces every occurrence of `old` with `new` and returns how many files
/// were rewritten.
pub fn swap_strings(root: &Path, old: &str, new: &str) -> Result<usize> {
    check_needle(old)?;
    let mut changed = 0;
    for file in files_under(root)? {
        let Some(text) = read_text(&file)? else {
            continue;
        };
        if text.contains(old) {
            std::fs::write(&file, text.replace(old, new))?;
            tracing::debug!(file = %file.display(), "swapped");
            changed += 1;
        }
    }
    Ok(changed)
}

/// Applies each pair as its own commit.
#[derive(Debug, Clone)]
pub struct ReplaceEdit {
    pub pairs: Vec<SwapPair>,
    pub pr: Option<PrDetails>,
}

impl RepoEdit for ReplaceEdit {
    fn precheck(&self, _repo: &OrgRepo, path: &Path) -> Result<Option<String>> {
        for pair in &self.pairs {
            if contains_string(path, &pair.old)? {
                return Ok(None);
            }
        }
        Ok(Some("string not found".to_string()))
    }

    fn steps(&self) -> usize {
        self.pairs.len()
    }

    fn apply(&self, step: usize, _repo: &OrgRepo, path: &Path) -> Result<Option<String>> {
        let Some(pair) = self.pairs.get(step) else {
            return Ok(None);
        };
        if swap_strings(path, &pair.old, &pair.new)? == 0 {
            tracing::info!(old = %pair.old, "did not find string");
            return Ok(None);
        }
        Ok(Some(pair.message.clone()))
    }

    fn pr_details(&self, _repo: &OrgRepo) -> Option<PrDetails> {
        self.pr.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join(".github/workflows")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(
            root.join(".github/workflows/ci.yml"),
            "uses: edx/.github/workflows/a.yml\nuses: edx/.github/workflows/b.yml\n",
        )
        .unwrap();
        std::fs::write(root.join(".git/config"), "url = edx/.github\n").unwrap();
        std::fs::write(root.join("logo.bin"), [0xffu8, 0xfe, b'e', b'd', b'x']).unwrap();
        std::fs::write(root.join("README.md"), "nothing here\n").unwrap();
        dir
    }

    #[test]
    fn swaps_all_occurrences_outside_git_dir() {
        let dir = tree();
        let root = dir.path();

        assert!(contains_string(root, "edx/.github").unwrap());
        let changed = swap_strings(root, "edx/.github", "openedx/.github").unwrap();
        assert_eq!(changed, 1);

        let ci = std::fs::read_to_string(root.join(".github/workflows/ci.yml")).unwrap();
        assert_eq!(
            ci,
            "uses: openedx/.github/workflows/a.yml\nuses: openedx/.github/workflows/b.yml\n"
        );
        let git_config = std::fs::read_to_string(root.join(".git/config")).unwrap();
        assert_eq!(git_config, "url = edx/.github\n");
        assert_eq!(std::fs::read(root.join("logo.bin")).unwrap()[0], 0xff);
    }

    #[test]
    fn slashes_and_regex_characters_are_literal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "see https://x.org/a.b*c\n").unwrap();

        swap_strings(dir.path(), "https://x.org/a.b*c", "https://y.org/").unwrap();
        let text = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        assert_eq!(text, "see https://y.org/\n");
    }

    #[test]
    fn missing_string_is_reported() {
        let dir = tree();
        assert!(!contains_string(dir.path(), "not-present-anywhere").unwrap());
        assert!(contains_string(dir.path(), "").is_err());
    }

    #[test]
    fn precheck_skips_repos_without_any_match() {
        let dir = tree();
        let edit = ReplaceEdit {
            pairs: vec![SwapPair {
                old: "absent".to_string(),
                new: "x".to_string(),
                message: "m".to_string(),
            }],
            pr: None,
        };
        let repo = crate::test_utils::org_repo("widgets", dir.path());
        assert_eq!(
            edit.precheck(&repo, dir.path()).unwrap().as_deref(),
            Some("string not found")
        );
    }
}
