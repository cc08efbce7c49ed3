use serde::{Deserialize, Serialize};

/// Repository entry as returned by `GET /orgs/{org}/repos`.
#[derive(Clone, Debug, Deserialize)]
pub struct RepoListing {
    pub name: String,
    #[serde(default)]
    pub ssh_url: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub has_issues: Option<bool>,
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub license: Option<LicenseInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseInfo {
    #[serde(default)]
    pub spdx_id: Option<String>,
    pub name: String,
}

impl LicenseInfo {
    pub fn id(&self) -> &str {
        self.spdx_id.as_deref().unwrap_or("NOASSERTION")
    }
}

/// A repository of the org, numbered in enumeration order starting at 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrgRepo {
    pub name: String,
    pub ssh_url: String,
    pub default_branch: String,
    pub has_issues: bool,
    pub private: bool,
    pub license: Option<LicenseInfo>,
    pub count: usize,
}

impl OrgRepo {
    pub fn from_listing(listing: RepoListing, count: usize) -> Self {
        Self {
            ssh_url: listing.ssh_url.unwrap_or_default(),
            default_branch: listing.default_branch.unwrap_or_else(|| "main".to_string()),
            has_issues: listing.has_issues.unwrap_or(false),
            private: listing.private.unwrap_or(false),
            license: listing.license,
            name: listing.name,
            count,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrDetails {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Everything needed to re-open a pull request whose creation failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPr {
    pub org: String,
    pub repo: String,
    pub branch: String,
    pub base: String,
    pub details: PrDetails,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewPull<'a> {
    pub head: &'a str,
    pub base: &'a str,
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedPull {
    pub html_url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MergeRequest<'a> {
    pub commit_title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_method: Option<MergeMethod>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    Merge,
    Squash,
    Rebase,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MergeResult {
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: String,
    pub color: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage {
    pub total_count: usize,
    pub items: Vec<SearchItem>,
}

/// An issue or pull request returned by the search API.
#[derive(Clone, Debug, Deserialize)]
pub struct SearchItem {
    pub url: String,
    pub html_url: String,
    pub number: u64,
    pub repository_url: String,
}

impl SearchItem {
    pub fn repo_name(&self) -> &str {
        self.repository_url.rsplit('/').next().unwrap_or_default()
    }

    pub fn org_name(&self) -> &str {
        self.repository_url.rsplit('/').nth(1).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PullHead {
    pub head: HeadRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HeadRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}
