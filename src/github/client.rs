use crate::error::{Result, SweepError};
use crate::github::types::*;
use octocrab::Octocrab;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone)]
pub struct GitHubClient {
    octo: Octocrab,
    per_page: u8,
}

#[derive(Serialize)]
struct RepoQuery<'a> {
    #[serde(rename = "type")]
    repo_type: &'a str,
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct PageQuery {
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    q: &'a str,
    per_page: u8,
    page: u32,
}

impl GitHubClient {
    pub fn new(token: &str, api_base: &str, per_page: u8) -> Result<Self> {
        let octo = Octocrab::builder()
            .base_uri(api_base)
            .map_err(|e| SweepError::Config(format!("bad api base {api_base}: {e}")))?
            .personal_token(token.to_string())
            .build()
            .map_err(|e| SweepError::GitHub(e.to_string()))?;

        Ok(Self {
            octo,
            per_page: per_page.max(1),
        })
    }

    /// Every repository of `org`, page by page, numbered from 1.
    pub async fn list_org_repos(&self, org: &str, exclude_private: bool) -> Result<Vec<OrgRepo>> {
        let route = format!("/orgs/{org}/repos");
        let repo_type = if exclude_private { "public" } else { "all" };
        let mut repos = Vec::new();
        let mut page = 1u32;

        loop {
            let query = RepoQuery {
                repo_type,
                per_page: self.per_page,
                page,
            };
            let listings: Vec<RepoListing> = self
                .octo
                .get(&route, Some(&query))
                .await
                .map_err(SweepError::from_octocrab)?;

            if listings.is_empty() {
                break;
            }
            let last_page = listings.len() < self.per_page as usize;

            for listing in listings {
                if exclude_private && listing.private == Some(true) {
                    return Err(SweepError::GitHub(format!(
                        "{org}/{} is private but only public repos were requested",
                        listing.name
                    )));
                }
                let count = repos.len() + 1;
                repos.push(OrgRepo::from_listing(listing, count));
            }

            if last_page {
                break;
            }
            page += 1;
        }

        tracing::debug!(org, total = repos.len(), "listed org repositories");
        Ok(repos)
    }

    pub async fn get_repo(&self, org: &str, repo: &str, count: usize) -> Result<OrgRepo> {
        let route = format!("/repos/{org}/{repo}");
        let listing: RepoListing = self
            .octo
            .get::<RepoListing, _, ()>(route, None)
            .await
            .map_err(SweepError::from_octocrab)?;
        Ok(OrgRepo::from_listing(listing, count))
    }

    /// Opens a pull request from `head` into `base` and returns its html URL.
    pub async fn create_pull(
        &self,
        org: &str,
        repo: &str,
        head: &str,
        base: &str,
        details: &PrDetails,
    ) -> Result<String> {
        let route = format!("/repos/{org}/{repo}/pulls");
        let body = NewPull {
            head,
            base,
            title: &details.title,
            body: details.body.as_deref(),
        };

        let created: CreatedPull = self.octo.post(route, Some(&body)).await.map_err(|e| {
            match SweepError::from_octocrab(e) {
                SweepError::Api { status, message } => SweepError::PrCreation {
                    status,
                    body: message,
                },
                other => SweepError::PrCreation {
                    status: 0,
                    body: other.to_string(),
                },
            }
        })?;

        tracing::info!(url = %created.html_url, "PR success");
        Ok(created.html_url)
    }

    pub async fn merge_pull(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        commit_title: &str,
        method: Option<MergeMethod>,
    ) -> Result<()> {
        let route = format!("/repos/{org}/{repo}/pulls/{number}/merge");
        let body = MergeRequest {
            commit_title,
            merge_method: method,
        };
        let result: MergeResult = self
            .octo
            .put(route, Some(&body))
            .await
            .map_err(SweepError::from_octocrab)?;

        if result.merged {
            Ok(())
        } else {
            Err(SweepError::Api {
                status: 200,
                message: result.message,
            })
        }
    }

    /// Returns `None` when the repository has no label with that name.
    pub async fn get_label(&self, org: &str, repo: &str, name: &str) -> Result<Option<Label>> {
        let route = format!("/repos/{org}/{repo}/labels/{}", urlencoding::encode(name));
        match self.octo.get::<Label, _, ()>(route, None).await {
            Ok(label) => Ok(Some(label)),
            Err(e) => match SweepError::from_octocrab(e) {
                SweepError::Api { status: 404, .. } => Ok(None),
                other => Err(other),
            },
        }
    }

    pub async fn create_label(&self, org: &str, repo: &str, spec: &LabelSpec) -> Result<Label> {
        let route = format!("/repos/{org}/{repo}/labels");
        let body = serde_json::json!({
            "name": spec.name,
            "color": spec.color,
            "description": spec.description,
        });
        self.octo
            .post(route, Some(&body))
            .await
            .map_err(SweepError::from_octocrab)
    }

    pub async fn update_label(&self, org: &str, repo: &str, spec: &LabelSpec) -> Result<Label> {
        let route = format!("/repos/{org}/{repo}/labels/{}", urlencoding::encode(&spec.name));
        let body = serde_json::json!({
            "color": spec.color,
            "description": spec.description,
        });
        self.octo
            .patch(route, Some(&body))
            .await
            .map_err(SweepError::from_octocrab)
    }

    /// Updates the label when it exists, creates it otherwise, then checks
    /// that GitHub echoes back what was asked for.
    pub async fn upsert_label(&self, org: &str, repo: &str, spec: &LabelSpec) -> Result<Label> {
        let (label, created) = if self.get_label(org, repo, &spec.name).await?.is_some() {
            tracing::info!(label = %spec.name, repo, "label present, updating");
            (self.update_label(org, repo, spec).await?, false)
        } else {
            tracing::info!(label = %spec.name, repo, "label missing, adding");
            (self.create_label(org, repo, spec).await?, true)
        };
        validate_label(&label, spec, created)?;
        Ok(label)
    }

    /// Raw issue objects of a repository, pull requests included.
    pub async fn list_issues(&self, org: &str, repo: &str) -> Result<Vec<Value>> {
        let route = format!("/repos/{org}/{repo}/issues");
        let mut issues = Vec::new();
        let mut page = 1u32;

        loop {
            let query = PageQuery {
                per_page: self.per_page,
                page,
            };
            let batch: Vec<Value> = self
                .octo
                .get(&route, Some(&query))
                .await
                .map_err(SweepError::from_octocrab)?;
            if batch.is_empty() {
                break;
            }
            let last_page = batch.len() < self.per_page as usize;
            issues.extend(batch);
            if last_page {
                break;
            }
            page += 1;
        }

        Ok(issues)
    }

    /// Runs a search query (same syntax as the GitHub UI) over issues and PRs.
    pub async fn search_issues(&self, query: &str) -> Result<Vec<SearchItem>> {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let params = SearchQuery {
                q: query,
                per_page: self.per_page,
                page,
            };
            let result: SearchPage = self
                .octo
                .get("/search/issues", Some(&params))
                .await
                .map_err(SweepError::from_octocrab)?;
            if result.items.is_empty() {
                break;
            }
            items.extend(result.items);
            if items.len() >= result.total_count {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    pub async fn pull_head_ref(&self, org: &str, repo: &str, number: u64) -> Result<String> {
        let route = format!("/repos/{org}/{repo}/pulls/{number}");
        let pull: PullHead = self
            .octo
            .get::<PullHead, _, ()>(route, None)
            .await
            .map_err(SweepError::from_octocrab)?;
        Ok(pull.head.ref_name)
    }

    pub async fn rate_limit(&self) -> Result<Value> {
        self.octo
            .get::<Value, _, ()>("/rate_limit", None)
            .await
            .map_err(SweepError::from_octocrab)
    }
}

fn validate_label(label: &Label, spec: &LabelSpec, check_name: bool) -> Result<()> {
    let name_ok = !check_name || label.name == spec.name;
    let color_ok = label.color.eq_ignore_ascii_case(&spec.color);
    let description_ok = label.description.as_deref().unwrap_or("") == spec.description;
    if name_ok && color_ok && description_ok {
        Ok(())
    } else {
        Err(SweepError::GitHub(format!("label update failed, got: {label:?}")))
    }
}

/// Normalizes a label color to six lowercase hex digits.
pub fn validate_color(color: &str) -> Result<String> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(hex.to_ascii_lowercase())
    } else {
        Err(SweepError::InvalidInput(format!(
            "label color must be six hex digits, got {color:?}"
        )))
    }
}

/// Splits `https://github.com/<org>/<repo>/pull/<num>` into its parts.
pub fn parse_pr_url(url: &str) -> Result<(String, String, u64)> {
    let invalid = || SweepError::InvalidInput(format!("not a pull request URL: {url}"));
    let path = url
        .trim()
        .trim_end_matches('/')
        .split_once("://")
        .map(|(_, rest)| rest)
        .ok_or_else(invalid)?;
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [_host, org, repo, "pull" | "pulls", num] => {
            let number = num.parse().map_err(|_| invalid())?;
            Ok((org.to_string(), repo.to_string(), number))
        }
        _ => Err(invalid()),
    }
}

/// Turns an API URL into the address a browser would open.
pub fn api_to_html_url(url: &str) -> String {
    url.replacen("://api.github.com/repos/", "://github.com/", 1)
        .replace("/pulls/", "/pull/")
}
