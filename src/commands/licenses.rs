use crate::commands::Session;
use crate::error::Result;
use crate::github::types::OrgRepo;
use crate::output;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct LicenseGroup {
    pub name: String,
    pub repos: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct LicenseReport {
    pub summary: Vec<String>,
    /// Keyed by SPDX id.
    pub licenses: BTreeMap<String, LicenseGroup>,
    #[serde(rename = "no license")]
    pub unlicensed: Vec<String>,
}

impl LicenseReport {
    pub fn build(repos: &[OrgRepo]) -> Self {
        let mut report = LicenseReport::default();
        for repo in repos {
            match &repo.license {
                Some(license) => report
                    .licenses
                    .entry(license.id().to_string())
                    .or_insert_with(|| LicenseGroup {
                        name: license.name.clone(),
                        repos: Vec::new(),
                    })
                    .repos
                    .push(repo.name.clone()),
                None => report.unlicensed.push(repo.name.clone()),
            }
        }

        report.summary = report
            .licenses
            .iter()
            .map(|(id, group)| format!("Found {} repos with license type {id}", group.repos.len()))
            .collect();
        report
            .summary
            .push(format!("Found {} repos with no license", report.unlicensed.len()));
        report
    }
}

pub async fn run(session: &Session) -> Result<()> {
    let org = session.org()?;
    let repos = session
        .client
        .list_org_repos(org, session.exclude_private)
        .await?;
    let report = LicenseReport::build(&repos);

    for line in &report.summary {
        tracing::info!("{line}");
    }
    let name = format!("license_check_{}.json", output::timestamp());
    let path = output::write_json(&session.config.output_dir, &name, &report)?;
    tracing::info!(path = %path.display(), "license report written");
    Ok(())
}
