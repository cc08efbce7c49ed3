use crate::cli::ExportFormat;
use crate::commands::Session;
use crate::error::{Result, SweepError};
use crate::github::client::api_to_html_url;
use crate::output;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

const CSV_COLUMNS: [&str; 9] = [
    "url",
    "number",
    "title",
    "body",
    "created_at",
    "updated_at",
    "user-login",
    "labels-name",
    "assignees-login",
];

const PLAIN_FIELDS: [&str; 6] = ["url", "number", "title", "body", "created_at", "updated_at"];

fn has_label(issue: &Value, label: &str) -> bool {
    issue["labels"]
        .as_array()
        .is_some_and(|labels| labels.iter().any(|l| l["name"].as_str() == Some(label)))
}

fn pluck(items: &Value, key: &str) -> Vec<Value> {
    items
        .as_array()
        .map(|arr| arr.iter().map(|item| item[key].clone()).collect())
        .unwrap_or_default()
}

fn trim_issue(issue: &Value, flatten: bool) -> Value {
    let mut out = Map::new();
    for field in PLAIN_FIELDS {
        out.insert(field.to_string(), issue[field].clone());
    }
    let login = issue["user"]["login"].clone();
    let labels = pluck(&issue["labels"], "name");
    let assignees = pluck(&issue["assignees"], "login");

    if flatten {
        out.insert("user-login".to_string(), login);
        out.insert("labels-name".to_string(), Value::Array(labels));
        out.insert("assignees-login".to_string(), Value::Array(assignees));
    } else {
        out.insert("user".to_string(), json!({ "login": login }));
        let labels = labels.into_iter().map(|name| json!({ "name": name })).collect();
        out.insert("labels".to_string(), Value::Array(labels));
        let assignees = assignees.into_iter().map(|login| json!({ "login": login })).collect();
        out.insert("assignees".to_string(), Value::Array(assignees));
    }
    Value::Object(out)
}

/// Drops pull requests and issues missing `label`, points `url` at the web
/// page and, unless `raw`, keeps only the exported fields.
pub fn prepare(issues: Vec<Value>, raw: bool, label: Option<&str>, flatten: bool) -> Vec<Value> {
    issues
        .into_iter()
        .filter(|issue| issue.get("pull_request").is_none())
        .filter(|issue| label.map_or(true, |l| has_label(issue, l)))
        .map(|mut issue| {
            if let Some(url) = issue["url"].as_str().map(api_to_html_url) {
                issue["url"] = Value::String(url);
            }
            if raw {
                issue
            } else {
                trim_issue(&issue, flatten)
            }
        })
        .collect()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

pub fn write_csv(path: &Path, issues: &[Value]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_COLUMNS)?;
    for issue in issues {
        writer.write_record(CSV_COLUMNS.iter().map(|col| cell(&issue[*col])))?;
    }
    writer.flush()?;
    Ok(())
}

pub async fn run(
    session: &Session,
    repos: &[String],
    format: ExportFormat,
    raw: bool,
    label: Option<&str>,
) -> Result<()> {
    if raw && format == ExportFormat::Csv {
        return Err(SweepError::InvalidInput(
            "raw export is only available as json".to_string(),
        ));
    }
    let org = session.org()?;
    let flatten = format == ExportFormat::Csv;

    let mut issues = Vec::new();
    for repo in repos {
        let fetched = session.client.list_issues(org, repo).await?;
        tracing::info!(%repo, fetched = fetched.len(), "fetched issues");
        issues.extend(prepare(fetched, raw, label, flatten));
    }

    let dir = session.config.output_dir.join("export");
    let name = format!("{}-{}.{}", output::timestamp(), repos.join(","), format.extension());
    let path: PathBuf = match format {
        ExportFormat::Json => output::write_json(&dir, &name, &issues)?,
        ExportFormat::Csv => {
            std::fs::create_dir_all(&dir)?;
            let path = dir.join(&name);
            write_csv(&path, &issues)?;
            path
        }
    };
    tracing::info!(count = issues.len(), path = %path.display(), "issues exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issues() -> Vec<Value> {
        vec![
            json!({
                "url": "https://api.github.com/repos/acme/widgets/issues/1",
                "number": 1,
                "title": "Broken build",
                "body": null,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-02T00:00:00Z",
                "user": {"login": "alice", "id": 1},
                "labels": [{"name": "bug", "color": "d73a4a"}, {"name": "ci"}],
                "assignees": [{"login": "bob"}, {"login": "carol"}],
                "state": "open"
            }),
            json!({
                "url": "https://api.github.com/repos/acme/widgets/issues/2",
                "number": 2,
                "title": "A pull request",
                "pull_request": {"url": "https://api.github.com/repos/acme/widgets/pulls/2"},
                "labels": [{"name": "bug"}]
            }),
            json!({
                "url": "https://api.github.com/repos/acme/widgets/issues/3",
                "number": 3,
                "title": "Question",
                "user": {"login": "dave"},
                "labels": [],
                "assignees": []
            }),
        ]
    }

    #[test]
    fn drops_pulls_and_trims_fields() {
        let out = prepare(issues(), false, None, false);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["url"], "https://github.com/acme/widgets/issues/1");
        assert_eq!(out[0]["user"], json!({"login": "alice"}));
        assert_eq!(out[0]["labels"], json!([{"name": "bug"}, {"name": "ci"}]));
        assert!(out[0].get("state").is_none());
    }

    #[test]
    fn label_filter_and_raw() {
        let out = prepare(issues(), true, Some("bug"), false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["state"], "open");
        assert_eq!(out[0]["url"], "https://github.com/acme/widgets/issues/1");
    }

    #[test]
    fn csv_joins_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let flat = prepare(issues(), false, None, true);
        assert_eq!(flat[0]["labels-name"], json!(["bug", "ci"]));

        write_csv(&path, &flat).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_COLUMNS.to_vec());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "1");
        assert_eq!(&rows[0][3], "");
        assert_eq!(&rows[0][6], "alice");
        assert_eq!(&rows[0][7], "bug, ci");
        assert_eq!(&rows[0][8], "bob, carol");
        assert_eq!(&rows[1][8], "");
    }
}
