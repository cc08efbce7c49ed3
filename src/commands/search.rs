use crate::commands::Session;
use crate::error::Result;
use crate::github::client::GitHubClient;
use crate::output;

/// `[pr_url, repo]` per matched PR, plus the head branch when asked.
pub async fn collect(client: &GitHubClient, query: &str, with_branch: bool) -> Result<Vec<Vec<String>>> {
    let items = client.search_issues(query).await?;
    tracing::info!(count = items.len(), "search matched");

    let mut rows = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if (i + 1) % 10 == 0 {
            tracing::info!("processing pr #{}", i + 1);
        }
        let mut row = vec![item.html_url.clone(), item.repo_name().to_string()];
        if with_branch {
            row.push(
                client
                    .pull_head_ref(item.org_name(), item.repo_name(), item.number)
                    .await?,
            );
        }
        rows.push(row);
    }
    Ok(rows)
}

pub async fn run(session: &Session, query: &str, with_branch: bool) -> Result<()> {
    let rows = collect(&session.client, query, with_branch).await?;
    let name = format!("pr_parse_{}.json", output::timestamp());
    let path = output::write_json(&session.config.output_dir, &name, &rows)?;
    tracing::info!(count = rows.len(), path = %path.display(), "search results written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_client;
    use mockito::Matcher;

    #[tokio::test]
    async fn rows_carry_head_branch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/issues")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "is:pr author:bot".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "total_count": 1,
                    "items": [{
                        "url": "https://api.github.com/repos/acme/widgets/issues/4",
                        "html_url": "https://github.com/acme/widgets/pull/4",
                        "number": 4,
                        "repository_url": "https://api.github.com/repos/acme/widgets"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/repos/acme/widgets/pulls/4")
            .with_header("content-type", "application/json")
            .with_body(r#"{"head": {"ref": "bulk/codeowners"}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url(), 100);
        let rows = collect(&client, "is:pr author:bot", true).await.unwrap();

        assert_eq!(
            rows,
            vec![vec![
                "https://github.com/acme/widgets/pull/4".to_string(),
                "widgets".to_string(),
                "bulk/codeowners".to_string(),
            ]]
        );
    }
}
