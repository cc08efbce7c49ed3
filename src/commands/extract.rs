use crate::config::Config;
use crate::error::Result;
use crate::github::client::parse_pr_url;
use crate::output;
use std::path::Path;

/// Pull request links found in a log, one per line, cut from the `https`
/// onward. Other links (API bases, issue URLs) are dropped.
pub fn extract_urls(log: &str) -> Vec<String> {
    log.lines()
        .filter_map(|line| line.find("https").map(|at| line[at..].trim_end()))
        .filter(|url| parse_pr_url(url).is_ok())
        .map(String::from)
        .collect()
}

/// Rebuilds a PR list (the input of `merge-prs`) from a saved run log.
pub fn run(config: &Config, log: &Path) -> Result<()> {
    let text = std::fs::read_to_string(log)?;
    let urls = extract_urls(&text);
    let path = output::write_json(&config.output_dir, "prs_from_log.json", &urls)?;
    tracing::info!(count = urls.len(), path = %path.display(), "extracted PR urls");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_link_tails() {
        let log = "\
******* CHECKING REPO: widgets (1) *******
INFO PR success url=https://github.com/acme/widgets/pull/12
INFO skipping repo=gears reason=branch exists
DEBUG configuration loaded config=Config { api_base: \"https://api.github.com\", .. }
see https://github.com/acme/gears/issues/4
PR: https://github.com/acme/gears/pull/3   
";
        assert_eq!(
            extract_urls(log),
            vec![
                "https://github.com/acme/widgets/pull/12",
                "https://github.com/acme/gears/pull/3",
            ]
        );
    }

    #[test]
    fn writes_json_list() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("run.log");
        std::fs::write(&log, "PR: https://github.com/acme/widgets/pull/1\n").unwrap();
        let config = Config {
            output_dir: dir.path().join("out"),
            ..Default::default()
        };

        run(&config, &log).unwrap();

        let urls: Vec<String> = output::read_json(&dir.path().join("out/prs_from_log.json")).unwrap();
        assert_eq!(urls, vec!["https://github.com/acme/widgets/pull/1"]);
    }
}
