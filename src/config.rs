use crate::error::{Result, SweepError};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    pub github_token: Option<String>,
    pub api_base: String,
    pub org: Option<String>,
    pub root_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pause_secs: u64,
    pub merge_pause_secs: u64,
    pub per_page: u8,
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
    pub commit_author_name: String,
    pub commit_author_email: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("github_token", &self.github_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("org", &self.org)
            .field("root_dir", &self.root_dir)
            .field("output_dir", &self.output_dir)
            .field("pause_secs", &self.pause_secs)
            .field("merge_pause_secs", &self.merge_pause_secs)
            .field("per_page", &self.per_page)
            .field("templates_dir", &self.templates_dir)
            .field("commit_author_name", &self.commit_author_name)
            .field("commit_author_email", &self.commit_author_email)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: None,
            api_base: "https://api.github.com".to_string(),
            org: None,
            root_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            pause_secs: 5,
            merge_pause_secs: 2,
            per_page: 100,
            templates_dir: None,
            commit_author_name: "orgsweep".to_string(),
            commit_author_email: "orgsweep@users.noreply.github.com".to_string(),
        }
    }
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub org: Option<String>,
    pub root_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl Config {
    pub fn load(overrides: Overrides) -> Result<Self> {
        let config_file = config_dir().join("orgsweep").join("config.toml");

        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        if config_file.exists() {
            figment = figment.merge(Toml::file(&config_file));
        }

        figment = figment.merge(Env::prefixed("ORGSWEEP_")).merge(
            Env::raw()
                .only(&["GITHUB_TOKEN"])
                .map(|_| "github_token".into()),
        );

        if let Some(org) = overrides.org {
            figment = figment.merge(Serialized::default("org", org));
        }
        if let Some(path) = overrides.root_dir {
            figment = figment.merge(Serialized::default("root_dir", path));
        }
        if let Some(path) = overrides.output_dir {
            figment = figment.merge(Serialized::default("output_dir", path));
        }

        figment
            .extract()
            .map_err(|e| SweepError::Config(e.to_string()))
    }

    pub fn require_token(&self) -> Result<&str> {
        match self.github_token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(SweepError::Config(
                "GITHUB_TOKEN must be defined in this environment".to_string(),
            )),
        }
    }

    pub fn require_org(&self) -> Result<&str> {
        self.org
            .as_deref()
            .filter(|o| !o.is_empty())
            .ok_or_else(|| SweepError::Config("no organization given (use --org)".to_string()))
    }

    /// Checkout holding the DEPR templates, `<root_dir>/.github` unless set.
    pub fn resolved_templates_dir(&self) -> PathBuf {
        self.templates_dir
            .clone()
            .unwrap_or_else(|| self.root_dir.join(".github"))
    }
}

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from("."))
}
