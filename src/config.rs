use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::error::{DashboardError, Result};
use crate::table::PageSize;

pub const DEFAULT_CONFIG_FILE: &str = "erp-dashboard.toml";
pub const ENV_PREFIX: &str = "ERP";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: BackendSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    /// Required. Every endpoint path is appended to it.
    #[serde(default)]
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiSettings {
    /// 5, 10, 20, 50, 100 or "all".
    #[serde(default = "default_page_size", deserialize_with = "page_size_setting")]
    pub page_size: PageSize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Keeps added units and inventory types across runs when set.
    #[serde(default)]
    pub options_db: Option<PathBuf>,
}

fn default_page_size() -> PageSize {
    PageSize::Ten
}

/// Accepts the row count as a number (`20`) or a string (`"20"`, `"all"`),
/// since environment variables always arrive as strings.
fn page_size_setting<'de, D>(deserializer: D) -> std::result::Result<PageSize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Rows(u64),
        Text(String),
    }

    let raw = Raw::deserialize(deserializer)?;
    let parsed = match &raw {
        Raw::Rows(n) => usize::try_from(*n).ok().and_then(PageSize::from_limit),
        Raw::Text(s) => PageSize::parse(s),
    };
    parsed.ok_or_else(|| {
        let got = match raw {
            Raw::Rows(n) => n.to_string(),
            Raw::Text(s) => s,
        };
        D::Error::custom(format!("ui.page_size must be one of 5, 10, 20, 50, 100 or \"all\"; got `{got}`"))
    })
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for UiSettings {
    fn default() -> Self {
        UiSettings {
            page_size: default_page_size(),
            output_dir: default_output_dir(),
            options_db: None,
        }
    }
}

impl AppConfig {
    /// Loads `erp-dashboard.toml` (or `path`) when present, then `ERP_*`
    /// environment variables, e.g. `ERP_BACKEND__BASE_URL`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let settings = ::config::Config::builder()
            .set_default("backend.timeout_secs", default_timeout_secs())?
            .set_default("ui.page_size", 10u64)?
            .set_default("ui.output_dir", ".")?
            .add_source(::config::File::from(file).required(path.is_some()))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let cfg: AppConfig = settings.try_deserialize()?;
        cfg.validate()
    }

    /// Checks values and normalizes the base URL (no trailing slash).
    pub fn validate(mut self) -> Result<Self> {
        let url = self.backend.base_url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Err(DashboardError::Config(
                "backend.base_url is required (set ERP_BACKEND__BASE_URL)".to_string(),
            ));
        }
        let scheme_ok = url
            .split_once("://")
            .is_some_and(|(scheme, rest)| matches!(scheme, "http" | "https") && !rest.is_empty());
        if !scheme_ok {
            return Err(DashboardError::Config(format!(
                "backend.base_url must be an http(s) URL, got `{url}`"
            )));
        }
        self.backend.base_url = url;

        if self.backend.timeout_secs == 0 {
            return Err(DashboardError::Config("backend.timeout_secs must be positive".to_string()));
        }
        self.backend.token = self.backend.token.take().filter(|t| !t.trim().is_empty());
        Ok(self)
    }

    pub fn page_size(&self) -> PageSize {
        self.ui.page_size
    }
}
