//! Application configuration for promptpage.
//!
//! Run identity and credentials come from the environment (the workflow that
//! triggers a run sets them). Optional, non-secret settings live in
//! `~/.promptpage/promptpage.toml` or a file passed with `--config`.
//! Everything is resolved once into an [`EditorConfig`] at process entry.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PromptPageError, Result};
use crate::types::RepoRef;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "promptpage.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".promptpage";

pub const ENV_REPO_OWNER: &str = "REPO_OWNER";
pub const ENV_REPO_NAME: &str = "REPO_NAME";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_ISSUE_NUMBER: &str = "ISSUE_NUMBER";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

// ---------------------------------------------------------------------------
// Settings structs (matching promptpage.toml schema)
// ---------------------------------------------------------------------------

/// Top-level settings, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// The published page.
    #[serde(default)]
    pub site: SiteConfig,

    /// GitHub REST settings.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Gemini settings.
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Path of the page inside the repository.
    #[serde(default = "default_page_path")]
    pub page_path: String,

    /// Branch the page is read from and committed to.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Issue label the request form attaches to new issues.
    #[serde(default = "default_request_label")]
    pub request_label: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            page_path: default_page_path(),
            branch: default_branch(),
            request_label: default_request_label(),
        }
    }
}

fn default_page_path() -> String {
    "index.html".into()
}
fn default_branch() -> String {
    "main".into()
}
fn default_request_label() -> String {
    "prompt".into()
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL.
    #[serde(default = "default_github_api")]
    pub api_base: String,

    /// Per-request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api(),
            timeout_secs: None,
        }
    }
}

fn default_github_api() -> String {
    "https://api.github.com".into()
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// REST API base URL (up to and including the version segment).
    #[serde(default = "default_gemini_api")]
    pub api_base: String,

    /// Model used for `generateContent`.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: default_gemini_api(),
            model: default_model(),
            timeout_secs: None,
        }
    }
}

fn default_gemini_api() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_model() -> String {
    "gemini-2.0-flash".into()
}

impl Settings {
    /// Reject API bases that are not absolute URLs.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("github.api_base", &self.github.api_base),
            ("gemini.api_base", &self.gemini.api_base),
        ] {
            Url::parse(value)
                .map_err(|e| PromptPageError::config(format!("{key} '{value}' is not a URL: {e}")))?;
        }
        if self.site.page_path.trim().is_empty() {
            return Err(PromptPageError::config("site.page_path must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// A credential whose `Debug` output never shows the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

// ---------------------------------------------------------------------------
// Run configuration (environment + settings)
// ---------------------------------------------------------------------------

/// Raw environment values for one run, before validation.
///
/// The CLI fills this through clap's `env` support so the same values can
/// also be passed as flags.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    pub repo_owner: Option<String>,
    pub repo_name: Option<String>,
    pub github_token: Option<String>,
    pub issue_number: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl EnvVars {
    /// Read all variables from the process environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            repo_owner: var(ENV_REPO_OWNER),
            repo_name: var(ENV_REPO_NAME),
            github_token: var(ENV_GITHUB_TOKEN),
            issue_number: var(ENV_ISSUE_NUMBER),
            gemini_api_key: var(ENV_GEMINI_API_KEY),
        }
    }

    /// Only the repository identity, for modes that never talk to an API.
    pub fn repo(&self) -> Result<RepoRef> {
        Ok(RepoRef::new(
            required(ENV_REPO_OWNER, &self.repo_owner)?,
            required(ENV_REPO_NAME, &self.repo_name)?,
        ))
    }

    /// Validate every variable and combine them with `settings`.
    pub fn resolve(&self, settings: Settings) -> Result<EditorConfig> {
        settings.validate()?;

        let repo = self.repo()?;
        let github_token = Secret::new(required(ENV_GITHUB_TOKEN, &self.github_token)?);
        let raw_issue = required(ENV_ISSUE_NUMBER, &self.issue_number)?;
        let issue_number = raw_issue.parse::<u64>().map_err(|_| {
            PromptPageError::config(format!(
                "{ENV_ISSUE_NUMBER} must be a positive integer, got '{raw_issue}'"
            ))
        })?;
        let gemini_api_key = Secret::new(required(ENV_GEMINI_API_KEY, &self.gemini_api_key)?);

        Ok(EditorConfig {
            repo,
            issue_number,
            github_token,
            gemini_api_key,
            settings,
        })
    }
}

fn required(name: &str, value: &Option<String>) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(PromptPageError::config(format!(
            "{name} environment variable is not set"
        ))),
    }
}

/// Everything one run needs, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub repo: RepoRef,
    pub issue_number: u64,
    pub github_token: Secret,
    pub gemini_api_key: Secret,
    pub settings: Settings,
}

// ---------------------------------------------------------------------------
// Settings loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.promptpage/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PromptPageError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the settings file (`~/.promptpage/promptpage.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load settings from `explicit` if given, else from the default location,
/// else defaults. An explicit path that does not exist is an error.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return load_settings_from(path);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "settings file not found, using defaults");
        return Ok(Settings::default());
    }

    load_settings_from(&path)
}

/// Load settings from a specific file path.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| PromptPageError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PromptPageError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default settings file.
/// Returns the path to the created file.
pub fn init_settings() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PromptPageError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&Settings::default())
        .map_err(|e| PromptPageError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PromptPageError::io(&path, e))?;
    tracing::info!(?path, "created default settings file");

    Ok(path)
}
