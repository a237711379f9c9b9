//! Shared types, error model, and configuration for promptpage.
//!
//! This crate is the foundation depended on by all other promptpage crates.
//! It provides:
//! - [`PromptPageError`]: the unified error type
//! - Domain types ([`RepoRef`], [`Issue`], [`RemoteFile`], [`VersionToken`], [`CommitRef`])
//! - Configuration ([`Settings`], [`EnvVars`], [`EditorConfig`], settings loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    EditorConfig, EnvVars, GeminiConfig, GitHubConfig, Secret, Settings, SiteConfig, config_dir,
    config_file_path, init_settings, load_settings, load_settings_from,
};
pub use error::{PromptPageError, Result, error_chain};
pub use types::{CommitRef, Issue, RemoteFile, RepoRef, VersionToken};
