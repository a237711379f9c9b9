//! GitHub REST v3 client for promptpage.
//!
//! One [`GitHubClient`] covers the three GitHub-backed roles of a run: it
//! reads the request issue, reads and commits the page through the contents
//! API, and comments on and closes the issue afterwards.

mod client;
mod models;

pub use client::GitHubClient;
