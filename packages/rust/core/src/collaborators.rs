//! The external services a run talks to.
//!
//! The pipeline only sees these traits. [`GitHubClient`] provides the first,
//! second and fourth; [`GeminiClient`] provides [`Generator`]. Tests swap in
//! in-memory fakes.

use std::future::Future;

use promptpage_gemini::GeminiClient;
use promptpage_github::GitHubClient;
use promptpage_shared::{CommitRef, Issue, RemoteFile, Result, VersionToken};

/// Where change requests come from.
pub trait IssueSource {
    fn get_issue(&self, number: u64) -> impl Future<Output = Result<Issue>> + Send;
}

/// Versioned storage for the page.
pub trait DocumentStore {
    fn get_file(&self, path: &str) -> impl Future<Output = Result<RemoteFile>> + Send;

    /// Replace `path`. Fails when `version` is no longer current.
    fn put_file(
        &self,
        path: &str,
        content: &str,
        version: &VersionToken,
        message: &str,
    ) -> impl Future<Output = Result<CommitRef>> + Send;
}

/// Text generation.
pub trait Generator {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Feedback to the requester.
pub trait NotificationSink {
    fn post_comment(&self, number: u64, body: &str) -> impl Future<Output = Result<()>> + Send;
    fn close_issue(&self, number: u64) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// Live implementations
// ---------------------------------------------------------------------------

impl IssueSource for GitHubClient {
    async fn get_issue(&self, number: u64) -> Result<Issue> {
        GitHubClient::get_issue(self, number).await
    }
}

impl DocumentStore for GitHubClient {
    async fn get_file(&self, path: &str) -> Result<RemoteFile> {
        GitHubClient::get_file(self, path).await
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        version: &VersionToken,
        message: &str,
    ) -> Result<CommitRef> {
        GitHubClient::put_file(self, path, content, version, message).await
    }
}

impl NotificationSink for GitHubClient {
    async fn post_comment(&self, number: u64, body: &str) -> Result<()> {
        GitHubClient::post_comment(self, number, body).await
    }

    async fn close_issue(&self, number: u64) -> Result<()> {
        GitHubClient::close_issue(self, number).await
    }
}

impl Generator for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        GeminiClient::complete(self, prompt).await
    }
}
