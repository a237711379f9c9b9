//! Request and response bodies for the GitHub endpoints promptpage calls.
//!
//! Only the fields we read are modelled; GitHub sends many more.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct IssueResponse {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentResponse {
    /// Base64, wrapped at 60 columns with `\n`.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PutContentRequest<'a> {
    pub message: &'a str,
    pub content: String,
    pub sha: &'a str,
    pub branch: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PutContentResponse {
    #[serde(default)]
    pub commit: Option<CommitInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitInfo {
    pub sha: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommentRequest<'a> {
    pub body: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct IssueStateRequest {
    pub state: &'static str,
}
