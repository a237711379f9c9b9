//! HTTP client for the GitHub REST API v3.
//!
//! Every failure (transport, non-success status, undecodable body or a
//! missing field) maps to [`PromptPageError::GitHub`]. Nothing is retried,
//! and requests only time out when `github.timeout_secs` is set.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use promptpage_shared::{
    CommitRef, EditorConfig, Issue, PromptPageError, RemoteFile, RepoRef, Result, Secret,
    VersionToken, error_chain,
};

use crate::models::{
    CommentRequest, ContentResponse, IssueResponse, IssueStateRequest, PutContentRequest,
    PutContentResponse,
};

/// User-Agent header (GitHub rejects requests without one).
const USER_AGENT: &str = concat!("promptpage/", env!("CARGO_PKG_VERSION"));

const ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_base: String,
    repo: RepoRef,
    branch: String,
    token: Secret,
}

impl GitHubClient {
    /// Build a client for the repository and branch in `config`.
    pub fn new(config: &EditorConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = config.settings.github.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| {
            PromptPageError::GitHub(format!("failed to build HTTP client: {}", error_chain(&e)))
        })?;

        Ok(Self {
            http,
            api_base: config.settings.github.api_base.trim_end_matches('/').to_string(),
            repo: config.repo.clone(),
            branch: config.settings.site.branch.clone(),
            token: config.github_token.clone(),
        })
    }

    fn repo_url(&self, rest: &str) -> String {
        format!(
            "{}/repos/{}/{}/{rest}",
            self.api_base, self.repo.owner, self.repo.name
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(self.token.expose())
            .header(reqwest::header::ACCEPT, ACCEPT)
    }

    /// Fetch an issue. An issue without a body carries no instructions and is an error.
    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn get_issue(&self, number: u64) -> Result<Issue> {
        let url = self.repo_url(&format!("issues/{number}"));
        let resp = send(self.request(Method::GET, &url), "get issue").await?;
        let issue: IssueResponse = read_json(resp, "get issue").await?;

        let body = issue
            .body
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| PromptPageError::GitHub(format!("issue #{number} has no body")))?;

        debug!(title = %issue.title, bytes = body.len(), "fetched issue");
        Ok(Issue {
            number,
            title: issue.title,
            body,
        })
    }

    /// Fetch and decode a file from the configured branch.
    #[instrument(skip(self), fields(repo = %self.repo, branch = %self.branch))]
    pub async fn get_file(&self, path: &str) -> Result<RemoteFile> {
        let url = self.repo_url(&format!("contents/{path}"));
        let req = self
            .request(Method::GET, &url)
            .query(&[("ref", self.branch.as_str())]);
        let resp = send(req, "get file").await?;
        let file: ContentResponse = read_json(resp, "get file").await?;

        let encoded = file
            .content
            .ok_or_else(|| PromptPageError::GitHub(format!("{path}: response has no content")))?;
        let sha = file
            .sha
            .ok_or_else(|| PromptPageError::GitHub(format!("{path}: response has no sha")))?;

        let content = decode_content(&encoded)
            .map_err(|e| PromptPageError::GitHub(format!("{path}: {e}")))?;

        debug!(bytes = content.len(), %sha, "fetched file");
        Ok(RemoteFile {
            path: path.to_string(),
            content,
            version: VersionToken(sha),
        })
    }

    /// Commit new contents for `path`. A stale `version` yields HTTP 409.
    #[instrument(skip(self, content), fields(repo = %self.repo, bytes = content.len()))]
    pub async fn put_file(
        &self,
        path: &str,
        content: &str,
        version: &VersionToken,
        message: &str,
    ) -> Result<CommitRef> {
        let url = self.repo_url(&format!("contents/{path}"));
        let body = PutContentRequest {
            message,
            content: B64.encode(content.as_bytes()),
            sha: version.as_str(),
            branch: &self.branch,
        };

        let resp = self
            .request(Method::PUT, &url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PromptPageError::GitHub(format!("update file: {}", error_chain(&e))))?;
        if resp.status() == StatusCode::CONFLICT {
            return Err(PromptPageError::GitHub(format!(
                "{path} changed since it was read (version {version} is stale)"
            )));
        }
        let resp = check_status(resp, "update file").await?;
        let updated: PutContentResponse = read_json(resp, "update file").await?;

        let sha = updated
            .commit
            .map(|c| c.sha)
            .ok_or_else(|| PromptPageError::GitHub("update file: response has no commit".into()))?;

        info!(%sha, "committed file");
        Ok(CommitRef {
            url: self.repo.commit_url(&sha),
            sha,
        })
    }

    #[instrument(skip(self, body), fields(repo = %self.repo))]
    pub async fn post_comment(&self, number: u64, body: &str) -> Result<()> {
        let url = self.repo_url(&format!("issues/{number}/comments"));
        let req = self
            .request(Method::POST, &url)
            .json(&CommentRequest { body });
        send(req, "post comment").await?;
        debug!("comment posted");
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn close_issue(&self, number: u64) -> Result<()> {
        let url = self.repo_url(&format!("issues/{number}"));
        let req = self
            .request(Method::PATCH, &url)
            .json(&IssueStateRequest { state: "closed" });
        send(req, "close issue").await?;
        debug!("issue closed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn send(req: RequestBuilder, what: &str) -> Result<Response> {
    let resp = req
        .send()
        .await
        .map_err(|e| PromptPageError::GitHub(format!("{what}: {}", error_chain(&e))))?;
    check_status(resp, what).await
}

async fn check_status(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(PromptPageError::GitHub(format!(
        "{what} returned {status}: {}",
        body.trim()
    )))
}

async fn read_json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    let text = resp
        .text()
        .await
        .map_err(|e| {
            PromptPageError::GitHub(format!("{what}: failed to read body: {}", error_chain(&e)))
        })?;
    serde_json::from_str(&text)
        .map_err(|e| PromptPageError::GitHub(format!("{what}: unexpected response: {e}")))
}

/// Decode the contents API's line-wrapped base64 into UTF-8 text.
fn decode_content(encoded: &str) -> std::result::Result<String, String> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = B64
        .decode(compact)
        .map_err(|e| format!("invalid base64 content: {e}"))?;
    String::from_utf8(bytes).map_err(|e| format!("content is not UTF-8: {e}"))
}

#[cfg(test)]
mod tests {
    use promptpage_shared::{EnvVars, Settings};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config_for(server: &MockServer) -> EditorConfig {
        config_with(server.uri(), None)
    }

    fn config_with(api_base: String, timeout_secs: Option<u64>) -> EditorConfig {
        let mut settings = Settings::default();
        settings.github.api_base = api_base;
        settings.github.timeout_secs = timeout_secs;
        EnvVars {
            repo_owner: Some("octo".into()),
            repo_name: Some("site".into()),
            github_token: Some("ghp_test".into()),
            issue_number: Some("7".into()),
            gemini_api_key: Some("unused".into()),
        }
        .resolve(settings)
        .expect("config")
    }

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(&config_for(server)).expect("client")
    }

    #[test]
    fn decode_content_handles_wrapped_base64() {
        let encoded = B64.encode("<html><body><p>Hello, wrapped world!</p></body></html>");
        let (a, b) = encoded.split_at(20);
        let wrapped = format!("{a}\n{b}\n");
        assert_eq!(
            decode_content(&wrapped).expect("decode"),
            "<html><body><p>Hello, wrapped world!</p></body></html>"
        );
        assert!(decode_content("!!!").is_err());
    }

    #[tokio::test]
    async fn get_issue_sends_auth_and_reads_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/site/issues/7"))
            .and(header("authorization", "Bearer ghp_test"))
            .and(header("accept", ACCEPT))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "number": 7,
                "title": "Blue please",
                "body": "make the background blue"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let issue = client(&server).get_issue(7).await.expect("issue");
        assert_eq!(issue.number, 7);
        assert_eq!(issue.title, "Blue please");
        assert_eq!(issue.body, "make the background blue");
    }

    #[tokio::test]
    async fn issue_without_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/site/issues/7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"title": "empty", "body": null})),
            )
            .mount(&server)
            .await;

        let err = client(&server).get_issue(7).await.unwrap_err();
        assert!(matches!(err, PromptPageError::GitHub(_)));
        assert!(err.to_string().contains("has no body"));
    }

    #[tokio::test]
    async fn get_file_decodes_content_from_branch() {
        let server = MockServer::start().await;
        let encoded = B64.encode("<html><body>hi</body></html>");
        Mock::given(method("GET"))
            .and(path("/repos/octo/site/contents/index.html"))
            .and(query_param("ref", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": format!("{encoded}\n"),
                "encoding": "base64",
                "sha": "blob123"
            })))
            .mount(&server)
            .await;

        let file = client(&server).get_file("index.html").await.expect("file");
        assert_eq!(file.content, "<html><body>hi</body></html>");
        assert_eq!(file.version, VersionToken("blob123".into()));
        assert_eq!(file.path, "index.html");
    }

    #[tokio::test]
    async fn get_file_missing_is_github_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/site/contents/index.html"))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#))
            .mount(&server)
            .await;

        let err = client(&server).get_file("index.html").await.unwrap_err();
        assert!(matches!(err, PromptPageError::GitHub(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn put_file_sends_version_and_returns_commit() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/octo/site/contents/index.html"))
            .and(body_json(serde_json::json!({
                "message": "Update index.html based on issue #7",
                "content": B64.encode("<p>new</p>"),
                "sha": "blob123",
                "branch": "main"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": {"sha": "blob456"},
                "commit": {"sha": "c0ffee"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let commit = client(&server)
            .put_file(
                "index.html",
                "<p>new</p>",
                &VersionToken("blob123".into()),
                "Update index.html based on issue #7",
            )
            .await
            .expect("commit");
        assert_eq!(commit.sha, "c0ffee");
        assert_eq!(commit.url, "https://github.com/octo/site/commit/c0ffee");
    }

    #[tokio::test]
    async fn stale_version_is_reported_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/octo/site/contents/index.html"))
            .respond_with(ResponseTemplate::new(409))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .put_file("index.html", "x", &VersionToken("old".into()), "m")
            .await
            .unwrap_err();
        assert!(err.is_reportable());
        assert!(err.to_string().contains("stale"));
    }

    #[tokio::test]
    async fn comment_and_close() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/site/issues/7/comments"))
            .and(body_json(serde_json::json!({"body": "done"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/octo/site/issues/7"))
            .and(body_json(serde_json::json!({"state": "closed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"number": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        client.post_comment(7, "done").await.expect("comment");
        client.close_issue(7).await.expect("close");
    }

    #[tokio::test]
    async fn unauthorized_is_github_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let err = client(&server).post_comment(7, "x").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "GitHub API request failed: post comment returned 401 Unauthorized: Bad credentials"
        );
    }

    #[tokio::test]
    async fn slow_response_is_awaited_without_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/site/issues/7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"title": "t", "body": "b"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let issue = client(&server).get_issue(7).await.expect("issue");
        assert_eq!(issue.body, "b");
    }

    #[tokio::test]
    async fn configured_timeout_is_reported_with_its_cause() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&config_with(server.uri(), Some(1))).expect("client");
        let err = client.post_comment(7, "x").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("GitHub API request failed: post comment: "), "{msg}");
        assert!(msg.contains("timed out"), "{msg}");
    }
}
