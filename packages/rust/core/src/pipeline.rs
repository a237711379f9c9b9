//! End-to-end run: issue → page → prompt → model → re-graft → commit → comment.

use std::time::{Duration, Instant};

use tracing::{error, info, instrument};

use promptpage_markup::{FragmentOrigin, GraftStrategy, page_title};
use promptpage_shared::{CommitRef, EditorConfig, PromptPageError, Result};

use crate::collaborators::{DocumentStore, Generator, IssueSource, NotificationSink};
use crate::comments::{failure_comment, success_comment};
use crate::render::{prepare_page, render_response};

/// The services a run talks to, borrowed for its duration.
pub struct Services<'a, I, D, G, N> {
    pub issues: &'a I,
    pub store: &'a D,
    pub generator: &'a G,
    pub sink: &'a N,
}

/// Options for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after rendering: no commit, no comment, issue left open.
    pub dry_run: bool,
}

/// What a run did.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub issue: u64,
    pub origin: FragmentOrigin,
    pub strategy: GraftStrategy,
    /// The rendered page, byte-for-byte what was (or would be) committed.
    pub html: String,
    /// `None` for a dry run.
    pub commit: Option<CommitRef>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the run completes.
    fn done(&self, outcome: &RunOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _outcome: &RunOutcome) {}
}

/// Commit message for an update driven by issue `number`.
pub fn commit_message(path: &str, number: u64) -> String {
    format!("Update {path} based on issue #{number}")
}

/// Process the configured issue and, on a reportable failure, tell the
/// requester what went wrong before returning the error.
pub async fn handle_issue<I, D, G, N>(
    config: &EditorConfig,
    services: &Services<'_, I, D, G, N>,
    options: RunOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunOutcome>
where
    I: IssueSource,
    D: DocumentStore,
    G: Generator,
    N: NotificationSink,
{
    match process_issue(config, services, options, progress).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            if e.is_reportable() && !options.dry_run {
                report_failure(&e, services.sink, config.issue_number).await;
            }
            Err(e)
        }
    }
}

/// Run every stage for the configured issue.
///
/// 1. Read the issue and the page
/// 2. Detach the request form and build the prompt
/// 3. Ask the model for a new page
/// 4. Graft the form back in
/// 5. Commit, comment and close (skipped for a dry run)
#[instrument(skip_all, fields(issue = config.issue_number, repo = %config.repo))]
pub async fn process_issue<I, D, G, N>(
    config: &EditorConfig,
    services: &Services<'_, I, D, G, N>,
    options: RunOptions,
    progress: &dyn ProgressReporter,
) -> Result<RunOutcome>
where
    I: IssueSource,
    D: DocumentStore,
    G: Generator,
    N: NotificationSink,
{
    let start = Instant::now();
    let site = &config.settings.site;
    let number = config.issue_number;

    progress.phase("Fetching issue");
    let issue = services.issues.get_issue(number).await?;
    info!(title = %issue.title, "processing issue");

    progress.phase("Fetching page");
    let file = services.store.get_file(&site.page_path).await?;
    info!(path = %file.path, bytes = file.content.len(), "retrieved page");

    let prepared = prepare_page(&file.content, &config.repo, &site.request_label);
    let prompt = prepared.prompt(&issue.body);

    progress.phase("Generating page");
    let response = services.generator.complete(&prompt).await?;
    info!(bytes = response.len(), "received model response");

    let rendered = render_response(&prepared.fragment, &response);

    let mut outcome = RunOutcome {
        issue: number,
        origin: prepared.origin,
        strategy: rendered.strategy,
        html: rendered.html,
        commit: None,
        elapsed: Duration::ZERO,
    };

    if options.dry_run {
        info!("dry run, nothing published");
        outcome.elapsed = start.elapsed();
        progress.done(&outcome);
        return Ok(outcome);
    }

    progress.phase("Publishing");
    let commit = services
        .store
        .put_file(
            &file.path,
            &outcome.html,
            &file.version,
            &commit_message(&file.path, number),
        )
        .await?;
    info!(sha = %commit.sha, "committed page");

    let title = page_title(&outcome.html);
    let comment = success_comment(&config.repo, &commit, title.as_deref(), &site.request_label);
    services.sink.post_comment(number, &comment).await?;
    services.sink.close_issue(number).await?;
    info!("commented on and closed issue");

    outcome.commit = Some(commit);
    outcome.elapsed = start.elapsed();
    progress.done(&outcome);
    Ok(outcome)
}

/// Post the failure comment for `err`. A failure to post is only logged.
pub async fn report_failure<N: NotificationSink>(err: &PromptPageError, sink: &N, number: u64) {
    error!(error = %err, "failed to update website");
    if let Err(comment_err) = sink.post_comment(number, &failure_comment(&err.to_string())).await {
        error!(error = %comment_err, "failed to add error comment");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use promptpage_shared::{EnvVars, Issue, RemoteFile, Settings, VersionToken};

    use super::*;

    const FORM: &str = r#"<form id="prompt-form"><input type="text" name="body"><button>Go</button></form>"#;

    fn config() -> EditorConfig {
        EnvVars {
            repo_owner: Some("octo".into()),
            repo_name: Some("site".into()),
            github_token: Some("t".into()),
            issue_number: Some("12".into()),
            gemini_api_key: Some("k".into()),
        }
        .resolve(Settings::default())
        .expect("config")
    }

    // -----------------------------------------------------------------------
    // Fakes
    // -----------------------------------------------------------------------

    struct FakeGitHub {
        issue_body: Option<String>,
        page: String,
        conflict: bool,
        comment_fails: bool,
        commits: Mutex<Vec<(String, String, String, String)>>,
        comments: Mutex<Vec<(u64, String)>>,
        closed: Mutex<Vec<u64>>,
    }

    impl FakeGitHub {
        fn new(page: &str) -> Self {
            Self {
                issue_body: Some("make the background blue".into()),
                page: page.into(),
                conflict: false,
                comment_fails: false,
                commits: Mutex::new(Vec::new()),
                comments: Mutex::new(Vec::new()),
                closed: Mutex::new(Vec::new()),
            }
        }
    }

    impl IssueSource for FakeGitHub {
        async fn get_issue(&self, number: u64) -> Result<Issue> {
            let body = self
                .issue_body
                .clone()
                .ok_or_else(|| PromptPageError::GitHub(format!("issue #{number} has no body")))?;
            Ok(Issue {
                number,
                title: "Blue".into(),
                body,
            })
        }
    }

    impl DocumentStore for FakeGitHub {
        async fn get_file(&self, path: &str) -> Result<RemoteFile> {
            Ok(RemoteFile {
                path: path.into(),
                content: self.page.clone(),
                version: VersionToken("v1".into()),
            })
        }

        async fn put_file(
            &self,
            path: &str,
            content: &str,
            version: &VersionToken,
            message: &str,
        ) -> Result<CommitRef> {
            if self.conflict {
                return Err(PromptPageError::GitHub(format!(
                    "{path} changed since it was read (version {version} is stale)"
                )));
            }
            self.commits.lock().expect("lock").push((
                path.into(),
                content.into(),
                version.to_string(),
                message.into(),
            ));
            Ok(CommitRef {
                sha: "c0ffee".into(),
                url: "https://github.com/octo/site/commit/c0ffee".into(),
            })
        }
    }

    impl NotificationSink for FakeGitHub {
        async fn post_comment(&self, number: u64, body: &str) -> Result<()> {
            if self.comment_fails {
                return Err(PromptPageError::GitHub("post comment returned 500".into()));
            }
            self.comments.lock().expect("lock").push((number, body.into()));
            Ok(())
        }

        async fn close_issue(&self, number: u64) -> Result<()> {
            self.closed.lock().expect("lock").push(number);
            Ok(())
        }
    }

    struct FakeModel {
        reply: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeModel {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl Generator for FakeModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().expect("lock").push(prompt.into());
            self.reply.clone().map_err(PromptPageError::Generation)
        }
    }

    fn services<'a>(
        github: &'a FakeGitHub,
        model: &'a FakeModel,
    ) -> Services<'a, FakeGitHub, FakeGitHub, FakeModel, FakeGitHub> {
        Services {
            issues: github,
            store: github,
            generator: model,
            sink: github,
        }
    }

    // -----------------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn blue_background_end_to_end() {
        let github = FakeGitHub::new(&format!("<html><body>{FORM}</body></html>"));
        let model = FakeModel::replying("```html\n<html><body><p>blue</p></body></html>\n```");

        let outcome = handle_issue(
            &config(),
            &services(&github, &model),
            RunOptions::default(),
            &SilentProgress,
        )
        .await
        .expect("run");

        let expected = format!("<html><body>{FORM}<p>blue</p></body></html>");
        assert_eq!(outcome.html, expected);
        assert_eq!(outcome.origin, FragmentOrigin::FormElement);
        assert_eq!(outcome.commit.as_ref().map(|c| c.sha.as_str()), Some("c0ffee"));

        let prompts = model.prompts.lock().expect("lock");
        assert!(prompts[0].contains("INSTRUCTIONS: make the background blue"));
        assert!(!prompts[0].contains("prompt-form"));

        let commits = github.commits.lock().expect("lock");
        assert_eq!(
            commits.as_slice(),
            &[(
                "index.html".to_string(),
                expected,
                "v1".to_string(),
                "Update index.html based on issue #12".to_string()
            )]
        );

        let comments = github.comments.lock().expect("lock");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].0, 12);
        assert!(comments[0].1.contains("Website Updated!"));
        assert!(comments[0].1.contains("https://github.com/octo/site/commit/c0ffee"));
        assert_eq!(github.closed.lock().expect("lock").as_slice(), &[12]);
    }

    #[tokio::test]
    async fn page_without_form_gets_default_form() {
        let github = FakeGitHub::new("<html><head><title>Home</title></head><body><p>hi</p></body></html>");
        let model = FakeModel::replying(
            "<html><head><title>Home</title></head><body><p>hi, in blue</p></body></html>",
        );

        let outcome = handle_issue(
            &config(),
            &services(&github, &model),
            RunOptions::default(),
            &SilentProgress,
        )
        .await
        .expect("run");

        assert_eq!(outcome.origin, FragmentOrigin::Synthesized);
        assert!(outcome.html.contains(r#"<body><div id="prompt-form""#));
        assert!(outcome.html.contains("https://github.com/octo/site/issues/new"));
        let comments = github.comments.lock().expect("lock");
        assert!(comments[0].1.contains("Page: **Home**"));
    }

    #[tokio::test]
    async fn dry_run_publishes_nothing() {
        let github = FakeGitHub::new(&format!("<html><body>{FORM}</body></html>"));
        let model = FakeModel::replying("<body><p>draft</p></body>");

        let outcome = handle_issue(
            &config(),
            &services(&github, &model),
            RunOptions { dry_run: true },
            &SilentProgress,
        )
        .await
        .expect("run");

        assert!(outcome.commit.is_none());
        assert_eq!(outcome.html, format!("<body>{FORM}<p>draft</p></body>"));
        assert!(github.commits.lock().expect("lock").is_empty());
        assert!(github.comments.lock().expect("lock").is_empty());
        assert!(github.closed.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn generation_failure_is_reported_on_issue() {
        let github = FakeGitHub::new(&format!("<html><body>{FORM}</body></html>"));
        let model = FakeModel::failing("HTTP 503 Service Unavailable: overloaded");

        let err = handle_issue(
            &config(),
            &services(&github, &model),
            RunOptions::default(),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PromptPageError::Generation(_)));
        let comments = github.comments.lock().expect("lock");
        assert_eq!(comments.len(), 1);
        assert!(comments[0].1.contains("Error Updating Website"));
        assert!(comments[0].1.contains(
            "```\nGemini API request failed: HTTP 503 Service Unavailable: overloaded\n```"
        ));
        assert!(github.commits.lock().expect("lock").is_empty());
        assert!(github.closed.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn stale_version_is_reported_not_retried() {
        let mut github = FakeGitHub::new(&format!("<html><body>{FORM}</body></html>"));
        github.conflict = true;
        let model = FakeModel::replying("<body><p>x</p></body>");

        let err = handle_issue(
            &config(),
            &services(&github, &model),
            RunOptions::default(),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("stale"));
        assert_eq!(model.prompts.lock().expect("lock").len(), 1);
        let comments = github.comments.lock().expect("lock");
        assert_eq!(comments.len(), 1);
        assert!(comments[0].1.contains("stale"));
    }

    #[tokio::test]
    async fn missing_issue_body_stops_before_generation() {
        let mut github = FakeGitHub::new("<p>x</p>");
        github.issue_body = None;
        let model = FakeModel::replying("<p>never</p>");

        let err = handle_issue(
            &config(),
            &services(&github, &model),
            RunOptions::default(),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PromptPageError::GitHub(_)));
        assert!(model.prompts.lock().expect("lock").is_empty());
        assert_eq!(github.comments.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn failing_error_comment_keeps_original_error() {
        let mut github = FakeGitHub::new("<p>x</p>");
        github.comment_fails = true;
        let model = FakeModel::failing("boom");

        let err = handle_issue(
            &config(),
            &services(&github, &model),
            RunOptions::default(),
            &SilentProgress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PromptPageError::Generation(_)));
        assert_eq!(err.to_string(), "Gemini API request failed: boom");
    }

    #[test]
    fn commit_message_names_path_and_issue() {
        assert_eq!(
            commit_message("docs/index.html", 3),
            "Update docs/index.html based on issue #3"
        );
    }
}
