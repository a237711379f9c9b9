//! Issue comments posted at the end of a run.

use promptpage_shared::{CommitRef, RepoRef};

/// Comment posted after a successful publish.
pub fn success_comment(
    repo: &RepoRef,
    commit: &CommitRef,
    page_title: Option<&str>,
    request_label: &str,
) -> String {
    let title_line = page_title
        .map(|t| format!("Page: **{t}**\n\n"))
        .unwrap_or_default();

    format!(
        "## Website Updated! 🎉

Your changes have been applied to the website based on your instructions.

### 🔗 Links
- [View Commit]({commit_url})
- [View Website]({site_url})

{title_line}If you need further adjustments, please create a new issue with the '{request_label}' label.
",
        commit_url = commit.url,
        site_url = repo.site_url(),
    )
}

/// Comment posted when a run fails with a reportable error.
pub fn failure_comment(message: &str) -> String {
    format!(
        "## ❌ Error Updating Website

Sorry, an error occurred while processing your request:

```
{message}
```

Please check your instructions and try again. If the problem persists, contact the repository maintainer.
"
    )
}
