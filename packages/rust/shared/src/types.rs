//! Core domain types shared by the collaborators and the pipeline.

// ---------------------------------------------------------------------------
// RepoRef
// ---------------------------------------------------------------------------

/// The `owner/name` pair identifying the repository that hosts the site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    /// Account or organization that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Endpoint the request form submits to (GitHub's "new issue" page).
    pub fn new_issue_url(&self) -> String {
        format!("https://github.com/{}/{}/issues/new", self.owner, self.name)
    }

    /// Browser URL of a commit in this repository.
    pub fn commit_url(&self, sha: &str) -> String {
        format!("https://github.com/{}/{}/commit/{sha}", self.owner, self.name)
    }

    /// GitHub Pages URL where the site is published.
    pub fn site_url(&self) -> String {
        format!("https://{}.github.io/{}/", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// A change request as filed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    /// Free-text instructions, passed to the model verbatim.
    pub body: String,
}

// ---------------------------------------------------------------------------
// Remote file + version token
// ---------------------------------------------------------------------------

/// Opaque optimistic-concurrency token for a stored file (the blob SHA).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(pub String);

impl VersionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decoded file fetched from the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
    pub version: VersionToken,
}

/// The commit produced by publishing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    pub sha: String,
    /// Browser URL of the commit.
    pub url: String,
}
