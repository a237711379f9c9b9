//! Core pipeline orchestration for promptpage.
//!
//! This crate ties the markup surgery to the GitHub and Gemini collaborators
//! and drives one change request end to end (see [`pipeline::handle_issue`]).

pub mod collaborators;
pub mod comments;
pub mod pipeline;
pub mod prompt;
pub mod render;

pub use collaborators::{DocumentStore, Generator, IssueSource, NotificationSink};
pub use pipeline::{
    ProgressReporter, RunOptions, RunOutcome, Services, SilentProgress, commit_message,
    handle_issue, process_issue, report_failure,
};
pub use prompt::build_prompt;
pub use render::{PreparedPage, RenderedPage, prepare_page, render_response};
