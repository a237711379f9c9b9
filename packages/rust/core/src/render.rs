//! The network-free stages of a run: preparing the page for the model and
//! turning the model's reply into the page that gets published.

use tracing::{info, warn};

use promptpage_markup::{
    Document, Fragment, FragmentOrigin, GraftStrategy, extract_fragment, extract_html,
    reinsert_fragment,
};
use promptpage_shared::RepoRef;

use crate::prompt::build_prompt;

/// A page with its request form cut out.
#[derive(Debug, Clone)]
pub struct PreparedPage {
    pub fragment: Fragment,
    pub origin: FragmentOrigin,
    /// Serialized page without the fragment; this is what the model sees.
    pub stripped_html: String,
}

impl PreparedPage {
    pub fn prompt(&self, instructions: &str) -> String {
        build_prompt(&self.stripped_html, instructions)
    }
}

/// The final page and how it was assembled.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub strategy: GraftStrategy,
    /// The model reply held no recognizable HTML and was used as-is.
    pub used_raw_response: bool,
}

/// Parse `page` and detach (or synthesize) its request form.
pub fn prepare_page(page: &str, repo: &RepoRef, request_label: &str) -> PreparedPage {
    let extraction = extract_fragment(Document::parse(page), repo, request_label);
    info!(origin = %extraction.origin, "isolated request form");

    PreparedPage {
        stripped_html: extraction.document.to_html(),
        fragment: extraction.fragment,
        origin: extraction.origin,
    }
}

/// Locate the HTML in `response` and graft `fragment` back into it.
///
/// A reply without recognizable HTML is used verbatim, so this never fails;
/// the re-inserter keeps whatever page content it can recover from it.
pub fn render_response(fragment: &Fragment, response: &str) -> RenderedPage {
    let (candidate, used_raw_response) = match extract_html(response) {
        Ok(html) => (html, false),
        Err(e) => {
            warn!(error = %e, "HTML extraction failed, using raw model response");
            (response.to_string(), true)
        }
    };

    let grafted = reinsert_fragment(fragment, &candidate);
    info!(strategy = %grafted.strategy, bytes = candidate.len(), "request form re-inserted");

    RenderedPage {
        html: grafted.to_html(),
        strategy: grafted.strategy,
        used_raw_response,
    }
}
