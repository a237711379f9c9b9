//! Fragment re-insertion into model output.

use tracing::{debug, warn};

use crate::fragment::Fragment;
use crate::tree::{Document, Element, NodeId};

/// Top-level elements kept when the candidate has neither `html` nor `body`.
const RECOVERED_TAGS: &[&str] = &[
    "div", "section", "p", "h1", "h2", "h3", "h4", "h5", "h6", "script", "style",
];

/// Which case of [`reinsert_fragment`] applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraftStrategy {
    /// The candidate had a `body`; the fragment became its first child.
    ExistingBody,
    /// The candidate had `html` but no `body`; a body holding the fragment was appended.
    CreatedBody,
    /// The candidate had neither; a fresh skeleton was built around recovered content.
    Skeleton,
}

impl GraftStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExistingBody => "existing_body",
            Self::CreatedBody => "created_body",
            Self::Skeleton => "skeleton",
        }
    }
}

impl std::fmt::Display for GraftStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Grafted {
    pub document: Document,
    pub strategy: GraftStrategy,
}

impl Grafted {
    pub fn to_html(&self) -> String {
        self.document.to_html()
    }
}

/// Parse `candidate` and place `fragment` at its canonical position.
///
/// The output always has an `html`/`body` structure and holds the fragment
/// exactly once. Never fails.
pub fn reinsert_fragment(fragment: &Fragment, candidate: &str) -> Grafted {
    let mut document = Document::parse(candidate);

    if let Some(body) = document.find_first("body") {
        let copy = fragment.import_into(&mut document);
        document.insert_child(body, 0, copy);
        return finish(document, GraftStrategy::ExistingBody);
    }

    if let Some(html) = document.find_first("html") {
        let body = document.create_element(Element::new("body"));
        let copy = fragment.import_into(&mut document);
        document.append_child(body, copy);
        document.append_child(html, body);
        return finish(document, GraftStrategy::CreatedBody);
    }

    let (mut skeleton, body) = skeleton();
    let copy = fragment.import_into(&mut skeleton);
    skeleton.append_child(body, copy);

    let mut dropped = 0usize;
    for &top in document.children(document.root()) {
        if is_recovered(&document, top) {
            let kept = skeleton.import_subtree(&document, top);
            skeleton.append_child(body, kept);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        warn!(dropped, "discarded top-level nodes outside html/body");
    }

    finish(skeleton, GraftStrategy::Skeleton)
}

fn finish(document: Document, strategy: GraftStrategy) -> Grafted {
    debug!(%strategy, "fragment re-inserted");
    Grafted { document, strategy }
}

fn skeleton() -> (Document, NodeId) {
    let mut doc = Document::new();
    let html = doc.create_element(Element::new("html"));
    let body = doc.create_element(Element::new("body"));
    let root = doc.root();
    doc.append_child(root, html);
    doc.append_child(html, body);
    (doc, body)
}

fn is_recovered(doc: &Document, id: NodeId) -> bool {
    doc.element(id)
        .is_some_and(|el| RECOVERED_TAGS.contains(&el.name.as_str()))
}
