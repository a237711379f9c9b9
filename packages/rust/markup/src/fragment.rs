//! Request-form fragment: detection, detachment and synthesis.
//!
//! The form that lets visitors file change requests must survive every
//! rewrite of the page, so it is cut out before the page is sent to the
//! model and grafted back afterwards (see [`crate::graft`]).

use tracing::debug;

use promptpage_shared::RepoRef;

use crate::tree::{Document, Element, NodeId};

/// Which rule produced the fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOrigin {
    /// A `<form>` element found in the page.
    FormElement,
    /// The nearest container of a text input and a button.
    InputGroup,
    /// No form in the page; a default one was built.
    Synthesized,
}

impl FragmentOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FormElement => "form_element",
            Self::InputGroup => "input_group",
            Self::Synthesized => "synthesized",
        }
    }
}

impl std::fmt::Display for FragmentOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A self-contained subtree with a single root element.
///
/// It owns its own arena, so nothing in it refers back to the page it came from.
#[derive(Debug, Clone)]
pub struct Fragment {
    doc: Document,
    top: NodeId,
}

impl Fragment {
    /// Copy the subtree at `id` out of `src`.
    fn copy_of(src: &Document, id: NodeId) -> Self {
        let mut doc = Document::new();
        let top = doc.import_subtree(src, id);
        let root = doc.root();
        doc.append_child(root, top);
        Self { doc, top }
    }

    /// Serialized markup of the fragment.
    pub fn html(&self) -> String {
        self.doc.outer_html(self.top)
    }

    /// The fragment's root element.
    pub fn element(&self) -> Option<&Element> {
        self.doc.element(self.top)
    }

    /// Copy the fragment into `target`, returning the detached copy.
    pub fn import_into(&self, target: &mut Document) -> NodeId {
        target.import_subtree(&self.doc, self.top)
    }
}

/// Result of [`extract_fragment`].
#[derive(Debug, Clone)]
pub struct Extraction {
    pub fragment: Fragment,
    /// The page without the fragment.
    pub document: Document,
    pub origin: FragmentOrigin,
}

/// Detach the request form from `document`, or synthesize a default one.
///
/// Rules, in order: the first `<form>`; the nearest container of a text
/// input and a button, whichever element that is; a default form that posts
/// to the repository's new-issue page. Always succeeds.
pub fn extract_fragment(mut document: Document, repo: &RepoRef, request_label: &str) -> Extraction {
    let found = document
        .find_first("form")
        .map(|id| (id, FragmentOrigin::FormElement))
        .or_else(|| input_group(&document).map(|id| (id, FragmentOrigin::InputGroup)));

    match found {
        Some((id, origin)) => {
            let fragment = Fragment::copy_of(&document, id);
            document.detach(id);
            debug!(%origin, bytes = fragment.html().len(), "detached fragment from page");
            Extraction {
                fragment,
                document,
                origin,
            }
        }
        None => {
            debug!(%repo, "no form in page, synthesizing default fragment");
            Extraction {
                fragment: default_fragment(repo, request_label),
                document,
                origin: FragmentOrigin::Synthesized,
            }
        }
    }
}

/// Lowest common ancestor of the first text input that shares a container
/// with a button. Only elements qualify, so the document root never does.
fn input_group(doc: &Document) -> Option<NodeId> {
    for input in doc.find_all(&["input"]) {
        let Some(el) = doc.element(input) else {
            continue;
        };
        if !is_text_input(el) {
            continue;
        }

        for ancestor in doc.ancestors(input) {
            if doc.element(ancestor).is_none() {
                break;
            }
            if doc.contains_tag(ancestor, "button") {
                return Some(ancestor);
            }
        }
    }
    None
}

fn is_text_input(el: &Element) -> bool {
    el.attr("type")
        .is_none_or(|t| t.trim().eq_ignore_ascii_case("text"))
}

/// The form inserted into pages that do not have one yet.
pub fn default_fragment(repo: &RepoRef, request_label: &str) -> Fragment {
    let mut doc = Document::new();

    let container = doc.create_element(
        Element::new("div")
            .with_attr("id", "prompt-form")
            .with_attr(
                "style",
                "margin: 20px 0; padding: 15px; background-color: #f8f9fa; border-radius: 5px;",
            ),
    );
    let root = doc.root();
    doc.append_child(root, container);

    let heading = append_element(&mut doc, container, Element::new("h3"));
    append_text(&mut doc, heading, "Modify this webpage");

    let form = append_element(
        &mut doc,
        container,
        Element::new("form")
            .with_attr("action", &repo.new_issue_url())
            .with_attr("method", "get")
            .with_attr("target", "_blank"),
    );
    append_element(
        &mut doc,
        form,
        Element::new("input")
            .with_attr("type", "hidden")
            .with_attr("name", "labels")
            .with_attr("value", request_label),
    );
    append_element(
        &mut doc,
        form,
        Element::new("input")
            .with_attr("type", "text")
            .with_attr("name", "body")
            .with_attr("placeholder", "Enter your instructions...")
            .with_attr("style", "width: 70%; padding: 8px; margin-right: 10px;"),
    );
    let button = append_element(
        &mut doc,
        form,
        Element::new("button").with_attr("type", "submit").with_attr(
            "style",
            "padding: 8px 15px; background-color: #0366d6; color: white; border: none; border-radius: 3px; cursor: pointer;",
        ),
    );
    append_text(&mut doc, button, "Submit");

    let note = append_element(&mut doc, container, Element::new("p"));
    let small = append_element(&mut doc, note, Element::new("small"));
    append_text(&mut doc, small, "Your request will be processed through GitHub Issues");

    Fragment {
        doc,
        top: container,
    }
}

fn append_element(doc: &mut Document, parent: NodeId, element: Element) -> NodeId {
    let id = doc.create_element(element);
    doc.append_child(parent, id);
    id
}

fn append_text(doc: &mut Document, parent: NodeId, text: &str) {
    let id = doc.create_text(text);
    doc.append_child(parent, id);
}
