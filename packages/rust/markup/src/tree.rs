//! Index-addressed markup tree.
//!
//! A [`Document`] owns every node in a flat arena; nodes refer to their parent
//! and children by [`NodeId`]. Detaching a node only unlinks it, so ids stay
//! valid, and copying between documents goes through [`Document::import_subtree`].

use std::fmt;

/// Elements that never have children or a close tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Handle to a node inside one [`Document`]. Not meaningful across documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// How an attribute value was delimited in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
    Bare,
}

/// One attribute. `value` holds raw markup (entities are not decoded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
    pub quote: Quote,
}

impl Attribute {
    /// A double-quoted attribute built from plain text.
    pub fn new(name: impl Into<String>, value: &str) -> Self {
        Self {
            name: name.into(),
            value: Some(value.replace('&', "&amp;").replace('"', "&quot;")),
            quote: Quote::Double,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name, used for matching.
    pub name: String,
    pub attrs: Vec<Attribute>,
    /// Written as `<name/>` in the source.
    pub self_closing: bool,
    /// Start tag exactly as it appeared in the source. Written in place of
    /// `attrs` when present.
    pub start_tag: Option<String>,
    /// Explicit end tag from the source, written verbatim when present.
    pub end_tag: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            self_closing: false,
            start_tag: None,
            end_tag: None,
        }
    }

    /// Builder-style attribute append.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push(Attribute::new(name.to_ascii_lowercase(), value));
        self
    }

    /// Raw value of the first attribute called `name`; `Some("")` for a bare attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A container that serializes as its children only. The document root
    /// is always the node at index 0.
    Root,
    Element(Element),
    /// Raw text, reproduced verbatim.
    Text(String),
    /// Comment body without the `<!--`/`-->` delimiters.
    Comment(String),
    /// Doctype, CDATA or processing instruction, stored with its delimiters.
    Declaration(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An ordered tree of markup nodes.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse markup without inventing any structure. Never fails.
    pub fn parse(html: &str) -> Self {
        crate::parser::parse(html)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).any(|a| a == self.root())
    }

    /// Parents of `id`, nearest first, ending at the root (or at the top of a detached subtree).
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Nodes below `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.children(next).iter().rev().copied());
            Some(next)
        })
    }

    /// First attached element called `tag`, in document order.
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .find(|&id| self.element(id).is_some_and(|el| el.is(tag)))
    }

    /// Every attached element whose name is in `tags`, in document order.
    pub fn find_all(&self, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|&id| {
                self.element(id)
                    .is_some_and(|el| tags.contains(&el.name.as_str()))
            })
            .collect()
    }

    /// Whether any element below `id` is called `tag`.
    pub fn contains_tag(&self, id: NodeId, tag: &str) -> bool {
        self.descendants(id)
            .any(|d| self.element(d).is_some_and(|el| el.is(tag)))
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeKind::Element(element))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub(crate) fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.push(kind)
    }

    /// Append raw text to an existing text node.
    pub(crate) fn extend_text(&mut self, id: NodeId, more: &str) {
        if let NodeKind::Text(text) = &mut self.nodes[id.0].kind {
            text.push_str(more);
        }
    }

    /// Unlink `id` from its parent. The node and its subtree stay in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child);
    }

    /// Move `child` to position `index` (clamped) among `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if child == self.root() || child == parent || self.ancestors(parent).any(|a| a == child) {
            return;
        }
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Deep-copy the subtree at `src_id` of `src` into this arena.
    /// Returns the detached copy of `src_id`. Copying a root yields a
    /// container that serializes as its children only.
    pub fn import_subtree(&mut self, src: &Document, src_id: NodeId) -> NodeId {
        let top = self.push(src.kind(src_id).clone());

        let mut pending: Vec<(NodeId, NodeId)> = vec![(src_id, top)];
        while let Some((from, to)) = pending.pop() {
            for &child in src.children(from) {
                let copy = self.push(src.kind(child).clone());
                self.nodes[to.0].children.push(copy);
                self.nodes[copy.0].parent = Some(to);
                pending.push((child, copy));
            }
        }
        top
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Serialize the node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        self.outer_html(self.root())
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        enum Step {
            Open(NodeId),
            Close(NodeId),
        }

        let mut stack = vec![Step::Open(id)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Close(id) => {
                    if let Some(el) = self.element(id) {
                        match &el.end_tag {
                            Some(raw) => out.push_str(raw),
                            None => {
                                out.push_str("</");
                                out.push_str(&el.name);
                                out.push('>');
                            }
                        }
                    }
                }
                Step::Open(id) => {
                    let children = self.children(id);
                    match self.kind(id) {
                        NodeKind::Root => {}
                        NodeKind::Text(text) => out.push_str(text),
                        NodeKind::Comment(text) => {
                            out.push_str("<!--");
                            out.push_str(text);
                            out.push_str("-->");
                        }
                        NodeKind::Declaration(raw) => out.push_str(raw),
                        NodeKind::Element(el) => {
                            write_start_tag(el, children.is_empty(), out);
                            if (el.is_void() || el.self_closing) && children.is_empty() {
                                continue;
                            }
                            stack.push(Step::Close(id));
                        }
                    }
                    stack.extend(children.iter().rev().map(|&c| Step::Open(c)));
                }
            }
        }
    }
}

fn write_start_tag(el: &Element, childless: bool, out: &mut String) {
    if let Some(raw) = &el.start_tag {
        out.push_str(raw);
        return;
    }
    out.push('<');
    out.push_str(&el.name);
    for attr in &el.attrs {
        out.push(' ');
        out.push_str(&attr.name);
        if let Some(value) = &attr.value {
            out.push('=');
            match attr.quote {
                Quote::Double => {
                    out.push('"');
                    out.push_str(value);
                    out.push('"');
                }
                Quote::Single => {
                    out.push('\'');
                    out.push_str(value);
                    out.push('\'');
                }
                Quote::Bare => out.push_str(value),
            }
        }
    }
    if el.self_closing && childless {
        out.push_str("/>");
    } else {
        out.push('>');
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}
