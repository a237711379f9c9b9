//! Tolerant markup parser.
//!
//! Builds a [`Document`] from whatever text it is given, in the manner of a
//! "soup" parser: it keeps the structure the author wrote, never synthesizes
//! `html`/`head`/`body`, drops stray end tags, and falls back to text for
//! anything that does not look like a tag.

use std::sync::LazyLock;

use regex::Regex;

use crate::tree::{Attribute, Document, Element, NodeId, NodeKind, Quote};

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// A complete start tag, anchored at the `<`.
static START_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^<([a-zA-Z][^\s/>]*)((?:[\s/]*[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)\s*>"#,
    )
    .expect("valid regex")
});

/// One attribute inside a start tag.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("valid regex")
});

/// A complete end tag, anchored at the `<`.
static END_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^</([a-zA-Z][^\s/>]*)[^>]*>").expect("valid regex")
});

pub(crate) fn parse(input: &str) -> Document {
    let mut builder = TreeBuilder::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(lt) = rest.find('<') else {
            builder.text(rest);
            break;
        };
        if lt > 0 {
            builder.text(&rest[..lt]);
            pos += lt;
            continue;
        }

        pos += match consume_markup(rest, &mut builder) {
            Some(consumed) => consumed,
            None => {
                builder.text("<");
                1
            }
        };
    }

    builder.finish()
}

/// Handle the construct starting at the `<` at the head of `rest`.
/// Returns the number of bytes consumed, or `None` when it is not markup.
fn consume_markup(rest: &str, builder: &mut TreeBuilder) -> Option<usize> {
    if let Some(body) = rest.strip_prefix("<!--") {
        let end = body.find("-->")?;
        builder.node(NodeKind::Comment(body[..end].to_string()));
        return Some(4 + end + 3);
    }

    if rest.starts_with("<!") || rest.starts_with("<?") {
        let end = rest.find('>')?;
        builder.node(NodeKind::Declaration(rest[..=end].to_string()));
        return Some(end + 1);
    }

    if rest.starts_with("</") {
        let caps = END_TAG_RE.captures(rest)?;
        builder.end(&caps[1].to_ascii_lowercase(), &caps[0]);
        return Some(caps[0].len());
    }

    let caps = START_TAG_RE.captures(rest)?;
    let mut element = Element::new(&caps[1]);
    element.attrs = parse_attributes(&caps[2]);
    element.self_closing = !caps[3].is_empty();
    element.start_tag = Some(caps[0].to_string());
    let mut consumed = caps[0].len();

    let raw_text = RAW_TEXT_ELEMENTS.contains(&element.name.as_str()) && !element.self_closing;
    let name = element.name.clone();
    builder.start(element);

    if raw_text {
        let body = &rest[consumed..];
        let end = find_close_tag(body, &name).unwrap_or(body.len());
        builder.text(&body[..end]);
        consumed += end;
    }

    Some(consumed)
}

fn parse_attributes(raw: &str) -> Vec<Attribute> {
    ATTR_RE
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let (value, quote) = if let Some(v) = caps.get(2) {
                (Some(v.as_str().to_string()), Quote::Double)
            } else if let Some(v) = caps.get(3) {
                (Some(v.as_str().to_string()), Quote::Single)
            } else if let Some(v) = caps.get(4) {
                (Some(v.as_str().to_string()), Quote::Bare)
            } else {
                (None, Quote::Double)
            };
            Attribute { name, value, quote }
        })
        .collect()
}

/// Offset of the `</name` that closes a raw-text element, matched case-insensitively.
fn find_close_tag(body: &str, name: &str) -> Option<usize> {
    let lowered = body.to_ascii_lowercase();
    let needle = format!("</{name}");
    let mut from = 0;
    while let Some(found) = lowered[from..].find(&needle) {
        let at = from + found;
        let after = lowered[at + needle.len()..].chars().next();
        if matches!(after, None | Some('>' | '/')) || after.is_some_and(char::is_whitespace) {
            return Some(at);
        }
        from = at + needle.len();
    }
    None
}

// ---------------------------------------------------------------------------
// Tree builder
// ---------------------------------------------------------------------------

struct TreeBuilder {
    doc: Document,
    /// Open elements; the root sits at the bottom and is never popped.
    open: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        let doc = Document::new();
        let root = doc.root();
        Self {
            doc,
            open: vec![root],
        }
    }

    fn current(&self) -> NodeId {
        self.open[self.open.len() - 1]
    }

    fn current_name(&self) -> Option<&str> {
        self.doc.element(self.current()).map(|el| el.name.as_str())
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        if let Some(&last) = self.doc.children(parent).last() {
            if matches!(self.doc.kind(last), NodeKind::Text(_)) {
                self.doc.extend_text(last, text);
                return;
            }
        }
        let id = self.doc.create_text(text);
        self.doc.append_child(parent, id);
    }

    fn node(&mut self, kind: NodeKind) {
        let id = self.doc.create_node(kind);
        let parent = self.current();
        self.doc.append_child(parent, id);
    }

    fn start(&mut self, element: Element) {
        if self
            .current_name()
            .is_some_and(|open| closes_sibling(open, &element.name))
        {
            self.open.pop();
        }

        let leaf = element.is_void() || element.self_closing;
        let id = self.doc.create_element(element);
        let parent = self.current();
        self.doc.append_child(parent, id);
        if !leaf {
            self.open.push(id);
        }
    }

    fn end(&mut self, name: &str, raw: &str) {
        let matching = self
            .open
            .iter()
            .rposition(|&id| self.doc.element(id).is_some_and(|el| el.is(name)));
        if let Some(index) = matching {
            if let Some(el) = self.doc.element_mut(self.open[index]) {
                el.end_tag = Some(raw.to_string());
            }
            self.open.truncate(index);
        }
    }

    fn finish(self) -> Document {
        self.doc
    }
}

/// Whether opening `new` implicitly closes a currently open `open` element.
fn closes_sibling(open: &str, new: &str) -> bool {
    match new {
        "p" | "li" | "option" | "tr" => open == new,
        "dt" | "dd" => matches!(open, "dt" | "dd"),
        "td" | "th" => matches!(open, "td" | "th"),
        _ => false,
    }
}
