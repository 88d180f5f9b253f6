#![forbid(unsafe_code)]

//! Minimal structural selectors.
//!
//! The engine locates host landmarks through a deliberately small selector
//! language: `tag`, `#id`, `[attr]`, `[attr=value]`, combined into compounds
//! (`tag#id[attr]`) and descendant chains separated by whitespace. Anything
//! richer belongs to the host contract, not here — these selectors are a
//! fragile, versioned agreement with the host page structure and are kept
//! easy to audit.

use crate::document::{Document, NodeId};

/// One attribute requirement: present, or present with an exact value.
#[derive(Clone, Debug, PartialEq, Eq)]
struct AttrPredicate {
    name: String,
    value: Option<String>,
}

/// A single compound (`tag#id[attr=value]...`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    attrs: Vec<AttrPredicate>,
}

/// A parsed selector: a descendant chain of compounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Compound>,
}

impl Selector {
    /// Parse a selector string. Returns `None` for empty or malformed input.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = Vec::new();
        for token in input.split_whitespace() {
            parts.push(parse_compound(token)?);
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self { parts })
    }

    /// Whether `node` matches the full chain (ancestors satisfy the leading
    /// compounds in order).
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let (last, ancestors) = match self.parts.split_last() {
            Some(split) => split,
            None => return false,
        };
        if !compound_matches(doc, node, last) {
            return false;
        }
        let mut remaining = ancestors.iter().rev();
        let mut want = remaining.next();
        let mut cur = doc.parent(node);
        while let (Some(compound), Some(n)) = (want, cur) {
            if compound_matches(doc, n, compound) {
                want = remaining.next();
            }
            cur = doc.parent(n);
        }
        want.is_none()
    }

    /// First matching node in depth-first document order under `from`
    /// (inclusive).
    pub fn query(&self, doc: &Document, from: NodeId) -> Option<NodeId> {
        let mut stack = vec![from];
        while let Some(n) = stack.pop() {
            if self.matches(doc, n) {
                return Some(n);
            }
            // Push in reverse so the first child is visited first.
            for &c in doc.children(n).iter().rev() {
                stack.push(c);
            }
        }
        None
    }

    /// All matching nodes in depth-first document order under `from`.
    pub fn query_all(&self, doc: &Document, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(n) = stack.pop() {
            if self.matches(doc, n) {
                out.push(n);
            }
            for &c in doc.children(n).iter().rev() {
                stack.push(c);
            }
        }
        out
    }
}

fn compound_matches(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        if doc.tag(node) != Some(tag.as_str()) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if doc.get_attribute(node, "id") != Some(id.as_str()) {
            return false;
        }
    }
    for pred in &compound.attrs {
        match (&pred.value, doc.get_attribute(node, &pred.name)) {
            (None, Some(_)) => {}
            (Some(want), Some(got)) if want == got => {}
            _ => return false,
        }
    }
    true
}

fn parse_compound(token: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut rest = token;
    // Leading tag name.
    let tag_end = rest
        .find(|c| c == '#' || c == '[')
        .unwrap_or(rest.len());
    if tag_end > 0 {
        compound.tag = Some(rest[..tag_end].to_string());
        rest = &rest[tag_end..];
    }
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('#') {
            let end = after.find('[').unwrap_or(after.len());
            if end == 0 {
                return None;
            }
            compound.id = Some(after[..end].to_string());
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']')?;
            let body = &after[..close];
            let pred = match body.split_once('=') {
                Some((name, value)) => AttrPredicate {
                    name: name.to_string(),
                    value: Some(value.trim_matches('"').to_string()),
                },
                None => AttrPredicate {
                    name: body.to_string(),
                    value: None,
                },
            };
            if pred.name.is_empty() {
                return None;
            }
            compound.attrs.push(pred);
            rest = &after[close + 1..];
        } else {
            return None;
        }
    }
    if compound.tag.is_none() && compound.id.is_none() && compound.attrs.is_empty() {
        return None;
    }
    Some(compound)
}
