//! Mutable arena DOM for SVG documents.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. Detached
//! nodes stay in the arena until the document is dropped, so ids never dangle.
//!
//! Parsing uses `quick_xml::Reader`. Text, comments, CDATA, processing
//! instructions, the XML declaration and the doctype are kept verbatim so a
//! parse/serialize round trip only normalizes attribute quoting.
//!
//! Attribute values are stored unescaped. General entities declared in the
//! doctype's internal subset are expanded in attribute values; text content
//! keeps its references as written.

use quick_xml::{
    Reader,
    escape::{EscapeError, escape, resolve_predefined_entity, unescape_with},
    events::{BytesStart, Event, attributes::AttrError},
};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::{
    borrow::Cow,
    fmt::{self, Write},
    sync::OnceLock,
};
use thiserror::Error;

/// SVG namespace URI.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML parse error at position {position}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("invalid attribute")]
    Attr(#[from] AttrError),

    #[error("invalid character or entity reference")]
    Escape(#[from] EscapeError),

    #[error("document is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("closing tag `</{0}>` has no matching opening tag")]
    UnexpectedEnd(String),

    #[error("element `<{0}>` is never closed")]
    Unclosed(String),

    #[error("document has no root element")]
    NoRoot,

    #[error("document has more than one root element")]
    MultipleRoots,
}

// ============================================================================
// Node Types
// ============================================================================

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Node payload. Character data is stored escaped, exactly as read.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The document node, parent of the root element.
    Document,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    /// XML declaration content, e.g. `xml version="1.0"`.
    Decl(String),
    /// Processing instruction content, e.g. `xml-stylesheet href="a.css"`.
    Pi(String),
    DocType(String),
}

/// An element with its qualified name and unescaped attribute values.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

/// Split `prefix:local` into its parts.
fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

// ============================================================================
// Document
// ============================================================================

/// An SVG/XML document. `Clone` is a deep copy.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }
}

impl Document {
    /// Parse a document from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        Self::parse(std::str::from_utf8(data)?)
    }

    /// Parse a document from text.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut doc = Self::default();
        let mut reader = Reader::from_str(text);
        // Stray closing tags are reported as `UnexpectedEnd`
        reader.config_mut().allow_unmatched_ends = true;
        let mut stack = vec![doc.root()];
        let mut entities = Entities::default();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(source) => {
                    return Err(ParseError::Xml {
                        position: reader.error_position() as u64,
                        source,
                    });
                }
            };
            let parent = *stack.last().unwrap_or(&doc.root());

            match event {
                Event::Start(ref e) => {
                    let id = doc.push(NodeKind::Element(read_element(e, &entities)?));
                    doc.attach(parent, id);
                    stack.push(id);
                }
                Event::Empty(ref e) => {
                    let id = doc.push(NodeKind::Element(read_element(e, &entities)?));
                    doc.attach(parent, id);
                }
                Event::End(ref e) => {
                    if stack.len() <= 1 {
                        let qname = e.name();
                        let name = std::str::from_utf8(qname.as_ref())?.to_string();
                        return Err(ParseError::UnexpectedEnd(name));
                    }
                    stack.pop();
                }
                Event::Text(_) => doc.push_text(parent, raw(&event)?),
                Event::GeneralRef(_) => doc.push_text(parent, &format!("&{};", raw(&event)?)),
                Event::CData(_) => doc.push_leaf(parent, NodeKind::CData(raw(&event)?.into())),
                Event::Comment(_) => doc.push_leaf(parent, NodeKind::Comment(raw(&event)?.into())),
                Event::Decl(_) => doc.push_leaf(parent, NodeKind::Decl(raw(&event)?.into())),
                Event::PI(_) => doc.push_leaf(parent, NodeKind::Pi(raw(&event)?.into())),
                Event::DocType(_) => {
                    let text = raw(&event)?;
                    entities = Entities::declared_in(text);
                    doc.push_leaf(parent, NodeKind::DocType(text.into()));
                }
                Event::Eof => break,
            }
        }

        if stack.len() > 1 {
            let open = stack
                .last()
                .and_then(|&id| doc.element(id))
                .map(|e| e.name.clone())
                .unwrap_or_default();
            return Err(ParseError::Unclosed(open));
        }

        let roots = doc
            .children(doc.root())
            .iter()
            .filter(|&&id| doc.element(id).is_some())
            .count();
        match roots {
            0 => Err(ParseError::NoRoot),
            1 => Ok(doc),
            _ => Err(ParseError::MultipleRoots),
        }
    }

    /// Serialize to UTF-8 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The single top-level element.
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Child elements only, skipping text and comments.
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
            .collect()
    }

    /// All nodes below `id` in document order (depth-first, pre-order).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = pending.pop() {
            out.push(next);
            pending.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Whether `id` is reachable from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root() {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    /// Set an attribute; no-op on non-element nodes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.element_mut(id) {
            element.set_attr(name, value);
        }
    }

    /// Namespace URI of an element, resolved through `xmlns` declarations
    /// on the element and its ancestors.
    pub fn namespace(&self, id: NodeId) -> Option<&str> {
        let element = self.element(id)?;
        let decl = match split_name(&element.name).0 {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };

        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(uri) = self.attr(node, &decl) {
                return (!uri.is_empty()).then_some(uri);
            }
            current = self.parent(node);
        }
        None
    }

    /// Whether `id` is an SVG element named `local`.
    ///
    /// Elements in no namespace count as SVG, so documents that omit
    /// `xmlns` are handled the same way browsers handle inline SVG.
    pub fn is_svg_element(&self, id: NodeId, local: &str) -> bool {
        self.element(id)
            .is_some_and(|e| e.local_name() == local)
            && matches!(self.namespace(id), None | Some(SVG_NS))
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)))
    }

    /// Append `child` to `parent`, detaching it from its old parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.attach(parent, child);
    }

    /// Put `new` where `old` is and detach `old`.
    ///
    /// Returns `false` if `old` is not a child of `parent`.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> bool {
        self.detach(new);
        let Some(pos) = self.nodes[parent.0].children.iter().position(|&c| c == old) else {
            return false;
        };
        self.nodes[parent.0].children[pos] = new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        true
    }

    /// Remove `id` from its parent. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Deep-copy a subtree of this document. The copy is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        let copy = self.push(kind);
        let mut pending = vec![(id, copy)];
        while let Some((from, to)) = pending.pop() {
            for child in self.nodes[from.0].children.clone() {
                let kind = self.nodes[child.0].kind.clone();
                let child_copy = self.push(kind);
                self.attach(to, child_copy);
                pending.push((child, child_copy));
            }
        }
        copy
    }

    /// Deep-copy a subtree of another document into this one, detached.
    pub fn import(&mut self, src: &Document, id: NodeId) -> NodeId {
        let copy = self.push(src.kind(id).clone());
        let mut pending = vec![(id, copy)];
        while let Some((from, to)) = pending.pop() {
            for &child in src.children(from) {
                let child_copy = self.push(src.kind(child).clone());
                self.attach(to, child_copy);
                pending.push((child, child_copy));
            }
        }
        copy
    }

    /// Move a subtree out of `src` into this document, detached.
    pub fn adopt(&mut self, src: &mut Document, id: NodeId) -> NodeId {
        src.detach(id);
        self.import(src, id)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn push_leaf(&mut self, parent: NodeId, kind: NodeKind) {
        let id = self.push(kind);
        self.attach(parent, id);
    }

    /// Append character data, merging with a preceding text node.
    fn push_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last()
            && let NodeKind::Text(existing) = &mut self.nodes[last.0].kind
        {
            existing.push_str(text);
            return;
        }
        self.push_leaf(parent, NodeKind::Text(text.to_string()));
    }

    // ------------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------------

    fn write_node(&self, id: NodeId, out: &mut impl Write) -> fmt::Result {
        let mut pending = vec![Step::Open(id)];
        while let Some(step) = pending.pop() {
            let id = match step {
                Step::Open(id) => id,
                Step::Close(id) => {
                    if let Some(element) = self.element(id) {
                        write!(out, "</{}>", element.name)?;
                    }
                    continue;
                }
            };

            match self.kind(id) {
                NodeKind::Document => {
                    pending.extend(self.children(id).iter().rev().map(|&c| Step::Open(c)));
                }
                NodeKind::Element(element) => {
                    write!(out, "<{}", element.name)?;
                    for (key, value) in &element.attrs {
                        write!(out, " {key}=\"{}\"", escape_attr(value))?;
                    }
                    if self.children(id).is_empty() {
                        out.write_str("/>")?;
                    } else {
                        out.write_char('>')?;
                        pending.push(Step::Close(id));
                        pending.extend(self.children(id).iter().rev().map(|&c| Step::Open(c)));
                    }
                }
                NodeKind::Text(text) => out.write_str(text)?,
                NodeKind::CData(text) => write!(out, "<![CDATA[{text}]]>")?,
                NodeKind::Comment(text) => write!(out, "<!--{text}-->")?,
                NodeKind::Decl(text) | NodeKind::Pi(text) => write!(out, "<?{text}?>")?,
                NodeKind::DocType(text) => write!(out, "<!DOCTYPE {}>", text.trim_start())?,
            }
        }
        Ok(())
    }
}

/// Pending serialization work.
enum Step {
    Open(NodeId),
    Close(NodeId),
}

/// Escape an attribute value for a double-quoted attribute.
///
/// Tab, newline and carriage return become character references, since a
/// parser replaces the literal characters with spaces.
fn escape_attr(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if !escaped.contains(['\t', '\n', '\r']) {
        return escaped;
    }
    let mut out = String::with_capacity(escaped.len() + 8);
    for ch in escaped.chars() {
        match ch {
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(self.root(), f)
    }
}

/// General entities declared in a doctype's internal subset.
#[derive(Debug, Default)]
struct Entities(FxHashMap<String, String>);

impl Entities {
    /// Collect internal `<!ENTITY name "value">` declarations.
    ///
    /// Parameter entities and external (`SYSTEM`/`PUBLIC`) entities are skipped.
    fn declared_in(doctype: &str) -> Self {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r#"<!ENTITY[ \t\r\n]+([^ \t\r\n%"']+)[ \t\r\n]+(?:"([^"]*)"|'([^']*)')[ \t\r\n]*>"#)
                .unwrap()
        });

        let mut map = FxHashMap::default();
        for caps in re.captures_iter(doctype) {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            // First declaration wins
            map.entry(caps[1].to_string()).or_insert_with(|| value.to_string());
        }
        Self(map)
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .or_else(|| resolve_predefined_entity(name))
    }
}

fn read_element(start: &BytesStart<'_>, entities: &Entities) -> Result<Element, ParseError> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let attrs = start
        .attributes()
        .map(|attr| -> Result<(String, String), ParseError> {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let raw = normalize_space(std::str::from_utf8(&attr.value)?);
            let value = unescape_with(&raw, |entity| entities.resolve(entity))?.into_owned();
            Ok((key, value))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Element { name, attrs })
}

/// Attribute-value normalization: literal tab, newline and carriage return
/// read as spaces. Character references are untouched.
fn normalize_space(raw: &str) -> Cow<'_, str> {
    if raw.contains(['\t', '\n', '\r']) {
        Cow::Owned(raw.replace(['\t', '\n', '\r'], " "))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Raw content of a character-data event.
fn raw<'a>(event: &'a Event<'_>) -> Result<&'a str, ParseError> {
    Ok(std::str::from_utf8(event)?)
}

// ============================================================================
// Id Index
// ============================================================================

/// Lookup table from `id` attribute to elements, in document order.
///
/// Built once per document. Lookups skip nodes that were detached since.
pub struct IdIndex {
    map: FxHashMap<String, Vec<NodeId>>,
}

impl IdIndex {
    pub fn build(doc: &Document) -> Self {
        let mut map: FxHashMap<String, Vec<NodeId>> = FxHashMap::default();
        for id in doc.descendants(doc.root()) {
            if let Some(value) = doc.attr(id, "id") {
                map.entry(value.to_string()).or_default().push(id);
            }
        }
        Self { map }
    }

    /// First element with this id that is still part of `doc`.
    pub fn lookup(&self, doc: &Document, id: &str) -> Option<NodeId> {
        self.map
            .get(id)?
            .iter()
            .copied()
            .find(|&node| doc.is_attached(node))
    }
}
