//! Arena-backed XML document.
//!
//! Nodes live in a `Vec` owned by the [`Document`] and refer to each other by
//! [`NodeId`] indices instead of pointers. Detaching a node only
//! unlinks it from its parent, so a detached subtree can be re-inserted
//! anywhere later. Slots come back to the arena only through
//! [`Document::release`], and later allocations reuse them.

use thiserror::Error;

use crate::path::{PathError, XPath, XPathEval, XPathParser};

// ── Handles ───────────────────────────────────────────────────────────────

/// Handle to a node inside one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to an interned source document name (provenance association).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DocumentError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("the document node cannot be moved")]
    DocumentNode,
    #[error("node {0:?} cannot hold children")]
    NotAContainer(NodeId),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("node {child:?} is an ancestor of {parent:?}")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("node {reference:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, reference: NodeId },
    #[error("node {0:?} has no parent")]
    Detached(NodeId),
    #[error("node {0:?} is still attached")]
    Attached(NodeId),
    #[error("invalid JsonML: {0}")]
    InvalidJsonMl(String),
}

// ── Nodes ─────────────────────────────────────────────────────────────────

/// What a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The invisible document node. Always `NodeId(0)`.
    Document,
    /// Element with ordered attributes.
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    /// Text content leaf.
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    source: Option<SourceId>,
    /// False once the slot has been released.
    live: bool,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            source: None,
            live: true,
        }
    }

    fn released() -> Self {
        Self {
            live: false,
            ..Self::new(NodeKind::Text(String::new()))
        }
    }
}

// ── Document ──────────────────────────────────────────────────────────────

/// A mutable XML tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    /// Released slots, reused before the arena grows.
    free: Vec<NodeId>,
    sources: Vec<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Document)],
            free: Vec::new(),
            sources: Vec::new(),
        }
    }
}

impl Document {
    /// Creates a document holding a single empty root element.
    pub fn new(root_tag: &str) -> Self {
        let mut doc = Self::default();
        let root = doc.create_element(root_tag);
        doc.nodes[0].children.push(root);
        doc.nodes[root.index()].parent = Some(doc.root());
        doc
    }

    /// The document node. Its children are the top-level elements.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The first element below the document node.
    pub fn root_element(&self) -> Option<NodeId> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|id| self.is_element(*id))
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index()).filter(|n| n.live)
    }

    fn data(&self, id: NodeId) -> Result<&NodeData, DocumentError> {
        self.node(id).ok_or(DocumentError::UnknownNode(id))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = NodeData::new(kind);
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(kind));
        id
    }

    /// Number of slots in the arena, released ones included.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    // ── Construction ──────────────────────────────────────────────────────

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
        })
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    /// Sets (or overwrites) an attribute, keeping first-insertion order.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DocumentError> {
        self.data(id)?;
        match &mut self.nodes[id.index()].kind {
            NodeKind::Element { attrs, .. } => {
                match attrs.iter_mut().find(|(k, _)| k == name) {
                    Some(entry) => entry.1 = value.to_string(),
                    None => attrs.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            _ => Err(DocumentError::NotAnElement(id)),
        }
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    /// Tag name of an element, `None` for text and document nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Element { tag, .. }) => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Element { attrs, .. }) => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match self.kind(id) {
            Some(NodeKind::Element { attrs, .. }) => attrs,
            _ => &[],
        }
    }

    /// Concatenated text of the node and all its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        if let NodeKind::Text(text) = &node.kind {
            out.push_str(text);
        }
        for child in &node.children {
            self.collect_text(*child, out);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
    }

    fn position_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let pos = self.children(parent).iter().position(|c| *c == id)?;
        Some((parent, pos))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, pos) = self.position_in_parent(id)?;
        self.children(parent).get(pos + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, pos) = self.position_in_parent(id)?;
        pos.checked_sub(1).map(|p| self.children(parent)[p])
    }

    /// True if `ancestor` is `node` itself or lies on its parent chain.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// True if the node can be reached from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_ancestor_of(self.root(), id)
    }

    /// All nodes below `id` in document (pre-) order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Number of nodes reachable from the document node, itself excluded.
    pub fn node_count(&self) -> usize {
        self.descendants(self.root()).len()
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Unlinks a node from its parent. Detaching a detached node is a no-op.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DocumentError> {
        let data = self.data(id)?;
        if matches!(data.kind, NodeKind::Document) {
            return Err(DocumentError::DocumentNode);
        }
        if let Some(parent) = data.parent {
            self.nodes[parent.index()].children.retain(|c| *c != id);
            self.nodes[id.index()].parent = None;
        }
        Ok(())
    }

    /// Frees the slots of a detached subtree for reuse.
    ///
    /// Handles to released nodes become invalid and may later name new
    /// nodes; only release subtrees nothing else refers to.
    pub fn release(&mut self, id: NodeId) -> Result<(), DocumentError> {
        let data = self.data(id)?;
        if matches!(data.kind, NodeKind::Document) {
            return Err(DocumentError::DocumentNode);
        }
        if data.parent.is_some() {
            return Err(DocumentError::Attached(id));
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = std::mem::replace(&mut self.nodes[next.index()], NodeData::released());
            stack.extend(node.children);
            self.free.push(next);
        }
        Ok(())
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        if matches!(self.data(parent)?.kind, NodeKind::Text(_)) {
            return Err(DocumentError::NotAContainer(parent));
        }
        if matches!(self.data(child)?.kind, NodeKind::Document) {
            return Err(DocumentError::DocumentNode);
        }
        if self.is_ancestor_of(child, parent) {
            return Err(DocumentError::Cycle { parent, child });
        }
        Ok(())
    }

    /// Moves `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    /// Moves `child` to the front of `parent`'s children.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.nodes[parent.index()].children.insert(0, child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    /// Moves `child` directly in front of `reference`, a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DocumentError> {
        self.check_insert(parent, child)?;
        if child == reference || self.parent(reference) != Some(parent) {
            return Err(DocumentError::NotAChild { parent, reference });
        }
        self.detach(child)?;
        let pos = self.nodes[parent.index()]
            .children
            .iter()
            .position(|c| *c == reference)
            .ok_or(DocumentError::NotAChild { parent, reference })?;
        self.nodes[parent.index()].children.insert(pos, child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    /// Moves `child` directly behind `reference`.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Result<(), DocumentError> {
        let parent = self.parent(reference).ok_or(DocumentError::Detached(reference))?;
        self.check_insert(parent, child)?;
        if child == reference {
            return Ok(());
        }
        self.detach(child)?;
        let pos = self.nodes[parent.index()]
            .children
            .iter()
            .position(|c| *c == reference)
            .ok_or(DocumentError::NotAChild { parent, reference })?;
        self.nodes[parent.index()].children.insert(pos + 1, child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    // ── Provenance ────────────────────────────────────────────────────────

    /// Interns a source document name.
    pub fn add_source(&mut self, name: &str) -> SourceId {
        if let Some(pos) = self.sources.iter().position(|s| s == name) {
            return SourceId(pos);
        }
        self.sources.push(name.to_string());
        SourceId(self.sources.len() - 1)
    }

    pub fn source_name(&self, source: SourceId) -> Option<&str> {
        self.sources.get(source.0).map(String::as_str)
    }

    pub fn source(&self, id: NodeId) -> Option<SourceId> {
        self.node(id).and_then(|n| n.source)
    }

    pub fn set_source(&mut self, id: NodeId, source: Option<SourceId>) -> Result<(), DocumentError> {
        self.data(id)?;
        self.nodes[id.index()].source = source;
        Ok(())
    }

    // ── Selection ─────────────────────────────────────────────────────────

    /// Nodes matched by `path`, in document order.
    pub fn select(&self, path: &XPath) -> Vec<NodeId> {
        XPathEval::eval(path, self)
    }

    /// Parses `path` and selects with it.
    pub fn select_str(&self, path: &str) -> Result<Vec<NodeId>, PathError> {
        let parsed = XPathParser::parse(path)?;
        Ok(self.select(&parsed))
    }
}
