//! Element tree for one row.
//!
//! The tree uses an index-based arena: nodes live in one `Vec` and refer to
//! each other by [`NodeId`]. Handles returned by path resolution are plain
//! ids, so the export side can cache one per column without borrowing the
//! tree.
//!
//! # Example
//!
//! ```
//! use xmlrow_core::tree::ElementTree;
//! use xmlrow_core::ColumnPath;
//!
//! let tree = ElementTree::parse(b"<row><a><b>7</b></a></row>").unwrap();
//! let id = tree.resolve(&ColumnPath::parse("a.b")).unwrap();
//! assert_eq!(tree.node(id).text(), Some("7"));
//! ```

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::schema::ColumnPath;

// ============================================================================
// Core Types
// ============================================================================

/// Index into the tree's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Internal node storage.
#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    tag: String,
    text: Option<String>,
}

/// Error returned when a row's bytes do not form one well-formed element.
#[derive(Debug, thiserror::Error)]
#[error("{message} at byte {position}")]
pub struct ParseError {
    pub message: String,
    /// Offset within the parsed bytes
    pub position: u64,
}

// ============================================================================
// ElementTree
// ============================================================================

/// An element and its descendants.
#[derive(Debug, Clone)]
pub struct ElementTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl ElementTree {
    /// A tree holding a single empty element.
    pub fn new(root_tag: &str) -> Self {
        ElementTree {
            nodes: vec![NodeData {
                parent: None,
                children: Vec::new(),
                tag: root_tag.to_string(),
                text: None,
            }],
            root: NodeId::new(0),
        }
    }

    /// Parse exactly one element.
    ///
    /// Entity references in text are resolved. Comments, processing
    /// instructions and attributes are dropped.
    pub fn parse(input: &[u8]) -> Result<Self, ParseError> {
        let mut reader = Reader::from_reader(input);
        let mut builder = TreeBuilder::default();

        loop {
            let position = reader.buffer_position() as u64;
            let fail = |message: String| ParseError { message, position };
            match reader.read_event() {
                Ok(Event::Start(e)) => builder.open(tag_name(e.name().as_ref()).map_err(fail)?).map_err(fail)?,
                Ok(Event::Empty(e)) => {
                    builder.open(tag_name(e.name().as_ref()).map_err(fail)?).map_err(fail)?;
                    builder.close().map_err(fail)?;
                }
                Ok(Event::End(_)) => builder.close().map_err(fail)?,
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|e| fail(e.to_string()))?;
                    builder.text(&text).map_err(fail)?;
                }
                Ok(Event::CData(c)) => {
                    let text = std::str::from_utf8(&c).map_err(|e| fail(e.to_string()))?;
                    builder.text(text).map_err(fail)?;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ParseError {
                        message: e.to_string(),
                        position: reader.buffer_position() as u64,
                    })
                }
            }
        }

        builder.finish().map_err(|message| ParseError {
            message,
            position: input.len() as u64,
        })
    }

    /// Get the root element.
    pub fn root(&self) -> Node<'_> {
        Node { tree: self, id: self.root }
    }

    /// Get a node by an ID obtained from this tree.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        Node { tree: self, id }
    }

    /// Number of elements in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    fn node_data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    /// Append a new empty element under `parent`.
    pub fn append_child(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            parent: Some(parent),
            children: Vec::new(),
            tag: tag.to_string(),
            text: None,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Replace the text of `id`, reusing its allocation.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let slot = &mut self.nodes[id.index()].text;
        match slot {
            Some(existing) => {
                existing.clear();
                existing.push_str(text);
            }
            None => *slot = Some(text.to_string()),
        }
    }

    // ------------------------------------------------------------------------
    // Path resolution
    // ------------------------------------------------------------------------

    /// First descendant of `from` (pre-order, `from` excluded) tagged `tag`.
    pub fn find_descendant(&self, from: NodeId, tag: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.node_data(from).children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let data = self.node_data(id);
            if data.tag == tag {
                return Some(id);
            }
            stack.extend(data.children.iter().rev());
        }
        None
    }

    /// Resolve a dotted path from the root. Never modifies the tree.
    ///
    /// Each segment is searched depth-first below the previous match, so
    /// with duplicate tags the first match in document order wins.
    pub fn resolve(&self, path: &ColumnPath) -> Option<NodeId> {
        path.segments()
            .try_fold(self.root, |at, segment| self.find_descendant(at, segment))
    }

    /// Resolve a dotted path, creating each missing segment under the last
    /// match.
    pub fn resolve_or_create(&mut self, path: &ColumnPath) -> NodeId {
        let mut at = self.root;
        for segment in path.segments() {
            at = match self.find_descendant(at, segment) {
                Some(id) => id,
                None => self.append_child(at, segment),
            };
        }
        at
    }

    // ------------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------------

    /// Append the tree as XML text to `out`.
    pub fn write_xml(&self, out: &mut Vec<u8>) {
        self.write_node(self.root, out);
    }

    pub fn to_xml(&self) -> String {
        let mut out = Vec::new();
        self.write_xml(&mut out);
        // Tags and text are `String`s and escaping keeps UTF-8 intact
        String::from_utf8_lossy(&out).into_owned()
    }

    fn write_node(&self, id: NodeId, out: &mut Vec<u8>) {
        let data = self.node_data(id);
        out.push(b'<');
        out.extend_from_slice(data.tag.as_bytes());
        out.push(b'>');
        if let Some(text) = &data.text {
            out.extend_from_slice(quick_xml::escape::escape(text.as_str()).as_bytes());
        }
        for &child in &data.children {
            self.write_node(child, out);
        }
        out.extend_from_slice(b"</");
        out.extend_from_slice(data.tag.as_bytes());
        out.push(b'>');
    }
}

fn tag_name(raw: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(raw).map_err(|e| format!("invalid tag name: {}", e))
}

// ============================================================================
// Node (navigation handle)
// ============================================================================

/// A handle for navigating the tree.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t ElementTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> &'t str {
        &self.tree.node_data(self.id).tag
    }

    /// Text content, if the element has any.
    pub fn text(&self) -> Option<&'t str> {
        self.tree.node_data(self.id).text.as_deref()
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        let tree = self.tree;
        tree.node_data(self.id).parent.map(|id| Node { tree, id })
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        tree.node_data(self.id).children.iter().map(move |&id| Node { tree, id })
    }

    pub fn first_child(&self) -> Option<Node<'t>> {
        self.children().next()
    }
}

impl std::fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("tag", &self.tag())
            .field("text", &self.text())
            .finish()
    }
}

// ============================================================================
// TreeBuilder (event consumer)
// ============================================================================

/// Builds a tree from start/end/text events.
#[derive(Default)]
struct TreeBuilder {
    nodes: Vec<NodeData>,
    /// Stack of open node IDs.
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    fn open(&mut self, tag: &str) -> Result<(), String> {
        let id = NodeId::new(self.nodes.len());
        let parent = match self.stack.last() {
            Some(&parent) => {
                self.nodes[parent.index()].children.push(id);
                Some(parent)
            }
            None if self.nodes.is_empty() => None,
            None => return Err(format!("second top-level element <{}>", tag)),
        };
        self.nodes.push(NodeData {
            parent,
            children: Vec::new(),
            tag: tag.to_string(),
            text: None,
        });
        self.stack.push(id);
        Ok(())
    }

    fn close(&mut self) -> Result<(), String> {
        self.stack
            .pop()
            .map(|_| ())
            .ok_or_else(|| "closing tag without open element".to_string())
    }

    fn text(&mut self, text: &str) -> Result<(), String> {
        match self.stack.last() {
            Some(&current) => {
                self.nodes[current.index()]
                    .text
                    .get_or_insert_with(String::new)
                    .push_str(text);
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err("text outside the root element".to_string()),
        }
    }

    fn finish(mut self) -> Result<ElementTree, String> {
        if let Some(&open) = self.stack.last() {
            return Err(format!("unclosed element <{}>", self.nodes[open.index()].tag));
        }
        if self.nodes.is_empty() {
            return Err("no element".to_string());
        }
        // Indentation between child elements is not content
        for node in &mut self.nodes {
            if !node.children.is_empty() && node.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
                node.text = None;
            }
        }
        Ok(ElementTree {
            nodes: self.nodes,
            root: NodeId::new(0),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
