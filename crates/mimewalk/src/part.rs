//! The parsed MIME tree.
//!
//! Parts live in an arena owned by [`MimeTree`] and refer to each other by
//! [`PartId`]. [`PartRef`] is a cheap handle that implements the read-only
//! [`MimePart`] interface.

use crate::header::Headers;
use std::collections::VecDeque;
use std::fmt;

/// Read-only view of one node in a MIME tree.
pub trait MimePart<'a>: Copy + Sized {
    /// Enclosing part; `None` for the root.
    fn parent(self) -> Option<Self>;

    /// First child in document order; `None` for leaf parts.
    fn first_child(self) -> Option<Self>;

    /// Next part at the same nesting level.
    fn next_sibling(self) -> Option<Self>;

    /// Header fields as read from the document.
    fn header(self) -> &'a Headers;

    /// Lower-cased media type without parameters, e.g. `text/plain`.
    fn content_type(self) -> &'a str;

    /// Lower-cased disposition token, or empty.
    fn disposition(self) -> &'a str;

    /// File name from the disposition or content type, or empty.
    fn file_name(self) -> &'a str;

    /// Decoded body. Always empty for multipart containers.
    fn content(self) -> &'a [u8];

    /// Iterates over direct children in document order.
    fn children(self) -> impl Iterator<Item = Self> {
        std::iter::successors(self.first_child(), |p| p.next_sibling())
    }

    /// Checks whether this part is a `multipart/*` container.
    fn is_multipart(self) -> bool {
        self.content_type().starts_with("multipart/")
    }

    /// Checks whether this part is marked as an attachment.
    fn is_attachment(self) -> bool {
        self.disposition() == "attachment"
    }

    /// Number of ancestors; the root is at depth 0.
    fn depth(self) -> usize {
        std::iter::successors(self.parent(), |p| p.parent()).count()
    }
}

/// Index of a part within its [`MimeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartId(usize);

impl PartId {
    /// Id of the root part.
    pub const ROOT: Self = Self(0);

    /// Position in depth-first document order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<PartId>,
    first_child: Option<PartId>,
    next_sibling: Option<PartId>,
    header: Headers,
    content_type: String,
    disposition: String,
    file_name: String,
    content: Vec<u8>,
}

/// Metadata for a node about to be inserted.
#[derive(Debug)]
pub(crate) struct NewPart {
    pub header: Headers,
    pub content_type: String,
    pub disposition: String,
    pub file_name: String,
}

impl NewPart {
    fn into_node(self, parent: Option<PartId>) -> Node {
        Node {
            parent,
            first_child: None,
            next_sibling: None,
            header: self.header,
            content_type: self.content_type,
            disposition: self.disposition,
            file_name: self.file_name,
            content: Vec::new(),
        }
    }
}

/// A fully parsed MIME document.
///
/// Parts are stored in depth-first document order, so [`MimeTree::iter`]
/// visits them exactly as they appear in the source. The tree is immutable
/// once built.
#[derive(Debug, Clone)]
pub struct MimeTree {
    nodes: Vec<Node>,
}

impl MimeTree {
    pub(crate) fn with_root(root: NewPart) -> Self {
        Self {
            nodes: vec![root.into_node(None)],
        }
    }

    /// Appends a child to `parent`, after `prev_sibling` if given.
    pub(crate) fn push_child(
        &mut self,
        parent: PartId,
        prev_sibling: Option<PartId>,
        part: NewPart,
    ) -> PartId {
        let id = PartId(self.nodes.len());
        self.nodes.push(part.into_node(Some(parent)));
        match prev_sibling {
            Some(prev) => self.nodes[prev.0].next_sibling = Some(id),
            None => self.nodes[parent.0].first_child = Some(id),
        }
        id
    }

    pub(crate) fn set_content(&mut self, id: PartId, content: Vec<u8>) {
        self.nodes[id.0].content = content;
    }

    /// The root part.
    #[must_use]
    pub const fn root(&self) -> PartRef<'_> {
        PartRef {
            tree: self,
            id: PartId::ROOT,
        }
    }

    /// Looks up a part by id.
    #[must_use]
    pub fn get(&self, id: PartId) -> Option<PartRef<'_>> {
        (id.0 < self.nodes.len()).then_some(PartRef { tree: self, id })
    }

    /// Number of parts, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false for a parsed tree, which has at least a root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over every part in depth-first document order.
    pub fn iter(&self) -> impl Iterator<Item = PartRef<'_>> {
        (0..self.nodes.len()).map(|i| PartRef {
            tree: self,
            id: PartId(i),
        })
    }

    /// First part in depth-first order matching `pred`.
    pub fn depth_first_match<'t, F>(&'t self, mut pred: F) -> Option<PartRef<'t>>
    where
        F: FnMut(PartRef<'t>) -> bool,
    {
        self.iter().find(|&p| pred(p))
    }

    /// All parts in depth-first order matching `pred`.
    pub fn depth_first_match_all<'t, F>(&'t self, mut pred: F) -> Vec<PartRef<'t>>
    where
        F: FnMut(PartRef<'t>) -> bool,
    {
        self.iter().filter(|&p| pred(p)).collect()
    }

    /// First part matching `pred`, searching level by level from the root.
    ///
    /// Prefers shallow parts: a top-level `text/plain` body wins over one
    /// nested inside an attached message.
    pub fn breadth_first_match<'t, F>(&'t self, mut pred: F) -> Option<PartRef<'t>>
    where
        F: FnMut(PartRef<'t>) -> bool,
    {
        let mut queue = VecDeque::from([self.root()]);
        while let Some(part) = queue.pop_front() {
            if pred(part) {
                return Some(part);
            }
            queue.extend(part.children());
        }
        None
    }

    /// Leaf parts whose disposition is `attachment`, in document order.
    #[must_use]
    pub fn attachments(&self) -> Vec<PartRef<'_>> {
        self.depth_first_match_all(|p| p.is_attachment() && !p.is_multipart())
    }
}

/// Handle to one part of a [`MimeTree`].
#[derive(Clone, Copy)]
pub struct PartRef<'a> {
    tree: &'a MimeTree,
    id: PartId,
}

impl<'a> PartRef<'a> {
    /// This part's id.
    #[must_use]
    pub const fn id(self) -> PartId {
        self.id
    }

    fn node(self) -> &'a Node {
        &self.tree.nodes[self.id.0]
    }

    fn at(self, id: Option<PartId>) -> Option<Self> {
        id.map(|id| Self {
            tree: self.tree,
            id,
        })
    }
}

impl<'a> MimePart<'a> for PartRef<'a> {
    fn parent(self) -> Option<Self> {
        self.at(self.node().parent)
    }

    fn first_child(self) -> Option<Self> {
        self.at(self.node().first_child)
    }

    fn next_sibling(self) -> Option<Self> {
        self.at(self.node().next_sibling)
    }

    fn header(self) -> &'a Headers {
        &self.node().header
    }

    fn content_type(self) -> &'a str {
        &self.node().content_type
    }

    fn disposition(self) -> &'a str {
        &self.node().disposition
    }

    fn file_name(self) -> &'a str {
        &self.node().file_name
    }

    fn content(self) -> &'a [u8] {
        &self.node().content
    }
}

impl PartialEq for PartRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for PartRef<'_> {}

impl fmt::Debug for PartRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node();
        f.debug_struct("PartRef")
            .field("id", &self.id.0)
            .field("content_type", &node.content_type)
            .field("disposition", &node.disposition)
            .field("file_name", &node.file_name)
            .field("content_len", &node.content.len())
            .finish()
    }
}
