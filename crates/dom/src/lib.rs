#![warn(missing_docs)]
//! DOM surface consumed by the panel render pipeline.
//!
//! The pipeline only needs a handful of operations from a document: build a
//! detached wrapper, clone it, park the clone in an offscreen root so it can
//! be measured, find interactive elements and images, and observe changes.
//! [`Document`] captures exactly that; [`MemoryDocument`] is an arena-backed
//! implementation with a fixed-metric layout used by tests and headless hosts.

pub mod markup;
mod memory;

use thiserror::Error;
use webplane_core::{PixelRect, PixelSize};

pub use memory::MemoryDocument;

/// Inline style applied to every content wrapper so its natural size is not
/// influenced by the surrounding page layout.
pub const WRAPPER_STYLE: &str =
    "position:absolute;top:0;left:0;z-index:-1;display:inline-block;box-sizing:border-box";

/// Handle to a node owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub u32);

/// Handle returned by [`Document::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u32);

/// DOM node type, mirroring `Node.nodeType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Element node (`nodeType == 1`).
    Element,
    /// Text node.
    Text,
    /// Comment node.
    Comment,
    /// Document node.
    Document,
}

impl NodeKind {
    /// Lowercase label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::Comment => "comment",
            NodeKind::Document => "document",
        }
    }
}

/// Load state of an embedded image element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    /// Still loading; a load or error event will follow.
    Pending,
    /// Fired `load`.
    Loaded,
    /// Fired `error`.
    Errored,
}

impl ImageState {
    /// Loaded and errored images both release the asset barrier.
    pub fn is_settled(self) -> bool {
        !matches!(self, ImageState::Pending)
    }
}

/// Failures reported by a [`Document`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    /// The handle does not name a live node.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeRef),
    /// The operation needs an element but got another node type.
    #[error("node {node:?} is a {kind} node, expected an element")]
    NotAnElement {
        /// Offending node.
        node: NodeRef,
        /// Its actual type label.
        kind: &'static str,
    },
    /// Measurement was requested for a node outside the document.
    #[error("node {0:?} is not attached to the document")]
    Detached(NodeRef),
}

/// Operations the render pipeline performs against a document.
pub trait Document {
    /// Create a detached wrapper element styled with [`WRAPPER_STYLE`].
    fn create_wrapper(&mut self) -> NodeRef;

    /// Replace the children of `node` with parsed `markup` (`innerHTML`).
    fn set_inner_markup(&mut self, node: NodeRef, markup: &str) -> Result<(), DomError>;

    /// Append `child` to `parent`, moving it out of any previous parent.
    fn append_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), DomError>;

    /// Type of `node`.
    fn node_kind(&self, node: NodeRef) -> Result<NodeKind, DomError>;

    /// Deep-clone `node` (`cloneNode(true)`); the clone is detached.
    fn deep_clone(&mut self, node: NodeRef) -> Result<NodeRef, DomError>;

    /// Attach `node` to the hidden offscreen root so it lays out.
    fn attach_offscreen(&mut self, node: NodeRef) -> Result<(), DomError>;

    /// Remove `node` from its parent, keeping it alive.
    fn detach(&mut self, node: NodeRef) -> Result<(), DomError>;

    /// Drop `node` and its subtree. Unknown handles are ignored.
    fn release(&mut self, node: NodeRef);

    /// Rendered size of `node` (`clientWidth` × `clientHeight`).
    fn client_size(&self, node: NodeRef) -> Result<PixelSize, DomError>;

    /// Bounding box of `node` relative to the offscreen root.
    fn bounding_rect(&self, node: NodeRef) -> Result<PixelRect, DomError>;

    /// Attribute value, if present.
    fn attribute(&self, node: NodeRef, name: &str) -> Option<String>;

    /// Descendants of `root` carrying attribute `name`, in document order.
    fn query_attribute(&self, root: NodeRef, name: &str) -> Vec<NodeRef>;

    /// Image elements under `root`, in document order.
    fn images(&self, root: NodeRef) -> Vec<NodeRef>;

    /// Load state of an image element.
    fn image_state(&self, image: NodeRef) -> ImageState;

    /// Start observing attribute/child/text changes below `root`.
    fn observe(&mut self, root: NodeRef) -> Result<ObserverId, DomError>;

    /// Stop an observer. Unknown ids are ignored.
    fn disconnect(&mut self, observer: ObserverId);
}
