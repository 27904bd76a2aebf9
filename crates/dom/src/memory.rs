//! Arena-backed [`Document`] with a fixed-metric block layout.
//!
//! Layout rules (measurement only, not CSS):
//! - text runs are `TEXT_ADVANCE` px per character and `LINE_HEIGHT` px tall;
//! - an element with numeric `width` / `height` attributes uses them;
//! - otherwise an element is as wide as its widest child and as tall as its
//!   children stacked vertically.
//!
//! Nodes outside the offscreen root measure as zero, like detached DOM nodes.

use crate::markup::{self, Token};
use crate::{Document, DomError, ImageState, NodeKind, NodeRef, ObserverId, WRAPPER_STYLE};
use std::collections::{HashMap, HashSet};
use tracing::trace;
use webplane_core::{PixelRect, PixelSize};

/// Horizontal advance of one text character, in pixels.
pub const TEXT_ADVANCE: f32 = 8.0;
/// Height of a non-empty text run, in pixels.
pub const LINE_HEIGHT: f32 = 16.0;

#[derive(Debug, Clone)]
enum NodeData {
    Document,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        image: Option<ImageState>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct DomNode {
    data: NodeData,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
}

/// In-memory document used by tests and headless hosts.
#[derive(Debug)]
pub struct MemoryDocument {
    nodes: Vec<Option<DomNode>>,
    document: NodeRef,
    body: NodeRef,
    observers: Vec<Option<NodeRef>>,
    mutations: Vec<ObserverId>,
    loaded_sources: HashSet<String>,
    failed_sources: HashSet<String>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty document with a `<body>` acting as offscreen root.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            document: NodeRef(0),
            body: NodeRef(0),
            observers: Vec::new(),
            mutations: Vec::new(),
            loaded_sources: HashSet::new(),
            failed_sources: HashSet::new(),
        };
        doc.document = doc.alloc(NodeData::Document);
        doc.body = doc.create_element("body", Vec::new());
        doc.link(doc.document, doc.body);
        doc
    }

    /// The document node itself.
    pub fn document_node(&self) -> NodeRef {
        self.document
    }

    /// The offscreen root clones are attached to.
    pub fn body(&self) -> NodeRef {
        self.body
    }

    /// Number of live nodes, including the document and body.
    pub fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Children currently attached to the offscreen root.
    pub fn attached(&self) -> Vec<NodeRef> {
        self.node(self.body)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Parse `markup` into a detached element (first element of the fragment).
    pub fn create_from_markup(&mut self, markup: &str) -> Option<NodeRef> {
        let holder = self.create_element("template", Vec::new());
        self.insert_markup(holder, markup);
        let first = self
            .node(holder)?
            .children
            .iter()
            .copied()
            .find(|c| matches!(self.node_kind(*c), Ok(NodeKind::Element)));
        if let Some(first) = first {
            self.unlink(first);
        }
        self.release(holder);
        first
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeRef {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeRef {
        self.alloc(NodeData::Comment(text.to_string()))
    }

    /// Set an attribute, notifying observers of the enclosing subtree.
    pub fn set_attribute(&mut self, node: NodeRef, name: &str, value: &str) -> Result<(), DomError> {
        let entry = self.node_mut(node)?;
        match &mut entry.data {
            NodeData::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(k, _)| k == name) {
                    Some((_, v)) => *v = value.to_string(),
                    None => attributes.push((name.to_string(), value.to_string())),
                }
            }
            data => return Err(not_an_element(node, data)),
        }
        self.record_mutation(node);
        Ok(())
    }

    /// Concatenated text content of `node`.
    pub fn text_content(&self, node: NodeRef) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    /// Tag name of an element.
    pub fn tag_name(&self, node: NodeRef) -> Option<&str> {
        match &self.node(node)?.data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Parent of `node`.
    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.node(node)?.parent
    }

    /// Mark every image with `src` as loaded (or errored) and remember the
    /// outcome for images created later. Returns the images that settled.
    pub fn resolve_source(&mut self, src: &str, ok: bool) -> Vec<NodeRef> {
        if ok {
            self.loaded_sources.insert(src.to_string());
        } else {
            self.failed_sources.insert(src.to_string());
        }
        let state = if ok { ImageState::Loaded } else { ImageState::Errored };
        let mut settled = Vec::new();
        for (index, slot) in self.nodes.iter_mut().enumerate() {
            let Some(DomNode {
                data: NodeData::Element { attributes, image, .. },
                ..
            }) = slot
            else {
                continue;
            };
            let matches_src = attributes.iter().any(|(k, v)| k == "src" && v == src);
            if matches_src && *image == Some(ImageState::Pending) {
                *image = Some(state);
                settled.push(NodeRef(index as u32));
            }
        }
        trace!(src, ok, count = settled.len(), "image source resolved");
        settled
    }

    /// Settle one image element directly.
    pub fn settle_image(&mut self, image_node: NodeRef, ok: bool) -> Result<(), DomError> {
        let entry = self.node_mut(image_node)?;
        match &mut entry.data {
            NodeData::Element {
                image: Some(state), ..
            } => {
                *state = if ok { ImageState::Loaded } else { ImageState::Errored };
                Ok(())
            }
            data => Err(not_an_element(image_node, data)),
        }
    }

    /// Drain observers that saw a change since the last call, deduplicated.
    pub fn take_mutations(&mut self) -> Vec<ObserverId> {
        std::mem::take(&mut self.mutations)
    }

    fn alloc(&mut self, data: NodeData) -> NodeRef {
        let id = NodeRef(self.nodes.len() as u32);
        self.nodes.push(Some(DomNode {
            data,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    fn create_element(&mut self, tag: &str, attributes: Vec<(String, String)>) -> NodeRef {
        let image = (tag == "img").then(|| {
            let src = attributes
                .iter()
                .find(|(k, _)| k == "src")
                .map(|(_, v)| v.as_str());
            match src {
                Some(src) if self.loaded_sources.contains(src) => ImageState::Loaded,
                Some(src) if self.failed_sources.contains(src) => ImageState::Errored,
                _ => ImageState::Pending,
            }
        });
        self.alloc(NodeData::Element {
            tag: tag.to_string(),
            attributes,
            image,
        })
    }

    fn node(&self, node: NodeRef) -> Option<&DomNode> {
        self.nodes.get(node.0 as usize).and_then(|n| n.as_ref())
    }

    fn node_mut(&mut self, node: NodeRef) -> Result<&mut DomNode, DomError> {
        self.nodes
            .get_mut(node.0 as usize)
            .and_then(|n| n.as_mut())
            .ok_or(DomError::UnknownNode(node))
    }

    fn link(&mut self, parent: NodeRef, child: NodeRef) {
        if let Some(Some(c)) = self.nodes.get_mut(child.0 as usize) {
            c.parent = Some(parent);
        }
        if let Some(Some(p)) = self.nodes.get_mut(parent.0 as usize) {
            p.children.push(child);
        }
    }

    fn unlink(&mut self, child: NodeRef) {
        let Some(parent) = self.node(child).and_then(|c| c.parent) else {
            return;
        };
        if let Some(Some(p)) = self.nodes.get_mut(parent.0 as usize) {
            p.children.retain(|c| *c != child);
        }
        if let Some(Some(c)) = self.nodes.get_mut(child.0 as usize) {
            c.parent = None;
        }
    }

    fn insert_markup(&mut self, parent: NodeRef, source: &str) {
        let mut stack = vec![parent];
        for token in markup::tokenize(source) {
            let top = *stack.last().unwrap_or(&parent);
            match token {
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    let void = markup::is_void(&name);
                    let element = self.create_element(&name, attributes);
                    self.link(top, element);
                    if !void && !self_closing {
                        stack.push(element);
                    }
                }
                Token::EndTag { name } => {
                    // Unmatched end tags are dropped; matched ones close
                    // everything opened after them.
                    let open = stack
                        .iter()
                        .skip(1)
                        .rposition(|n| self.tag_name(*n) == Some(name.as_str()));
                    if let Some(index) = open {
                        stack.truncate(index + 1);
                    }
                }
                Token::Text(text) => {
                    let node = self.create_text(&text);
                    self.link(top, node);
                }
                Token::Comment(text) => {
                    let node = self.create_comment(&text);
                    self.link(top, node);
                }
            }
        }
    }

    fn clone_subtree(&mut self, node: NodeRef) -> Option<NodeRef> {
        let source = self.node(node)?.clone();
        let copy = self.alloc(source.data);
        for child in source.children {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.link(copy, child_copy);
            }
        }
        Some(copy)
    }

    fn collect_text(&self, node: NodeRef, out: &mut String) {
        let Some(entry) = self.node(node) else {
            return;
        };
        if let NodeData::Text(text) = &entry.data {
            out.push_str(text);
        }
        for child in &entry.children {
            self.collect_text(*child, out);
        }
    }

    fn descendants(&self, root: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeRef> = self
            .node(root)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(entry) = self.node(next) {
                stack.extend(entry.children.iter().rev().copied());
            }
        }
        out
    }

    fn is_in_document(&self, mut node: NodeRef) -> bool {
        loop {
            if node == self.document {
                return true;
            }
            match self.node(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn contains(&self, root: NodeRef, mut node: NodeRef) -> bool {
        loop {
            if node == root {
                return true;
            }
            match self.node(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn record_mutation(&mut self, node: NodeRef) {
        let hits: Vec<ObserverId> = self
            .observers
            .iter()
            .enumerate()
            .filter_map(|(index, root)| {
                root.filter(|root| self.contains(*root, node))
                    .map(|_| ObserverId(index as u32))
            })
            .collect();
        for id in hits {
            if !self.mutations.contains(&id) {
                self.mutations.push(id);
            }
        }
    }

    /// Top-level ancestor directly under the body, if attached.
    fn layout_root(&self, node: NodeRef) -> Option<NodeRef> {
        let mut current = node;
        loop {
            let parent = self.node(current)?.parent?;
            if parent == self.body {
                return Some(current);
            }
            current = parent;
        }
    }

    fn layout(&self, root: NodeRef) -> HashMap<NodeRef, PixelRect> {
        let mut boxes = HashMap::new();
        self.layout_node(root, 0.0, 0.0, &mut boxes);
        boxes
    }

    fn layout_node(
        &self,
        node: NodeRef,
        left: f32,
        top: f32,
        boxes: &mut HashMap<NodeRef, PixelRect>,
    ) -> (f32, f32) {
        let Some(entry) = self.node(node) else {
            return (0.0, 0.0);
        };
        let (width, height) = match &entry.data {
            NodeData::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    (0.0, 0.0)
                } else {
                    (trimmed.chars().count() as f32 * TEXT_ADVANCE, LINE_HEIGHT)
                }
            }
            NodeData::Comment(_) | NodeData::Document => (0.0, 0.0),
            NodeData::Element { attributes, .. } => {
                let explicit = |name: &str| {
                    attributes
                        .iter()
                        .find(|(k, _)| k == name)
                        .and_then(|(_, v)| v.trim().trim_end_matches("px").parse::<f32>().ok())
                };
                let mut content_width: f32 = 0.0;
                let mut cursor = top;
                for child in &entry.children {
                    let (w, h) = self.layout_node(*child, left, cursor, boxes);
                    content_width = content_width.max(w);
                    cursor += h;
                }
                (
                    explicit("width").unwrap_or(content_width),
                    explicit("height").unwrap_or(cursor - top),
                )
            }
        };
        boxes.insert(node, PixelRect::from_origin_size(left, top, width, height));
        (width, height)
    }
}

fn not_an_element(node: NodeRef, data: &NodeData) -> DomError {
    DomError::NotAnElement {
        node,
        kind: kind_of(data).label(),
    }
}

fn kind_of(data: &NodeData) -> NodeKind {
    match data {
        NodeData::Document => NodeKind::Document,
        NodeData::Element { .. } => NodeKind::Element,
        NodeData::Text(_) => NodeKind::Text,
        NodeData::Comment(_) => NodeKind::Comment,
    }
}

impl Document for MemoryDocument {
    fn create_wrapper(&mut self) -> NodeRef {
        self.create_element("div", vec![("style".to_string(), WRAPPER_STYLE.to_string())])
    }

    fn set_inner_markup(&mut self, node: NodeRef, markup: &str) -> Result<(), DomError> {
        let entry = self.node(node).ok_or(DomError::UnknownNode(node))?;
        if !matches!(entry.data, NodeData::Element { .. }) {
            return Err(not_an_element(node, &entry.data));
        }
        for child in entry.children.clone() {
            self.release(child);
        }
        self.insert_markup(node, markup);
        self.record_mutation(node);
        Ok(())
    }

    fn append_child(&mut self, parent: NodeRef, child: NodeRef) -> Result<(), DomError> {
        self.node(parent).ok_or(DomError::UnknownNode(parent))?;
        self.node(child).ok_or(DomError::UnknownNode(child))?;
        self.unlink(child);
        self.link(parent, child);
        self.record_mutation(parent);
        Ok(())
    }

    fn node_kind(&self, node: NodeRef) -> Result<NodeKind, DomError> {
        self.node(node)
            .map(|n| kind_of(&n.data))
            .ok_or(DomError::UnknownNode(node))
    }

    fn deep_clone(&mut self, node: NodeRef) -> Result<NodeRef, DomError> {
        self.clone_subtree(node).ok_or(DomError::UnknownNode(node))
    }

    fn attach_offscreen(&mut self, node: NodeRef) -> Result<(), DomError> {
        self.node(node).ok_or(DomError::UnknownNode(node))?;
        self.unlink(node);
        self.link(self.body, node);
        Ok(())
    }

    fn detach(&mut self, node: NodeRef) -> Result<(), DomError> {
        self.node(node).ok_or(DomError::UnknownNode(node))?;
        self.unlink(node);
        Ok(())
    }

    fn release(&mut self, node: NodeRef) {
        if self.node(node).is_none() || node == self.document || node == self.body {
            return;
        }
        self.unlink(node);
        let mut doomed = self.descendants(node);
        doomed.push(node);
        for id in doomed {
            if let Some(slot) = self.nodes.get_mut(id.0 as usize) {
                *slot = None;
            }
        }
        for root in self.observers.iter_mut() {
            if root.is_some_and(|r| self.nodes[r.0 as usize].is_none()) {
                *root = None;
            }
        }
    }

    fn client_size(&self, node: NodeRef) -> Result<PixelSize, DomError> {
        let rect = self.bounding_rect(node)?;
        Ok(PixelSize::new(
            rect.width.round() as u32,
            rect.height.round() as u32,
        ))
    }

    fn bounding_rect(&self, node: NodeRef) -> Result<PixelRect, DomError> {
        self.node(node).ok_or(DomError::UnknownNode(node))?;
        if !self.is_in_document(node) {
            return Err(DomError::Detached(node));
        }
        let Some(root) = self.layout_root(node) else {
            // The body and document have no content box of their own here.
            return Ok(PixelRect::default());
        };
        Ok(self.layout(root).get(&node).copied().unwrap_or_default())
    }

    fn attribute(&self, node: NodeRef, name: &str) -> Option<String> {
        match &self.node(node)?.data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn query_attribute(&self, root: NodeRef, name: &str) -> Vec<NodeRef> {
        self.descendants(root)
            .into_iter()
            .filter(|n| self.attribute(*n, name).is_some())
            .collect()
    }

    fn images(&self, root: NodeRef) -> Vec<NodeRef> {
        self.descendants(root)
            .into_iter()
            .filter(|n| self.tag_name(*n) == Some("img"))
            .collect()
    }

    fn image_state(&self, image_node: NodeRef) -> ImageState {
        match self.node(image_node).map(|n| &n.data) {
            Some(NodeData::Element {
                image: Some(state), ..
            }) => *state,
            // Anything that is not a live image cannot hold the barrier.
            _ => ImageState::Errored,
        }
    }

    fn observe(&mut self, root: NodeRef) -> Result<ObserverId, DomError> {
        self.node(root).ok_or(DomError::UnknownNode(root))?;
        let id = ObserverId(self.observers.len() as u32);
        self.observers.push(Some(root));
        Ok(id)
    }

    fn disconnect(&mut self, observer: ObserverId) {
        if let Some(slot) = self.observers.get_mut(observer.0 as usize) {
            *slot = None;
        }
        self.mutations.retain(|id| *id != observer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached(doc: &mut MemoryDocument, markup: &str) -> NodeRef {
        let wrapper = doc.create_wrapper();
        doc.set_inner_markup(wrapper, markup).unwrap();
        doc.attach_offscreen(wrapper).unwrap();
        wrapper
    }

    #[test]
    fn nested_markup_builds_tree() {
        let mut doc = MemoryDocument::new();
        let wrapper = doc.create_wrapper();
        doc.set_inner_markup(wrapper, "<div><p>a<b>b</b></p><img src=x.png>c</div>")
            .unwrap();
        assert_eq!(doc.text_content(wrapper), "abc");
        assert_eq!(doc.images(wrapper).len(), 1);
        assert_eq!(doc.attribute(wrapper, "style").as_deref(), Some(WRAPPER_STYLE));
    }

    #[test]
    fn layout_stacks_children_vertically() {
        let mut doc = MemoryDocument::new();
        let wrapper = attached(
            &mut doc,
            r#"<button method="save" width="120" height="40">Save</button><p>hello</p>"#,
        );
        assert_eq!(doc.client_size(wrapper).unwrap(), PixelSize::new(120, 56));

        let button = doc.query_attribute(wrapper, "method")[0];
        let rect = doc.bounding_rect(button).unwrap();
        assert_eq!(rect, PixelRect::from_origin_size(0.0, 0.0, 120.0, 40.0));

        let text_width = 5.0 * TEXT_ADVANCE;
        let p = doc.descendants(wrapper)[2];
        assert_eq!(doc.tag_name(p), Some("p"));
        assert_eq!(
            doc.bounding_rect(p).unwrap(),
            PixelRect::from_origin_size(0.0, 40.0, text_width, LINE_HEIGHT)
        );
    }

    #[test]
    fn detached_nodes_do_not_measure() {
        let mut doc = MemoryDocument::new();
        let wrapper = doc.create_wrapper();
        doc.set_inner_markup(wrapper, "<p>x</p>").unwrap();
        assert_eq!(doc.client_size(wrapper), Err(DomError::Detached(wrapper)));
    }

    #[test]
    fn deep_clone_is_independent() {
        let mut doc = MemoryDocument::new();
        let wrapper = doc.create_wrapper();
        doc.set_inner_markup(wrapper, r#"<a method="go">go</a>"#).unwrap();
        let clone = doc.deep_clone(wrapper).unwrap();
        assert_ne!(clone, wrapper);
        assert_eq!(doc.parent(clone), None);

        let original = doc.query_attribute(wrapper, "method")[0];
        doc.set_attribute(original, "method", "stop").unwrap();
        let copied = doc.query_attribute(clone, "method")[0];
        assert_eq!(doc.attribute(copied, "method").as_deref(), Some("go"));
    }

    #[test]
    fn release_frees_subtree() {
        let mut doc = MemoryDocument::new();
        let before = doc.live_nodes();
        let wrapper = attached(&mut doc, "<div><span>x</span></div>");
        doc.release(wrapper);
        assert_eq!(doc.live_nodes(), before);
        assert!(doc.attached().is_empty());
    }

    #[test]
    fn image_states_follow_sources() {
        let mut doc = MemoryDocument::new();
        let wrapper = doc.create_wrapper();
        doc.set_inner_markup(wrapper, r#"<img src="a.png"><img src="b.png">"#)
            .unwrap();
        let images = doc.images(wrapper);
        assert!(images.iter().all(|i| doc.image_state(*i) == ImageState::Pending));

        let settled = doc.resolve_source("a.png", true);
        assert_eq!(settled, vec![images[0]]);
        assert_eq!(doc.image_state(images[0]), ImageState::Loaded);

        doc.settle_image(images[1], false).unwrap();
        assert_eq!(doc.image_state(images[1]), ImageState::Errored);

        // Cached sources are loaded on creation.
        let later = doc.create_from_markup(r#"<img src="a.png">"#).unwrap();
        assert_eq!(doc.image_state(later), ImageState::Loaded);
    }

    #[test]
    fn observers_see_subtree_changes_only() {
        let mut doc = MemoryDocument::new();
        let watched = doc.create_wrapper();
        doc.set_inner_markup(watched, "<span>a</span>").unwrap();
        let other = doc.create_wrapper();
        let observer = doc.observe(watched).unwrap();

        doc.set_attribute(other, "class", "x").unwrap();
        assert!(doc.take_mutations().is_empty());

        let span = doc.descendants(watched)[0];
        doc.set_attribute(span, "class", "x").unwrap();
        doc.set_inner_markup(span, "b").unwrap();
        assert_eq!(doc.take_mutations(), vec![observer]);

        doc.disconnect(observer);
        doc.set_attribute(span, "class", "y").unwrap();
        assert!(doc.take_mutations().is_empty());
    }

    #[test]
    fn node_kinds() {
        let mut doc = MemoryDocument::new();
        let text = doc.create_text("x");
        let comment = doc.create_comment("c");
        assert_eq!(doc.node_kind(text), Ok(NodeKind::Text));
        assert_eq!(doc.node_kind(comment), Ok(NodeKind::Comment));
        assert_eq!(doc.node_kind(doc.document_node()), Ok(NodeKind::Document));
        assert_eq!(doc.node_kind(NodeRef(999)), Err(DomError::UnknownNode(NodeRef(999))));
    }
}
