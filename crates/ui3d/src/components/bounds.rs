//! Clickable regions of rendered content.

use glam::Vec2;
use tracing::warn;
use webplane_core::PixelRect;
use webplane_dom::{Document, DomError, NodeRef};

/// Attribute that marks an element as interactive; its value names the
/// callback in the panel's method table.
pub const METHOD_ATTRIBUTE: &str = "method";

/// Pixel rectangle of one interactive element.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonBound {
    pub rect: PixelRect,
    pub method: String,
    /// Live element the bound stands for.
    pub source: NodeRef,
}

/// Measure every interactive element of the attached `clone`, pairing them
/// by document order with the live `sources` they were cloned from.
pub fn compute_button_bounds(
    document: &dyn Document,
    clone: NodeRef,
    sources: &[NodeRef],
) -> Result<Vec<ButtonBound>, DomError> {
    let elements = document.query_attribute(clone, METHOD_ATTRIBUTE);
    if elements.len() != sources.len() {
        warn!(
            cloned = elements.len(),
            live = sources.len(),
            "interactive elements differ between snapshot and live tree"
        );
    }
    elements
        .into_iter()
        .zip(sources.iter().copied())
        .map(|(element, source)| {
            Ok(ButtonBound {
                rect: document.bounding_rect(element)?,
                method: document.attribute(element, METHOD_ATTRIBUTE).unwrap_or_default(),
                source,
            })
        })
        .collect()
}

/// First bound containing `pixel`, in document order.
pub fn hit_test(bounds: &[ButtonBound], pixel: Vec2) -> Option<&ButtonBound> {
    bounds.iter().find(|b| b.rect.contains(pixel.x, pixel.y))
}
