//! Content accepted by a panel and its conversion into a wrapper tree.

use crate::error::PanelError;
use serde_json::Value;
use webplane_dom::{Document, NodeKind, NodeRef};

/// HTML content handed to a panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Markup assigned as the wrapper's inner HTML.
    Markup(String),
    /// Markup strings concatenated before assignment.
    Fragments(Vec<String>),
    /// An existing element, moved into the wrapper.
    Node(NodeRef),
}

impl From<&str> for ContentSource {
    fn from(markup: &str) -> Self {
        ContentSource::Markup(markup.to_string())
    }
}

impl From<String> for ContentSource {
    fn from(markup: String) -> Self {
        ContentSource::Markup(markup)
    }
}

impl From<Vec<String>> for ContentSource {
    fn from(fragments: Vec<String>) -> Self {
        ContentSource::Fragments(fragments)
    }
}

impl From<NodeRef> for ContentSource {
    fn from(node: NodeRef) -> Self {
        ContentSource::Node(node)
    }
}

impl TryFrom<Value> for ContentSource {
    type Error = PanelError;

    /// Strings and arrays of strings are content; anything else is not.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(markup) => Ok(ContentSource::Markup(markup)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(fragment) => Ok(fragment),
                    other => Err(PanelError::InvalidContentKind {
                        found: format!("array containing {}", json_kind(&other)),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(ContentSource::Fragments),
            other => Err(PanelError::InvalidContentKind {
                found: json_kind(&other).to_string(),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ContentSource {
    /// Reject empty content and nodes that are not elements.
    pub fn validate(&self, document: &dyn Document) -> Result<(), PanelError> {
        match self {
            ContentSource::Markup(markup) if markup.trim().is_empty() => {
                Err(PanelError::EmptyContent)
            }
            ContentSource::Fragments(fragments)
                if fragments.iter().all(|f| f.trim().is_empty()) =>
            {
                Err(PanelError::EmptyContent)
            }
            ContentSource::Node(node) => match document.node_kind(*node)? {
                NodeKind::Element => Ok(()),
                kind => Err(PanelError::InvalidContentKind {
                    found: format!("{} node", kind.label()),
                }),
            },
            _ => Ok(()),
        }
    }

    /// Build a detached wrapper holding this content.
    pub fn build(self, document: &mut dyn Document) -> Result<NodeRef, PanelError> {
        let wrapper = document.create_wrapper();
        let filled = match self {
            ContentSource::Markup(markup) => document.set_inner_markup(wrapper, &markup),
            ContentSource::Fragments(fragments) => {
                document.set_inner_markup(wrapper, &fragments.concat())
            }
            ContentSource::Node(node) => document.append_child(wrapper, node),
        };
        if let Err(err) = filled {
            document.release(wrapper);
            return Err(err.into());
        }
        Ok(wrapper)
    }
}
