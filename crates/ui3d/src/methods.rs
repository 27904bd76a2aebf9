//! Named click callbacks.

use glam::Vec2;
use std::collections::HashMap;
use std::fmt;
use webplane_dom::NodeRef;
use webplane_scene::NodeId;

/// Everything a click callback gets to see.
///
/// Callbacks capture their own state; the panel identifies itself through
/// `panel` instead of being bound as a receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickContext {
    /// Scene node of the panel that was clicked.
    pub panel: NodeId,
    /// Live element that declared the method.
    pub element: NodeRef,
    /// Method identifier.
    pub method: String,
    /// Click position in content pixels.
    pub pixel: Vec2,
}

type Callback = Box<dyn FnMut(&ClickContext)>;

/// Identifier → callback table, fixed once a panel is built.
#[derive(Default)]
pub struct MethodTable {
    methods: HashMap<String, Callback>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register `callback` under `name`.
    pub fn with(mut self, name: impl Into<String>, callback: impl FnMut(&ClickContext) + 'static) -> Self {
        self.methods.insert(name.into(), Box::new(callback));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Invoke `context.method`; false when no such method is registered.
    pub(crate) fn invoke(&mut self, context: &ClickContext) -> bool {
        match self.methods.get_mut(&context.method) {
            Some(callback) => {
                callback(context);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.methods.keys().collect();
        names.sort();
        f.debug_struct("MethodTable").field("methods", &names).finish()
    }
}
