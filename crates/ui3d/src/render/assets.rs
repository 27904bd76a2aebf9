use webplane_dom::{Document, NodeRef};

/// Join over the images a render job is still waiting for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBarrier {
    pending: Vec<NodeRef>,
}

impl AssetBarrier {
    /// Barrier over every image below `root` that has not settled yet.
    pub fn for_subtree(document: &dyn Document, root: NodeRef) -> Self {
        let pending = document
            .images(root)
            .into_iter()
            .filter(|image| !document.image_state(*image).is_settled())
            .collect();
        Self { pending }
    }

    /// Mark `image` settled. Returns true if the barrier was waiting on it.
    pub fn settle(&mut self, image: NodeRef) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| *p != image);
        before != self.pending.len()
    }

    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Stop waiting on everything, returning what was still pending.
    pub fn release_all(&mut self) -> Vec<NodeRef> {
        std::mem::take(&mut self.pending)
    }
}
