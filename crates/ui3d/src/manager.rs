//! Panel registry: routes host completions to the panel they belong to.

use crate::components::{DispatchOutcome, SurfacePanel};
use crate::env::PanelEnv;
use crate::error::RasterizeError;
use crate::render::JobId;
use glam::Vec3;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use webplane_core::{Bitmap, Millis};
use webplane_dom::{NodeRef, ObserverId};
use webplane_scene::{NodeId, SceneGraph};

/// Every live panel, keyed by its scene node.
#[derive(Debug, Default)]
pub struct PanelManager {
    panels: BTreeMap<NodeId, SurfacePanel>,
}

impl PanelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `panel` and attach it below the scene root.
    pub fn add(&mut self, scene: &mut dyn SceneGraph, panel: SurfacePanel) -> NodeId {
        let root = scene.root();
        self.add_to(scene, root, panel)
    }

    /// Register `panel` and attach it below `parent`.
    pub fn add_to(&mut self, scene: &mut dyn SceneGraph, parent: NodeId, panel: SurfacePanel) -> NodeId {
        let node = panel.node();
        scene.add_child(parent, node);
        debug!(panel = ?node, ?parent, "panel added");
        self.panels.insert(node, panel);
        node
    }

    /// Unregister and dispose a panel.
    pub fn remove(&mut self, env: &mut PanelEnv<'_>, node: NodeId) -> bool {
        match self.panels.remove(&node) {
            Some(panel) => {
                panel.dispose(env);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&SurfacePanel> {
        self.panels.get(&node)
    }

    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut SurfacePanel> {
        self.panels.get_mut(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.panels.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &SurfacePanel)> {
        self.panels.iter()
    }

    /// Advance every panel's clock.
    pub fn tick(&mut self, env: &mut PanelEnv<'_>, now: Millis) {
        for panel in self.panels.values_mut() {
            panel.tick(env, now);
        }
    }

    /// Earliest throttled render deadline across panels.
    pub fn next_due(&self) -> Option<Millis> {
        self.panels.values().filter_map(SurfacePanel::next_due).min()
    }

    /// Re-render every panel whose observer saw a change. Returns how many
    /// panels were notified.
    pub fn deliver_mutations(
        &mut self,
        env: &mut PanelEnv<'_>,
        now: Millis,
        observers: &[ObserverId],
    ) -> usize {
        let mut notified = 0;
        for panel in self.panels.values_mut() {
            if panel.observer().is_some_and(|o| observers.contains(&o)) {
                panel.on_mutation(env, now);
                notified += 1;
            }
        }
        notified
    }

    /// Forward an image settlement to whichever panel is waiting on it.
    pub fn on_image_settled(&mut self, env: &mut PanelEnv<'_>, image: NodeRef) -> bool {
        self.panels
            .values_mut()
            .any(|panel| panel.on_image_settled(env, image))
    }

    /// Forward a rasterizer completion.
    pub fn on_bitmap_ready(
        &mut self,
        env: &mut PanelEnv<'_>,
        panel: NodeId,
        job: JobId,
        result: Result<Bitmap, RasterizeError>,
    ) -> bool {
        match self.panels.get_mut(&panel) {
            Some(target) => target.on_bitmap_ready(env, job, result),
            None => {
                warn!(?panel, job = %job, "completion for an unknown panel");
                false
            }
        }
    }

    /// Click a panel directly at a world-space point.
    pub fn dispatch_click(
        &mut self,
        scene: &mut dyn SceneGraph,
        panel: NodeId,
        world_point: Vec3,
    ) -> Option<DispatchOutcome> {
        self.panels
            .get_mut(&panel)
            .map(|target| target.dispatch_click(scene, world_point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::MethodTable;
    use crate::options::PanelOptions;
    use crate::render::{RasterRequest, Rasterizer};
    use webplane_dom::MemoryDocument;
    use webplane_scene::Scene;

    #[derive(Default)]
    struct Requests(Vec<RasterRequest>);

    impl Rasterizer for Requests {
        fn rasterize(&mut self, request: RasterRequest) -> Result<(), RasterizeError> {
            self.0.push(request);
            Ok(())
        }
    }

    #[test]
    fn completions_route_by_panel_node() {
        let mut document = MemoryDocument::new();
        let mut scene = Scene::new();
        let mut rasterizer = Requests::default();
        let mut manager = PanelManager::new();

        let options = PanelOptions::default().with_throttle(None);
        let mut env = PanelEnv::new(&mut document, &mut scene, &mut rasterizer);
        let a = SurfacePanel::new(&mut env, Millis::ZERO, "<p>a</p>", MethodTable::new(), options.clone()).unwrap();
        let b = SurfacePanel::new(&mut env, Millis::ZERO, "<p>bb</p>", MethodTable::new(), options).unwrap();
        let a = manager.add(env.scene, a);
        let b = manager.add(env.scene, b);
        assert_eq!(env.scene.parent(a), Some(env.scene.root()));
        drop(env);

        let requests = std::mem::take(&mut rasterizer.0);
        assert_eq!(requests.len(), 2);
        let mut env = PanelEnv::new(&mut document, &mut scene, &mut rasterizer);
        for request in &requests {
            let bitmap = Bitmap::solid(request.size, [0, 0, 0, 255]);
            assert!(manager.on_bitmap_ready(&mut env, request.panel, request.job, Ok(bitmap)));
        }
        assert_eq!(manager.get(a).unwrap().geometry().unwrap().pixels.width, 8);
        assert_eq!(manager.get(b).unwrap().geometry().unwrap().pixels.width, 16);
        assert!(!manager.on_bitmap_ready(&mut env, NodeId(999), JobId(1), Err(RasterizeError::Failed("x".into()))));

        assert!(manager.remove(&mut env, a));
        assert!(!manager.contains(a));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn mutations_reach_observing_panels_only() {
        let mut document = MemoryDocument::new();
        let mut scene = Scene::new();
        let mut rasterizer = Requests::default();
        let mut manager = PanelManager::new();

        let mut env = PanelEnv::new(&mut document, &mut scene, &mut rasterizer);
        let watching = SurfacePanel::new(
            &mut env,
            Millis::ZERO,
            "<p>a</p>",
            MethodTable::new(),
            PanelOptions::default().with_observe_mutations(true),
        )
        .unwrap();
        let observer = watching.observer().unwrap();
        let plain = SurfacePanel::new(&mut env, Millis::ZERO, "<p>b</p>", MethodTable::new(), PanelOptions::default()).unwrap();
        let watching = manager.add(env.scene, watching);
        manager.add(env.scene, plain);

        assert_eq!(manager.deliver_mutations(&mut env, Millis(10), &[observer]), 1);
        assert_eq!(manager.get(watching).unwrap().next_due(), Some(Millis(250)));
        assert_eq!(manager.next_due(), Some(Millis(250)));
    }
}
