//! Headless panel harness.
//!
//! Owns a [`MemoryDocument`], a [`Scene`] with an attached
//! [`PointerDispatcher`], a [`ScriptedRasterizer`] and a deterministic clock.
//! Tests drive every asynchronous step explicitly: advancing time, settling
//! images, completing rasterizer jobs and clicking.

use crate::rasterizer::ScriptedRasterizer;
use glam::Vec3;
use tracing::debug;
use webplane_core::{Bitmap, Millis};
use webplane_dom::MemoryDocument;
use webplane_scene::{Camera, NodeId, Scene, SceneGraph};
use webplane_ui3d::{
    ClickResult, ContentSource, MethodTable, PanelEnv, PanelError, PanelManager, PanelOptions,
    PointerDispatcher, PointerEvent, RasterRequest, RasterizeError, SurfacePanel,
};

/// Fill color of bitmaps produced by [`Harness::complete_next`].
pub const HARNESS_FILL: [u8; 4] = [255, 255, 255, 255];

/// Everything a panel needs, wired together.
pub struct Harness {
    /// Document holding content trees and offscreen clones.
    pub document: MemoryDocument,
    /// Scene graph panels and the reticle live in.
    pub scene: Scene,
    /// Rasterizer whose completions the test triggers.
    pub rasterizer: ScriptedRasterizer,
    /// Registered panels.
    pub panels: PanelManager,
    /// Pointer dispatcher, attached to the scene camera.
    pub dispatcher: PointerDispatcher,
    /// Current host time.
    pub now: Millis,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Fresh harness at `t = 0` with the camera at the origin looking down -Z.
    pub fn new() -> Self {
        let mut scene = Scene::new();
        let mut dispatcher = PointerDispatcher::new();
        dispatcher.attach(&mut scene);
        Self {
            document: MemoryDocument::new(),
            scene,
            rasterizer: ScriptedRasterizer::new(),
            panels: PanelManager::new(),
            dispatcher,
            now: Millis::ZERO,
        }
    }

    /// Borrow the collaborators as a panel environment.
    pub fn env(&mut self) -> PanelEnv<'_> {
        PanelEnv::new(&mut self.document, &mut self.scene, &mut self.rasterizer)
    }

    /// Create a panel, register it and place it at `position`.
    pub fn spawn(
        &mut self,
        content: impl Into<ContentSource>,
        methods: MethodTable,
        options: PanelOptions,
        position: Vec3,
    ) -> Result<NodeId, PanelError> {
        let now = self.now;
        let panel = SurfacePanel::new(&mut self.env(), now, content, methods, options)?;
        let node = self.panels.add(&mut self.scene, panel);
        self.scene.set_position(node, position);
        Ok(node)
    }

    /// Look up a registered panel.
    ///
    /// # Panics
    /// If `node` is not a registered panel.
    pub fn panel(&self, node: NodeId) -> &SurfacePanel {
        self.panels
            .get(node)
            .unwrap_or_else(|| panic!("no panel at {node:?}"))
    }

    /// Submit new content to a panel at the current time.
    pub fn submit(
        &mut self,
        node: NodeId,
        content: impl Into<ContentSource>,
    ) -> Result<webplane_ui3d::Submission, PanelError> {
        let now = self.now;
        let mut env = PanelEnv::new(&mut self.document, &mut self.scene, &mut self.rasterizer);
        match self.panels.get_mut(node) {
            Some(panel) => panel.submit_content(&mut env, now, content),
            None => panic!("no panel at {node:?}"),
        }
    }

    /// Advance the clock by `ms` and tick every panel.
    pub fn advance(&mut self, ms: u64) {
        self.now = self.now.advance(ms);
        let now = self.now;
        let mut env = PanelEnv::new(&mut self.document, &mut self.scene, &mut self.rasterizer);
        self.panels.tick(&mut env, now);
    }

    /// Complete the oldest rasterizer request with a solid bitmap.
    pub fn complete_next(&mut self) -> Option<RasterRequest> {
        let request = self.rasterizer.take_next()?;
        let bitmap = Bitmap::solid(request.size, HARNESS_FILL);
        self.deliver(request, Ok(bitmap));
        Some(request)
    }

    /// Fail the oldest rasterizer request.
    pub fn fail_next(&mut self, reason: &str) -> Option<RasterRequest> {
        let request = self.rasterizer.take_next()?;
        self.deliver(request, Err(RasterizeError::Failed(reason.to_string())));
        Some(request)
    }

    /// Complete requests until none are left, including ones queued by the
    /// completions themselves. Returns how many completed.
    pub fn complete_all(&mut self) -> usize {
        let mut completed = 0;
        while self.complete_next().is_some() {
            completed += 1;
        }
        completed
    }

    /// Deliver a completion for an arbitrary request.
    pub fn deliver(&mut self, request: RasterRequest, result: Result<Bitmap, RasterizeError>) -> bool {
        let mut env = PanelEnv::new(&mut self.document, &mut self.scene, &mut self.rasterizer);
        self.panels
            .on_bitmap_ready(&mut env, request.panel, request.job, result)
    }

    /// Finish loading every image with `src`. Returns how many images settled.
    pub fn resolve_image(&mut self, src: &str, ok: bool) -> usize {
        let settled = self.document.resolve_source(src, ok);
        let mut env = PanelEnv::new(&mut self.document, &mut self.scene, &mut self.rasterizer);
        for image in &settled {
            self.panels.on_image_settled(&mut env, *image);
        }
        settled.len()
    }

    /// Route pending mutation notices to their panels.
    pub fn flush_mutations(&mut self) -> usize {
        let observers = self.document.take_mutations();
        let now = self.now;
        let mut env = PanelEnv::new(&mut self.document, &mut self.scene, &mut self.rasterizer);
        self.panels.deliver_mutations(&mut env, now, &observers)
    }

    /// Point the camera from `position` at `target`.
    pub fn aim(&mut self, position: Vec3, target: Vec3) {
        self.scene.set_camera(&Camera::looking_at(position, target));
    }

    /// Feed one pointer event through the dispatcher.
    pub fn pointer(&mut self, event: PointerEvent) -> Option<ClickResult> {
        self.dispatcher
            .handle(&mut self.scene, &mut self.panels, event)
    }

    /// Press and release without moving.
    pub fn click(&mut self) -> Option<ClickResult> {
        self.pointer(PointerEvent::Down);
        let result = self.pointer(PointerEvent::Up);
        debug!(?result, at = self.now.0, "harness click");
        result
    }
}
