//! A plane in the scene showing rendered HTML.
//!
//! The panel owns its content tree and a FIFO of render jobs. Each job is a
//! deep clone of the tree taken when the render was requested; it is
//! attached to the document's offscreen root, waits for its images, gets
//! measured and is handed to the [`Rasterizer`](crate::render::Rasterizer).
//! The bitmap comes back through [`SurfacePanel::on_bitmap_ready`], which
//! swaps the displayed [`RenderedFrame`] and starts the next job.
//!
//! Only one job is live at a time, so the offscreen root holds at most one
//! clone per panel and a slow job can never overwrite a newer frame.

use super::bounds::{compute_button_bounds, hit_test, ButtonBound, METHOD_ATTRIBUTE};
use super::content::ContentSource;
use crate::env::PanelEnv;
use crate::error::{PanelError, RasterizeError};
use crate::methods::{ClickContext, MethodTable};
use crate::options::PanelOptions;
use crate::render::{
    AssetBarrier, JobId, JobStage, PanelGeometry, PanelMesh, PendingRender, PipelineStatus,
    RasterRequest, RenderJob, RenderPipeline, Throttle, Throttled,
};
use glam::{Vec2, Vec3};
use std::fmt;
use tracing::{debug, error, trace, warn};
use webplane_core::{Bitmap, Millis, PixelSize};
use webplane_dom::{Document, NodeRef, ObserverId};
use webplane_scene::{MarkerDesc, MaterialDesc, NodeId, PlaneDesc, PlaneGeometry, SceneGraph};

const DEBUG_MARKER_RADIUS: f32 = 0.05;
const DEBUG_MARKER_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

/// What happened to a content submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Built and queued for rendering.
    Queued(JobId),
    /// Held by the throttle; runs on the first `tick` at or after `until`.
    Deferred { until: Millis },
}

/// Result of routing a click to a panel.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A callback ran.
    Invoked { method: String, element: NodeRef },
    /// The hit element names a method the panel does not have.
    UnknownMethod { method: String },
    /// No interactive element under the point.
    Miss { pixel: Vec2 },
    /// Nothing has been rendered yet.
    NotRendered,
}

/// Everything one completed job produced. Replaced as a whole.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub job: JobId,
    /// Content tree the frame was rendered from; bound sources live in it.
    pub tree: NodeRef,
    pub bitmap: Bitmap,
    pub bounds: Vec<ButtonBound>,
    pub geometry: PanelGeometry,
}

type ErrorHandler = Box<dyn FnMut(&PanelError)>;

pub struct SurfacePanel {
    node: NodeId,
    options: PanelOptions,
    methods: MethodTable,
    tree: Option<NodeRef>,
    observer: Option<ObserverId>,
    /// Replaced trees still referenced by the frame or a queued job.
    retired: Vec<NodeRef>,
    throttle: Throttle<PendingRender>,
    pipeline: RenderPipeline,
    frame: Option<RenderedFrame>,
    mesh: Option<PanelMesh>,
    /// Last host time seen; stamps jobs started from completions.
    clock: Millis,
    error_handler: Option<ErrorHandler>,
}

impl SurfacePanel {
    /// Create a panel node and submit the initial content.
    ///
    /// The node is not attached anywhere; add it to the scene (or register
    /// the panel with a [`PanelManager`](crate::PanelManager)) to show it.
    pub fn new(
        env: &mut PanelEnv<'_>,
        now: Millis,
        content: impl Into<ContentSource>,
        methods: MethodTable,
        options: PanelOptions,
    ) -> Result<Self, PanelError> {
        Self::build(env, now, content.into(), methods, options, None)
    }

    /// Like [`SurfacePanel::new`], with every reported error forwarded to
    /// `handler`. The handler is installed before the first render starts,
    /// so a failure of the initial job reaches it too.
    pub fn with_error_handler(
        env: &mut PanelEnv<'_>,
        now: Millis,
        content: impl Into<ContentSource>,
        methods: MethodTable,
        options: PanelOptions,
        handler: impl FnMut(&PanelError) + 'static,
    ) -> Result<Self, PanelError> {
        Self::build(env, now, content.into(), methods, options, Some(Box::new(handler)))
    }

    fn build(
        env: &mut PanelEnv<'_>,
        now: Millis,
        content: ContentSource,
        methods: MethodTable,
        options: PanelOptions,
        error_handler: Option<ErrorHandler>,
    ) -> Result<Self, PanelError> {
        let node = env.scene.create_group();
        let mut panel = Self {
            node,
            throttle: Throttle::new(options.throttle_interval_ms.interval_ms()),
            options,
            methods,
            tree: None,
            observer: None,
            retired: Vec::new(),
            pipeline: RenderPipeline::new(),
            frame: None,
            mesh: None,
            clock: now,
            error_handler,
        };
        if let Err(err) = panel.submit_content(env, now, content) {
            env.scene.dispose_mesh(node);
            return Err(err);
        }
        Ok(panel)
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn options(&self) -> &PanelOptions {
        &self.options
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// Current content tree.
    pub fn tree(&self) -> Option<NodeRef> {
        self.tree
    }

    pub fn frame(&self) -> Option<&RenderedFrame> {
        self.frame.as_ref()
    }

    pub fn mesh(&self) -> Option<PanelMesh> {
        self.mesh
    }

    pub fn geometry(&self) -> Option<PanelGeometry> {
        self.frame.as_ref().map(|f| f.geometry)
    }

    pub fn bounds(&self) -> &[ButtonBound] {
        self.frame.as_ref().map(|f| f.bounds.as_slice()).unwrap_or(&[])
    }

    pub fn observer(&self) -> Option<ObserverId> {
        self.observer
    }

    pub fn status(&self) -> PipelineStatus {
        self.pipeline.status()
    }

    /// When the throttled render becomes due, if one is waiting.
    pub fn next_due(&self) -> Option<Millis> {
        self.throttle.next_due()
    }

    /// Place the panel in its parent's frame.
    pub fn set_position(&self, scene: &mut dyn SceneGraph, position: Vec3) {
        scene.set_position(self.node, position);
    }

    /// Replace the panel content.
    ///
    /// Invalid content is reported and rejected without touching the
    /// current tree, queue or frame.
    pub fn submit_content(
        &mut self,
        env: &mut PanelEnv<'_>,
        now: Millis,
        content: impl Into<ContentSource>,
    ) -> Result<Submission, PanelError> {
        self.clock = now;
        let content = content.into();
        if let Err(err) = content.validate(&*env.document) {
            self.report_error(&err);
            return Err(err);
        }
        match self
            .throttle
            .submit_with(now, PendingRender::Content(content), PendingRender::merge)
        {
            Throttled::Run(item) => self.run(env, item).map(Submission::Queued),
            Throttled::Deferred { until } => {
                debug!(panel = ?self.node, until = until.0, "content submission throttled");
                Ok(Submission::Deferred { until })
            }
        }
    }

    /// Re-render the current tree after it changed in place.
    ///
    /// Goes through the same throttle as content submissions. Returns `None`
    /// when there is no tree or the re-render failed to start.
    pub fn on_mutation(&mut self, env: &mut PanelEnv<'_>, now: Millis) -> Option<Submission> {
        self.clock = now;
        self.tree?;
        match self
            .throttle
            .submit_with(now, PendingRender::Refresh, PendingRender::merge)
        {
            Throttled::Run(item) => self.run(env, item).ok().map(Submission::Queued),
            Throttled::Deferred { until } => Some(Submission::Deferred { until }),
        }
    }

    /// Advance time: release the throttled render and expire stalled assets.
    pub fn tick(&mut self, env: &mut PanelEnv<'_>, now: Millis) {
        self.clock = now;
        self.expire_assets(now);
        if let Some(item) = self.throttle.poll(now) {
            if let Err(err) = self.run(env, item) {
                debug!(panel = ?self.node, %err, "throttled render dropped");
            }
        }
        self.process_queue(env);
    }

    /// An image finished loading or failed. Returns true if the live job
    /// was waiting for it.
    pub fn on_image_settled(&mut self, env: &mut PanelEnv<'_>, image: NodeRef) -> bool {
        let Some(live) = self.pipeline.live_mut() else {
            return false;
        };
        let JobStage::AwaitingAssets { barrier, .. } = &mut live.stage else {
            return false;
        };
        if !barrier.settle(image) {
            return false;
        }
        trace!(panel = ?self.node, ?image, remaining = barrier.pending_count(), "image settled");
        self.process_queue(env);
        true
    }

    /// Rasterizer completion for `job`.
    ///
    /// Completions for anything but the job currently rasterizing are
    /// logged and ignored. Returns true if the completion was applied.
    pub fn on_bitmap_ready(
        &mut self,
        env: &mut PanelEnv<'_>,
        job: JobId,
        result: Result<Bitmap, RasterizeError>,
    ) -> bool {
        let rasterizing = matches!(
            self.pipeline.live(),
            Some(live) if live.job.id == job && matches!(live.stage, JobStage::Rasterizing { .. })
        );
        if !rasterizing {
            warn!(panel = ?self.node, job = %job, "ignoring completion for a job that is not rasterizing");
            return false;
        }
        let outcome = result.map_err(|source| PanelError::Rasterize { job, source });
        self.finish_job(env, job, outcome);
        self.process_queue(env);
        true
    }

    /// Map a world-space point on the panel to content pixels and run the
    /// first interactive element's callback under it.
    pub fn dispatch_click(&mut self, scene: &mut dyn SceneGraph, world_point: Vec3) -> DispatchOutcome {
        let (Some(frame), Some(mesh)) = (&self.frame, self.mesh) else {
            debug!(panel = ?self.node, "click on a panel with nothing rendered");
            return DispatchOutcome::NotRendered;
        };
        let local = scene.world_to_local(mesh.node, world_point);
        if self.options.debug {
            let marker = scene.create_marker(MarkerDesc {
                radius: DEBUG_MARKER_RADIUS,
                color: DEBUG_MARKER_COLOR,
                position: local,
            });
            scene.add_child(mesh.node, marker);
        }

        let pixel = frame.geometry.local_to_pixel(local);
        let Some(bound) = hit_test(&frame.bounds, pixel) else {
            debug!(panel = ?self.node, x = pixel.x, y = pixel.y, "click missed every button");
            return DispatchOutcome::Miss { pixel };
        };
        let context = ClickContext {
            panel: self.node,
            element: bound.source,
            method: bound.method.clone(),
            pixel,
        };
        if self.methods.invoke(&context) {
            debug!(panel = ?self.node, method = %context.method, "button clicked");
            DispatchOutcome::Invoked {
                method: context.method,
                element: context.element,
            }
        } else {
            debug!(panel = ?self.node, method = %context.method, "no callback for method");
            DispatchOutcome::UnknownMethod {
                method: context.method,
            }
        }
    }

    /// Tear down every document and scene resource the panel holds.
    pub fn dispose(mut self, env: &mut PanelEnv<'_>) {
        for job in self.pipeline.drain() {
            if let Err(err) = env.document.detach(job.snapshot) {
                trace!(%err, "snapshot was not attached");
            }
            env.document.release(job.snapshot);
        }
        if let Some(observer) = self.observer.take() {
            env.document.disconnect(observer);
        }
        if let Some(mesh) = self.mesh.take() {
            env.scene.remove_child(self.node, mesh.node);
            env.scene.dispose_mesh(mesh.node);
            env.scene.dispose_texture(mesh.texture);
        }
        if let Some(parent) = env.scene.parent(self.node) {
            env.scene.remove_child(parent, self.node);
        }
        env.scene.dispose_mesh(self.node);
        self.frame = None;
        for tree in self.tree.take().into_iter().chain(self.retired.drain(..)) {
            env.document.release(tree);
        }
        debug!(panel = ?self.node, "panel disposed");
    }

    fn run(&mut self, env: &mut PanelEnv<'_>, item: PendingRender) -> Result<JobId, PanelError> {
        match self.execute(env, item) {
            Ok(job) => Ok(job),
            Err(err) => {
                self.report_error(&err);
                Err(err)
            }
        }
    }

    fn execute(&mut self, env: &mut PanelEnv<'_>, item: PendingRender) -> Result<JobId, PanelError> {
        let tree = match item {
            PendingRender::Content(content) => {
                let tree = content.build(env.document)?;
                self.replace_tree(env.document, tree)?;
                tree
            }
            PendingRender::Refresh => self.tree.ok_or(PanelError::EmptyContent)?,
        };
        let snapshot = env.document.deep_clone(tree)?;
        let sources = env.document.query_attribute(tree, METHOD_ATTRIBUTE);
        let job = self.pipeline.enqueue(tree, snapshot, sources);
        self.process_queue(env);
        Ok(job)
    }

    fn replace_tree(&mut self, document: &mut dyn Document, tree: NodeRef) -> Result<(), PanelError> {
        if let Some(observer) = self.observer.take() {
            document.disconnect(observer);
        }
        if let Some(old) = self.tree.replace(tree) {
            self.retired.push(old);
        }
        if self.options.observe_mutations {
            self.observer = Some(document.observe(tree)?);
        }
        self.release_retired(document);
        Ok(())
    }

    /// Drive the pipeline until it has to wait for the host.
    fn process_queue(&mut self, env: &mut PanelEnv<'_>) {
        loop {
            if self.pipeline.is_idle() {
                match self.pipeline.pop_next() {
                    Some(job) => {
                        self.start_job(env, job);
                        continue;
                    }
                    None => return,
                }
            }

            let Some(live) = self.pipeline.live() else {
                return;
            };
            if !live.assets_settled() {
                return;
            }
            let job = live.job.id;
            let snapshot = live.job.snapshot;
            let sources = live.job.sources.clone();

            match measure(&*env.document, snapshot, &sources) {
                Ok((size, bounds)) => {
                    if let Some(live) = self.pipeline.live_mut() {
                        live.stage = JobStage::Rasterizing { size, bounds };
                    }
                    let request = RasterRequest {
                        panel: self.node,
                        job,
                        node: snapshot,
                        size,
                    };
                    debug!(panel = ?self.node, job = %job, width = size.width, height = size.height, "rasterizing");
                    match env.rasterizer.rasterize(request) {
                        Ok(()) => return,
                        Err(source) => {
                            self.finish_job(env, job, Err(PanelError::Rasterize { job, source }))
                        }
                    }
                }
                Err(err) => self.finish_job(env, job, Err(err)),
            }
        }
    }

    fn start_job(&mut self, env: &mut PanelEnv<'_>, job: RenderJob) {
        let id = job.id;
        let attached = env.document.attach_offscreen(job.snapshot);
        let barrier = AssetBarrier::for_subtree(&*env.document, job.snapshot);
        debug!(panel = ?self.node, job = %id, pending_assets = barrier.pending_count(), "snapshot attached");
        self.pipeline.begin(
            job,
            JobStage::AwaitingAssets {
                barrier,
                since: self.clock,
            },
        );
        if self.options.clear_texture_on_render {
            if let Some(mesh) = self.mesh {
                env.scene.upload_texture(mesh.texture, None);
            }
        }
        if let Err(err) = attached {
            self.finish_job(env, id, Err(err.into()));
        }
    }

    /// Retire the live job: drop its snapshot and either present the bitmap
    /// or report the failure and keep the current frame.
    fn finish_job(&mut self, env: &mut PanelEnv<'_>, job: JobId, outcome: Result<Bitmap, PanelError>) {
        let Some(live) = self.pipeline.take_live(job) else {
            warn!(panel = ?self.node, job = %job, "job is not live");
            return;
        };
        let snapshot = live.job.snapshot;
        if let Err(err) = env.document.detach(snapshot) {
            trace!(%err, "snapshot was not attached");
        }
        env.document.release(snapshot);

        match (outcome, live.stage) {
            (Ok(bitmap), JobStage::Rasterizing { size, bounds }) => {
                self.present(env.scene, live.job, bitmap, size, bounds);
            }
            (Ok(_), JobStage::AwaitingAssets { .. }) => {
                warn!(panel = ?self.node, job = %job, "bitmap for a job that was never rasterized");
                self.restore_texture(env.scene);
            }
            (Err(err), _) => {
                self.report_error(&err);
                self.restore_texture(env.scene);
            }
        }
        self.release_retired(env.document);
    }

    fn present(
        &mut self,
        scene: &mut dyn SceneGraph,
        job: RenderJob,
        bitmap: Bitmap,
        size: PixelSize,
        bounds: Vec<ButtonBound>,
    ) {
        if bitmap.size() != size {
            debug!(panel = ?self.node, job = %job.id, ?size, bitmap = ?bitmap.size(), "bitmap size differs from layout size");
        }
        let geometry = PanelGeometry::from_pixels(size);
        let previous = self.frame.as_ref().map(|f| f.geometry.pixels);
        match self.mesh.filter(|_| previous == Some(size)) {
            Some(mesh) => scene.upload_texture(mesh.texture, Some(&bitmap)),
            None => self.rebuild_geometry(scene, geometry, &bitmap),
        }
        debug!(panel = ?self.node, job = %job.id, buttons = bounds.len(), "frame presented");
        self.frame = Some(RenderedFrame {
            job: job.id,
            tree: job.tree,
            bitmap,
            bounds,
            geometry,
        });
    }

    /// Replace the plane mesh and its texture with ones sized for `geometry`.
    fn rebuild_geometry(&mut self, scene: &mut dyn SceneGraph, geometry: PanelGeometry, bitmap: &Bitmap) {
        if let Some(old) = self.mesh.take() {
            scene.remove_child(self.node, old.node);
            scene.dispose_mesh(old.node);
            scene.dispose_texture(old.texture);
        }
        let texture = scene.create_texture();
        scene.upload_texture(texture, Some(bitmap));
        let mesh = scene.create_plane(PlaneDesc {
            geometry: PlaneGeometry::new(geometry.width, geometry.height),
            material: MaterialDesc {
                texture: Some(texture),
                transparent: true,
                depth_test: !self.options.always_on_top,
                ..MaterialDesc::default()
            },
        });
        scene.add_child(self.node, mesh);
        self.mesh = Some(PanelMesh { node: mesh, texture });
        debug!(
            panel = ?self.node,
            width = geometry.pixels.width,
            height = geometry.pixels.height,
            "panel geometry rebuilt"
        );
    }

    /// Put the current frame back after a cleared texture's job failed.
    fn restore_texture(&self, scene: &mut dyn SceneGraph) {
        if !self.options.clear_texture_on_render {
            return;
        }
        if let (Some(mesh), Some(frame)) = (self.mesh, &self.frame) {
            scene.upload_texture(mesh.texture, Some(&frame.bitmap));
        }
    }

    fn release_retired(&mut self, document: &mut dyn Document) {
        let frame_tree = self.frame.as_ref().map(|f| f.tree);
        let pipeline = &self.pipeline;
        self.retired.retain(|tree| {
            let keep = Some(*tree) == frame_tree || pipeline.references_tree(*tree);
            if !keep {
                trace!(?tree, "releasing retired content tree");
                document.release(*tree);
            }
            keep
        });
    }

    fn expire_assets(&mut self, now: Millis) {
        let Some(timeout) = self.options.asset_timeout_ms else {
            return;
        };
        let Some(live) = self.pipeline.live_mut() else {
            return;
        };
        if let JobStage::AwaitingAssets { barrier, since } = &mut live.stage {
            if !barrier.is_settled() && now.since(*since) >= timeout {
                let abandoned = barrier.release_all();
                warn!(
                    panel = ?self.node,
                    job = %live.job.id,
                    images = abandoned.len(),
                    timeout_ms = timeout,
                    "asset timeout, rendering without pending images"
                );
            }
        }
    }

    fn report_error(&mut self, err: &PanelError) {
        error!(panel = ?self.node, error = %err, "panel error");
        if let Some(handler) = self.error_handler.as_mut() {
            handler(err);
        }
    }
}

fn measure(
    document: &dyn Document,
    snapshot: NodeRef,
    sources: &[NodeRef],
) -> Result<(PixelSize, Vec<ButtonBound>), PanelError> {
    let size = document.client_size(snapshot)?;
    let bounds = compute_button_bounds(document, snapshot, sources)?;
    Ok((size, bounds))
}

impl fmt::Debug for SurfacePanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfacePanel")
            .field("node", &self.node)
            .field("tree", &self.tree)
            .field("status", &self.pipeline.status())
            .field("frame", &self.frame.as_ref().map(|frame| frame.job))
            .field("methods", &self.methods)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Rasterizer;
    use std::cell::RefCell;
    use std::rc::Rc;
    use webplane_dom::MemoryDocument;
    use webplane_scene::Scene;

    #[derive(Default)]
    struct Recorder {
        requests: Vec<RasterRequest>,
        reject: bool,
    }

    impl Rasterizer for Recorder {
        fn rasterize(&mut self, request: RasterRequest) -> Result<(), RasterizeError> {
            if self.reject {
                return Err(RasterizeError::Rejected("busy".into()));
            }
            self.requests.push(request);
            Ok(())
        }
    }

    struct Fixture {
        document: MemoryDocument,
        scene: Scene,
        rasterizer: Recorder,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                document: MemoryDocument::new(),
                scene: Scene::new(),
                rasterizer: Recorder::default(),
            }
        }

        fn env(&mut self) -> PanelEnv<'_> {
            PanelEnv::new(&mut self.document, &mut self.scene, &mut self.rasterizer)
        }

        fn complete(&mut self, panel: &mut SurfacePanel) -> JobId {
            let request = self.rasterizer.requests.remove(0);
            let bitmap = Bitmap::solid(request.size, [255, 255, 255, 255]);
            assert!(panel.on_bitmap_ready(&mut self.env(), request.job, Ok(bitmap)));
            request.job
        }
    }

    const BUTTON: &str = r#"<button method="save" width="200" height="100">Save</button>"#;

    fn unthrottled() -> PanelOptions {
        PanelOptions::default().with_throttle(None)
    }

    #[test]
    fn first_render_builds_mesh_and_bounds() {
        let mut fx = Fixture::new();
        let mut panel =
            SurfacePanel::new(&mut fx.env(), Millis::ZERO, BUTTON, MethodTable::new(), unthrottled())
                .unwrap();
        assert!(panel.frame().is_none());
        assert_eq!(fx.rasterizer.requests[0].size, PixelSize::new(200, 100));

        fx.complete(&mut panel);
        let geometry = panel.geometry().unwrap();
        assert!((geometry.width - 0.5).abs() < 1e-6);
        assert_eq!(panel.bounds().len(), 1);
        assert_eq!(panel.bounds()[0].method, "save");

        let mesh = panel.mesh().unwrap();
        assert_eq!(fx.scene.parent(mesh.node), Some(panel.node()));
        assert!(fx.scene.plane(mesh.node).unwrap().material.depth_test);
        assert!(fx.document.attached().is_empty());
    }

    #[test]
    fn click_invokes_callback_with_live_element() {
        let mut fx = Fixture::new();
        let clicked = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicked);
        let methods = MethodTable::new().with("save", move |ctx: &ClickContext| {
            sink.borrow_mut().push(ctx.element);
        });
        let mut panel =
            SurfacePanel::new(&mut fx.env(), Millis::ZERO, BUTTON, methods, unthrottled()).unwrap();
        fx.complete(&mut panel);

        let outcome = panel.dispatch_click(&mut fx.scene, Vec3::new(0.0, 0.0, 0.0));
        let live_button = fx.document.query_attribute(panel.tree().unwrap(), "method")[0];
        assert_eq!(
            outcome,
            DispatchOutcome::Invoked {
                method: "save".into(),
                element: live_button
            }
        );
        assert_eq!(*clicked.borrow(), vec![live_button]);

        let outcome = panel.dispatch_click(&mut fx.scene, Vec3::new(2.5, 0.0, 0.0));
        assert!(matches!(outcome, DispatchOutcome::Miss { .. }));
    }

    #[test]
    fn unknown_method_is_not_an_error() {
        let mut fx = Fixture::new();
        let mut panel =
            SurfacePanel::new(&mut fx.env(), Millis::ZERO, BUTTON, MethodTable::new(), unthrottled())
                .unwrap();
        fx.complete(&mut panel);
        assert_eq!(
            panel.dispatch_click(&mut fx.scene, Vec3::ZERO),
            DispatchOutcome::UnknownMethod {
                method: "save".into()
            }
        );
    }

    #[test]
    fn same_size_swaps_texture_only() {
        let mut fx = Fixture::new();
        let mut panel =
            SurfacePanel::new(&mut fx.env(), Millis::ZERO, BUTTON, MethodTable::new(), unthrottled())
                .unwrap();
        fx.complete(&mut panel);
        let first = panel.mesh().unwrap();

        panel
            .submit_content(&mut fx.env(), Millis(1), r#"<a method="x" width="200" height="100">x</a>"#)
            .unwrap();
        fx.complete(&mut panel);
        assert_eq!(panel.mesh(), Some(first));
        assert_eq!(panel.bounds()[0].method, "x");

        panel
            .submit_content(&mut fx.env(), Millis(2), r#"<a method="y" width="400" height="100">y</a>"#)
            .unwrap();
        fx.complete(&mut panel);
        assert_ne!(panel.mesh(), Some(first));
        assert!(!fx.scene.contains(first.node));
        assert_eq!(fx.scene.stats().live_textures, 1);
        assert_eq!(fx.scene.stats().disposed_textures, 1);
    }

    #[test]
    fn second_job_waits_for_first() {
        let mut fx = Fixture::new();
        let mut panel =
            SurfacePanel::new(&mut fx.env(), Millis::ZERO, BUTTON, MethodTable::new(), unthrottled())
                .unwrap();
        let queued = panel
            .submit_content(&mut fx.env(), Millis(1), "<p>next</p>")
            .unwrap();
        assert_eq!(fx.rasterizer.requests.len(), 1);
        assert_eq!(panel.status().queued, 1);
        assert_eq!(fx.document.attached().len(), 1);

        fx.complete(&mut panel);
        assert_eq!(fx.rasterizer.requests.len(), 1);
        assert_eq!(Submission::Queued(fx.complete(&mut panel)), queued);
        assert_eq!(panel.status().queued, 0);
    }

    #[test]
    fn rejected_rasterization_keeps_frame_and_reports() {
        let mut fx = Fixture::new();
        let errors = Rc::new(RefCell::new(0));
        let count = Rc::clone(&errors);
        let mut panel = SurfacePanel::with_error_handler(
            &mut fx.env(),
            Millis::ZERO,
            BUTTON,
            MethodTable::new(),
            unthrottled(),
            move |_| *count.borrow_mut() += 1,
        )
        .unwrap();
        fx.complete(&mut panel);
        let frame_job = panel.frame().unwrap().job;
        let texture = panel.mesh().unwrap().texture;

        fx.rasterizer.reject = true;
        panel
            .submit_content(&mut fx.env(), Millis(1), "<p>broken</p>")
            .unwrap();
        assert_eq!(*errors.borrow(), 1);
        assert_eq!(panel.frame().unwrap().job, frame_job);
        assert!(panel.status().live_job.is_none());
        assert!(fx.document.attached().is_empty());
        assert!(fx.scene.texture_image(texture).is_some());
    }

    #[test]
    fn first_render_failure_reaches_the_handler() {
        let mut fx = Fixture::new();
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        fx.rasterizer.reject = true;
        let panel = SurfacePanel::with_error_handler(
            &mut fx.env(),
            Millis::ZERO,
            BUTTON,
            MethodTable::new(),
            unthrottled(),
            move |err| sink.borrow_mut().push(err.to_string()),
        )
        .unwrap();

        assert_eq!(errors.borrow().len(), 1);
        assert!(errors.borrow()[0].contains("busy"));
        assert!(panel.frame().is_none());
        assert!(panel.status().live_job.is_none());
        assert!(fx.document.attached().is_empty());
    }

    #[test]
    fn invalid_initial_content_reaches_the_handler() {
        let mut fx = Fixture::new();
        let errors = Rc::new(RefCell::new(0));
        let count = Rc::clone(&errors);
        let result = SurfacePanel::with_error_handler(
            &mut fx.env(),
            Millis::ZERO,
            "  ",
            MethodTable::new(),
            unthrottled(),
            move |_| *count.borrow_mut() += 1,
        );
        assert!(matches!(result, Err(PanelError::EmptyContent)));
        assert_eq!(*errors.borrow(), 1);
        assert!(fx.document.attached().is_empty());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut fx = Fixture::new();
        let mut panel =
            SurfacePanel::new(&mut fx.env(), Millis::ZERO, BUTTON, MethodTable::new(), unthrottled())
                .unwrap();
        let job = fx.complete(&mut panel);
        let bitmap = Bitmap::solid(PixelSize::new(1, 1), [0, 0, 0, 255]);
        assert!(!panel.on_bitmap_ready(&mut fx.env(), job, Ok(bitmap)));
        assert_eq!(panel.geometry().unwrap().pixels, PixelSize::new(200, 100));
    }

    #[test]
    fn always_on_top_disables_depth_test() {
        let mut fx = Fixture::new();
        let options = unthrottled().with_always_on_top(true);
        let mut panel =
            SurfacePanel::new(&mut fx.env(), Millis::ZERO, BUTTON, MethodTable::new(), options)
                .unwrap();
        fx.complete(&mut panel);
        let material = fx.scene.plane(panel.mesh().unwrap().node).unwrap().material;
        assert!(!material.depth_test);
        assert!(material.transparent);
    }

    #[test]
    fn debug_click_leaves_marker_on_mesh() {
        let mut fx = Fixture::new();
        let options = unthrottled().with_debug(true);
        let mut panel =
            SurfacePanel::new(&mut fx.env(), Millis::ZERO, BUTTON, MethodTable::new(), options)
                .unwrap();
        fx.complete(&mut panel);
        let mesh = panel.mesh().unwrap().node;
        panel.dispatch_click(&mut fx.scene, Vec3::new(0.1, 0.0, 0.0));
        let marker = fx.scene.children(mesh)[0];
        let desc = fx.scene.marker(marker).unwrap();
        assert_eq!(desc.radius, 0.05);
        assert!((desc.position - Vec3::new(0.1, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn dispose_releases_everything() {
        let mut fx = Fixture::new();
        let baseline = fx.document.live_nodes();
        let mut panel =
            SurfacePanel::new(&mut fx.env(), Millis::ZERO, BUTTON, MethodTable::new(), unthrottled())
                .unwrap();
        fx.complete(&mut panel);
        panel.submit_content(&mut fx.env(), Millis(1), "<p>x</p>").unwrap();
        let node = panel.node();
        panel.dispose(&mut fx.env());

        assert!(!fx.scene.contains(node));
        assert_eq!(fx.scene.stats().live_textures, 0);
        assert_eq!(fx.scene.stats().live_geometries, 0);
        assert_eq!(fx.document.live_nodes(), baseline);
    }
}
