//! HTML panels in a 3D scene for webplane
//!
//! A [`SurfacePanel`] renders an HTML fragment to a bitmap and shows it as a
//! textured plane sized to the content. Elements carrying a `method`
//! attribute become clickable: the [`PointerDispatcher`] casts a ray from the
//! camera through the reticle, and the panel maps the hit point back to
//! content pixels and runs the matching callback from its [`MethodTable`].
//!
//! # Features
//!
//! - **Serialized rendering**: one render job in flight per panel, queued in
//!   FIFO order, so a slow job never overwrites a newer frame
//! - **Throttling**: leading+trailing throttle over content submissions
//! - **Asset waiting**: jobs wait for their images before measuring
//! - **Geometry reuse**: the plane is rebuilt only when the content size changes
//!
//! Everything asynchronous is driven by the host: image settlement,
//! rasterizer completion, mutation notices and clock ticks are plain method
//! calls, usually routed through a [`PanelManager`].
//!
//! # Example
//!
//! ```rust,no_run
//! use webplane_core::Millis;
//! use webplane_dom::MemoryDocument;
//! use webplane_scene::Scene;
//! use webplane_ui3d::{MethodTable, PanelEnv, PanelManager, PanelOptions, Rasterizer, SurfacePanel};
//!
//! # fn run(rasterizer: &mut dyn Rasterizer) -> Result<(), webplane_ui3d::PanelError> {
//! let mut document = MemoryDocument::new();
//! let mut scene = Scene::new();
//! let mut env = PanelEnv::new(&mut document, &mut scene, rasterizer);
//!
//! let methods = MethodTable::new().with("save", |ctx| println!("saved from {:?}", ctx.element));
//! let panel = SurfacePanel::new(
//!     &mut env,
//!     Millis::ZERO,
//!     r#"<button method="save">Save</button>"#,
//!     methods,
//!     PanelOptions::default(),
//! )?;
//!
//! let mut panels = PanelManager::new();
//! panels.add(env.scene, panel);
//! # Ok(())
//! # }
//! ```

pub mod components;
pub mod env;
pub mod error;
pub mod interaction;
pub mod manager;
pub mod methods;
pub mod options;
pub mod render;

// Re-export commonly used types
pub use components::{
    compute_button_bounds, ButtonBound, ContentSource, DispatchOutcome, RenderedFrame,
    Submission, SurfacePanel, METHOD_ATTRIBUTE,
};
pub use env::PanelEnv;
pub use error::{PanelError, RasterizeError};
pub use interaction::{ClickResult, PointerDispatcher, PointerEvent};
pub use manager::PanelManager;
pub use methods::{ClickContext, MethodTable};
pub use options::{PanelOptions, ThrottleSetting, DEFAULT_THROTTLE_MS};
pub use render::{
    JobId, PanelGeometry, PanelMesh, PipelineState, PipelineStatus, RasterRequest, Rasterizer,
};

use anyhow::Result;

/// Version of the webplane-ui3d crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the crate version once at host start-up.
pub fn init() -> Result<()> {
    tracing::info!("Initializing webplane-ui3d v{}", VERSION);
    Ok(())
}
