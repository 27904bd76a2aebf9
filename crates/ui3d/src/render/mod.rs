//! Render pipeline: throttling, asset waiting, rasterization and the
//! plane geometry that displays the result.

mod assets;
mod geometry;
mod pipeline;
mod rasterizer;
mod throttle;

pub use assets::AssetBarrier;
pub use geometry::{PanelGeometry, PanelMesh};
pub use pipeline::{
    JobId, JobStage, LiveJob, PipelineState, PipelineStatus, RenderJob, RenderPipeline,
};
pub use rasterizer::{RasterRequest, Rasterizer};
pub use throttle::{PendingRender, Throttle, Throttled};
