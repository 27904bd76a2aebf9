//! Panel building blocks.

pub mod bounds;
pub mod content;
pub mod surface_panel;

pub use bounds::{compute_button_bounds, hit_test, ButtonBound, METHOD_ATTRIBUTE};
pub use content::ContentSource;
pub use surface_panel::{DispatchOutcome, RenderedFrame, Submission, SurfacePanel};
