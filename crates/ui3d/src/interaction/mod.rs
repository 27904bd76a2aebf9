//! Pointer interaction: turning a click under the reticle into a panel click.

mod dispatcher;
mod pointer;

pub use dispatcher::{ClickResult, PointerDispatcher, RETICLE_DISTANCE, RETICLE_SCALE};
pub use pointer::PointerEvent;
