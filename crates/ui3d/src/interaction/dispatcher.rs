//! Camera-centred click detection.
//!
//! A click is a pointer down followed by an up with no movement in between.
//! On a click the dispatcher casts a ray from the camera along its view
//! direction. The nearest hit is the reticle itself, so the second hit is the
//! candidate; if its parent is a registered panel the click is forwarded to
//! [`SurfacePanel::dispatch_click`](crate::SurfacePanel::dispatch_click).

use super::PointerEvent;
use crate::components::DispatchOutcome;
use crate::manager::PanelManager;
use glam::Vec3;
use tracing::{debug, trace};
use webplane_scene::{MaterialDesc, NodeId, Ray, SceneGraph, SpriteDesc};

/// Distance of the reticle in front of the camera.
pub const RETICLE_DISTANCE: f32 = 0.5;
/// World size of the reticle sprite.
pub const RETICLE_SCALE: f32 = 0.02;

/// What a click turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickResult {
    /// Nothing behind the reticle.
    NoHit,
    /// The object under the reticle does not belong to a panel.
    NotAPanel { object: NodeId },
    /// Routed to a panel.
    Panel {
        panel: NodeId,
        outcome: DispatchOutcome,
    },
}

#[derive(Debug, Default)]
pub struct PointerDispatcher {
    moving: bool,
    reticle: Option<NodeId>,
}

impl PointerDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hang the reticle sprite in front of the camera.
    pub fn attach(&mut self, scene: &mut dyn SceneGraph) -> NodeId {
        if let Some(reticle) = self.reticle {
            return reticle;
        }
        let reticle = scene.create_sprite(SpriteDesc {
            material: MaterialDesc {
                transparent: true,
                depth_test: false,
                ..MaterialDesc::default()
            },
            position: Vec3::new(0.0, 0.0, -RETICLE_DISTANCE),
            scale: (RETICLE_SCALE, RETICLE_SCALE),
        });
        let camera = scene.camera();
        scene.add_child(camera, reticle);
        self.reticle = Some(reticle);
        debug!(?reticle, "pointer dispatcher attached");
        reticle
    }

    /// Remove the reticle and forget pointer state.
    pub fn detach(&mut self, scene: &mut dyn SceneGraph) {
        if let Some(reticle) = self.reticle.take() {
            let camera = scene.camera();
            scene.remove_child(camera, reticle);
            scene.dispose_mesh(reticle);
            debug!(?reticle, "pointer dispatcher detached");
        }
        self.moving = false;
    }

    pub fn reticle(&self) -> Option<NodeId> {
        self.reticle
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Feed one pointer event. Returns the click result when the event
    /// completed a click.
    pub fn handle(
        &mut self,
        scene: &mut dyn SceneGraph,
        panels: &mut PanelManager,
        event: PointerEvent,
    ) -> Option<ClickResult> {
        match event {
            PointerEvent::Down => {
                self.pointer_down();
                None
            }
            PointerEvent::Move => {
                self.pointer_move();
                None
            }
            PointerEvent::Up => self.pointer_up(scene, panels),
        }
    }

    pub fn pointer_down(&mut self) {
        self.moving = false;
    }

    pub fn pointer_move(&mut self) {
        self.moving = true;
    }

    /// Finish a press. A press that moved is a drag and never clicks.
    pub fn pointer_up(
        &mut self,
        scene: &mut dyn SceneGraph,
        panels: &mut PanelManager,
    ) -> Option<ClickResult> {
        if self.moving {
            trace!("pointer moved since press, not a click");
            return None;
        }
        Some(self.click(scene, panels))
    }

    fn click(&self, scene: &mut dyn SceneGraph, panels: &mut PanelManager) -> ClickResult {
        let ray = Ray::new(scene.camera_world_position(), scene.camera_world_direction());
        let hits = scene.intersect_objects(&ray);
        let Some(hit) = hits.get(1) else {
            trace!(hits = hits.len(), "nothing behind the reticle");
            return ClickResult::NoHit;
        };
        let Some(parent) = scene.parent(hit.object) else {
            return ClickResult::NotAPanel { object: hit.object };
        };
        match panels.get_mut(parent) {
            Some(panel) => {
                let outcome = panel.dispatch_click(scene, hit.point);
                ClickResult::Panel {
                    panel: parent,
                    outcome,
                }
            }
            None => {
                trace!(object = ?hit.object, "hit object is not a panel");
                ClickResult::NotAPanel { object: hit.object }
            }
        }
    }
}
