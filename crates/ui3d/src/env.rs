use crate::render::Rasterizer;
use webplane_dom::Document;
use webplane_scene::SceneGraph;

/// Host collaborators a panel works against for the duration of one call.
pub struct PanelEnv<'a> {
    pub document: &'a mut dyn Document,
    pub scene: &'a mut dyn SceneGraph,
    pub rasterizer: &'a mut dyn Rasterizer,
}

impl<'a> PanelEnv<'a> {
    pub fn new(
        document: &'a mut dyn Document,
        scene: &'a mut dyn SceneGraph,
        rasterizer: &'a mut dyn Rasterizer,
    ) -> Self {
        Self {
            document,
            scene,
            rasterizer,
        }
    }
}
