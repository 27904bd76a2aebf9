//! Arena scene graph with resource accounting.

use crate::camera::Camera;
use crate::geometry::{MarkerDesc, PlaneDesc, SpriteDesc};
use crate::raycast::{raycast_billboard_quad, raycast_plane_quad, Ray};
use crate::transform::Transform3D;
use crate::{Intersection, NodeId, SceneGraph, TextureId};
use glam::{Mat4, Vec3};
use std::collections::HashMap;
use tracing::{trace, warn};
use webplane_core::{Bitmap, PixelSize};

#[derive(Debug, Clone)]
enum ObjectKind {
    Group,
    Camera,
    Plane(PlaneDesc),
    Sprite(SpriteDesc),
    Marker(MarkerDesc),
}

#[derive(Debug, Clone)]
struct SceneNode {
    kind: ObjectKind,
    transform: Transform3D,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
struct TextureSlot {
    image: Option<Bitmap>,
    version: u64,
}

/// Live and released resource counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Mesh geometries currently allocated.
    pub live_geometries: usize,
    /// Materials currently allocated.
    pub live_materials: usize,
    /// Textures currently allocated.
    pub live_textures: usize,
    /// Geometries released so far.
    pub disposed_geometries: usize,
    /// Textures released so far.
    pub disposed_textures: usize,
}

/// In-memory scene graph.
#[derive(Debug)]
pub struct Scene {
    nodes: Vec<Option<SceneNode>>,
    root: NodeId,
    camera: NodeId,
    textures: HashMap<TextureId, TextureSlot>,
    next_texture: u32,
    stats: ResourceStats,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene with a camera at the origin looking down -Z.
    pub fn new() -> Self {
        let mut scene = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            camera: NodeId(0),
            textures: HashMap::new(),
            next_texture: 1,
            stats: ResourceStats::default(),
        };
        scene.root = scene.alloc(ObjectKind::Group, Transform3D::default());
        scene.camera = scene.alloc(ObjectKind::Camera, Transform3D::default());
        scene.link(scene.root, scene.camera);
        scene.set_camera(&Camera::default());
        scene
    }

    /// Pose the camera node from a first-person camera.
    pub fn set_camera(&mut self, camera: &Camera) {
        let rotation = camera.rotation();
        if let Some(node) = self.node_mut(self.camera) {
            node.transform.position = camera.position;
            node.transform.rotation = rotation;
        }
    }

    /// Replace a node's whole local transform.
    pub fn set_transform(&mut self, node: NodeId, transform: Transform3D) {
        if let Some(entry) = self.node_mut(node) {
            entry.transform = transform;
        }
    }

    /// Local transform of a node.
    pub fn transform(&self, node: NodeId) -> Option<Transform3D> {
        self.node(node).map(|n| n.transform)
    }

    /// Children of `node`.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// True if `node` names a live node.
    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    /// Plane description of a mesh node.
    pub fn plane(&self, node: NodeId) -> Option<&PlaneDesc> {
        match &self.node(node)?.kind {
            ObjectKind::Plane(desc) => Some(desc),
            _ => None,
        }
    }

    /// Marker description of a marker node.
    pub fn marker(&self, node: NodeId) -> Option<&MarkerDesc> {
        match &self.node(node)?.kind {
            ObjectKind::Marker(desc) => Some(desc),
            _ => None,
        }
    }

    /// Size of the image currently held by a texture.
    pub fn texture_size(&self, texture: TextureId) -> Option<PixelSize> {
        self.textures.get(&texture)?.image.as_ref().map(Bitmap::size)
    }

    /// Image currently held by a texture.
    pub fn texture_image(&self, texture: TextureId) -> Option<&Bitmap> {
        self.textures.get(&texture)?.image.as_ref()
    }

    /// Upload counter of a texture (bumped on every upload).
    pub fn texture_version(&self, texture: TextureId) -> Option<u64> {
        self.textures.get(&texture).map(|t| t.version)
    }

    /// Resource accounting snapshot.
    pub fn stats(&self) -> ResourceStats {
        self.stats
    }

    /// World matrix of `node` (identity for unknown nodes).
    pub fn world_matrix(&self, node: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(entry) = self.node(id) else {
                break;
            };
            matrix = entry.transform.matrix() * matrix;
            current = entry.parent;
        }
        matrix
    }

    fn alloc(&mut self, kind: ObjectKind, transform: Transform3D) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(SceneNode {
            kind,
            transform,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    fn node(&self, node: NodeId) -> Option<&SceneNode> {
        self.nodes.get(node.0 as usize).and_then(|n| n.as_ref())
    }

    fn node_mut(&mut self, node: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(node.0 as usize).and_then(|n| n.as_mut())
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).and_then(|c| c.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = None;
        }
    }

    fn free_subtree(&mut self, node: NodeId) {
        let Some(entry) = self.nodes.get_mut(node.0 as usize).and_then(Option::take) else {
            return;
        };
        if matches!(entry.kind, ObjectKind::Plane(_) | ObjectKind::Marker(_)) {
            self.stats.live_geometries = self.stats.live_geometries.saturating_sub(1);
            self.stats.live_materials = self.stats.live_materials.saturating_sub(1);
            self.stats.disposed_geometries += 1;
        }
        if matches!(entry.kind, ObjectKind::Sprite(_)) {
            self.stats.live_materials = self.stats.live_materials.saturating_sub(1);
        }
        for child in entry.children {
            self.free_subtree(child);
        }
    }

    fn collect_hits(&self, node: NodeId, ray: &Ray, hits: &mut Vec<Intersection>) {
        let Some(entry) = self.node(node) else {
            return;
        };
        let world = self.world_matrix(node);
        let hit = match &entry.kind {
            ObjectKind::Group | ObjectKind::Camera | ObjectKind::Marker(_) => None,
            ObjectKind::Plane(desc) => raycast_plane_quad(
                ray,
                &world,
                (desc.geometry.width, desc.geometry.height),
            ),
            ObjectKind::Sprite(desc) => {
                let (scale, _, center) = world.to_scale_rotation_translation();
                raycast_billboard_quad(
                    ray,
                    center,
                    (desc.scale.0 * scale.x, desc.scale.1 * scale.y),
                    ray.origin,
                )
            }
        };
        if let Some(hit) = hit {
            hits.push(Intersection {
                object: node,
                point: hit.position,
                distance: hit.distance,
            });
        }
        for child in &entry.children {
            self.collect_hits(*child, ray, hits);
        }
    }
}

impl SceneGraph for Scene {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_group(&mut self) -> NodeId {
        self.alloc(ObjectKind::Group, Transform3D::default())
    }

    fn create_plane(&mut self, desc: PlaneDesc) -> NodeId {
        self.stats.live_geometries += 1;
        self.stats.live_materials += 1;
        self.alloc(ObjectKind::Plane(desc), Transform3D::default())
    }

    fn create_sprite(&mut self, desc: SpriteDesc) -> NodeId {
        self.stats.live_materials += 1;
        self.alloc(ObjectKind::Sprite(desc), Transform3D::new(desc.position))
    }

    fn create_marker(&mut self, desc: MarkerDesc) -> NodeId {
        self.stats.live_geometries += 1;
        self.stats.live_materials += 1;
        self.alloc(ObjectKind::Marker(desc), Transform3D::new(desc.position))
    }

    fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() || self.node(child).is_none() || parent == child {
            warn!(?parent, ?child, "add_child on unknown node");
            return;
        }
        self.unlink(child);
        self.link(parent, child);
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(child).and_then(|c| c.parent) == Some(parent) {
            self.unlink(child);
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    fn set_position(&mut self, node: NodeId, position: Vec3) {
        if let Some(entry) = self.node_mut(node) {
            entry.transform.position = position;
        }
    }

    fn world_to_local(&self, node: NodeId, point: Vec3) -> Vec3 {
        self.world_matrix(node).inverse().transform_point3(point)
    }

    fn create_texture(&mut self) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, TextureSlot::default());
        self.stats.live_textures += 1;
        id
    }

    fn upload_texture(&mut self, texture: TextureId, bitmap: Option<&Bitmap>) {
        match self.textures.get_mut(&texture) {
            Some(slot) => {
                slot.image = bitmap.cloned();
                slot.version += 1;
                trace!(?texture, version = slot.version, "texture uploaded");
            }
            None => warn!(?texture, "upload to unknown texture"),
        }
    }

    fn dispose_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_some() {
            self.stats.live_textures -= 1;
            self.stats.disposed_textures += 1;
        }
    }

    fn dispose_mesh(&mut self, mesh: NodeId) {
        if mesh == self.root || mesh == self.camera {
            return;
        }
        self.unlink(mesh);
        self.free_subtree(mesh);
    }

    fn camera(&self) -> NodeId {
        self.camera
    }

    fn camera_world_position(&self) -> Vec3 {
        self.world_matrix(self.camera).transform_point3(Vec3::ZERO)
    }

    fn camera_world_direction(&self) -> Vec3 {
        self.world_matrix(self.camera)
            .transform_vector3(Vec3::NEG_Z)
            .normalize_or_zero()
    }

    fn intersect_objects(&self, ray: &Ray) -> Vec<Intersection> {
        let mut hits = Vec::new();
        self.collect_hits(self.root, ray, &mut hits);
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MaterialDesc, PlaneGeometry};

    fn plane(width: f32, height: f32) -> PlaneDesc {
        PlaneDesc {
            geometry: PlaneGeometry::new(width, height),
            material: MaterialDesc::default(),
        }
    }

    #[test]
    fn camera_defaults_to_origin_looking_down_negative_z() {
        let scene = Scene::new();
        assert_eq!(scene.camera_world_position(), Vec3::ZERO);
        assert!((scene.camera_world_direction() - Vec3::NEG_Z).length() < 1e-5);
        assert_eq!(scene.parent(scene.camera()), Some(scene.root()));
    }

    #[test]
    fn world_to_local_inverts_parent_chain() {
        let mut scene = Scene::new();
        let group = scene.create_group();
        scene.add_child(scene.root(), group);
        scene.set_position(group, Vec3::new(1.0, 2.0, -3.0));
        let mesh = scene.create_plane(plane(1.0, 1.0));
        scene.add_child(group, mesh);
        scene.set_position(mesh, Vec3::new(0.5, 0.0, 0.0));

        let local = scene.world_to_local(mesh, Vec3::new(1.5, 2.25, -3.0));
        assert!((local - Vec3::new(0.0, 0.25, 0.0)).length() < 1e-5);
    }

    #[test]
    fn intersections_are_sorted_and_recursive() {
        let mut scene = Scene::new();
        let group = scene.create_group();
        scene.add_child(scene.root(), group);
        let far = scene.create_plane(plane(1.0, 1.0));
        let near = scene.create_plane(plane(1.0, 1.0));
        scene.add_child(group, far);
        scene.add_child(group, near);
        scene.set_position(far, Vec3::new(0.0, 0.0, -5.0));
        scene.set_position(near, Vec3::new(0.0, 0.0, -2.0));

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hits = scene.intersect_objects(&ray);
        let objects: Vec<NodeId> = hits.iter().map(|h| h.object).collect();
        assert_eq!(objects, vec![near, far]);
        assert!((hits[0].point - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn markers_are_not_pickable() {
        let mut scene = Scene::new();
        let mesh = scene.create_plane(plane(1.0, 1.0));
        scene.add_child(scene.root(), mesh);
        scene.set_position(mesh, Vec3::new(0.0, 0.0, -2.0));
        let marker = scene.create_marker(MarkerDesc {
            radius: 0.05,
            color: [0.0, 1.0, 0.0, 1.0],
            position: Vec3::ZERO,
        });
        scene.add_child(mesh, marker);

        let hits = scene.intersect_objects(&Ray::new(Vec3::ZERO, Vec3::NEG_Z));
        let objects: Vec<NodeId> = hits.iter().map(|h| h.object).collect();
        assert_eq!(objects, vec![mesh]);
    }

    #[test]
    fn sprites_on_the_camera_follow_it() {
        let mut scene = Scene::new();
        scene.set_camera(&Camera::looking_at(Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 0.0, -1.0)));
        let sprite = scene.create_sprite(SpriteDesc {
            material: MaterialDesc::default(),
            position: Vec3::new(0.0, 0.0, -0.5),
            scale: (0.02, 0.02),
        });
        scene.add_child(scene.camera(), sprite);

        let ray = Ray::new(scene.camera_world_position(), scene.camera_world_direction());
        let hits = scene.intersect_objects(&ray);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object, sprite);
        assert!((hits[0].distance - 0.5).abs() < 1e-4);
    }

    #[test]
    fn disposal_updates_stats() {
        let mut scene = Scene::new();
        let texture = scene.create_texture();
        let mesh = scene.create_plane(plane(1.0, 1.0));
        scene.add_child(scene.root(), mesh);
        let marker = scene.create_marker(MarkerDesc {
            radius: 0.05,
            color: [0.0, 1.0, 0.0, 1.0],
            position: Vec3::ZERO,
        });
        scene.add_child(mesh, marker);
        assert_eq!(scene.stats().live_geometries, 2);

        scene.remove_child(scene.root(), mesh);
        scene.dispose_mesh(mesh);
        scene.dispose_texture(texture);

        let stats = scene.stats();
        assert_eq!(stats.live_geometries, 0);
        assert_eq!(stats.live_materials, 0);
        assert_eq!(stats.live_textures, 0);
        assert_eq!(stats.disposed_geometries, 2);
        assert_eq!(stats.disposed_textures, 1);
        assert!(!scene.contains(marker));
    }

    #[test]
    fn uploads_bump_texture_version() {
        let mut scene = Scene::new();
        let texture = scene.create_texture();
        let bitmap = Bitmap::solid(PixelSize::new(2, 3), [1, 2, 3, 4]);
        scene.upload_texture(texture, Some(&bitmap));
        assert_eq!(scene.texture_size(texture), Some(PixelSize::new(2, 3)));
        scene.upload_texture(texture, None);
        assert_eq!(scene.texture_size(texture), None);
        assert_eq!(scene.texture_version(texture), Some(2));
    }
}
