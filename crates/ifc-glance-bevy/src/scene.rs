//! Scene host: turns loaded models into batched Bevy meshes
//!
//! The viewer core hands finished models to [`SceneHostQueue`] through the
//! [`SceneHost`] trait; [`spawn_models_system`] picks them up on the next
//! frame. Each model becomes at most two draw calls (opaque and
//! transparent) plus one lightweight entity per element carrying its bounds
//! for picking.
//!
//! Geometry arrives in viewer space (Y up), so no axis conversion happens
//! here.

use crate::camera::{CameraController, CameraRested};
use crate::{GlanceSession, ViewerSettings};
use bevy::asset::RenderAssetUsages;
use bevy::ecs::message::MessageReader;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use ifc_glance_model::{Aabb, ElementId, ElementMesh, ModelId, SceneHost, SceneModel};
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneHostQueue>()
            .init_resource::<SceneBounds>()
            .add_systems(
                Update,
                (
                    camera_rest_system,
                    spawn_models_system,
                    refresh_scene_system,
                    draw_grid_system,
                )
                    .chain()
                    .after(crate::camera::CameraInputSet),
            );
    }
}

/// Models waiting to be spawned and pending refresh requests
#[derive(Resource, Default)]
pub struct SceneHostQueue {
    pending: Vec<Arc<SceneModel>>,
    refresh_requested: bool,
}

impl SceneHostQueue {
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn take_pending(&mut self) -> Vec<Arc<SceneModel>> {
        std::mem::take(&mut self.pending)
    }

    pub fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }
}

impl SceneHost for SceneHostQueue {
    fn add_model(&mut self, model: Arc<SceneModel>) {
        self.pending.push(model);
    }

    fn update(&mut self) {
        self.refresh_requested = true;
    }
}

/// Union of everything spawned so far, plus totals for the status bar
#[derive(Resource, Default, Debug, Clone)]
pub struct SceneBounds {
    pub bounds: Option<Aabb>,
    pub models: usize,
    pub elements: usize,
    pub vertices: usize,
    pub triangles: usize,
}

impl SceneBounds {
    pub fn include(&mut self, model: &SceneModel, elements: usize) {
        let model_bounds = model.bounds.unwrap_or_else(|| model.compute_bounds());
        if !model_bounds.is_empty() {
            match self.bounds.as_mut() {
                Some(b) => b.merge(&model_bounds),
                None => self.bounds = Some(model_bounds),
            }
        }
        self.models += 1;
        self.elements += elements;
        self.vertices += model.vertex_count();
        self.triangles += model.triangle_count();
    }

    pub fn diagonal(&self) -> f32 {
        self.bounds
            .map(|b| {
                let s = b.size();
                (s[0] * s[0] + s[1] * s[1] + s[2] * s[2]).sqrt() as f32
            })
            .unwrap_or(0.0)
    }
}

/// Identifies the element an entity stands for
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementTag {
    pub model: ModelId,
    pub element: ElementId,
}

/// World-space bounds of one element (for picking and highlighting)
#[derive(Component, Clone, Copy, Debug)]
pub struct ElementBounds(pub Aabb);

impl ElementBounds {
    pub fn min(&self) -> Vec3 {
        to_vec3(self.0.min)
    }

    pub fn max(&self) -> Vec3 {
        to_vec3(self.0.max)
    }
}

/// Marker for batched mesh entities
#[derive(Component)]
pub struct ModelBatch {
    pub model: ModelId,
    pub is_transparent: bool,
}

fn to_vec3(p: [f64; 3]) -> Vec3 {
    Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32)
}

/// Combines many element meshes into one Bevy mesh
#[derive(Default)]
pub(crate) struct BatchBuilder {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    colors: Vec<[f32; 4]>,
    indices: Vec<u32>,
    /// Set when any input mesh came without usable normals
    missing_normals: bool,
}

impl BatchBuilder {
    pub(crate) fn add_mesh(&mut self, mesh: &ElementMesh) {
        let vertex_count = mesh.vertex_count();
        if vertex_count == 0 || mesh.indices.is_empty() {
            return;
        }

        let start_vertex = self.positions.len() as u32;
        let has_normals = mesh.normals.len() == mesh.positions.len();
        if !has_normals {
            self.missing_normals = true;
        }

        for (i, p) in mesh.positions.chunks_exact(3).enumerate() {
            self.positions.push([p[0], p[1], p[2]]);
            if has_normals {
                let n = &mesh.normals[i * 3..i * 3 + 3];
                self.normals.push([n[0], n[1], n[2]]);
            } else {
                self.normals.push([0.0, 0.0, 0.0]);
            }
            self.colors.push(mesh.color);
        }

        self.indices
            .extend(mesh.indices.iter().map(|&idx| idx + start_vertex));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub(crate) fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub(crate) fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub(crate) fn build(self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );

        let normals = if self.missing_normals {
            compute_smooth_normals(&self.positions, &self.indices)
        } else {
            self.normals
        };

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors);
        mesh.insert_indices(Indices::U32(self.indices));
        mesh
    }
}

/// Area-weighted vertex normals; degenerate vertices point up
fn compute_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let p0 = Vec3::from_array(positions[i0]);
        let face = (Vec3::from_array(positions[i1]) - p0).cross(Vec3::from_array(positions[i2]) - p0);
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }

    normals
        .into_iter()
        .map(|n| {
            if n.length_squared() > 1e-12 {
                n.normalize().to_array()
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

/// Per-element bounds over all meshes of the element
pub(crate) fn element_bounds(model: &SceneModel) -> FxHashMap<ElementId, Aabb> {
    let mut bounds: FxHashMap<ElementId, Aabb> = FxHashMap::default();
    for mesh in &model.meshes {
        let mesh_bounds = mesh.bounds();
        if mesh_bounds.is_empty() {
            continue;
        }
        bounds
            .entry(mesh.element)
            .and_modify(|b| b.merge(&mesh_bounds))
            .or_insert(mesh_bounds);
    }
    bounds
}

fn opaque_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::WHITE,
        metallic: 0.0,
        perceptual_roughness: 0.6,
        reflectance: 0.3,
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

fn transparent_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::WHITE,
        metallic: 0.0,
        perceptual_roughness: 0.1,
        reflectance: 0.5,
        double_sided: true,
        cull_mode: None,
        alpha_mode: AlphaMode::Blend,
        ..default()
    }
}

/// Spawn batches and element entities for every queued model
pub fn spawn_models_system(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut queue: ResMut<SceneHostQueue>,
    mut scene_bounds: ResMut<SceneBounds>,
    session: Res<GlanceSession>,
) {
    if !queue.has_pending() {
        return;
    }
    let diag = session.diagnostics();

    for model in queue.take_pending() {
        let mut opaque = BatchBuilder::default();
        let mut transparent = BatchBuilder::default();
        for mesh in &model.meshes {
            if mesh.color[3] < 1.0 {
                transparent.add_mesh(mesh);
            } else {
                opaque.add_mesh(mesh);
            }
        }

        let per_element = element_bounds(&model);
        for (element, bounds) in &per_element {
            commands.spawn((
                ElementTag {
                    model: model.id,
                    element: *element,
                },
                ElementBounds(*bounds),
                Transform::default(),
                Visibility::default(),
            ));
        }

        for (batch, is_transparent) in [(opaque, false), (transparent, true)] {
            if batch.is_empty() {
                continue;
            }
            diag.debug([ifc_glance_engine::LogArg::display(format_args!(
                "[Scene] {} {} batch: {} vertices, {} triangles",
                model.id,
                if is_transparent { "transparent" } else { "opaque" },
                batch.vertex_count(),
                batch.triangle_count()
            ))]);
            let material = if is_transparent {
                transparent_material()
            } else {
                opaque_material()
            };
            commands.spawn((
                Mesh3d(meshes.add(batch.build())),
                MeshMaterial3d(materials.add(material)),
                Transform::default(),
                ModelBatch {
                    model: model.id,
                    is_transparent,
                },
            ));
        }

        scene_bounds.include(&model, per_element.len());
    }
}

/// Scene-wide refresh: clip planes and zoom limits follow the scene size
pub fn refresh_scene_system(
    mut queue: ResMut<SceneHostQueue>,
    scene_bounds: Res<SceneBounds>,
    mut controller: ResMut<CameraController>,
) {
    if !queue.take_refresh() {
        return;
    }
    controller.adapt_to_scene(scene_bounds.diagonal());
}

/// Camera came to rest: let the session refresh the scene
pub fn camera_rest_system(
    mut rested: MessageReader<CameraRested>,
    session: Res<GlanceSession>,
    mut queue: ResMut<SceneHostQueue>,
) {
    for _ in rested.read() {
        session.on_camera_rest(&mut *queue);
    }
}

/// Ground grid under the scene, sized to its footprint
fn draw_grid_system(settings: Res<ViewerSettings>, scene_bounds: Res<SceneBounds>, mut gizmos: Gizmos) {
    if !settings.show_grid {
        return;
    }
    let (center, extent, floor) = match scene_bounds.bounds {
        Some(b) => {
            let c = b.center();
            let s = b.size();
            (
                Vec2::new(c[0] as f32, c[2] as f32),
                (s[0].max(s[2]) as f32).max(1.0),
                b.min[1] as f32,
            )
        }
        None => (Vec2::ZERO, 20.0, 0.0),
    };

    let step = grid_step(extent);
    let half = (extent * 0.75 / step).ceil() * step;
    let color = settings.theme.grid_color();
    let lines = (2.0 * half / step).round() as i32;
    for i in 0..=lines {
        let offset = -half + i as f32 * step;
        gizmos.line(
            Vec3::new(center.x + offset, floor, center.y - half),
            Vec3::new(center.x + offset, floor, center.y + half),
            color,
        );
        gizmos.line(
            Vec3::new(center.x - half, floor, center.y + offset),
            Vec3::new(center.x + half, floor, center.y + offset),
            color,
        );
    }
}

/// Power-of-ten spacing giving 10-100 lines across `extent`
pub(crate) fn grid_step(extent: f32) -> f32 {
    10f32.powf((extent.max(1e-3) / 10.0).log10().floor())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quad(element: u32, y: f32, color: [f32; 4], with_normals: bool) -> ElementMesh {
        ElementMesh {
            element: ElementId(element),
            positions: vec![0.0, y, 0.0, 1.0, y, 0.0, 1.0, y, 1.0, 0.0, y, 1.0],
            normals: if with_normals {
                [0.0, 1.0, 0.0].repeat(4)
            } else {
                Vec::new()
            },
            indices: vec![0, 2, 1, 0, 3, 2],
            color,
        }
    }

    #[test]
    fn test_batch_offsets_indices() {
        let mut batch = BatchBuilder::default();
        batch.add_mesh(&quad(1, 0.0, [1.0; 4], true));
        batch.add_mesh(&quad(2, 1.0, [1.0; 4], true));
        assert_eq!(batch.vertex_count(), 8);
        assert_eq!(batch.triangle_count(), 4);
        assert_eq!(&batch.indices[6..], &[4, 6, 5, 4, 7, 6]);
        assert!(!batch.missing_normals);
    }

    #[test]
    fn test_batch_skips_empty_meshes() {
        let mut batch = BatchBuilder::default();
        batch.add_mesh(&ElementMesh::default());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let mut batch = BatchBuilder::default();
        batch.add_mesh(&quad(1, 0.0, [1.0; 4], false));
        assert!(batch.missing_normals);
        let normals = compute_smooth_normals(&batch.positions, &batch.indices);
        for n in normals {
            assert_relative_eq!(n[1].abs(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_element_bounds_merge_meshes() {
        let model = SceneModel::new(
            ModelId(0),
            "quads.ifc",
            Vec::new(),
            vec![
                quad(1, 0.0, [1.0; 4], true),
                quad(1, 3.0, [1.0; 4], true),
                quad(2, 1.0, [1.0; 4], true),
            ],
        );
        let bounds = element_bounds(&model);
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[&ElementId(1)].min, [0.0, 0.0, 0.0]);
        assert_eq!(bounds[&ElementId(1)].max, [1.0, 3.0, 1.0]);
    }

    #[test]
    fn test_queue_collects_models_and_refreshes() {
        let mut queue = SceneHostQueue::default();
        let model = Arc::new(SceneModel::new(ModelId(3), "a.ifc", Vec::new(), Vec::new()));
        queue.add_model(model);
        queue.update();
        assert!(queue.has_pending());
        assert_eq!(queue.take_pending()[0].id, ModelId(3));
        assert!(queue.take_refresh());
        assert!(!queue.take_refresh());
    }

    #[test]
    fn test_scene_bounds_accumulate() {
        let mut scene = SceneBounds::default();
        let a = SceneModel::new(ModelId(0), "a.ifc", Vec::new(), vec![quad(1, 0.0, [1.0; 4], true)]);
        let b = SceneModel::new(ModelId(1), "b.ifc", Vec::new(), vec![quad(1, 4.0, [1.0; 4], true)]);
        scene.include(&a, 1);
        scene.include(&b, 1);
        assert_eq!(scene.models, 2);
        assert_eq!(scene.triangles, 4);
        let bounds = scene.bounds.unwrap();
        assert_eq!(bounds.max, [1.0, 4.0, 1.0]);
        assert_relative_eq!(scene.diagonal(), 18f32.sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn test_grid_step() {
        assert_relative_eq!(grid_step(50.0), 1.0);
        assert_relative_eq!(grid_step(500.0), 10.0);
        assert_relative_eq!(grid_step(5.0), 0.1, epsilon = 1e-6);
    }
}
