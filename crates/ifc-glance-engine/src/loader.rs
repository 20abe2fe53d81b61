// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model loader adapter
//!
//! Turns raw file bytes into a [`SceneModel`]: product elements are
//! tessellated by the IFC engine, converted from IFC Z-up to viewer Y-up,
//! optionally recentred, and the content is registered with the primary
//! parser so raw lines stay queryable.

use crate::psets::StepPropertyTable;
use crate::registry::ParserRegistry;
use crate::step::StepContent;
use ifc_glance_model::{Aabb, ElementId, ElementInfo, ElementMesh, LoadError, ModelId, SceneModel};
use ifc_lite_core::{EntityScanner, IfcType};
use ifc_lite_geometry::GeometryRouter;
use std::sync::Arc;

/// Counters reported after a load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LoadStats {
    pub entities: usize,
    pub products: usize,
    pub meshes: usize,
    pub failed: usize,
}

/// A parsed model plus what the loader learned along the way
pub struct ParsedModel {
    pub model: SceneModel,
    pub stats: LoadStats,
    pub schema: Option<String>,
}

#[derive(Clone, Default)]
pub struct ModelLoader {
    registry: ParserRegistry,
}

impl ModelLoader {
    pub fn new(registry: ParserRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Parse `bytes` into a model with identifier `id`
    ///
    /// `file_name` only feeds error messages and the model name. Any file is
    /// attempted; non-IFC input fails with a [`LoadError`].
    pub fn parse(
        &self,
        bytes: &[u8],
        normalize: bool,
        file_name: &str,
        id: ModelId,
    ) -> Result<ParsedModel, LoadError> {
        let content = StepContent::from_bytes(bytes, file_name)?;
        let mut stats = LoadStats {
            entities: content.entity_count(),
            ..Default::default()
        };

        let (elements, mut meshes) = {
            let mut decoder = content.decoder();
            let router = GeometryRouter::with_units(content.text(), &mut decoder);

            let mut products: Vec<(u32, String)> = Vec::new();
            let mut scanner = EntityScanner::new(content.text());
            while let Some((entity_id, type_name, _, _)) = scanner.next_entity() {
                if ifc_lite_core::has_geometry_by_name(type_name)
                    && !matches!(IfcType::from_str(type_name), IfcType::Unknown(_))
                {
                    products.push((entity_id, type_name.to_ascii_uppercase()));
                }
            }
            stats.products = products.len();

            let mut elements = Vec::with_capacity(products.len());
            let mut meshes = Vec::new();
            for (entity_id, type_name) in products {
                let entity = match decoder.decode_by_id(entity_id) {
                    Ok(e) => e,
                    Err(e) => {
                        log::debug!("[Loader] Failed to decode #{}: {}", entity_id, e);
                        stats.failed += 1;
                        continue;
                    }
                };

                // IfcRoot/IfcProduct layout: GlobalId, _, Name, _, ObjectType, _, _, Tag
                let info = ElementInfo {
                    id: ElementId(entity_id),
                    global_id: entity.get_string(0).map(str::to_string),
                    name: entity.get_string(2).map(str::to_string),
                    object_type: entity.get_string(4).map(str::to_string),
                    tag: entity.get_string(7).map(str::to_string),
                    ifc_type: type_name.clone(),
                };
                elements.push(info);

                let mesh = match router.process_element(&entity, &mut decoder) {
                    Ok(m) => m,
                    Err(e) => {
                        log::debug!(
                            "[Loader] Failed to process #{} ({}): {}",
                            entity_id,
                            type_name,
                            e
                        );
                        stats.failed += 1;
                        continue;
                    }
                };
                if mesh.is_empty() {
                    continue;
                }
                meshes.push(to_viewer_mesh(
                    ElementId(entity_id),
                    mesh.positions,
                    mesh.normals,
                    mesh.indices,
                    default_color(&type_name),
                ));
            }
            (elements, meshes)
        };
        stats.meshes = meshes.len();

        let mut bounds = Aabb::empty();
        for mesh in &meshes {
            bounds.merge(&mesh.bounds());
        }

        let mut origin_offset = [0.0; 3];
        if normalize && !bounds.is_empty() {
            let c = bounds.center();
            origin_offset = [-c[0], -c[1], -c[2]];
            for mesh in &mut meshes {
                mesh.translate(origin_offset);
            }
            bounds = bounds.translated(origin_offset);
        }

        let schema = content.schema();
        let properties = Arc::new(StepPropertyTable::build(content.clone()));
        let handle = self.registry.register(content);

        let mut model = SceneModel::new(id, file_name, elements, meshes)
            .with_bounds((!bounds.is_empty()).then_some(bounds))
            .with_parser_handle(handle)
            .with_properties(properties);
        model.origin_offset = origin_offset;

        Ok(ParsedModel {
            model,
            stats,
            schema,
        })
    }
}

/// Swap IFC Z-up into viewer Y-up: (x, y, z) → (x, z, -y)
pub fn to_viewer_mesh(
    element: ElementId,
    mut positions: Vec<f32>,
    mut normals: Vec<f32>,
    indices: Vec<u32>,
    color: [f32; 4],
) -> ElementMesh {
    for chunk in positions.chunks_exact_mut(3).chain(normals.chunks_exact_mut(3)) {
        let (y, z) = (chunk[1], chunk[2]);
        chunk[1] = z;
        chunk[2] = -y;
    }
    ElementMesh {
        element,
        positions,
        normals,
        indices,
        color,
    }
}

/// Base color by IFC type; glazing and spaces are translucent
pub fn default_color(ifc_type: &str) -> [f32; 4] {
    let t = ifc_type.to_ascii_uppercase();
    if t.contains("WINDOW") || t.contains("CURTAINWALL") {
        [0.5, 0.7, 0.85, 0.35]
    } else if t.contains("SPACE") {
        [0.8, 0.85, 0.95, 0.12]
    } else if t.contains("WALL") {
        [0.92, 0.85, 0.75, 1.0]
    } else if t.contains("SLAB") || t.contains("FOOTING") || t.contains("PILE") {
        [0.75, 0.73, 0.70, 1.0]
    } else if t.contains("ROOF") {
        [0.72, 0.55, 0.45, 1.0]
    } else if t.contains("BEAM") || t.contains("COLUMN") || t.contains("MEMBER") || t.contains("PLATE") {
        [0.60, 0.65, 0.72, 1.0]
    } else if t.contains("DOOR") || t.contains("FURNI") {
        [0.55, 0.35, 0.20, 1.0]
    } else if t.contains("RAILING") {
        [0.35, 0.35, 0.38, 1.0]
    } else {
        [0.8, 0.8, 0.8, 1.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::tests::{TEST_IFC, WALL_IFC};
    use approx::assert_relative_eq;

    #[test]
    fn test_axis_swap() {
        let mesh = to_viewer_mesh(
            ElementId(1),
            vec![1.0, 2.0, 3.0],
            vec![0.0, 0.0, 1.0],
            vec![],
            [1.0; 4],
        );
        assert_eq!(mesh.positions, vec![1.0, 3.0, -2.0]);
        assert_eq!(mesh.normals, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_parse_without_geometry_has_no_bounds() {
        let loader = ModelLoader::default();
        let parsed = loader
            .parse(TEST_IFC.as_bytes(), true, "test.ifc", ModelId(0))
            .unwrap();

        assert!(parsed.model.meshes.is_empty());
        assert!(parsed.model.bounds.is_none());
        assert_eq!(parsed.model.parser_handle, Some(0));
        assert!(parsed.model.properties.is_some());
        assert_eq!(parsed.schema.as_deref(), Some("IFC4"));
        assert_eq!(loader.registry().len(), 1);

        let wall = parsed.model.element(ElementId(10)).unwrap();
        assert_eq!(wall.ifc_type, "IFCWALL");
        assert_eq!(wall.name.as_deref(), Some("Wall 1"));
        assert_eq!(wall.tag.as_deref(), Some("T-100"));
    }

    #[test]
    fn test_parse_tessellates_extruded_wall() {
        let loader = ModelLoader::default();
        let raw = loader
            .parse(WALL_IFC.as_bytes(), false, "wall.ifc", ModelId(0))
            .unwrap();
        assert_eq!(raw.stats.products, 1);
        assert_eq!(raw.stats.meshes, 1);
        assert_eq!(raw.stats.failed, 0);

        let mesh = &raw.model.meshes[0];
        assert_eq!(mesh.element, ElementId(110));
        assert!(!mesh.indices.is_empty());
        assert_eq!(mesh.color, default_color("IFCWALL"));

        // Extrusion along IFC +Z becomes viewer +Y; the profile depth lands on Z
        let bounds = raw.model.bounds.unwrap();
        assert_relative_eq!(bounds.min[1], 0.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.max[1], 3.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.size()[0], 5.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.size()[2], 0.2, epsilon = 1e-5);
        assert_eq!(raw.model.origin_offset, [0.0; 3]);

        let normalized = ModelLoader::default()
            .parse(WALL_IFC.as_bytes(), true, "wall.ifc", ModelId(1))
            .unwrap();
        let bounds = normalized.model.bounds.unwrap();
        assert_relative_eq!(bounds.min[1], -1.5, epsilon = 1e-5);
        assert_relative_eq!(bounds.max[1], 1.5, epsilon = 1e-5);
        assert_relative_eq!(normalized.model.origin_offset[1], -1.5, epsilon = 1e-5);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let loader = ModelLoader::default();
        let err = loader
            .parse(b"PK\x03\x04 zip archive", false, "model.ifczip", ModelId(0))
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::NotStep { ref file } if file == "model.ifczip"));
        assert!(loader.registry().is_empty());
    }

    #[test]
    fn test_default_colors() {
        assert_eq!(default_color("IfcWindow")[3], 0.35);
        assert_eq!(default_color("IFCWALLSTANDARDCASE"), [0.92, 0.85, 0.75, 1.0]);
        assert_eq!(default_color("IFCCURTAINWALL")[3], 0.35);
    }
}
