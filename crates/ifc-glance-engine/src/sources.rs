// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The ranked property sources
//!
//! Listed here from highest to lowest priority:
//!
//! 1. [`SidecarSource`] - raw line from the sidecar session of the model
//! 2. [`ItemAttributesSource`] - element metadata captured at load time
//! 3. [`ModelPropertiesSource`] - property and quantity sets
//! 4. [`LocalPropertiesSource`] - facts derived from the element's geometry
//! 5. [`PrimaryParserSource`] - raw line from the primary parser registry

use crate::registry::ParserRegistry;
use crate::sidecar::SharedSidecar;
use ifc_glance_model::{
    Aabb, AttributeValue, ElementId, ElementProperties, PropertyLookup, PropertySource, SceneModel,
};

pub struct SidecarSource {
    sidecar: SharedSidecar,
}

impl SidecarSource {
    pub fn new(sidecar: SharedSidecar) -> Self {
        Self { sidecar }
    }
}

impl PropertySource for SidecarSource {
    fn name(&self) -> &str {
        "sidecar"
    }

    fn lookup(&self, model: &SceneModel, element: ElementId) -> PropertyLookup {
        match self.sidecar.handle_for(model.id) {
            Some(handle) => self.sidecar.get_line(handle, element).into(),
            None => PropertyLookup::Empty,
        }
    }
}

pub struct ItemAttributesSource;

impl PropertySource for ItemAttributesSource {
    fn name(&self) -> &str {
        "item attributes"
    }

    fn lookup(&self, model: &SceneModel, element: ElementId) -> PropertyLookup {
        let Some(info) = model.element(element) else {
            return PropertyLookup::Empty;
        };
        let mut props = ElementProperties::new().with("type", info.ifc_type.as_str());
        let optional = [
            ("GlobalId", &info.global_id),
            ("Name", &info.name),
            ("ObjectType", &info.object_type),
            ("Tag", &info.tag),
        ];
        for (name, value) in optional {
            if let Some(v) = value {
                props.insert(name, v.as_str());
            }
        }
        PropertyLookup::from_properties(props)
    }
}

/// Flattens each set into `SetName.PropertyName` entries
pub struct ModelPropertiesSource;

impl PropertySource for ModelPropertiesSource {
    fn name(&self) -> &str {
        "model properties"
    }

    fn lookup(&self, model: &SceneModel, element: ElementId) -> PropertyLookup {
        let Some(table) = &model.properties else {
            return PropertyLookup::Empty;
        };
        match table.item_properties(element) {
            Ok(sets) => {
                let mut props = ElementProperties::new();
                for set in sets {
                    for (name, value) in set.values {
                        props.insert(format!("{}.{}", set.name, name), value);
                    }
                }
                PropertyLookup::from_properties(props)
            }
            Err(e) => PropertyLookup::Failed(e),
        }
    }
}

pub struct LocalPropertiesSource;

impl PropertySource for LocalPropertiesSource {
    fn name(&self) -> &str {
        "local properties"
    }

    fn lookup(&self, model: &SceneModel, element: ElementId) -> PropertyLookup {
        let mut bounds = Aabb::empty();
        let mut vertices = 0;
        let mut triangles = 0;
        for mesh in model.meshes_for(element) {
            bounds.merge(&mesh.bounds());
            vertices += mesh.vertex_count();
            triangles += mesh.triangle_count();
        }
        let info = model.element(element);
        if info.is_none() && vertices == 0 {
            return PropertyLookup::Empty;
        }

        let mut props = ElementProperties::new().with("expressID", AttributeValue::Integer(element.0 as i64));
        if let Some(info) = info {
            props.insert("type", info.ifc_type.as_str());
        }
        props.insert("Vertices", vertices);
        props.insert("Triangles", triangles);
        if !bounds.is_empty() {
            let size = bounds.size();
            props.insert("Width", size[0]);
            props.insert("Height", size[1]);
            props.insert("Depth", size[2]);
        }
        PropertyLookup::Found(props)
    }
}

/// Falls back to handle 0 for models without a registered handle
pub struct PrimaryParserSource {
    registry: ParserRegistry,
}

impl PrimaryParserSource {
    pub fn new(registry: ParserRegistry) -> Self {
        Self { registry }
    }
}

impl PropertySource for PrimaryParserSource {
    fn name(&self) -> &str {
        "primary parser"
    }

    fn lookup(&self, model: &SceneModel, element: ElementId) -> PropertyLookup {
        let handle = model.parser_handle.unwrap_or(0);
        self.registry.get_line(handle, element).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_fit::tests::box_mesh;
    use crate::loader::ModelLoader;
    use crate::sidecar::SidecarParser;
    use crate::step::tests::TEST_IFC;
    use ifc_glance_model::{ElementInfo, ModelId, PropertyError, SessionError};

    fn loaded() -> (ModelLoader, SceneModel) {
        let loader = ModelLoader::default();
        let parsed = loader
            .parse(TEST_IFC.as_bytes(), false, "test.ifc", ModelId(0))
            .unwrap();
        (loader, parsed.model)
    }

    #[test]
    fn test_sidecar_source() {
        let (_, model) = loaded();
        let sidecar = SharedSidecar::new();
        let source = SidecarSource::new(sidecar.clone());
        assert_eq!(source.lookup(&model, ElementId(10)), PropertyLookup::Empty);

        sidecar
            .attach(ModelId(0), SidecarParser::prepare(TEST_IFC.as_bytes()).unwrap())
            .unwrap();
        assert!(source.lookup(&model, ElementId(10)).is_found());

        // Another model takes over the single session
        sidecar
            .attach(ModelId(1), SidecarParser::prepare(TEST_IFC.as_bytes()).unwrap())
            .unwrap();
        assert!(matches!(
            source.lookup(&model, ElementId(10)),
            PropertyLookup::Failed(PropertyError::Session(SessionError::StaleHandle { .. }))
        ));
    }

    #[test]
    fn test_item_attributes_source() {
        let (_, model) = loaded();
        let PropertyLookup::Found(props) = ItemAttributesSource.lookup(&model, ElementId(10)) else {
            panic!("expected attributes");
        };
        assert_eq!(props.get("Name"), Some(&AttributeValue::text("Wall 1")));
        assert_eq!(props.get("ObjectType"), Some(&AttributeValue::text("Basic Wall")));
        assert_eq!(
            ItemAttributesSource.lookup(&model, ElementId(20)),
            PropertyLookup::Empty
        );
    }

    #[test]
    fn test_model_properties_source_flattens_sets() {
        let (_, model) = loaded();
        let PropertyLookup::Found(props) = ModelPropertiesSource.lookup(&model, ElementId(10)) else {
            panic!("expected property sets");
        };
        assert_eq!(
            props.get("Pset_WallCommon.FireRating").and_then(|v| v.display_text()),
            Some("REI60".to_string())
        );
        assert_eq!(
            props.get("Qto_WallBaseQuantities.Length"),
            Some(&AttributeValue::Real(5.25))
        );
    }

    #[test]
    fn test_local_properties_source() {
        let model = SceneModel::new(
            ModelId(0),
            "a.ifc",
            vec![ElementInfo::new(ElementId(5), "IFCSLAB")],
            vec![box_mesh(5, [0.0, 0.0, 0.0], [2.0, 0.5, 3.0])],
        );
        let PropertyLookup::Found(props) = LocalPropertiesSource.lookup(&model, ElementId(5)) else {
            panic!("expected local properties");
        };
        assert_eq!(props.get("Triangles"), Some(&AttributeValue::Integer(1)));
        assert_eq!(props.get("Depth"), Some(&AttributeValue::Real(3.0)));
        assert_eq!(
            LocalPropertiesSource.lookup(&model, ElementId(6)),
            PropertyLookup::Empty
        );
    }

    #[test]
    fn test_primary_parser_defaults_to_handle_zero() {
        let (loader, mut model) = loaded();
        let source = PrimaryParserSource::new(loader.registry().clone());
        model.parser_handle = None;
        assert!(source.lookup(&model, ElementId(10)).is_found());

        model.parser_handle = Some(7);
        assert!(matches!(
            source.lookup(&model, ElementId(10)),
            PropertyLookup::Failed(PropertyError::Session(SessionError::UnknownHandle(7)))
        ));
    }
}
