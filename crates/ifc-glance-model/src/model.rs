// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsed model as held by the scene

use crate::{Aabb, ElementId, ElementInfo, ElementMesh, ModelId, ModelProperties};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A parsed IFC file ready for rendering
///
/// Geometry is stored in viewer space: Y up, right handed, metres scaled by
/// the file's length unit. When the loader normalizes coordinates,
/// `origin_offset` holds the translation that was applied.
pub struct SceneModel {
    pub id: ModelId,
    /// File name the model was loaded from
    pub name: String,
    pub elements: Vec<ElementInfo>,
    pub meshes: Vec<ElementMesh>,
    /// Bounds computed at load time, `None` when not precomputed
    pub bounds: Option<Aabb>,
    pub origin_offset: [f64; 3],
    /// Handle of this model in the primary parser registry
    pub parser_handle: Option<u32>,
    pub properties: Option<Arc<dyn ModelProperties>>,
    element_index: FxHashMap<ElementId, usize>,
}

impl SceneModel {
    pub fn new(
        id: ModelId,
        name: impl Into<String>,
        elements: Vec<ElementInfo>,
        meshes: Vec<ElementMesh>,
    ) -> Self {
        let element_index = elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
        Self {
            id,
            name: name.into(),
            elements,
            meshes,
            bounds: None,
            origin_offset: [0.0; 3],
            parser_handle: None,
            properties: None,
            element_index,
        }
    }

    pub fn with_bounds(mut self, bounds: Option<Aabb>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_parser_handle(mut self, handle: u32) -> Self {
        self.parser_handle = Some(handle);
        self
    }

    pub fn with_properties(mut self, properties: Arc<dyn ModelProperties>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementInfo> {
        self.element_index.get(&id).map(|&i| &self.elements[i])
    }

    pub fn meshes_for(&self, id: ElementId) -> impl Iterator<Item = &ElementMesh> {
        self.meshes.iter().filter(move |m| m.element == id)
    }

    /// Walk every mesh vertex and compute bounds from scratch
    pub fn compute_bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for mesh in &self.meshes {
            aabb.merge(&mesh.bounds());
        }
        aabb
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangle_count()).sum()
    }
}

impl fmt::Debug for SceneModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneModel")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("elements", &self.elements.len())
            .field("meshes", &self.meshes.len())
            .field("bounds", &self.bounds)
            .field("parser_handle", &self.parser_handle)
            .field("properties", &self.properties.is_some())
            .finish()
    }
}
