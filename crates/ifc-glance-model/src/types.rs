// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifiers, element metadata and per-element meshes

use crate::Aabb;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a loaded model, assigned by the viewer session
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default, PartialOrd, Ord)]
pub struct ModelId(pub u32);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model {}", self.0)
    }
}

/// Type-safe element identifier
///
/// Wraps the STEP express id (e.g., #123 becomes ElementId(123))
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default, PartialOrd, Ord)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for ElementId {
    fn from(id: u32) -> Self {
        ElementId(id)
    }
}

impl From<ElementId> for u32 {
    fn from(id: ElementId) -> Self {
        id.0
    }
}

/// Metadata captured for every product element at load time
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub id: ElementId,
    /// Uppercase STEP type name, e.g. `IFCWALL`
    pub ifc_type: String,
    pub global_id: Option<String>,
    pub name: Option<String>,
    pub object_type: Option<String>,
    pub tag: Option<String>,
}

impl ElementInfo {
    pub fn new(id: ElementId, ifc_type: impl Into<String>) -> Self {
        Self {
            id,
            ifc_type: ifc_type.into(),
            ..Default::default()
        }
    }
}

/// Triangle mesh of a single element in viewer space (Y up)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementMesh {
    pub element: ElementId,
    /// Flat xyz triples
    pub positions: Vec<f32>,
    /// Flat xyz triples, same length as `positions`
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
    /// Linear RGBA
    pub color: [f32; 4],
}

impl ElementMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Bounds of every vertex, empty when there are none
    pub fn bounds(&self) -> Aabb {
        Aabb::from_positions(&self.positions)
    }

    /// Move every vertex by `offset`
    pub fn translate(&mut self, offset: [f64; 3]) {
        for chunk in self.positions.chunks_exact_mut(3) {
            chunk[0] = (chunk[0] as f64 + offset[0]) as f32;
            chunk[1] = (chunk[1] as f64 + offset[1]) as f32;
            chunk[2] = (chunk[2] as f64 + offset[2]) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_id_display() {
        assert_eq!(ElementId(123).to_string(), "#123");
        assert_eq!(ModelId(2).to_string(), "model 2");
    }

    #[test]
    fn test_mesh_counts_and_translate() {
        let mut mesh = ElementMesh {
            element: ElementId(7),
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2],
            color: [1.0; 4],
        };
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);

        mesh.translate([1.0, 2.0, 3.0]);
        assert_eq!(&mesh.positions[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(mesh.bounds().min, [1.0, 2.0, 3.0]);
    }
}
