// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera framing for freshly loaded models

use crate::diagnostics::{Diagnostics, LogArg};
use ifc_glance_model::{Aabb, CameraRig, FitError, SceneModel};
use nalgebra::{Point3, Vector3};
use serde::Serialize;

/// Default multiplier on the framing distance
pub const DEFAULT_FIT_MARGIN: f64 = 1.5;

/// Where the camera goes to frame a bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFit {
    pub center: Point3<f64>,
    pub size: Vector3<f64>,
    pub max_extent: f64,
    /// Horizontal distance from the center along +Z
    pub distance: f64,
    pub position: Point3<f64>,
}

#[derive(Serialize)]
struct FitSummary {
    center: [f64; 3],
    size: [f64; 3],
    #[serde(rename = "maxDim")]
    max_dim: f64,
}

/// Compute the framing for `bounds`
///
/// The distance is the one at which the largest extent fills the vertical
/// field of view, times `margin`. The camera sits that far behind the center
/// and one max extent above it.
pub fn compute_fit(bounds: &Aabb, fov: f64, margin: f64) -> Result<CameraFit, FitError> {
    if !(fov > 0.0 && fov < std::f64::consts::PI) {
        return Err(FitError::InvalidFov(fov));
    }
    let max_extent = bounds.max_extent();
    if bounds.is_empty() || max_extent <= 0.0 || !max_extent.is_finite() {
        return Err(FitError::EmptyBounds);
    }

    let center = Point3::from(bounds.center());
    let size = Vector3::from(bounds.size());
    let distance = (max_extent / 2.0) / (fov / 2.0).tan() * margin;
    let position = center + Vector3::new(0.0, max_extent, distance);

    Ok(CameraFit {
        center,
        size,
        max_extent,
        distance,
        position,
    })
}

/// Frames models through a [`CameraRig`]
#[derive(Clone, Debug)]
pub struct CameraFitController {
    diag: Diagnostics,
    margin: f64,
}

impl CameraFitController {
    pub fn new(diag: Diagnostics, margin: f64) -> Self {
        Self { diag, margin }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Move `rig` to frame `model`
    ///
    /// Falls back to a full traversal when the cached bounds are missing or
    /// degenerate. On [`FitError`] the error is logged and the rig is left
    /// untouched.
    pub fn fit(&self, model: &SceneModel, rig: &mut dyn CameraRig) -> Result<CameraFit, FitError> {
        let bounds = match model.bounds {
            Some(b) if !b.is_empty() && b.max_extent() > 0.0 => b,
            _ => {
                self.diag.info([LogArg::from(
                    "Model bounding box empty or missing, calculating from geometry...",
                )]);
                model.compute_bounds()
            }
        };

        let fit = match compute_fit(&bounds, rig.vertical_fov(), self.margin) {
            Ok(fit) => fit,
            Err(e) => {
                self.diag.error([LogArg::error(&e)]);
                return Err(e);
            }
        };

        self.diag.info([
            LogArg::from("Bounding box calculated:"),
            LogArg::json(&FitSummary {
                center: fit.center.coords.into(),
                size: fit.size.into(),
                max_dim: fit.max_extent,
            }),
        ]);

        rig.look_at(fit.position.coords.into(), fit.center.coords.into(), true);
        Ok(fit)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ifc_glance_model::{ElementId, ElementMesh, ModelId};

    /// Records every camera move
    #[derive(Default)]
    pub(crate) struct RecordingRig {
        pub fov: f64,
        pub moves: Vec<([f64; 3], [f64; 3], bool)>,
    }

    impl RecordingRig {
        pub fn new() -> Self {
            Self {
                fov: 45f64.to_radians(),
                moves: Vec::new(),
            }
        }
    }

    impl CameraRig for RecordingRig {
        fn vertical_fov(&self) -> f64 {
            self.fov
        }

        fn look_at(&mut self, position: [f64; 3], target: [f64; 3], animate: bool) {
            self.moves.push((position, target, animate));
        }
    }

    pub(crate) fn box_mesh(element: u32, min: [f32; 3], max: [f32; 3]) -> ElementMesh {
        ElementMesh {
            element: ElementId(element),
            positions: vec![min[0], min[1], min[2], max[0], max[1], max[2], min[0], max[1], min[2]],
            normals: vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            color: [1.0; 4],
        }
    }

    #[test]
    fn test_distance_scales_with_extent() {
        let fov = 45f64.to_radians();
        let small = compute_fit(&Aabb::new([0.0; 3], [10.0, 2.0, 4.0]), fov, 1.5).unwrap();
        let large = compute_fit(&Aabb::new([0.0; 3], [20.0, 4.0, 8.0]), fov, 1.5).unwrap();

        assert_relative_eq!(small.max_extent, 10.0);
        assert_relative_eq!(small.distance, 5.0 / (fov / 2.0).tan() * 1.5);
        assert_relative_eq!(large.distance / small.distance, 2.0, epsilon = 1e-12);
        assert_relative_eq!(small.distance / (small.max_extent * 1.5), large.distance / (large.max_extent * 1.5));
    }

    #[test]
    fn test_camera_above_and_behind_center() {
        let fit = compute_fit(&Aabb::new([-1.0, -1.0, -1.0], [3.0, 1.0, 1.0]), 1.0, 1.5).unwrap();
        assert_eq!(fit.center, Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(fit.position.y - fit.center.y, 4.0);
        assert_relative_eq!(fit.position.z - fit.center.z, fit.distance);
        assert_relative_eq!(fit.position.x, fit.center.x);
    }

    #[test]
    fn test_zero_extent_is_error() {
        let point = Aabb::new([1.0; 3], [1.0; 3]);
        assert_eq!(compute_fit(&point, 1.0, 1.5), Err(FitError::EmptyBounds));
        assert_eq!(compute_fit(&Aabb::empty(), 1.0, 1.5), Err(FitError::EmptyBounds));
        assert!(matches!(
            compute_fit(&Aabb::new([0.0; 3], [1.0; 3]), 0.0, 1.5),
            Err(FitError::InvalidFov(_))
        ));
    }

    #[test]
    fn test_fit_recomputes_missing_bounds() {
        let diag = Diagnostics::new(false);
        let controller = CameraFitController::new(diag.clone(), DEFAULT_FIT_MARGIN);
        let model = SceneModel::new(
            ModelId(0),
            "a.ifc",
            Vec::new(),
            vec![box_mesh(1, [0.0, 0.0, 0.0], [4.0, 2.0, 2.0])],
        );
        let mut rig = RecordingRig::new();

        let fit = controller.fit(&model, &mut rig).unwrap();
        assert_eq!(rig.moves.len(), 1);
        let (position, target, animate) = rig.moves[0];
        assert_eq!(target, [2.0, 1.0, 1.0]);
        assert_eq!(position[1], 1.0 + 4.0);
        assert!(animate);
        assert_relative_eq!(fit.max_extent, 4.0);

        let text = diag.panel_text();
        assert!(text.contains("calculating from geometry"));
        assert!(text.contains("Bounding box calculated: {\"center\":[2.0,1.0,1.0]"));
    }

    #[test]
    fn test_fit_without_geometry_logs_and_leaves_camera() {
        let diag = Diagnostics::new(false);
        let controller = CameraFitController::new(diag.clone(), DEFAULT_FIT_MARGIN);
        let model = SceneModel::new(ModelId(0), "empty.ifc", Vec::new(), Vec::new());
        let mut rig = RecordingRig::new();

        assert_eq!(controller.fit(&model, &mut rig), Err(FitError::EmptyBounds));
        assert!(rig.moves.is_empty());
        assert!(diag
            .panel_text()
            .contains("ERROR: Bounding box is still empty. Please check if the IFC file contains 3D geometry."));
    }
}
