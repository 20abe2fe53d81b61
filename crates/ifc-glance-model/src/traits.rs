// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core traits for the viewer
//!
//! These traits are the seams between the viewer logic and the outside world:
//! the ways of resolving properties, and the renderer that owns the scene and
//! the camera.

use crate::{ElementId, PropertyError, PropertyLookup, PropertySet, SceneModel};
use std::sync::Arc;

/// One ranked way of resolving an element's attributes
///
/// Sources are tried in a fixed priority order; the first one returning
/// [`PropertyLookup::Found`] wins. `Empty` and `Failed` both fall through to
/// the next source, `Failed` is additionally logged.
///
/// # Example
///
/// ```ignore
/// struct Fixed;
///
/// impl PropertySource for Fixed {
///     fn name(&self) -> &str { "fixed" }
///     fn lookup(&self, _model: &SceneModel, _element: ElementId) -> PropertyLookup {
///         PropertyLookup::Empty
///     }
/// }
/// ```
pub trait PropertySource: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &str;

    /// Resolve attributes of `element` within `model`
    fn lookup(&self, model: &SceneModel, element: ElementId) -> PropertyLookup;
}

/// Model-level property table
///
/// Attached to a [`SceneModel`] by the loader when the IFC engine can
/// enumerate property sets.
pub trait ModelProperties: Send + Sync {
    /// Property and quantity sets attached to `element`
    ///
    /// Returns an empty list for elements without sets.
    fn item_properties(&self, element: ElementId) -> Result<Vec<PropertySet>, PropertyError>;
}

/// The renderer side that owns the scene graph
pub trait SceneHost {
    /// Take ownership of a freshly loaded model
    fn add_model(&mut self, model: Arc<SceneModel>);

    /// Force a scene-wide refresh (visibility, clip planes, culling)
    fn update(&mut self);
}

/// The renderer side that owns the camera
pub trait CameraRig {
    /// Vertical field of view in radians
    fn vertical_fov(&self) -> f64;

    /// Move the camera to `position` and aim the orbit target at `target`
    fn look_at(&mut self, position: [f64; 3], target: [f64; 3], animate: bool);
}
