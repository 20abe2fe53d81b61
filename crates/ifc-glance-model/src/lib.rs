// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ifc-glance Model - Shared types and trait seams for the viewer
//!
//! This crate holds the data that flows between the IFC engine adapter, the
//! selection/properties bridge and the rendering front end. It has no
//! dependency on the renderer or the parser, so every piece of viewer logic
//! can be exercised with plain test doubles.
//!
//! # Architecture
//!
//! - [`SceneModel`] - A parsed file: meshes, element metadata, cached bounds
//! - [`Selection`] - Ordered model → elements map carried by click events
//! - [`ElementProperties`] - Untyped, ordered attribute map for one element
//! - [`PropertySource`] - One ranked way of resolving element properties
//! - [`ModelProperties`] - Model-level property table (property sets)
//! - [`SceneHost`] / [`CameraRig`] - What the core needs from the renderer
//!
//! # Example
//!
//! ```ignore
//! use ifc_glance_model::{ElementId, ModelId, Selection};
//!
//! let mut selection = Selection::default();
//! selection.push(ModelId(0), ElementId(42));
//! for (model, element) in selection.iter() {
//!     println!("{model}: {element}");
//! }
//! ```

pub mod bounds;
pub mod error;
pub mod model;
pub mod properties;
pub mod selection;
pub mod traits;
pub mod types;

// Re-export all public types
pub use bounds::*;
pub use error::*;
pub use model::*;
pub use properties::*;
pub use selection::*;
pub use traits::*;
pub use types::*;
