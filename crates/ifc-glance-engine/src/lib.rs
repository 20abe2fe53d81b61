// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ifc-glance Engine - Renderer-independent viewer core
//!
//! Everything between "bytes picked by the user" and "pixels on screen" that
//! does not need a GPU lives here:
//!
//! - [`ModelLoader`] - bytes → [`SceneModel`](ifc_glance_model::SceneModel) via the IFC engine
//! - [`SidecarParser`] - single-session raw attribute parser
//! - [`PropertyResolver`] - ranked [`PropertySource`](ifc_glance_model::PropertySource)s
//! - [`SelectionBridge`] - selection events → [`PropertiesPanel`]
//! - [`CameraFitController`] - frames a model through a camera rig
//! - [`Diagnostics`] - logger handle mirrored into the on-screen log panel
//! - [`ViewerSession`] - wires the above into the load and selection flows

pub mod bridge;
pub mod camera_fit;
pub mod config;
pub mod diagnostics;
pub mod loader;
pub mod panel;
pub mod psets;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod sidecar;
pub mod sources;
pub mod step;

pub use bridge::{ModelRegistry, SelectionBridge};
pub use camera_fit::{compute_fit, CameraFit, CameraFitController, DEFAULT_FIT_MARGIN};
pub use config::{ConfigError, ViewerConfig};
pub use diagnostics::{Diagnostics, LogArg, LogPanel};
pub use loader::{LoadStats, ModelLoader, ParsedModel};
pub use panel::{PropertiesPanel, PropertyBlock, PropertyRow, NO_PROPERTIES_MESSAGE};
pub use registry::ParserRegistry;
pub use resolver::{PropertyResolver, Resolved};
pub use session::{LoadGate, LoadOutcome, LoadTicket, PendingLoad, ViewerSession};
pub use sidecar::{SharedSidecar, SidecarParser};
pub use step::StepContent;
