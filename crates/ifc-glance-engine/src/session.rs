// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer session: load flow, selection and camera-rest wiring
//!
//! A load is split in three so the parse can run on a task pool:
//!
//! 1. [`ViewerSession::begin_load`] claims the load gate and assigns an id
//! 2. [`PendingLoad::run`] parses and indexes the sidecar copy, and may run
//!    on any thread
//! 3. [`ViewerSession::finish_load`] adds the model to the scene, swaps the
//!    sidecar session and frames the camera
//!
//! [`ViewerSession::load_bytes`] chains all three for synchronous callers.

use crate::bridge::{ModelRegistry, SelectionBridge};
use crate::camera_fit::CameraFitController;
use crate::config::ViewerConfig;
use crate::diagnostics::{Diagnostics, LogArg};
use crate::loader::{ModelLoader, ParsedModel};
use crate::panel::PropertiesPanel;
use crate::registry::ParserRegistry;
use crate::resolver::PropertyResolver;
use crate::step::StepContent;
use crate::sidecar::{SharedSidecar, SidecarParser};
use crate::sources::{
    ItemAttributesSource, LocalPropertiesSource, ModelPropertiesSource, PrimaryParserSource,
    SidecarSource,
};
use ifc_glance_model::{CameraRig, LoadError, ModelId, SceneHost, Selection, SessionError};
use std::sync::Arc;

/// Proof that the load gate was claimed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    serial: u64,
    pub file_name: String,
    pub model_id: ModelId,
}

/// Admits one load at a time; overlapping loads are rejected
#[derive(Debug, Default)]
pub struct LoadGate {
    current: Option<(u64, String)>,
    next_serial: u64,
}

impl LoadGate {
    pub fn begin(&mut self, file_name: &str, model_id: ModelId) -> Result<LoadTicket, LoadError> {
        if let Some((_, current)) = &self.current {
            return Err(LoadError::Busy {
                requested: file_name.to_string(),
                current: current.clone(),
            });
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        self.current = Some((serial, file_name.to_string()));
        Ok(LoadTicket {
            serial,
            file_name: file_name.to_string(),
            model_id,
        })
    }

    /// Release the gate; tickets of other loads are ignored
    pub fn finish(&mut self, ticket: &LoadTicket) -> bool {
        match &self.current {
            Some((serial, _)) if *serial == ticket.serial => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|(_, f)| f.as_str())
    }
}

/// Work item for the parse step
pub struct PendingLoad {
    pub ticket: LoadTicket,
    pub bytes: Vec<u8>,
    normalize: bool,
    sidecar: bool,
    loader: ModelLoader,
}

/// Result of [`PendingLoad::run`]
pub struct LoadOutcome {
    pub ticket: LoadTicket,
    pub result: Result<ParsedModel, LoadError>,
    /// Independent copy for the sidecar, indexed alongside the parse
    pub sidecar: Option<Result<StepContent, SessionError>>,
}

impl PendingLoad {
    pub fn run(self) -> LoadOutcome {
        let result = self.loader.parse(
            &self.bytes,
            self.normalize,
            &self.ticket.file_name,
            self.ticket.model_id,
        );
        // Nothing to attach to when the main parse failed
        let sidecar = (self.sidecar && result.is_ok()).then(|| SidecarParser::prepare(&self.bytes));
        LoadOutcome {
            ticket: self.ticket,
            result,
            sidecar,
        }
    }
}

pub struct ViewerSession {
    config: ViewerConfig,
    diag: Diagnostics,
    loader: ModelLoader,
    sidecar: Option<SharedSidecar>,
    models: ModelRegistry,
    gate: LoadGate,
    bridge: SelectionBridge,
    fitter: CameraFitController,
    next_model: u32,
}

impl ViewerSession {
    pub fn new(config: ViewerConfig, diag: Diagnostics) -> Self {
        let registry = ParserRegistry::new();
        let sidecar = config.sidecar.then(SharedSidecar::new);

        let mut resolver = PropertyResolver::new(diag.clone());
        if let Some(sidecar) = &sidecar {
            resolver = resolver.with_source(SidecarSource::new(sidecar.clone()));
        }
        let resolver = resolver
            .with_source(ItemAttributesSource)
            .with_source(ModelPropertiesSource)
            .with_source(LocalPropertiesSource)
            .with_source(PrimaryParserSource::new(registry.clone()));

        Self {
            bridge: SelectionBridge::new(resolver, diag.clone()),
            fitter: CameraFitController::new(diag.clone(), config.fit_margin),
            loader: ModelLoader::new(registry),
            sidecar,
            models: ModelRegistry::default(),
            gate: LoadGate::default(),
            next_model: 0,
            config,
            diag,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn is_loading(&self) -> bool {
        self.gate.is_busy()
    }

    pub fn sidecar(&self) -> Option<&SharedSidecar> {
        self.sidecar.as_ref()
    }

    /// Claim the load gate for `file_name`
    ///
    /// A rejected load is logged and leaves the running load untouched.
    pub fn begin_load(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<PendingLoad, LoadError> {
        self.diag.info([LogArg::from("File selected:"), LogArg::from(file_name)]);
        let ticket = match self.gate.begin(file_name, ModelId(self.next_model)) {
            Ok(t) => t,
            Err(e) => {
                self.diag.error([LogArg::error(&e)]);
                return Err(e);
            }
        };
        self.next_model += 1;
        self.diag.info([LogArg::from("Loading model...")]);
        Ok(PendingLoad {
            ticket,
            bytes,
            normalize: self.config.normalize,
            sidecar: self.sidecar.is_some(),
            loader: self.loader.clone(),
        })
    }

    /// The picked file could not be read; nothing was loaded
    pub fn read_failed(&self, file_name: &str, reason: &str) {
        self.diag.info([LogArg::from("File selected:"), LogArg::from(file_name)]);
        self.diag.error([
            LogArg::display(format_args!("Failed to read {}:", file_name)),
            LogArg::from(reason),
        ]);
    }

    /// Finish a load: scene, sidecar, camera
    pub fn finish_load(
        &mut self,
        outcome: LoadOutcome,
        scene: &mut dyn SceneHost,
        camera: &mut dyn CameraRig,
    ) -> Option<ModelId> {
        let LoadOutcome {
            ticket,
            result,
            sidecar: prepared,
        } = outcome;
        self.gate.finish(&ticket);

        let parsed = match result {
            Ok(p) => p,
            Err(e) => {
                self.diag.error([LogArg::from("Error loading model:"), LogArg::error(&e)]);
                return None;
            }
        };
        self.diag.info([LogArg::from("Model loaded successfully")]);
        self.diag.info([
            LogArg::from("Model stats:"),
            LogArg::json(&parsed.stats),
            LogArg::from(parsed.schema.as_deref().unwrap_or("unknown schema")),
        ]);

        let model = Arc::new(parsed.model);
        let id = model.id;
        self.models.insert(Arc::clone(&model));
        scene.add_model(Arc::clone(&model));
        scene.update();

        if let (Some(sidecar), Some(prepared)) = (&self.sidecar, prepared) {
            match prepared.and_then(|content| sidecar.attach(id, content)) {
                Ok((handle, closed)) => {
                    if let Some(closed) = closed {
                        self.diag
                            .debug([LogArg::display(format_args!("[Sidecar] Closed session {}", closed))]);
                    }
                    self.diag.debug([LogArg::display(format_args!(
                        "[Sidecar] Opened session {} for {}",
                        handle, id
                    ))]);
                }
                Err(e) => self.diag.error([LogArg::from("Sidecar parser:"), LogArg::error(&e)]),
            }
        }

        // The model stays in the scene either way
        if let Err(e) = self.fitter.fit(&model, camera) {
            self.diag
                .debug([LogArg::display(format_args!("[Camera] Left in place for {}: {}", id, e))]);
        }
        Some(id)
    }

    /// Synchronous load, used natively and in tests
    pub fn load_bytes(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        scene: &mut dyn SceneHost,
        camera: &mut dyn CameraRig,
    ) -> Option<ModelId> {
        let pending = self.begin_load(file_name, bytes).ok()?;
        let outcome = pending.run();
        self.finish_load(outcome, scene, camera)
    }

    pub fn select(&self, selection: &Selection, panel: &mut PropertiesPanel) {
        self.bridge.on_select(selection, &self.models, panel);
    }

    pub fn clear_selection(&self, panel: &mut PropertiesPanel) {
        self.bridge.on_clear(panel);
    }

    /// Camera stopped moving: refresh the scene
    pub fn on_camera_rest(&self, scene: &mut dyn SceneHost) {
        scene.update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_fit::tests::RecordingRig;
    use crate::panel::NO_PROPERTIES_MESSAGE;
    use crate::step::tests::{TEST_IFC, WALL_IFC};
    use approx::assert_relative_eq;
    use ifc_glance_model::{ElementId, SceneModel};

    #[derive(Default)]
    struct RecordingScene {
        added: Vec<ModelId>,
        updates: usize,
    }

    impl SceneHost for RecordingScene {
        fn add_model(&mut self, model: Arc<SceneModel>) {
            self.added.push(model.id);
        }

        fn update(&mut self) {
            self.updates += 1;
        }
    }

    fn session() -> ViewerSession {
        ViewerSession::new(ViewerConfig::default(), Diagnostics::new(false))
    }

    #[test]
    fn test_gate_rejects_overlapping_loads() {
        let mut gate = LoadGate::default();
        let first = gate.begin("a.ifc", ModelId(0)).unwrap();
        assert_eq!(
            gate.begin("b.ifc", ModelId(1)),
            Err(LoadError::Busy {
                requested: "b.ifc".to_string(),
                current: "a.ifc".to_string(),
            })
        );
        assert!(gate.finish(&first));
        assert!(!gate.finish(&first));
        assert!(gate.begin("b.ifc", ModelId(1)).is_ok());
    }

    #[test]
    fn test_second_begin_while_loading_is_rejected_and_logged() {
        let mut s = session();
        let pending = s.begin_load("a.ifc", TEST_IFC.as_bytes().to_vec()).ok().unwrap();
        assert!(s.begin_load("b.ifc", Vec::new()).is_err());
        assert!(s.diagnostics().panel_text().contains("ERROR: cannot load b.ifc: a.ifc is still loading"));

        let mut scene = RecordingScene::default();
        let mut rig = RecordingRig::new();
        assert_eq!(s.finish_load(pending.run(), &mut scene, &mut rig), Some(ModelId(0)));
        assert!(!s.is_loading());
    }

    #[test]
    fn test_model_without_geometry_does_not_move_camera() {
        let mut s = session();
        let mut scene = RecordingScene::default();
        let mut rig = RecordingRig::new();

        let id = s.load_bytes("test.ifc", TEST_IFC.as_bytes().to_vec(), &mut scene, &mut rig);
        assert_eq!(id, Some(ModelId(0)));
        assert_eq!(scene.added, vec![ModelId(0)]);
        assert_eq!(scene.updates, 1);
        assert!(rig.moves.is_empty());

        let log = s.diagnostics().panel_text();
        assert!(log.contains("File selected: test.ifc\nLoading model...\nModel loaded successfully\n"));
        assert_eq!(log.matches("ERROR: Bounding box is still empty.").count(), 1);
    }

    #[test]
    fn test_extruded_wall_frames_camera() {
        let mut s = session();
        let mut scene = RecordingScene::default();
        let mut rig = RecordingRig::new();

        let id = s
            .load_bytes("wall.ifc", WALL_IFC.as_bytes().to_vec(), &mut scene, &mut rig)
            .unwrap();
        let model = s.models().get(id).unwrap();
        assert_eq!(model.meshes.len(), 1);

        // Normalized: centered on the origin, 5 wide, 3 tall (Y-up), 0.2 deep
        let bounds = model.bounds.unwrap();
        for (c, expected) in bounds.center().into_iter().zip([0.0, 0.0, 0.0]) {
            assert_relative_eq!(c, expected, epsilon = 1e-5);
        }
        let size = bounds.size();
        assert_relative_eq!(size[0], 5.0, epsilon = 1e-5);
        assert_relative_eq!(size[1], 3.0, epsilon = 1e-5);
        assert_relative_eq!(size[2], 0.2, epsilon = 1e-5);

        assert_eq!(rig.moves.len(), 1);
        let (position, target, animate) = rig.moves[0];
        let distance = 2.5 / 22.5f64.to_radians().tan() * 1.5;
        assert!(animate);
        assert_relative_eq!(position[0] - target[0], 0.0, epsilon = 1e-5);
        assert_relative_eq!(position[1] - target[1], 5.0, epsilon = 1e-5);
        assert_relative_eq!(position[2] - target[2], distance, epsilon = 1e-4);
        assert!(s.diagnostics().panel_text().contains("\"maxDim\":5.0"));
    }

    #[test]
    fn test_sidecar_copy_is_indexed_by_run() {
        let mut s = session();
        let pending = s.begin_load("a.ifc", TEST_IFC.as_bytes().to_vec()).ok().unwrap();
        let outcome = pending.run();
        assert!(matches!(outcome.sidecar, Some(Ok(_))));

        let mut scene = RecordingScene::default();
        let mut rig = RecordingRig::new();
        let id = s.finish_load(outcome, &mut scene, &mut rig).unwrap();
        let sidecar = s.sidecar().unwrap();
        assert_eq!(sidecar.handle_for(id), Some(0));
        assert_eq!(sidecar.open_handle(), Some(0));
    }

    #[test]
    fn test_failed_parse_skips_sidecar_copy() {
        let mut s = session();
        let outcome = s.begin_load("notes.txt", b"hello".to_vec()).ok().unwrap().run();
        assert!(outcome.result.is_err());
        assert!(outcome.sidecar.is_none());

        let config = ViewerConfig {
            sidecar: false,
            ..ViewerConfig::default()
        };
        let mut s = ViewerSession::new(config, Diagnostics::new(false));
        let outcome = s.begin_load("a.ifc", TEST_IFC.as_bytes().to_vec()).ok().unwrap().run();
        assert!(outcome.result.is_ok());
        assert!(outcome.sidecar.is_none());
    }

    #[test]
    fn test_parse_failure_is_logged() {
        let mut s = session();
        let mut scene = RecordingScene::default();
        let mut rig = RecordingRig::new();

        assert!(s.load_bytes("notes.txt", b"hello".to_vec(), &mut scene, &mut rig).is_none());
        assert!(scene.added.is_empty());
        assert!(s
            .diagnostics()
            .panel_text()
            .contains("ERROR: Error loading model: notes.txt: missing ISO-10303-21 header"));
        assert!(!s.is_loading());
    }

    #[test]
    fn test_select_resolves_from_sidecar() {
        let mut s = session();
        let mut scene = RecordingScene::default();
        let mut rig = RecordingRig::new();
        let id = s
            .load_bytes("test.ifc", TEST_IFC.as_bytes().to_vec(), &mut scene, &mut rig)
            .unwrap();

        let mut selection = Selection::single(id, ElementId(10));
        selection.push(id, ElementId(404));
        let mut panel = PropertiesPanel::default();
        s.select(&selection, &mut panel);

        assert_eq!(panel.blocks().len(), 2);
        assert_eq!(panel.blocks()[0].source.as_deref(), Some("sidecar"));
        assert!(panel.blocks()[0]
            .rows
            .iter()
            .any(|r| r.name == "Name" && r.value == "Wall 1"));
        assert_eq!(panel.blocks()[1].message.as_deref(), Some(NO_PROPERTIES_MESSAGE));

        s.clear_selection(&mut panel);
        assert!(panel.is_empty() && !panel.is_visible());
    }

    #[test]
    fn test_reload_makes_old_sidecar_handle_stale() {
        let mut s = session();
        let mut scene = RecordingScene::default();
        let mut rig = RecordingRig::new();
        let first = s
            .load_bytes("a.ifc", TEST_IFC.as_bytes().to_vec(), &mut scene, &mut rig)
            .unwrap();
        s.load_bytes("b.ifc", TEST_IFC.as_bytes().to_vec(), &mut scene, &mut rig)
            .unwrap();

        let mut panel = PropertiesPanel::default();
        s.select(&Selection::single(first, ElementId(10)), &mut panel);

        // The stale sidecar lookup is logged, item attributes answer instead
        assert_eq!(panel.blocks()[0].source.as_deref(), Some("item attributes"));
        assert!(s.diagnostics().panel_text().contains("ERROR: sidecar lookup failed for #10:"));
    }

    #[test]
    fn test_read_failure_leaves_gate_open() {
        let mut s = session();
        s.read_failed("gone.ifc", "permission denied");
        assert_eq!(
            s.diagnostics().panel_text(),
            "File selected: gone.ifc\nERROR: Failed to read gone.ifc: permission denied\n"
        );
        assert!(!s.is_loading());
        assert!(s.begin_load("next.ifc", Vec::new()).is_ok());
    }

    #[test]
    fn test_without_sidecar() {
        let config = ViewerConfig {
            sidecar: false,
            ..ViewerConfig::default()
        };
        let s = ViewerSession::new(config, Diagnostics::new(false));
        assert!(s.sidecar().is_none());
        assert_eq!(
            s.bridge.resolver().source_names(),
            vec!["item attributes", "model properties", "local properties", "primary parser"]
        );
    }

    #[test]
    fn test_camera_rest_forces_update() {
        let s = session();
        let mut scene = RecordingScene::default();
        s.on_camera_rest(&mut scene);
        assert_eq!(scene.updates, 1);
    }
}
