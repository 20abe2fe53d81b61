//! ifc-glance Bevy viewer
//!
//! Bevy front end for the ifc-glance viewer core: scene host, orbit camera,
//! click picking and file loading, plus on-screen log and properties panels.
//! Runs on a browser canvas (WASM) or in a native window.

pub mod camera;
pub mod loader;
pub mod picking;
pub mod scene;

#[cfg(feature = "bevy-ui")]
pub mod ui;

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use ifc_glance_engine::{Diagnostics, LogArg, PropertiesPanel, ViewerConfig, ViewerSession};

pub use camera::{CameraController, CameraPlugin, CameraRested, MainCamera};
pub use loader::{LoadRequest, LoaderPlugin, OpenFileDialogRequest};
pub use picking::{PickingPlugin, SelectionChanged, SelectionState};
pub use scene::{ElementBounds, ElementTag, ModelBatch, SceneBounds, SceneHostQueue, ScenePlugin};

#[cfg(feature = "bevy-ui")]
pub use ui::GlanceUiPlugin;

/// The viewer session shared by all systems
#[derive(Resource, Deref, DerefMut)]
pub struct GlanceSession(pub ViewerSession);

/// Content of the properties panel, rebuilt on every selection event
#[derive(Resource, Default, Deref, DerefMut)]
pub struct PanelState(pub PropertiesPanel);

/// Main viewer plugin - combines all subsystems
pub struct GlancePlugin {
    pub config: ViewerConfig,
}

impl Default for GlancePlugin {
    fn default() -> Self {
        Self {
            config: ViewerConfig::default(),
        }
    }
}

impl Plugin for GlancePlugin {
    fn build(&self, app: &mut App) {
        let diag = Diagnostics::new(self.config.debug);
        app.insert_resource(GlanceSession(ViewerSession::new(self.config.clone(), diag)))
            .insert_resource(ViewerSettings::from_config(&self.config))
            .init_resource::<PanelState>()
            .add_plugins((CameraPlugin, ScenePlugin, PickingPlugin, LoaderPlugin));

        #[cfg(feature = "bevy-ui")]
        app.add_plugins(GlanceUiPlugin);
    }
}

/// Render-side settings derived from the configuration
#[derive(Resource, Clone, Debug)]
pub struct ViewerSettings {
    pub theme: Theme,
    pub show_grid: bool,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
}

impl ViewerSettings {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            theme: if config.light_theme { Theme::Light } else { Theme::Dark },
            show_grid: config.grid,
            fov_degrees: config.fov_degrees as f32,
        }
    }
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn background_color(&self) -> Color {
        match self {
            Theme::Light => Color::srgb(0.95, 0.95, 0.95),
            Theme::Dark => Color::srgb(0.12, 0.12, 0.12),
        }
    }

    pub fn grid_color(&self) -> Color {
        match self {
            Theme::Light => Color::srgba(0.5, 0.5, 0.5, 0.3),
            Theme::Dark => Color::srgba(0.4, 0.4, 0.4, 0.3),
        }
    }
}

/// Configuration from the page URL (`?debug=1&fov=60&light=1`)
#[cfg(target_arch = "wasm32")]
pub fn load_config() -> (ViewerConfig, Vec<ifc_glance_engine::ConfigError>) {
    let search = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default();
    ViewerConfig::from_query(&search)
}

/// Configuration from `IFC_GLANCE_*` environment variables
#[cfg(not(target_arch = "wasm32"))]
pub fn load_config() -> (ViewerConfig, Vec<ifc_glance_engine::ConfigError>) {
    ViewerConfig::from_env()
}

fn log_plugin(config: &ViewerConfig) -> LogPlugin {
    LogPlugin {
        level: if config.debug { Level::DEBUG } else { Level::INFO },
        filter: "wgpu=error,naga=warn".to_string(),
        ..default()
    }
}

/// Surface configuration warnings in the log panel once the session exists
fn report_config_warnings(app: &mut App, warnings: Vec<ifc_glance_engine::ConfigError>) {
    let session = app.world().resource::<GlanceSession>();
    for warning in &warnings {
        session
            .diagnostics()
            .error([LogArg::from("Ignoring configuration value:"), LogArg::error(warning)]);
    }
}

/// Run the viewer on a canvas element (WASM)
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn run_on_canvas(canvas_selector: &str) {
    console_error_panic_hook::set_once();
    let (config, warnings) = load_config();
    let settings = ViewerSettings::from_config(&config);

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "ifc-glance".to_string(),
                    canvas: Some(canvas_selector.to_string()),
                    fit_canvas_to_parent: true,
                    prevent_default_event_handling: false,
                    ..default()
                }),
                ..default()
            })
            .set(log_plugin(&config)),
    )
    .insert_resource(ClearColor(settings.theme.background_color()))
    .add_plugins(GlancePlugin { config });

    report_config_warnings(&mut app, warnings);
    app.run();
}

/// Run the viewer in a native window (desktop)
#[cfg(not(target_arch = "wasm32"))]
pub fn run_on_canvas(_canvas_selector: &str) {
    run_native();
}

/// Run native desktop viewer
#[cfg(not(target_arch = "wasm32"))]
pub fn run_native() {
    let (config, warnings) = load_config();
    let settings = ViewerSettings::from_config(&config);

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "ifc-glance".to_string(),
                    resolution: (1280u32, 720u32).into(),
                    ..default()
                }),
                ..default()
            })
            .set(log_plugin(&config)),
    )
    .insert_resource(ClearColor(settings.theme.background_color()))
    .add_plugins(GlancePlugin { config });

    report_config_warnings(&mut app, warnings);
    app.run();
}

#[cfg(target_arch = "wasm32")]
pub fn run_native() {
    run_on_canvas("#bevy-canvas");
}
