//! ifc-glance web viewer
//!
//! WASM entry point: starts Bevy on `#bevy-canvas` as soon as the module is
//! instantiated. The page provides `#load-btn` and `#file-input`.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Canvas the viewer renders into
pub const CANVAS_SELECTOR: &str = "#bevy-canvas";

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    web_sys::console::info_1(&"[ifc-glance] starting".into());
    ifc_glance_bevy::run_on_canvas(CANVAS_SELECTOR);
}
