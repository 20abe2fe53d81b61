//! ifc-glance desktop viewer
//!
//! Open a file with the toolbar button, the `O` key or by dropping it on the
//! window. Options come from `IFC_GLANCE_*` environment variables.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    ifc_glance_bevy::run_native();
}

// The browser build starts from the library's wasm_bindgen entry
#[cfg(target_arch = "wasm32")]
fn main() {}
