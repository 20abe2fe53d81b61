//! File picking, reading and off-thread parsing
//!
//! Files arrive from the native dialog, drag and drop, or the page's
//! `#load-btn`/`#file-input` pair on WASM. Every picked file becomes a
//! [`LoadRequest`]; the parse runs on the [`AsyncComputeTaskPool`] and is
//! polled each frame, then handed back to the session to finish.

use crate::camera::CameraController;
use crate::scene::SceneHostQueue;
use crate::GlanceSession;
use bevy::ecs::message::{MessageReader, Messages};
use bevy::prelude::*;
use bevy::tasks::{block_on, poll_once, AsyncComputeTaskPool, Task};
#[cfg(not(target_arch = "wasm32"))]
use bevy::tasks::IoTaskPool;
use ifc_glance_engine::LoadOutcome;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

pub struct LoaderPlugin;

impl Plugin for LoaderPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<LoadRequest>()
            .add_message::<OpenFileDialogRequest>()
            .init_resource::<FileDialogState>()
            .init_resource::<LoadTasks>()
            .init_resource::<LoadStatus>()
            .add_systems(Startup, setup_file_input)
            .add_systems(
                Update,
                (
                    handle_open_dialog_request,
                    poll_file_dialog,
                    handle_file_drop,
                    drain_inbox_system,
                    start_load_system,
                    poll_load_tasks,
                )
                    .chain(),
            );
    }
}

/// Ask for a file picker (toolbar button, `O` key)
#[derive(Message, Debug, Clone, Copy)]
pub struct OpenFileDialogRequest;

/// A file's contents, ready to parse
#[derive(Message, Debug, Clone)]
pub struct LoadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of reading a picked file
#[derive(Debug)]
pub struct PickedFile {
    pub file_name: String,
    pub bytes: Result<Vec<u8>, String>,
}

/// Files read outside the Bevy schedule (DOM callbacks), drained each frame
static INBOX: Lazy<Mutex<Vec<PickedFile>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Hand a file to the viewer from any thread or callback
pub fn submit_file(file: PickedFile) {
    INBOX.lock().push(file);
}

#[derive(Resource, Default)]
pub struct FileDialogState {
    task: Option<Task<Option<PickedFile>>>,
}

/// Parses in flight
#[derive(Resource, Default)]
pub struct LoadTasks {
    tasks: Vec<Task<LoadOutcome>>,
}

impl LoadTasks {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// What the toolbar shows
#[derive(Resource, Default, Debug, Clone)]
pub struct LoadStatus {
    /// Most recently loaded file
    pub current_file: Option<String>,
    /// File being parsed right now
    pub loading: Option<String>,
}

#[cfg(not(target_arch = "wasm32"))]
fn handle_open_dialog_request(
    mut requests: MessageReader<OpenFileDialogRequest>,
    mut state: ResMut<FileDialogState>,
    session: Res<GlanceSession>,
) {
    for _ in requests.read() {
        if state.task.is_some() {
            session
                .diagnostics()
                .debug([ifc_glance_engine::LogArg::from("[Loader] File dialog already open")]);
            continue;
        }

        let task = IoTaskPool::get().spawn(async {
            let file = rfd::AsyncFileDialog::new()
                .add_filter("IFC Files", &["ifc", "IFC"])
                .add_filter("All Files", &["*"])
                .set_title("Open IFC File")
                .pick_file()
                .await?;
            let file_name = file.file_name();
            let bytes = std::fs::read(file.path()).map_err(|e| e.to_string());
            Some(PickedFile { file_name, bytes })
        });
        state.task = Some(task);
    }
}

/// The page's hidden `<input type="file">` is the picker on WASM
#[cfg(target_arch = "wasm32")]
fn handle_open_dialog_request(
    mut requests: MessageReader<OpenFileDialogRequest>,
    _state: ResMut<FileDialogState>,
    session: Res<GlanceSession>,
) {
    use wasm_bindgen::JsCast;

    for _ in requests.read() {
        let input = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("file-input"))
            .and_then(|e| e.dyn_into::<web_sys::HtmlInputElement>().ok());
        match input {
            Some(input) => input.click(),
            None => session
                .diagnostics()
                .error([ifc_glance_engine::LogArg::from("No #file-input element on the page")]),
        }
    }
}

fn poll_file_dialog(mut state: ResMut<FileDialogState>, session: Res<GlanceSession>) {
    let Some(task) = state.task.as_mut() else {
        return;
    };
    let Some(result) = block_on(poll_once(task)) else {
        return;
    };
    state.task = None;
    match result {
        Some(file) => submit_file(file),
        None => session
            .diagnostics()
            .debug([ifc_glance_engine::LogArg::from("[Loader] File dialog cancelled")]),
    }
}

/// Dropped files are accepted whatever their extension
#[cfg(not(target_arch = "wasm32"))]
fn handle_file_drop(mut drops: MessageReader<bevy::window::FileDragAndDrop>) {
    for event in drops.read() {
        if let bevy::window::FileDragAndDrop::DroppedFile { path_buf, .. } = event {
            let path = path_buf.clone();
            IoTaskPool::get()
                .spawn(async move {
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    let bytes = std::fs::read(&path).map_err(|e| e.to_string());
                    submit_file(PickedFile { file_name, bytes });
                })
                .detach();
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn handle_file_drop(mut drops: MessageReader<bevy::window::FileDragAndDrop>) {
    // Browsers don't expose dropped file paths; the file input covers WASM
    drops.clear();
}

fn drain_inbox_system(session: Res<GlanceSession>, mut requests: MessageWriter<LoadRequest>) {
    let picked: Vec<PickedFile> = std::mem::take(&mut *INBOX.lock());
    for file in picked {
        match file.bytes {
            Ok(bytes) => {
                requests.write(LoadRequest {
                    file_name: file.file_name,
                    bytes,
                });
            }
            Err(reason) => session.read_failed(&file.file_name, &reason),
        }
    }
}

fn start_load_system(
    mut requests: ResMut<Messages<LoadRequest>>,
    mut session: ResMut<GlanceSession>,
    mut tasks: ResMut<LoadTasks>,
    mut status: ResMut<LoadStatus>,
) {
    // Drained so each file's bytes move into its parse task
    for request in requests.drain() {
        // Busy loads are rejected and logged by the session
        let Ok(pending) = session.begin_load(&request.file_name, request.bytes) else {
            continue;
        };
        status.loading = Some(request.file_name);
        let task = AsyncComputeTaskPool::get().spawn(async move { pending.run() });
        tasks.tasks.push(task);
    }
}

fn poll_load_tasks(
    mut tasks: ResMut<LoadTasks>,
    mut session: ResMut<GlanceSession>,
    mut scene: ResMut<SceneHostQueue>,
    mut camera: ResMut<CameraController>,
    mut status: ResMut<LoadStatus>,
) {
    if tasks.is_empty() {
        return;
    }

    let mut finished = Vec::new();
    tasks.tasks.retain_mut(|task| match block_on(poll_once(task)) {
        Some(outcome) => {
            finished.push(outcome);
            false
        }
        None => true,
    });

    for outcome in finished {
        let file_name = outcome.ticket.file_name.clone();
        status.loading = None;
        if session.finish_load(outcome, &mut *scene, &mut *camera).is_some() {
            status.current_file = Some(file_name);
        }
    }
}

/// Wire `#load-btn` to the hidden `#file-input` and read picked files
#[cfg(target_arch = "wasm32")]
fn setup_file_input(session: Res<GlanceSession>) {
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(input) = document
        .get_element_by_id("file-input")
        .and_then(|e| e.dyn_into::<web_sys::HtmlInputElement>().ok())
    else {
        session
            .diagnostics()
            .debug([ifc_glance_engine::LogArg::from("[Loader] No #file-input, DOM picker disabled")]);
        return;
    };

    if let Some(button) = document.get_element_by_id("load-btn") {
        let target = input.clone();
        let on_click = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            target.click();
        });
        if button
            .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            .is_ok()
        {
            on_click.forget();
        }
    }

    let source = input.clone();
    let on_change = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
        let Some(file) = source.files().and_then(|files| files.get(0)) else {
            return;
        };
        // Clear so picking the same file again fires another change event
        source.set_value("");
        wasm_bindgen_futures::spawn_local(async move {
            let file_name = file.name();
            let bytes = wasm_bindgen_futures::JsFuture::from(file.array_buffer())
                .await
                .map(|buffer| js_sys::Uint8Array::new(&buffer).to_vec())
                .map_err(|e| format!("{:?}", e));
            submit_file(PickedFile { file_name, bytes });
        });
    });
    if input
        .add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())
        .is_ok()
    {
        on_change.forget();
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn setup_file_input() {}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::app::TaskPoolPlugin;
    use ifc_glance_engine::{Diagnostics, ViewerConfig, ViewerSession};

    #[test]
    fn test_submitted_files_are_drained_in_order() {
        submit_file(PickedFile {
            file_name: "a.ifc".into(),
            bytes: Ok(vec![1]),
        });
        submit_file(PickedFile {
            file_name: "b.ifc".into(),
            bytes: Err("denied".into()),
        });
        let drained: Vec<_> = std::mem::take(&mut *INBOX.lock());
        let names: Vec<_> = drained.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.ifc", "b.ifc"]);
        assert!(drained[1].bytes.is_err());
    }

    #[test]
    fn test_load_requests_are_consumed_into_tasks() {
        let mut app = App::new();
        app.add_plugins(TaskPoolPlugin::default())
            .add_message::<LoadRequest>()
            .insert_resource(GlanceSession(ViewerSession::new(
                ViewerConfig::default(),
                Diagnostics::new(false),
            )))
            .init_resource::<LoadTasks>()
            .init_resource::<LoadStatus>()
            .add_systems(Update, start_load_system);

        app.world_mut().write_message(LoadRequest {
            file_name: "a.ifc".into(),
            bytes: b"ISO-10303-21;".to_vec(),
        });
        app.world_mut().write_message(LoadRequest {
            file_name: "b.ifc".into(),
            bytes: Vec::new(),
        });
        app.update();

        let world = app.world();
        assert!(world.resource::<Messages<LoadRequest>>().is_empty());
        assert_eq!(world.resource::<LoadTasks>().tasks.len(), 1);
        assert_eq!(world.resource::<LoadStatus>().loading.as_deref(), Some("a.ifc"));
        let log = world.resource::<GlanceSession>().diagnostics().panel_text();
        assert!(log.contains("ERROR: cannot load b.ifc: a.ifc is still loading"));
    }
}
