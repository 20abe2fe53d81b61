//! Click picking and selection
//!
//! A click (press and release without dragging) casts a ray through the
//! cursor and tests it against element bounds. Ctrl/Cmd toggles the hit
//! element in the selection, a plain click replaces it, a plain click on
//! empty space clears it.

use crate::camera::{CameraController, CameraInputSet, MainCamera};
use crate::scene::{ElementBounds, ElementTag};
use crate::{GlanceSession, PanelState};
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use ifc_glance_model::{Selection, SelectionEvent};

pub struct PickingPlugin;

impl Plugin for PickingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SelectionState>()
            .add_message::<SelectionChanged>()
            .add_systems(
                Update,
                (picking_system, apply_selection_system, highlight_selection_system)
                    .chain()
                    .after(CameraInputSet),
            );
    }
}

/// Current selection, in the order elements were picked
#[derive(Resource, Default, Debug)]
pub struct SelectionState {
    pub selection: Selection,
}

/// Selection event for the properties bridge
#[derive(Message, Debug, Clone)]
pub struct SelectionChanged(pub SelectionEvent);

/// Apply one click to `selection`, returning the event to publish
///
/// Clicking empty space with nothing selected publishes nothing.
pub fn apply_click(selection: &mut Selection, hit: Option<ElementTag>, additive: bool) -> Option<SelectionEvent> {
    match (hit, additive) {
        (Some(tag), true) => selection.toggle(tag.model, tag.element),
        (Some(tag), false) => *selection = Selection::single(tag.model, tag.element),
        (None, true) => return None,
        (None, false) => {
            if selection.is_empty() {
                return None;
            }
            selection.clear();
        }
    }
    if selection.is_empty() {
        Some(SelectionEvent::Clear)
    } else {
        Some(SelectionEvent::Select(selection.clone()))
    }
}

/// Closest element whose bounds the ray enters
pub fn closest_hit<'a>(
    origin: Vec3,
    direction: Vec3,
    candidates: impl IntoIterator<Item = (&'a ElementTag, &'a ElementBounds)>,
) -> Option<ElementTag> {
    let origin = [origin.x as f64, origin.y as f64, origin.z as f64];
    let direction = [direction.x as f64, direction.y as f64, direction.z as f64];
    candidates
        .into_iter()
        .filter_map(|(tag, bounds)| bounds.0.ray_hit(origin, direction).map(|t| (*tag, t)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(tag, _)| tag)
}

fn picking_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    elements: Query<(&ElementTag, &ElementBounds)>,
    mut controller: ResMut<CameraController>,
    mut state: ResMut<SelectionState>,
    mut changed: MessageWriter<SelectionChanged>,
) {
    if !controller.take_click() {
        return;
    }

    let Ok(window) = windows.single() else { return };
    let Some(cursor_pos) = window.cursor_position() else { return };
    let Ok((camera, camera_transform)) = cameras.single() else { return };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor_pos) else { return };

    let hit = closest_hit(ray.origin, *ray.direction, elements.iter());
    let additive = keyboard.any_pressed([
        KeyCode::ControlLeft,
        KeyCode::ControlRight,
        KeyCode::SuperLeft,
        KeyCode::SuperRight,
    ]);

    if let Some(event) = apply_click(&mut state.selection, hit, additive) {
        changed.write(SelectionChanged(event));
    }
}

/// Feed selection events through the session into the properties panel
fn apply_selection_system(
    mut changed: MessageReader<SelectionChanged>,
    session: Res<GlanceSession>,
    mut panel: ResMut<PanelState>,
) {
    for SelectionChanged(event) in changed.read() {
        match event {
            SelectionEvent::Select(selection) => session.select(selection, &mut panel),
            SelectionEvent::Clear => session.clear_selection(&mut panel),
        }
    }
}

fn highlight_selection_system(
    state: Res<SelectionState>,
    elements: Query<(&ElementTag, &ElementBounds)>,
    mut gizmos: Gizmos,
) {
    if state.selection.is_empty() {
        return;
    }
    let color = Color::srgb(0.2, 0.6, 1.0);
    for (tag, bounds) in elements.iter() {
        if !state.selection.contains(tag.model, tag.element) {
            continue;
        }
        let (min, max) = (bounds.min(), bounds.max());
        let corners = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        for i in 0..4 {
            let j = (i + 1) % 4;
            gizmos.line(corners[i], corners[j], color); // bottom
            gizmos.line(corners[i + 4], corners[j + 4], color); // top
            gizmos.line(corners[i], corners[i + 4], color); // vertical
        }
    }
}
