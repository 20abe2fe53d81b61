//! Bevy UI for the viewer
//!
//! Pure Bevy UI - works on both web and native.

mod layout;
mod log_panel;
mod properties;
mod styles;
mod toolbar;

pub use layout::*;
pub use log_panel::*;
pub use properties::*;
pub use styles::*;
pub use toolbar::{ButtonAction, ToolbarButton, ToolbarPlugin};

use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;
use bevy::ui::ScrollPosition;

pub struct GlanceUiPlugin;

impl Plugin for GlanceUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((LayoutPlugin, ToolbarPlugin, LogPanelPlugin, PropertiesPlugin))
            .add_systems(Update, ui_scroll_system);
    }
}

/// Marker for panels scrolled with the mouse wheel
#[derive(Component)]
pub struct ScrollablePanel;

/// Scroll whichever panel the cursor hovers
fn ui_scroll_system(
    mut mouse_wheel: MessageReader<MouseWheel>,
    mut panels: Query<(&mut ScrollPosition, &Interaction), With<ScrollablePanel>>,
) {
    const LINE_HEIGHT: f32 = 40.0;

    for ev in mouse_wheel.read() {
        let delta_y = -ev.y * LINE_HEIGHT;
        if let Some((mut scroll_pos, _)) = panels
            .iter_mut()
            .find(|(_, interaction)| matches!(interaction, Interaction::Hovered | Interaction::Pressed))
        {
            scroll_pos.y = (scroll_pos.y + delta_y).max(0.0);
        }
    }
}
