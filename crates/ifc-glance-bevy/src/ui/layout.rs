//! Main UI layout - toolbar, viewport, properties panel, log panel

use super::styles::{UiColors, UiSizes};
use bevy::prelude::*;
use bevy::ui::{AlignItems, FlexDirection, Overflow, ScrollPosition, UiRect, Val};

pub struct LayoutPlugin;

impl Plugin for LayoutPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_ui_camera, setup_layout).chain());
    }
}

#[derive(Component)]
pub struct UiOnlyCamera;

/// Dedicated 2D camera drawing the UI over the 3D view
fn setup_ui_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Camera {
            order: 1,
            clear_color: ClearColorConfig::None,
            ..default()
        },
        UiOnlyCamera,
    ));
}

#[derive(Component)]
pub struct ToolbarContainer;

/// Right side panel holding element properties
#[derive(Component)]
pub struct PropertiesPanelNode;

/// Bottom panel mirroring the log
#[derive(Component)]
pub struct LogPanelNode;

pub fn setup_layout(mut commands: Commands) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            BackgroundColor(Color::NONE),
        ))
        .with_children(|root| {
            root.spawn((
                ToolbarContainer,
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Px(UiSizes::TOOLBAR_HEIGHT),
                    flex_direction: FlexDirection::Row,
                    align_items: AlignItems::Center,
                    padding: UiRect::horizontal(Val::Px(UiSizes::PADDING)),
                    ..default()
                },
                BackgroundColor(UiColors::TOOLBAR_BG),
            ));

            // Viewport row: 3D renders behind the transparent spacer
            root.spawn((
                Node {
                    width: Val::Percent(100.0),
                    flex_grow: 1.0,
                    min_height: Val::Px(0.0),
                    flex_direction: FlexDirection::Row,
                    ..default()
                },
                BackgroundColor(Color::NONE),
            ))
            .with_children(|content| {
                content.spawn((
                    Node {
                        flex_grow: 1.0,
                        height: Val::Percent(100.0),
                        ..default()
                    },
                    BackgroundColor(Color::NONE),
                ));

                content.spawn((
                    PropertiesPanelNode,
                    super::ScrollablePanel,
                    Node {
                        width: Val::Px(UiSizes::PANEL_WIDTH),
                        height: Val::Percent(100.0),
                        flex_direction: FlexDirection::Column,
                        padding: UiRect::all(Val::Px(UiSizes::PADDING)),
                        overflow: Overflow::scroll_y(),
                        ..default()
                    },
                    BackgroundColor(UiColors::PANEL_BG),
                    Interaction::default(),
                    ScrollPosition::default(),
                    // Shown by the first selection
                    Visibility::Hidden,
                ));
            });

            root.spawn((
                LogPanelNode,
                super::ScrollablePanel,
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Px(UiSizes::LOG_HEIGHT),
                    flex_direction: FlexDirection::Column,
                    padding: UiRect::all(Val::Px(UiSizes::PADDING_SM)),
                    overflow: Overflow::scroll_y(),
                    border: UiRect::top(Val::Px(1.0)),
                    ..default()
                },
                BorderColor::all(UiColors::BORDER),
                BackgroundColor(UiColors::LOG_BG),
                Interaction::default(),
                ScrollPosition::default(),
            ));
        });
}
