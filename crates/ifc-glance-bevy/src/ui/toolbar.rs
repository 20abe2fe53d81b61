//! Toolbar: open button, view buttons and the current file name

use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::prelude::*;
use bevy::ui::{widget::Button, AlignItems, BorderRadius, Interaction, JustifyContent, UiRect, Val};

use super::layout::{LogPanelNode, ToolbarContainer};
use super::styles::{label, UiColors, UiSizes};
use crate::camera::CameraController;
use crate::loader::{LoadStatus, OpenFileDialogRequest};

pub struct ToolbarPlugin;

impl Plugin for ToolbarPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_toolbar.after(super::layout::setup_layout))
            .add_systems(Update, (button_interaction, open_shortcut, update_file_label));
    }
}

#[derive(Component)]
pub struct ToolbarButton {
    pub action: ButtonAction,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ButtonAction {
    OpenFile,
    Home,
    ToggleLog,
}

/// Text showing the loaded or loading file
#[derive(Component)]
pub struct FileLabel;

fn setup_toolbar(mut commands: Commands, toolbar_query: Query<Entity, With<ToolbarContainer>>) {
    let Ok(toolbar_entity) = toolbar_query.single() else {
        return;
    };

    commands.entity(toolbar_entity).with_children(|toolbar| {
        spawn_button(toolbar, "Open", ButtonAction::OpenFile);
        spawn_separator(toolbar);
        spawn_button(toolbar, "Home", ButtonAction::Home);
        spawn_button(toolbar, "Log", ButtonAction::ToggleLog);

        toolbar.spawn((
            FileLabel,
            label("No file loaded", UiSizes::FONT_SIZE, UiColors::TEXT_SECONDARY),
            Node {
                margin: UiRect::left(Val::Px(UiSizes::PADDING * 2.0)),
                ..default()
            },
        ));

        toolbar.spawn(Node {
            flex_grow: 1.0,
            ..default()
        });

        toolbar.spawn(label("ifc-glance", UiSizes::FONT_SIZE, UiColors::TEXT_SECONDARY));
    });
}

fn spawn_button(parent: &mut ChildSpawnerCommands, text: &str, action: ButtonAction) {
    parent
        .spawn((
            ToolbarButton { action },
            Button,
            Node {
                height: Val::Px(UiSizes::BUTTON_SIZE),
                padding: UiRect::horizontal(Val::Px(12.0)),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                margin: UiRect::horizontal(Val::Px(2.0)),
                border_radius: BorderRadius::all(Val::Px(UiSizes::BORDER_RADIUS)),
                ..default()
            },
            BackgroundColor(UiColors::BUTTON_BG),
        ))
        .with_children(|btn: &mut ChildSpawnerCommands| {
            btn.spawn(label(text, UiSizes::FONT_SIZE_SM, UiColors::TEXT_PRIMARY));
        });
}

fn spawn_separator(parent: &mut ChildSpawnerCommands) {
    parent.spawn((
        Node {
            width: Val::Px(1.0),
            height: Val::Px(24.0),
            margin: UiRect::horizontal(Val::Px(8.0)),
            ..default()
        },
        BackgroundColor(UiColors::BORDER),
    ));
}

fn button_interaction(
    mut query: Query<(&Interaction, &mut BackgroundColor, &ToolbarButton), Changed<Interaction>>,
    mut log_panel: Query<&mut Visibility, With<LogPanelNode>>,
    mut open_requests: MessageWriter<OpenFileDialogRequest>,
    mut camera: ResMut<CameraController>,
) {
    for (interaction, mut bg_color, button) in query.iter_mut() {
        match *interaction {
            Interaction::Pressed => {
                *bg_color = BackgroundColor(UiColors::BUTTON_ACTIVE);
                match button.action {
                    ButtonAction::OpenFile => {
                        open_requests.write(OpenFileDialogRequest);
                    }
                    ButtonAction::Home => camera.home(),
                    ButtonAction::ToggleLog => {
                        if let Ok(mut vis) = log_panel.single_mut() {
                            *vis = match *vis {
                                Visibility::Hidden => Visibility::Inherited,
                                _ => Visibility::Hidden,
                            };
                        }
                    }
                }
            }
            Interaction::Hovered => {
                *bg_color = BackgroundColor(UiColors::BUTTON_HOVER);
            }
            Interaction::None => {
                *bg_color = BackgroundColor(UiColors::BUTTON_BG);
            }
        }
    }
}

fn open_shortcut(keyboard: Res<ButtonInput<KeyCode>>, mut open_requests: MessageWriter<OpenFileDialogRequest>) {
    if keyboard.just_pressed(KeyCode::KeyO) {
        open_requests.write(OpenFileDialogRequest);
    }
}

/// Toolbar caption for the current load state
pub fn file_caption(status: &LoadStatus) -> String {
    match (&status.loading, &status.current_file) {
        (Some(loading), _) => format!("Loading {}...", loading),
        (None, Some(current)) => current.clone(),
        (None, None) => "No file loaded".to_string(),
    }
}

fn update_file_label(status: Res<LoadStatus>, mut labels: Query<&mut Text, With<FileLabel>>) {
    if !status.is_changed() {
        return;
    }
    for mut text in labels.iter_mut() {
        text.0 = file_caption(&status);
    }
}
