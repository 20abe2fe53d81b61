//! Properties panel - renders the blocks built by the selection bridge

use super::layout::PropertiesPanelNode;
use super::styles::{label, UiColors, UiSizes};
use crate::PanelState;
use bevy::ecs::hierarchy::ChildSpawnerCommands;
use bevy::prelude::*;
use bevy::ui::{FlexDirection, JustifyContent, ScrollPosition, UiRect, Val};
use ifc_glance_engine::PropertyBlock;

pub struct PropertiesPlugin;

impl Plugin for PropertiesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_properties);
    }
}

/// Marker for everything spawned into the panel, cleared on rebuild
#[derive(Component)]
pub struct PropertyContent;

fn update_properties(
    mut commands: Commands,
    panel_state: Res<PanelState>,
    mut panel_query: Query<(Entity, &mut Visibility, &mut ScrollPosition), With<PropertiesPanelNode>>,
    existing: Query<Entity, With<PropertyContent>>,
    mut last_revision: Local<u64>,
) {
    if panel_state.revision() == *last_revision {
        return;
    }
    *last_revision = panel_state.revision();

    let Ok((panel_entity, mut visibility, mut scroll)) = panel_query.single_mut() else {
        return;
    };

    // despawn() is recursive
    for entity in existing.iter() {
        commands.entity(entity).despawn();
    }

    *visibility = if panel_state.is_visible() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    scroll.y = 0.0;

    commands.entity(panel_entity).with_children(|panel| {
        panel.spawn((
            PropertyContent,
            label("Properties", UiSizes::FONT_SIZE_LG, UiColors::TEXT_PRIMARY),
            Node {
                margin: UiRect::bottom(Val::Px(UiSizes::PADDING)),
                ..default()
            },
        ));
        for block in panel_state.blocks() {
            spawn_block(panel, block);
        }
    });
}

fn spawn_block(parent: &mut ChildSpawnerCommands, block: &PropertyBlock) {
    parent
        .spawn((
            PropertyContent,
            Node {
                width: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                margin: UiRect::bottom(Val::Px(UiSizes::PADDING * 2.0)),
                ..default()
            },
        ))
        .with_children(|section| {
            section.spawn(label(
                block.heading.clone(),
                UiSizes::FONT_SIZE,
                UiColors::TEXT_ACCENT,
            ));
            if let Some(source) = &block.source {
                section.spawn(label(
                    format!("via {}", source),
                    UiSizes::FONT_SIZE_SM,
                    UiColors::TEXT_SECONDARY,
                ));
            }
            if let Some(message) = &block.message {
                section.spawn((
                    label(message.clone(), UiSizes::FONT_SIZE_SM, UiColors::TEXT_SECONDARY),
                    Node {
                        margin: UiRect::top(Val::Px(UiSizes::PADDING_SM)),
                        ..default()
                    },
                ));
            }
            for row in &block.rows {
                spawn_property_row(section, &row.name, &row.value);
            }
        });
}

fn spawn_property_row(parent: &mut ChildSpawnerCommands, name: &str, value: &str) {
    parent
        .spawn((
            Node {
                width: Val::Percent(100.0),
                flex_direction: FlexDirection::Row,
                justify_content: JustifyContent::SpaceBetween,
                column_gap: Val::Px(UiSizes::PADDING),
                padding: UiRect::vertical(Val::Px(UiSizes::PADDING_SM)),
                border: UiRect::bottom(Val::Px(1.0)),
                ..default()
            },
            BorderColor::all(UiColors::BORDER),
        ))
        .with_children(|row: &mut ChildSpawnerCommands| {
            row.spawn(label(name, UiSizes::FONT_SIZE_SM, UiColors::TEXT_SECONDARY));
            row.spawn(label(value, UiSizes::FONT_SIZE_SM, UiColors::TEXT_PRIMARY));
        });
}
