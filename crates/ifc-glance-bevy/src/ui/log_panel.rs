//! On-screen log panel fed from the session's diagnostics

use super::layout::LogPanelNode;
use super::styles::{label, UiColors, UiSizes};
use crate::GlanceSession;
use bevy::prelude::*;
use bevy::ui::ScrollPosition;
use ifc_glance_engine::diagnostics::ERROR_PREFIX;

pub struct LogPanelPlugin;

impl Plugin for LogPanelPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_log_panel);
    }
}

/// One rendered log line
#[derive(Component)]
pub struct LogLine;

/// Lines already rendered and the panel revision they came from
#[derive(Default)]
pub struct LogCursor {
    rendered: usize,
    revision: u64,
}

/// Lines of `text` past the first `skip`, with their colors
pub fn new_lines(text: &str, skip: usize) -> Vec<(&str, Color)> {
    text.lines()
        .skip(skip)
        .map(|line| {
            let color = if line.starts_with(ERROR_PREFIX) {
                UiColors::TEXT_ERROR
            } else {
                UiColors::TEXT_PRIMARY
            };
            (line, color)
        })
        .collect()
}

/// Append new log lines and keep the panel scrolled to the bottom
fn update_log_panel(
    mut commands: Commands,
    session: Res<GlanceSession>,
    mut panel_query: Query<(Entity, &mut ScrollPosition), With<LogPanelNode>>,
    mut cursor: Local<LogCursor>,
) {
    let Ok((panel_entity, mut scroll)) = panel_query.single_mut() else {
        return;
    };

    let (text, scroll_to_bottom) = session.diagnostics().with_panel(|panel| {
        if panel.revision() == cursor.revision {
            return (None, false);
        }
        cursor.revision = panel.revision();
        (Some(panel.text().to_string()), panel.take_scroll_request())
    });
    let Some(text) = text else {
        return;
    };

    let lines = new_lines(&text, cursor.rendered);
    cursor.rendered += lines.len();
    commands.entity(panel_entity).with_children(|panel| {
        for (line, color) in lines {
            panel.spawn((LogLine, label(line, UiSizes::FONT_SIZE_SM, color)));
        }
    });

    if scroll_to_bottom {
        // Layout clamps to the real content height
        scroll.y = f32::MAX / 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lines_skip_rendered_and_color_errors() {
        let text = "File selected: a.ifc\nLoading model...\nERROR: Error loading model: bad\n";
        let lines = new_lines(text, 1);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], ("Loading model...", UiColors::TEXT_PRIMARY));
        assert_eq!(lines[1].1, UiColors::TEXT_ERROR);
        assert!(new_lines(text, 3).is_empty());
    }
}
