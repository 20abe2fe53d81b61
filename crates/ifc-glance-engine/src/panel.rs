// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Properties side panel state

use ifc_glance_model::{ElementId, ElementProperties, ModelId};

/// Message shown for elements no source could resolve
pub const NO_PROPERTIES_MESSAGE: &str = "No properties found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRow {
    pub name: String,
    pub value: String,
}

/// One heading and its attribute list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyBlock {
    pub model: ModelId,
    pub element: ElementId,
    pub heading: String,
    /// Source that produced the rows, if any
    pub source: Option<String>,
    pub rows: Vec<PropertyRow>,
    /// Shown instead of rows when nothing could be resolved
    pub message: Option<String>,
}

impl PropertyBlock {
    /// Null attributes and values that stay structured after unwrapping are
    /// left out.
    pub fn from_properties(
        model: ModelId,
        element: ElementId,
        heading: String,
        source: &str,
        properties: &ElementProperties,
    ) -> Self {
        let rows: Vec<PropertyRow> = properties
            .iter()
            .filter_map(|(name, value)| {
                value.display_text().map(|text| PropertyRow {
                    name: name.to_string(),
                    value: text,
                })
            })
            .collect();
        let message = rows.is_empty().then(|| NO_PROPERTIES_MESSAGE.to_string());
        Self {
            model,
            element,
            heading,
            source: Some(source.to_string()),
            rows,
            message,
        }
    }

    pub fn not_found(model: ModelId, element: ElementId, heading: String) -> Self {
        Self {
            model,
            element,
            heading,
            source: None,
            rows: Vec::new(),
            message: Some(NO_PROPERTIES_MESSAGE.to_string()),
        }
    }
}

/// Content and visibility of the properties panel
///
/// Only the most recent select or clear event is reflected.
#[derive(Debug, Clone, Default)]
pub struct PropertiesPanel {
    visible: bool,
    blocks: Vec<PropertyBlock>,
    revision: u64,
}

impl PropertiesPanel {
    /// Empty and show, ready for a new selection
    pub fn begin(&mut self) {
        self.blocks.clear();
        self.visible = true;
        self.revision += 1;
    }

    pub fn push(&mut self, block: PropertyBlock) {
        self.blocks.push(block);
        self.revision += 1;
    }

    /// Empty and hide
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.visible = false;
        self.revision += 1;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[PropertyBlock] {
        &self.blocks
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_glance_model::AttributeValue;

    #[test]
    fn test_rows_unwrap_and_skip() {
        let props = ElementProperties::new()
            .with("Name", AttributeValue::wrapped(Some("IFCLABEL"), AttributeValue::text("Door")))
            .with("OwnerHistory", AttributeValue::Null)
            .with("Placement", AttributeValue::Reference(ElementId(4)))
            .with("Points", AttributeValue::List(vec![AttributeValue::Real(1.0)]))
            .with(
                "Nested",
                AttributeValue::wrapped(None, AttributeValue::List(Vec::new())),
            );
        let block = PropertyBlock::from_properties(ModelId(0), ElementId(1), "Element 1".into(), "test", &props);

        let rows: Vec<_> = block.rows.iter().map(|r| (r.name.as_str(), r.value.as_str())).collect();
        assert_eq!(rows, vec![("Name", "Door"), ("Placement", "#4")]);
        assert!(block.message.is_none());
    }

    #[test]
    fn test_block_without_displayable_rows() {
        let props = ElementProperties::new().with("OwnerHistory", AttributeValue::Null);
        let block = PropertyBlock::from_properties(ModelId(0), ElementId(1), "Element 1".into(), "test", &props);
        assert_eq!(block.message.as_deref(), Some(NO_PROPERTIES_MESSAGE));
    }

    #[test]
    fn test_clear_hides_and_empties() {
        let mut panel = PropertiesPanel::default();
        panel.begin();
        panel.push(PropertyBlock::not_found(ModelId(0), ElementId(1), "Element 1".into()));
        assert!(panel.is_visible());
        panel.clear();
        assert!(!panel.is_visible());
        assert!(panel.is_empty());
    }
}
