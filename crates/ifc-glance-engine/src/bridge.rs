// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection/properties bridge
//!
//! Turns selection events into panel content. Nothing is cached: every
//! select re-resolves every element from scratch.

use crate::diagnostics::{Diagnostics, LogArg};
use crate::panel::{PropertiesPanel, PropertyBlock};
use crate::resolver::PropertyResolver;
use ifc_glance_model::{ModelId, SceneModel, Selection};
use std::sync::Arc;

/// Models known to the viewer, in load order
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    models: Vec<Arc<SceneModel>>,
}

impl ModelRegistry {
    pub fn insert(&mut self, model: Arc<SceneModel>) {
        self.models.push(model);
    }

    pub fn get(&self, id: ModelId) -> Option<&Arc<SceneModel>> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SceneModel>> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

pub struct SelectionBridge {
    resolver: PropertyResolver,
    diag: Diagnostics,
}

impl SelectionBridge {
    pub fn new(resolver: PropertyResolver, diag: Diagnostics) -> Self {
        Self { resolver, diag }
    }

    pub fn resolver(&self) -> &PropertyResolver {
        &self.resolver
    }

    /// Replace the panel content with one block per selected element
    pub fn on_select(&self, selection: &Selection, models: &ModelRegistry, panel: &mut PropertiesPanel) {
        panel.begin();
        for (model_id, element) in selection.iter() {
            let Some(model) = models.get(model_id) else {
                self.diag
                    .error([LogArg::display(format_args!("Selection references unknown {}", model_id))]);
                panel.push(PropertyBlock::not_found(
                    model_id,
                    element,
                    format!("Element {}", element.0),
                ));
                continue;
            };
            let heading = format!("Element {} ({})", element.0, model.name);
            let block = match self.resolver.resolve(model, element) {
                Some(resolved) => PropertyBlock::from_properties(
                    model_id,
                    element,
                    heading,
                    &resolved.source,
                    &resolved.properties,
                ),
                None => PropertyBlock::not_found(model_id, element, heading),
            };
            panel.push(block);
        }
    }

    pub fn on_clear(&self, panel: &mut PropertiesPanel) {
        panel.clear();
    }
}
