// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection maps carried by click events

use crate::{ElementId, ModelId};
use serde::{Deserialize, Serialize};

/// Ordered mapping from model to selected elements
///
/// Models keep the order in which they were first touched and elements keep
/// their insertion order, so iterating replays the event order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    entries: Vec<(ModelId, Vec<ElementId>)>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(model: ModelId, element: ElementId) -> Self {
        let mut selection = Self::new();
        selection.push(model, element);
        selection
    }

    /// Append an element; duplicates are ignored
    pub fn push(&mut self, model: ModelId, element: ElementId) {
        match self.entries.iter_mut().find(|(m, _)| *m == model) {
            Some((_, elements)) => {
                if !elements.contains(&element) {
                    elements.push(element);
                }
            }
            None => self.entries.push((model, vec![element])),
        }
    }

    /// Remove an element, dropping the model entry once it is empty
    pub fn remove(&mut self, model: ModelId, element: ElementId) -> bool {
        let Some(pos) = self.entries.iter().position(|(m, _)| *m == model) else {
            return false;
        };
        let elements = &mut self.entries[pos].1;
        let before = elements.len();
        elements.retain(|e| *e != element);
        let removed = elements.len() != before;
        if elements.is_empty() {
            self.entries.remove(pos);
        }
        removed
    }

    /// Add the element if absent, remove it otherwise
    pub fn toggle(&mut self, model: ModelId, element: ElementId) {
        if !self.remove(model, element) {
            self.push(model, element);
        }
    }

    pub fn contains(&self, model: ModelId, element: ElementId) -> bool {
        self.entries
            .iter()
            .any(|(m, elements)| *m == model && elements.contains(&element))
    }

    /// Total number of selected elements across all models
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, e)| e.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Every (model, element) pair in event order
    pub fn iter(&self) -> impl Iterator<Item = (ModelId, ElementId)> + '_ {
        self.entries
            .iter()
            .flat_map(|(m, elements)| elements.iter().map(move |e| (*m, *e)))
    }

    pub fn models(&self) -> impl Iterator<Item = ModelId> + '_ {
        self.entries.iter().map(|(m, _)| *m)
    }
}

/// Event emitted by the picking layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionEvent {
    Select(Selection),
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_preserves_event_order() {
        let mut s = Selection::new();
        s.push(ModelId(1), ElementId(30));
        s.push(ModelId(0), ElementId(10));
        s.push(ModelId(1), ElementId(31));

        let pairs: Vec<_> = s.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (ModelId(1), ElementId(30)),
                (ModelId(1), ElementId(31)),
                (ModelId(0), ElementId(10)),
            ]
        );
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_toggle() {
        let mut s = Selection::single(ModelId(0), ElementId(1));
        s.toggle(ModelId(0), ElementId(2));
        assert!(s.contains(ModelId(0), ElementId(2)));
        s.toggle(ModelId(0), ElementId(1));
        s.toggle(ModelId(0), ElementId(2));
        assert!(s.is_empty());
    }

    #[test]
    fn test_push_ignores_duplicates() {
        let mut s = Selection::single(ModelId(0), ElementId(1));
        s.push(ModelId(0), ElementId(1));
        assert_eq!(s.len(), 1);
    }
}
