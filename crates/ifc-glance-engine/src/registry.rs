// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primary parser registry
//!
//! Every successfully parsed file stays registered under a numeric handle for
//! the life of the viewer, mirroring how models are never removed from the
//! scene. Handles start at zero.

use crate::step::StepContent;
use ifc_glance_model::{ElementId, ElementProperties, PropertyError, SessionError};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct ParserRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    next_handle: AtomicU32,
    models: RwLock<FxHashMap<u32, StepContent>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content and return its handle
    pub fn register(&self, content: StepContent) -> u32 {
        let handle = self.inner.next_handle.fetch_add(1, Ordering::Relaxed);
        self.inner.models.write().insert(handle, content);
        handle
    }

    pub fn contains(&self, handle: u32) -> bool {
        self.inner.models.read().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.inner.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw line lookup against the model registered under `handle`
    pub fn get_line(
        &self,
        handle: u32,
        element: ElementId,
    ) -> Result<ElementProperties, PropertyError> {
        let content = self
            .inner
            .models
            .read()
            .get(&handle)
            .cloned()
            .ok_or(SessionError::UnknownHandle(handle))?;
        content.decode_line(element)
    }
}
