// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sidecar parser
//!
//! A second, independent parser instance kept only for raw attribute
//! queries. It owns its own copy of the file and holds at most one open
//! session; opening a model closes the previous session first, so handles
//! of earlier models become stale instead of silently pointing elsewhere.

use crate::step::StepContent;
use ifc_glance_model::{ElementId, ElementProperties, ModelId, PropertyError, SessionError};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

struct Session {
    handle: u32,
    content: StepContent,
}

/// Single-session raw parser
#[derive(Default)]
pub struct SidecarParser {
    initialized: bool,
    next_handle: u32,
    session: Option<Session>,
}

impl SidecarParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self) {
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Handle of the open session
    pub fn open_handle(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.handle)
    }

    /// Close the open session (if any) and open `bytes` under a new handle
    pub fn open_model(&mut self, bytes: &[u8]) -> Result<u32, SessionError> {
        if !self.initialized {
            return Err(SessionError::NotInitialized);
        }
        self.close();
        let content = Self::prepare(bytes)?;
        self.open_content(content)
    }

    /// Index `bytes` for a later [`open_content`](Self::open_content)
    ///
    /// Needs no session, so it can run away from the thread that owns the
    /// parser.
    pub fn prepare(bytes: &[u8]) -> Result<StepContent, SessionError> {
        StepContent::from_bytes(bytes, "sidecar").map_err(|e| SessionError::Open(e.to_string()))
    }

    /// Close the open session (if any) and open already indexed content
    pub fn open_content(&mut self, content: StepContent) -> Result<u32, SessionError> {
        if !self.initialized {
            return Err(SessionError::NotInitialized);
        }
        self.close();
        let handle = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        self.session = Some(Session { handle, content });
        Ok(handle)
    }

    pub fn get_line(&self, handle: u32, element: ElementId) -> Result<ElementProperties, PropertyError> {
        if !self.initialized {
            return Err(SessionError::NotInitialized.into());
        }
        match &self.session {
            Some(session) if session.handle == handle => session.content.decode_line(element),
            _ => Err(SessionError::StaleHandle {
                handle,
                open: self.open_handle(),
            }
            .into()),
        }
    }

    /// Returns the handle that was closed
    pub fn close(&mut self) -> Option<u32> {
        self.session.take().map(|s| s.handle)
    }
}

/// Sidecar shared between the load path and the property sources
///
/// Remembers which handle each model was given, so lookups for a model
/// whose session has since been replaced fail with a stale handle error.
#[derive(Clone, Default)]
pub struct SharedSidecar {
    inner: Arc<Mutex<SidecarState>>,
}

#[derive(Default)]
struct SidecarState {
    parser: SidecarParser,
    handles: FxHashMap<ModelId, u32>,
}

impl SharedSidecar {
    /// Create and initialize
    pub fn new() -> Self {
        let sidecar = Self::default();
        sidecar.inner.lock().parser.init();
        sidecar
    }

    /// Open a session for `model` over content from
    /// [`SidecarParser::prepare`]; returns (new handle, closed handle)
    pub fn attach(&self, model: ModelId, content: StepContent) -> Result<(u32, Option<u32>), SessionError> {
        let mut state = self.inner.lock();
        let previous = state.parser.open_handle();
        let handle = state.parser.open_content(content)?;
        state.handles.insert(model, handle);
        Ok((handle, previous))
    }

    pub fn handle_for(&self, model: ModelId) -> Option<u32> {
        self.inner.lock().handles.get(&model).copied()
    }

    pub fn open_handle(&self) -> Option<u32> {
        self.inner.lock().parser.open_handle()
    }

    pub fn get_line(&self, handle: u32, element: ElementId) -> Result<ElementProperties, PropertyError> {
        self.inner.lock().parser.get_line(handle, element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::tests::TEST_IFC;
    use ifc_glance_model::AttributeValue;

    #[test]
    fn test_requires_init() {
        let mut parser = SidecarParser::new();
        assert_eq!(
            parser.open_model(TEST_IFC.as_bytes()),
            Err(SessionError::NotInitialized)
        );
        assert!(matches!(
            parser.get_line(0, ElementId(10)),
            Err(PropertyError::Session(SessionError::NotInitialized))
        ));
    }

    #[test]
    fn test_open_closes_previous_session() {
        let mut parser = SidecarParser::new();
        parser.init();
        let first = parser.open_model(TEST_IFC.as_bytes()).unwrap();
        let second = parser.open_model(TEST_IFC.as_bytes()).unwrap();
        assert_ne!(first, second);
        assert_eq!(parser.open_handle(), Some(second));

        let props = parser.get_line(second, ElementId(10)).unwrap();
        assert_eq!(props.get("Name"), Some(&AttributeValue::text("Wall 1")));

        assert_eq!(
            parser.get_line(first, ElementId(10)),
            Err(PropertyError::Session(SessionError::StaleHandle {
                handle: first,
                open: Some(second),
            }))
        );
    }

    #[test]
    fn test_failed_open_leaves_no_session() {
        let mut parser = SidecarParser::new();
        parser.init();
        parser.open_model(TEST_IFC.as_bytes()).unwrap();
        assert!(matches!(
            parser.open_model(b"not an ifc file"),
            Err(SessionError::Open(_))
        ));
        assert_eq!(parser.open_handle(), None);
    }

    #[test]
    fn test_prepare_rejects_non_step_input() {
        assert!(matches!(
            SidecarParser::prepare(b"not an ifc file"),
            Err(SessionError::Open(_))
        ));
    }

    #[test]
    fn test_shared_sidecar_tracks_model_handles() {
        let sidecar = SharedSidecar::new();
        let prepared = SidecarParser::prepare(TEST_IFC.as_bytes()).unwrap();
        let (a, closed) = sidecar.attach(ModelId(0), prepared.clone()).unwrap();
        assert_eq!(closed, None);
        let (b, closed) = sidecar.attach(ModelId(1), prepared).unwrap();
        assert_eq!(closed, Some(a));

        assert_eq!(sidecar.handle_for(ModelId(0)), Some(a));
        assert!(sidecar.get_line(a, ElementId(10)).is_err());
        assert!(sidecar.get_line(b, ElementId(10)).is_ok());
    }
}
