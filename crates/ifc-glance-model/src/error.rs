// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for loading, property lookup and camera framing
//!
//! Every failure is scoped to the user action that triggered it. None of
//! these errors is fatal to the viewer.

use crate::ElementId;
use thiserror::Error;

/// Errors raised while turning file bytes into a [`crate::SceneModel`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// The file is not UTF-8 text
    #[error("{file}: file is not valid UTF-8 text")]
    Encoding { file: String },

    /// The file does not start with a STEP header
    #[error("{file}: missing ISO-10303-21 header, not an IFC file")]
    NotStep { file: String },

    /// The DATA section holds no entities
    #[error("{file}: no entities found")]
    NoEntities { file: String },

    /// The IFC engine rejected the content
    #[error("{file}: {message}")]
    Parse { file: String, message: String },

    /// Another load is still running
    #[error("cannot load {requested}: {current} is still loading")]
    Busy { requested: String, current: String },
}

impl LoadError {
    /// Create a parse error for a file
    pub fn parse(file: impl Into<String>, msg: impl Into<String>) -> Self {
        LoadError::Parse {
            file: file.into(),
            message: msg.into(),
        }
    }
}

/// Errors raised by the sidecar parser and the primary parser registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `init` was never called
    #[error("sidecar parser is not initialized")]
    NotInitialized,

    /// The handle does not belong to the open session
    #[error("model handle {handle} is stale (open session: {open:?})")]
    StaleHandle { handle: u32, open: Option<u32> },

    /// No content registered under this handle
    #[error("no model registered under parser handle {0}")]
    UnknownHandle(u32),

    /// The bytes could not be opened
    #[error("failed to open model: {0}")]
    Open(String),
}

/// Errors a property source can report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// No entity with this id
    #[error("element {0} not found")]
    NotFound(ElementId),

    /// The entity exists but could not be decoded
    #[error("failed to decode element {element}: {message}")]
    Decode { element: ElementId, message: String },

    /// Parser session problem
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl PropertyError {
    /// Create a decode error
    pub fn decode(element: ElementId, msg: impl Into<String>) -> Self {
        PropertyError::Decode {
            element,
            message: msg.into(),
        }
    }
}

/// Errors raised while framing a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// The model has no visible geometry
    #[error("Bounding box is still empty. Please check if the IFC file contains 3D geometry.")]
    EmptyBounds,

    /// The field of view cannot produce a finite distance
    #[error("invalid vertical field of view: {0} rad")]
    InvalidFov(f64),
}
