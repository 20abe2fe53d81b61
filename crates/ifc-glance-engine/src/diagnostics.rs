// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On-screen diagnostics
//!
//! [`Diagnostics`] is handed to every component that reports progress or
//! failures to the user. Each call formats its arguments into one line,
//! appends it to the shared [`LogPanel`] and forwards it to the `log` facade,
//! so the browser console (or stdout) sees the same text.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Substituted for structured arguments that fail to serialize
pub const COMPLEX_OBJECT_PLACEHOLDER: &str = "[Complex Object]";

/// Prefix of error lines in the panel
pub const ERROR_PREFIX: &str = "ERROR: ";

/// A single logging argument
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    /// Plain value, shown as-is
    Text(String),
    /// Structured value, already serialized to JSON (or the reason it failed)
    Json(Result<String, String>),
    /// Error value: message followed by its source chain
    Error {
        message: String,
        chain: Vec<String>,
    },
}

impl LogArg {
    pub fn display(value: impl fmt::Display) -> Self {
        LogArg::Text(value.to_string())
    }

    /// Serialize eagerly; failures are kept and rendered as the placeholder
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        LogArg::Json(serde_json::to_string(value).map_err(|e| e.to_string()))
    }

    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        LogArg::Error {
            message: err.to_string(),
            chain,
        }
    }

    pub fn format(&self) -> String {
        match self {
            LogArg::Text(s) => s.clone(),
            LogArg::Json(Ok(json)) => json.clone(),
            LogArg::Json(Err(_)) => COMPLEX_OBJECT_PLACEHOLDER.to_string(),
            LogArg::Error { message, chain } => {
                let mut out = message.clone();
                for cause in chain {
                    out.push_str("\n  caused by: ");
                    out.push_str(cause);
                }
                out
            }
        }
    }
}

impl From<&str> for LogArg {
    fn from(s: &str) -> Self {
        LogArg::Text(s.to_string())
    }
}

impl From<String> for LogArg {
    fn from(s: String) -> Self {
        LogArg::Text(s)
    }
}

/// Join formatted arguments with a single space
pub fn format_line<I: IntoIterator<Item = LogArg>>(args: I) -> String {
    args.into_iter()
        .map(|a| a.format())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Scrollable text shown in the log panel
#[derive(Debug, Default, Clone)]
pub struct LogPanel {
    text: String,
    lines: usize,
    scroll_to_bottom: bool,
    revision: u64,
}

impl LogPanel {
    pub fn append(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
        self.lines += 1;
        self.scroll_to_bottom = true;
        self.revision += 1;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Bumped on every append, lets renderers skip unchanged frames
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns true once after each append
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_bottom)
    }
}

/// Cloneable logger handle shared by all viewer components
#[derive(Clone, Default)]
pub struct Diagnostics {
    panel: Arc<Mutex<LogPanel>>,
    debug: bool,
}

impl Diagnostics {
    pub fn new(debug: bool) -> Self {
        Self {
            panel: Arc::default(),
            debug,
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn info<I: IntoIterator<Item = LogArg>>(&self, args: I) {
        let line = format_line(args);
        log::info!("{}", line);
        self.panel.lock().append(&line);
    }

    pub fn error<I: IntoIterator<Item = LogArg>>(&self, args: I) {
        let line = format_line(args);
        log::error!("{}", line);
        self.panel.lock().append(&format!("{}{}", ERROR_PREFIX, line));
    }

    /// Console only, and only in debug mode
    pub fn debug<I: IntoIterator<Item = LogArg>>(&self, args: I) {
        if self.debug {
            log::debug!("{}", format_line(args));
        }
    }

    /// Run `f` with the panel locked
    pub fn with_panel<R>(&self, f: impl FnOnce(&mut LogPanel) -> R) -> R {
        f(&mut self.panel.lock())
    }

    pub fn panel_text(&self) -> String {
        self.panel.lock().text().to_string()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("lines", &self.panel.lock().line_count())
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde::Serializer;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cyclic structure"))
        }
    }

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer(#[source] Inner);

    #[derive(Debug, thiserror::Error)]
    #[error("inner failure")]
    struct Inner;

    #[test]
    fn test_args_joined_with_single_space() {
        let diag = Diagnostics::new(false);
        diag.info([
            LogArg::from("File selected:"),
            LogArg::from("house.ifc"),
            LogArg::display(42),
        ]);
        assert_eq!(diag.panel_text(), "File selected: house.ifc 42\n");
    }

    #[test]
    fn test_serialization_failure_uses_placeholder() {
        let diag = Diagnostics::new(false);
        diag.info([
            LogArg::from("state:"),
            LogArg::json(&Unserializable),
            LogArg::json(&Point { x: 1, y: 2 }),
        ]);
        assert_eq!(
            diag.panel_text(),
            "state: [Complex Object] {\"x\":1,\"y\":2}\n"
        );
    }

    #[test]
    fn test_error_prefix_and_source_chain() {
        let diag = Diagnostics::new(false);
        let err = Outer(Inner);
        diag.error([LogArg::from("Load failed:"), LogArg::error(&err)]);
        assert_eq!(
            diag.panel_text(),
            "ERROR: Load failed: outer failure\n  caused by: inner failure\n"
        );
    }

    #[test]
    fn test_debug_never_reaches_panel() {
        let diag = Diagnostics::new(true);
        diag.debug([LogArg::from("hidden")]);
        assert_eq!(diag.panel_text(), "");
    }

    #[test]
    fn test_scroll_request_consumed_once() {
        let diag = Diagnostics::new(false);
        diag.info([LogArg::from("a")]);
        diag.info([LogArg::from("b")]);
        assert!(diag.with_panel(|p| p.take_scroll_request()));
        assert!(!diag.with_panel(|p| p.take_scroll_request()));
        assert_eq!(diag.with_panel(|p| p.line_count()), 2);
    }

    #[test]
    fn test_clones_share_panel() {
        let diag = Diagnostics::new(false);
        let other = diag.clone();
        other.info([LogArg::from("shared")]);
        assert_eq!(diag.panel_text(), "shared\n");
    }
}
