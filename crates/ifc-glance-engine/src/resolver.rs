// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordered property resolution

use crate::diagnostics::{Diagnostics, LogArg};
use ifc_glance_model::{ElementId, ElementProperties, PropertyLookup, PropertySource, SceneModel};

/// Properties together with the source that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub source: String,
    pub properties: ElementProperties,
}

/// Tries property sources in insertion order
pub struct PropertyResolver {
    sources: Vec<Box<dyn PropertySource>>,
    diag: Diagnostics,
}

impl PropertyResolver {
    pub fn new(diag: Diagnostics) -> Self {
        Self {
            sources: Vec::new(),
            diag,
        }
    }

    /// Append a source with lower priority than all existing ones
    pub fn with_source(mut self, source: impl PropertySource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// First non-empty result, or `None` when every source came up empty
    pub fn resolve(&self, model: &SceneModel, element: ElementId) -> Option<Resolved> {
        for source in &self.sources {
            match source.lookup(model, element) {
                PropertyLookup::Found(properties) if !properties.is_empty() => {
                    self.diag.debug([LogArg::display(format_args!(
                        "[Properties] {} resolved by {}",
                        element,
                        source.name()
                    ))]);
                    return Some(Resolved {
                        source: source.name().to_string(),
                        properties,
                    });
                }
                PropertyLookup::Found(_) | PropertyLookup::Empty => {}
                PropertyLookup::Failed(e) => {
                    self.diag.error([
                        LogArg::display(format_args!("{} lookup failed for {}:", source.name(), element)),
                        LogArg::error(&e),
                    ]);
                }
            }
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ifc_glance_model::{AttributeValue, ModelId, PropertyError};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Canned answer plus a shared call log
    pub(crate) struct StubSource {
        pub name: &'static str,
        pub answer: fn(ElementId) -> PropertyLookup,
        pub calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl PropertySource for StubSource {
        fn name(&self) -> &str {
            self.name
        }

        fn lookup(&self, _model: &SceneModel, element: ElementId) -> PropertyLookup {
            self.calls.lock().push(self.name);
            (self.answer)(element)
        }
    }

    fn found(element: ElementId) -> PropertyLookup {
        PropertyLookup::Found(ElementProperties::new().with("id", AttributeValue::Integer(element.0 as i64)))
    }

    fn empty(_: ElementId) -> PropertyLookup {
        PropertyLookup::Empty
    }

    fn failed(element: ElementId) -> PropertyLookup {
        PropertyLookup::Failed(PropertyError::NotFound(element))
    }

    fn hollow(_: ElementId) -> PropertyLookup {
        PropertyLookup::Found(ElementProperties::new())
    }

    fn resolver(
        answers: [fn(ElementId) -> PropertyLookup; 5],
    ) -> (PropertyResolver, Arc<Mutex<Vec<&'static str>>>, Diagnostics) {
        let names = ["one", "two", "three", "four", "five"];
        let calls = Arc::new(Mutex::new(Vec::new()));
        let diag = Diagnostics::new(false);
        let mut resolver = PropertyResolver::new(diag.clone());
        for (name, answer) in names.into_iter().zip(answers) {
            resolver = resolver.with_source(StubSource {
                name,
                answer,
                calls: calls.clone(),
            });
        }
        (resolver, calls, diag)
    }

    fn model() -> SceneModel {
        SceneModel::new(ModelId(0), "stub.ifc", Vec::new(), Vec::new())
    }

    #[test]
    fn test_first_source_wins() {
        let (resolver, calls, _) = resolver([found, found, found, found, found]);
        let resolved = resolver.resolve(&model(), ElementId(1)).unwrap();
        assert_eq!(resolved.source, "one");
        assert_eq!(*calls.lock(), vec!["one"]);
    }

    #[test]
    fn test_later_sources_run_only_after_empty_or_failure() {
        let (resolver, calls, diag) = resolver([empty, failed, hollow, found, found]);
        let resolved = resolver.resolve(&model(), ElementId(9)).unwrap();
        assert_eq!(resolved.source, "four");
        assert_eq!(*calls.lock(), vec!["one", "two", "three", "four"]);
        assert_eq!(
            diag.panel_text(),
            "ERROR: two lookup failed for #9: element #9 not found\n"
        );
    }

    #[test]
    fn test_last_source_reached() {
        let (resolver, calls, _) = resolver([empty, empty, empty, empty, found]);
        assert_eq!(resolver.resolve(&model(), ElementId(2)).unwrap().source, "five");
        assert_eq!(calls.lock().len(), 5);
    }

    #[test]
    fn test_all_sources_fail() {
        let (resolver, calls, diag) = resolver([failed, empty, failed, empty, failed]);
        assert!(resolver.resolve(&model(), ElementId(3)).is_none());
        assert_eq!(calls.lock().len(), 5);
        assert_eq!(diag.panel_text().matches("ERROR: ").count(), 3);
    }
}
