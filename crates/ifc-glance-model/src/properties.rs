// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Untyped element properties
//!
//! Property sources disagree on shape: some hand back raw scalars, others wrap
//! each value together with its IFC measure type (`IFCLABEL('Wall')`). Both
//! land in [`AttributeValue`], and the panel peels wrappers before display.

use crate::{ElementId, PropertyError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute value as returned by a property source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    /// STEP enumeration without the dots, e.g. `ELEMENT`
    Enum(String),
    Reference(ElementId),
    List(Vec<AttributeValue>),
    /// A `{value: ...}` wrapper, optionally tagged with its measure type
    Wrapped {
        type_name: Option<String>,
        value: Box<AttributeValue>,
    },
}

impl AttributeValue {
    pub fn text(s: impl Into<String>) -> Self {
        AttributeValue::Text(s.into())
    }

    pub fn wrapped(type_name: Option<&str>, value: AttributeValue) -> Self {
        AttributeValue::Wrapped {
            type_name: type_name.map(str::to_string),
            value: Box::new(value),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Peel every `{value: ...}` layer
    pub fn unwrapped(&self) -> &AttributeValue {
        let mut current = self;
        while let AttributeValue::Wrapped { value, .. } = current {
            current = value;
        }
        current
    }

    /// Lists and wrappers cannot be shown as a single table cell
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            AttributeValue::List(_) | AttributeValue::Wrapped { .. }
        )
    }

    /// Display text for scalars, `None` for null or structured values
    ///
    /// Wrappers are peeled first, so `Wrapped(Text("Wall"))` renders as `Wall`.
    pub fn display_text(&self) -> Option<String> {
        let inner = self.unwrapped();
        if inner.is_null() || inner.is_structured() {
            return None;
        }
        Some(inner.to_string())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Integer(i) => write!(f, "{}", i),
            AttributeValue::Real(r) => write!(f, "{}", r),
            AttributeValue::Text(s) | AttributeValue::Enum(s) => write!(f, "{}", s),
            AttributeValue::Reference(id) => write!(f, "{}", id),
            AttributeValue::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            AttributeValue::Wrapped { value, .. } => write!(f, "{}", value),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Real(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<usize> for AttributeValue {
    fn from(v: usize) -> Self {
        AttributeValue::Integer(v as i64)
    }
}

/// Ordered attribute map for one element
///
/// Insertion order is kept so panels list attributes the way the source
/// produced them. Inserting an existing name replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementProperties {
    entries: Vec<(String, AttributeValue)>,
}

impl ElementProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when at least one attribute survives display filtering
    pub fn has_displayable(&self) -> bool {
        self.entries.iter().any(|(_, v)| v.display_text().is_some())
    }
}

impl FromIterator<(String, AttributeValue)> for ElementProperties {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        let mut props = ElementProperties::new();
        for (name, value) in iter {
            props.insert(name, value);
        }
        props
    }
}

/// Kind of a model-level property set
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertySetKind {
    /// `IfcPropertySet`
    Properties,
    /// `IfcElementQuantity`
    Quantities,
}

/// A named property or quantity set attached to an element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    pub name: String,
    pub kind: PropertySetKind,
    pub values: Vec<(String, AttributeValue)>,
}

/// Outcome of asking one property source about one element
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyLookup {
    /// The source produced attributes
    Found(ElementProperties),
    /// The source has nothing for this element
    Empty,
    /// The source failed; the next source is tried
    Failed(PropertyError),
}

impl PropertyLookup {
    /// `Found` with no attributes counts as `Empty`
    pub fn from_properties(props: ElementProperties) -> Self {
        if props.is_empty() {
            PropertyLookup::Empty
        } else {
            PropertyLookup::Found(props)
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PropertyLookup::Found(_))
    }
}

impl From<Result<ElementProperties, PropertyError>> for PropertyLookup {
    fn from(result: Result<ElementProperties, PropertyError>) -> Self {
        match result {
            Ok(props) => PropertyLookup::from_properties(props),
            Err(e) => PropertyLookup::Failed(e),
        }
    }
}
