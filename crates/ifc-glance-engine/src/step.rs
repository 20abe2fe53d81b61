// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Indexed STEP content and raw line decoding
//!
//! Both the primary parser registry and the sidecar parser answer "give me
//! line #N" queries. They share this module so the two only differ in how
//! sessions are owned.

use ifc_glance_model::{AttributeValue, ElementId, ElementProperties, LoadError, PropertyError};
use ifc_lite_core::{build_entity_index, EntityDecoder, EntityIndex};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Attribute names of the IfcRoot prefix
const ROOT_ATTRIBUTES: [&str; 4] = ["GlobalId", "OwnerHistory", "Name", "Description"];

/// Attribute names following the IfcRoot prefix on IfcProduct subtypes
const PRODUCT_ATTRIBUTES: [&str; 4] = ["ObjectType", "ObjectPlacement", "Representation", "Tag"];

/// Length of an IFC GlobalId (compressed GUID)
const GLOBAL_ID_LEN: usize = 22;

const STEP_MAGIC: &str = "ISO-10303-21";

/// Immutable, indexed file content
///
/// Cloning is cheap: text and index are shared.
#[derive(Clone)]
pub struct StepContent {
    text: Arc<str>,
    index: Arc<EntityIndex>,
}

impl StepContent {
    /// Validate and index raw file bytes
    pub fn from_bytes(bytes: &[u8], file: &str) -> Result<Self, LoadError> {
        let text = std::str::from_utf8(bytes).map_err(|_| LoadError::Encoding {
            file: file.to_string(),
        })?;
        Self::from_text(text, file)
    }

    pub fn from_text(text: &str, file: &str) -> Result<Self, LoadError> {
        let trimmed = text.trim_start_matches('\u{feff}').trim_start();
        if !trimmed.starts_with(STEP_MAGIC) {
            return Err(LoadError::NotStep {
                file: file.to_string(),
            });
        }
        let index = build_entity_index(trimmed);
        if index.is_empty() {
            return Err(LoadError::NoEntities {
                file: file.to_string(),
            });
        }
        Ok(Self {
            text: Arc::from(trimmed),
            index: Arc::new(index),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn entity_count(&self) -> usize {
        self.index.len()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.contains_key(&id)
    }

    /// Decoder sharing this content's index
    pub fn decoder(&self) -> EntityDecoder<'_> {
        EntityDecoder::with_arc_index(&self.text, Arc::clone(&self.index))
    }

    /// Raw text of entity `id`, from `#id=` up to the closing `;`
    pub fn raw_line(&self, id: u32) -> Option<&str> {
        let &(start, end) = self.index.get(&id)?;
        self.text.get(start..end)
    }

    /// Typed-value constructors appearing in entity `id`
    pub fn typed_keywords(&self, id: u32) -> TypedKeywords<'_> {
        self.raw_line(id).map(TypedKeywords::scan).unwrap_or_default()
    }

    /// Uppercase type name of entity `id`, read from its raw line
    pub fn type_name(&self, id: u32) -> Option<&str> {
        let line = self.raw_line(id)?;
        let (_, rest) = line.split_once('=')?;
        let rest = rest.trim_start();
        let end = rest.find('(').unwrap_or(rest.len());
        Some(rest[..end].trim())
    }

    /// Schema named in `FILE_SCHEMA`, e.g. `IFC4`
    pub fn schema(&self) -> Option<String> {
        let header_end = self.text.find("DATA;").unwrap_or(self.text.len());
        let header = &self.text[..header_end];
        let start = header.find("FILE_SCHEMA")?;
        let after = &header[start..];
        let open = after.find('\'')?;
        let close = after[open + 1..].find('\'')?;
        Some(after[open + 1..open + 1 + close].to_string())
    }

    /// Raw line lookup: positional attributes plus `expressID` and `type`
    pub fn decode_line(&self, element: ElementId) -> Result<ElementProperties, PropertyError> {
        if !self.contains(element.0) {
            return Err(PropertyError::NotFound(element));
        }
        let type_name = self.type_name(element.0).unwrap_or_default().to_string();
        let mut decoder = self.decoder();
        let entity = decoder
            .decode_by_id(element.0)
            .map_err(|e| PropertyError::decode(element, e.to_string()))?;
        let typed = self.typed_keywords(element.0);

        let is_root = matches!(
            entity.attributes.first(),
            Some(ifc_lite_core::AttributeValue::String(s)) if s.len() == GLOBAL_ID_LEN
        );
        let is_product = is_root && ifc_lite_core::has_geometry_by_name(&type_name);

        let mut props = ElementProperties::new()
            .with("expressID", AttributeValue::Integer(element.0 as i64))
            .with("type", AttributeValue::Text(type_name));

        for (i, attr) in entity.attributes.iter().enumerate() {
            props.insert(attribute_name(i, is_root, is_product), convert_value(attr, &typed));
        }
        Ok(props)
    }
}

fn attribute_name(index: usize, is_root: bool, is_product: bool) -> String {
    if is_root && index < ROOT_ATTRIBUTES.len() {
        return ROOT_ATTRIBUTES[index].to_string();
    }
    let product_index = index.wrapping_sub(ROOT_ATTRIBUTES.len());
    if is_product && product_index < PRODUCT_ATTRIBUTES.len() {
        return PRODUCT_ATTRIBUTES[product_index].to_string();
    }
    format!("Attribute{}", index)
}

/// Keywords used as typed-value constructors in one raw line
///
/// The engine decodes `IFCLABEL('x')` and the plain list `('IFCLABEL','x')`
/// to the same value; only the raw text tells them apart.
#[derive(Debug, Default)]
pub struct TypedKeywords<'a>(FxHashSet<&'a str>);

impl<'a> TypedKeywords<'a> {
    /// Collect every `KEYWORD(` outside string literals, skipping the
    /// entity's own type name
    pub fn scan(line: &'a str) -> Self {
        let mut keywords = FxHashSet::default();
        let Some(open) = line.find('(') else {
            return Self(keywords);
        };
        let mut in_string = false;
        let mut word_start: Option<usize> = None;
        for (i, b) in line.bytes().enumerate().skip(open + 1) {
            if in_string {
                // A doubled quote closes and reopens, which nets out
                if b == b'\'' {
                    in_string = false;
                }
                continue;
            }
            match b {
                b'\'' => {
                    in_string = true;
                    word_start = None;
                }
                b'(' => {
                    if let Some(start) = word_start.take() {
                        keywords.insert(&line[start..i]);
                    }
                }
                b'_' => {}
                c if c.is_ascii_alphabetic() => {
                    word_start.get_or_insert(i);
                }
                c if c.is_ascii_digit() => {}
                _ => word_start = None,
            }
        }
        Self(keywords)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }
}

/// Map an engine value onto the viewer's untyped value
///
/// Typed values such as `IFCLABEL('x')` arrive as a list headed by the type
/// name and become [`AttributeValue::Wrapped`]; `typed` decides whether a
/// leading string was a constructor or a quoted literal.
pub fn convert_value(value: &ifc_lite_core::AttributeValue, typed: &TypedKeywords<'_>) -> AttributeValue {
    use ifc_lite_core::AttributeValue as Raw;

    match value {
        Raw::EntityRef(id) => AttributeValue::Reference(ElementId(*id)),
        Raw::String(s) => AttributeValue::Text(s.clone()),
        Raw::Integer(i) => AttributeValue::Integer(*i),
        Raw::Float(f) => AttributeValue::Real(*f),
        Raw::Enum(e) => match e.trim_matches('.') {
            "T" => AttributeValue::Bool(true),
            "F" => AttributeValue::Bool(false),
            "U" => AttributeValue::Null,
            other => AttributeValue::Enum(other.to_string()),
        },
        Raw::List(items) => match items.split_first() {
            Some((Raw::String(type_name), rest)) if typed.contains(type_name) && !rest.is_empty() => {
                let inner = if rest.len() == 1 {
                    convert_value(&rest[0], typed)
                } else {
                    AttributeValue::List(rest.iter().map(|v| convert_value(v, typed)).collect())
                };
                AttributeValue::wrapped(Some(type_name.as_str()), inner)
            }
            _ => AttributeValue::List(items.iter().map(|v| convert_value(v, typed)).collect()),
        },
        Raw::Null | Raw::Derived => AttributeValue::Null,
    }
}
