// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model-level property table built from `IfcRelDefinesByProperties`

use crate::step::{convert_value, StepContent};
use ifc_glance_model::{
    AttributeValue, ElementId, ModelProperties, PropertyError, PropertySet, PropertySetKind,
};
use ifc_lite_core::{DecodedEntity, EntityScanner};
use rustc_hash::FxHashMap;

/// Relationship → definitions index over one file
///
/// The relationship scan happens once at load time; the sets themselves are
/// decoded on demand.
pub struct StepPropertyTable {
    content: StepContent,
    definitions: FxHashMap<u32, Vec<u32>>,
}

impl StepPropertyTable {
    pub fn build(content: StepContent) -> Self {
        let mut definitions: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        {
            let mut decoder = content.decoder();
            let mut scanner = EntityScanner::new(content.text());
            while let Some((id, type_name, _, _)) = scanner.next_entity() {
                if !type_name.eq_ignore_ascii_case("IFCRELDEFINESBYPROPERTIES") {
                    continue;
                }
                let Ok(rel) = decoder.decode_by_id(id) else {
                    continue;
                };
                // RelatedObjects at 4, RelatingPropertyDefinition at 5
                let Some(definition) = rel.get_ref(5) else {
                    continue;
                };
                for object in ref_list(&rel, 4) {
                    definitions.entry(object).or_default().push(definition);
                }
            }
        }
        Self {
            content,
            definitions,
        }
    }

    /// Number of elements with at least one definition
    pub fn element_count(&self) -> usize {
        self.definitions.len()
    }

    fn read_set(&self, id: u32) -> Result<Option<PropertySet>, PropertyError> {
        let mut decoder = self.content.decoder();
        let entity = decoder
            .decode_by_id(id)
            .map_err(|e| PropertyError::decode(ElementId(id), e.to_string()))?;
        let type_name = self.content.type_name(id).unwrap_or_default();

        let (kind, members_at) = if type_name.eq_ignore_ascii_case("IFCPROPERTYSET") {
            (PropertySetKind::Properties, 4)
        } else if type_name.eq_ignore_ascii_case("IFCELEMENTQUANTITY") {
            (PropertySetKind::Quantities, 5)
        } else {
            return Ok(None);
        };

        let name = entity
            .get_string(2)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", id));

        let mut values = Vec::new();
        for member_id in ref_list(&entity, members_at) {
            let Ok(member) = decoder.decode_by_id(member_id) else {
                continue;
            };
            let typed = self.content.typed_keywords(member_id);
            let member_name = member
                .get_string(0)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", member_id));
            // NominalValue at 2 for single values, the measure at 3 for quantities
            let value_at = match kind {
                PropertySetKind::Properties => 2,
                PropertySetKind::Quantities => 3,
            };
            let value = member
                .get(value_at)
                .map(|v| convert_value(v, &typed))
                .unwrap_or(AttributeValue::Null);
            values.push((member_name, value));
        }

        Ok(Some(PropertySet { name, kind, values }))
    }
}

impl ModelProperties for StepPropertyTable {
    fn item_properties(&self, element: ElementId) -> Result<Vec<PropertySet>, PropertyError> {
        let Some(ids) = self.definitions.get(&element.0) else {
            return Ok(Vec::new());
        };
        let mut sets = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(set) = self.read_set(id)? {
                sets.push(set);
            }
        }
        Ok(sets)
    }
}

fn ref_list(entity: &DecodedEntity, index: usize) -> Vec<u32> {
    entity
        .get(index)
        .and_then(|a| a.as_list())
        .map(|items| items.iter().filter_map(|i| i.as_entity_ref()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::tests::TEST_IFC;

    fn table() -> StepPropertyTable {
        StepPropertyTable::build(StepContent::from_text(TEST_IFC, "test.ifc").unwrap())
    }

    #[test]
    fn test_sets_for_wall() {
        let sets = table().item_properties(ElementId(10)).unwrap();
        assert_eq!(sets.len(), 2);

        assert_eq!(sets[0].name, "Pset_WallCommon");
        assert_eq!(sets[0].kind, PropertySetKind::Properties);
        assert_eq!(sets[0].values[0].0, "IsExternal");
        assert_eq!(sets[0].values[0].1.unwrapped(), &AttributeValue::Bool(true));
        assert_eq!(sets[0].values[1].1.display_text().as_deref(), Some("REI60"));

        assert_eq!(sets[1].name, "Qto_WallBaseQuantities");
        assert_eq!(sets[1].kind, PropertySetKind::Quantities);
        assert_eq!(sets[1].values, vec![("Length".to_string(), AttributeValue::Real(5.25))]);
    }

    #[test]
    fn test_element_without_sets() {
        let t = table();
        assert_eq!(t.element_count(), 1);
        assert!(t.item_properties(ElementId(1)).unwrap().is_empty());
    }
}
