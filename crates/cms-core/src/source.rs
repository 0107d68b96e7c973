//! Entity sources: where asset-backed entities come from.
//!
//! A source yields [`EntityRecord`]s (an id plus an authored component list)
//! once per `init`. The registry converts each record into a plain
//! [`Entity`], taking ownership of the record's components.

use std::fmt;

use crate::component::{ComponentDefinition, SerializedComponent};
use crate::discovery::TypeRegistry;
use crate::entity::{Entity, EntityId};
use crate::CmsError;

// ---------------------------------------------------------------------------
// EntityRecord
// ---------------------------------------------------------------------------

/// One authored entity as read from a source.
#[derive(Debug, Default)]
pub struct EntityRecord {
    /// Stored identifier. `None` lets the table derive one.
    pub id: Option<EntityId>,
    /// Display name (file stem for on-disk records).
    pub name: String,
    pub components: Vec<Box<dyn ComponentDefinition>>,
}

impl EntityRecord {
    pub fn new(id: impl Into<EntityId>) -> Self {
        let id = id.into();
        Self {
            name: id.name().to_owned(),
            id: Some(id),
            components: Vec::new(),
        }
    }

    /// Builder-style component append.
    pub fn with(mut self, component: impl ComponentDefinition) -> Self {
        self.components.push(Box::new(component));
        self
    }

    /// Convert into a plain entity, moving the components.
    pub fn into_entity(self) -> Entity {
        Entity::with_components(self.id, self.components)
    }
}

// ---------------------------------------------------------------------------
// EntitySource
// ---------------------------------------------------------------------------

/// A store of authored entity records.
pub trait EntitySource: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Read every record. Called once per `init`; each call must return fresh
    /// component instances.
    fn load(&self, registry: &TypeRegistry) -> Result<Vec<EntityRecord>, CmsError>;
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// In-memory source holding records in their serialized form.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    records: Vec<(EntityId, Vec<SerializedComponent>)>,
}

impl MemorySource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            records: Vec::new(),
        }
    }

    /// Builder-style record append.
    pub fn with_record(
        mut self,
        id: impl Into<EntityId>,
        components: Vec<SerializedComponent>,
    ) -> Self {
        self.push(id, components);
        self
    }

    pub fn push(&mut self, id: impl Into<EntityId>, components: Vec<SerializedComponent>) {
        self.records.push((id.into(), components));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl EntitySource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self, registry: &TypeRegistry) -> Result<Vec<EntityRecord>, CmsError> {
        self.records
            .iter()
            .map(|(id, serialized)| {
                let components = serialized
                    .iter()
                    .map(|component| registry.deserialize_component(component))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(EntityRecord {
                    id: Some(id.clone()),
                    name: id.name().to_owned(),
                    components,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{register_builtin_tags, TagSprite};

    #[test]
    fn record_converts_to_entity() {
        let record = EntityRecord::new("CMS/Items/Coin").with(TagSprite {
            sprite: "coin.png".to_owned(),
        });
        assert_eq!(record.name, "Coin");
        let entity = record.into_entity();
        assert_eq!(entity.id_str(), "CMS/Items/Coin");
        assert_eq!(entity.sprite(), Some("coin.png"));
    }

    #[test]
    fn memory_source_returns_fresh_instances() {
        let mut registry = TypeRegistry::new();
        register_builtin_tags(&mut registry);
        let source = MemorySource::new("memory").with_record(
            "CMS/Items/Coin",
            vec![SerializedComponent::new(
                "tag_sprite",
                serde_json::json!({ "sprite": "coin.png" }),
            )],
        );

        let mut first = source.load(&registry).unwrap();
        first[0].components[0]
            .as_any_mut()
            .downcast_mut::<TagSprite>()
            .unwrap()
            .sprite
            .clear();

        let second = source.load(&registry).unwrap();
        let entity = second.into_iter().next().unwrap().into_entity();
        assert_eq!(entity.sprite(), Some("coin.png"));
    }

    #[test]
    fn memory_source_propagates_unknown_tags() {
        let registry = TypeRegistry::new();
        let source = MemorySource::new("memory")
            .with_record("CMS/X", vec![SerializedComponent::default_of("ghost")]);
        assert!(matches!(
            source.load(&registry),
            Err(CmsError::UnknownComponent { .. })
        ));
    }
}
