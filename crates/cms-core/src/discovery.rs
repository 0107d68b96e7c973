//! Type discovery through explicit registration.
//!
//! Entity variants and component types register themselves once in a
//! [`TypeRegistry`]. The registry is the enumerable "type universe" used to
//! auto-populate code-defined entities, to fill "add component" pickers, and
//! to bridge components to and from their tagged JSON form.
//!
//! Registration order is preserved, so every enumeration is deterministic.

use std::any::TypeId;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::component::{concrete_type_id, ComponentDefinition, SerializedComponent};
use crate::entity::EntityVariant;
use crate::CmsError;

// ---------------------------------------------------------------------------
// Registration records
// ---------------------------------------------------------------------------

/// A registered code-defined entity variant.
#[derive(Debug, Clone)]
pub struct EntityVariantInfo {
    /// Fully-qualified type name; also the default entity id.
    pub type_name: &'static str,
    pub type_id: TypeId,
    factory: fn() -> Box<dyn EntityVariant>,
}

impl EntityVariantInfo {
    /// Default-construct the variant.
    pub fn instantiate(&self) -> Box<dyn EntityVariant> {
        (self.factory)()
    }

    /// Name of the crate that defines the variant.
    pub fn crate_name(&self) -> &'static str {
        crate_of(self.type_name)
    }
}

/// A registered component type.
#[derive(Debug, Clone)]
pub struct ComponentVariantInfo {
    /// Stable tag used in entity files and templates.
    pub tag: String,
    pub type_name: &'static str,
    pub type_id: TypeId,
    factory: fn() -> Box<dyn ComponentDefinition>,
    deserialize: fn(serde_json::Value) -> Result<Box<dyn ComponentDefinition>, serde_json::Error>,
    serialize: fn(&dyn ComponentDefinition) -> Option<Result<serde_json::Value, serde_json::Error>>,
}

impl ComponentVariantInfo {
    /// A default instance, as an "add component" picker would create it.
    pub fn instantiate(&self) -> Box<dyn ComponentDefinition> {
        (self.factory)()
    }

    /// Whether the type advertises capability `C`.
    pub fn implements<C: ?Sized + 'static>(&self) -> bool {
        self.instantiate().caster(TypeId::of::<C>()).is_some()
    }

    /// Name of the crate that defines the component.
    pub fn crate_name(&self) -> &'static str {
        crate_of(self.type_name)
    }
}

fn crate_of(type_name: &'static str) -> &'static str {
    type_name.split("::").next().unwrap_or(type_name)
}

fn make_entity<E: EntityVariant + Default>() -> Box<dyn EntityVariant> {
    Box::new(E::default())
}

fn make_component<V: ComponentDefinition + Default>() -> Box<dyn ComponentDefinition> {
    Box::new(V::default())
}

fn deserialize_as<V: ComponentDefinition + DeserializeOwned>(
    value: serde_json::Value,
) -> Result<Box<dyn ComponentDefinition>, serde_json::Error> {
    Ok(Box::new(serde_json::from_value::<V>(value)?))
}

fn serialize_as<V: ComponentDefinition + Serialize>(
    component: &dyn ComponentDefinition,
) -> Option<Result<serde_json::Value, serde_json::Error>> {
    component
        .as_any()
        .downcast_ref::<V>()
        .map(serde_json::to_value)
}

// ---------------------------------------------------------------------------
// TypeRegistry
// ---------------------------------------------------------------------------

/// Enumerable set of entity variants and component types.
///
/// A type can only be registered once; re-registering the same Rust type is a
/// no-op.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    entities: Vec<EntityVariantInfo>,
    entity_by_type: HashMap<TypeId, usize>,
    components: Vec<ComponentVariantInfo>,
    component_by_type: HashMap<TypeId, usize>,
    component_by_tag: HashMap<String, usize>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a code-defined entity variant. It will be default-constructed
    /// and added to the table on every `init`.
    pub fn register_entity<E: EntityVariant + Default>(&mut self) -> &mut Self {
        let type_id = TypeId::of::<E>();
        if self.entity_by_type.contains_key(&type_id) {
            return self;
        }
        let type_name = std::any::type_name::<E>();
        debug!(variant = type_name, "registered entity variant");
        self.entity_by_type.insert(type_id, self.entities.len());
        self.entities.push(EntityVariantInfo {
            type_name,
            type_id,
            factory: make_entity::<E>,
        });
        self
    }

    /// Register a component type under `tag`.
    ///
    /// # Panics
    ///
    /// Panics if `tag` is already registered for a different type.
    pub fn register_component<V>(&mut self, tag: &str) -> &mut Self
    where
        V: ComponentDefinition + Default + Serialize + DeserializeOwned,
    {
        let type_id = TypeId::of::<V>();
        if self.component_by_type.contains_key(&type_id) {
            return self;
        }
        if self.component_by_tag.contains_key(tag) {
            panic!(
                "component tag '{}' is already registered for a different type",
                tag
            );
        }
        let type_name = std::any::type_name::<V>();
        debug!(tag, component = type_name, "registered component type");
        let index = self.components.len();
        self.components.push(ComponentVariantInfo {
            tag: tag.to_owned(),
            type_name,
            type_id,
            factory: make_component::<V>,
            deserialize: deserialize_as::<V>,
            serialize: serialize_as::<V>,
        });
        self.component_by_type.insert(type_id, index);
        self.component_by_tag.insert(tag.to_owned(), index);
        self
    }

    // -- discovery ----------------------------------------------------------

    /// Every registered entity variant, in registration order.
    pub fn entity_variants(&self) -> &[EntityVariantInfo] {
        &self.entities
    }

    /// Entity variants defined in the crate `crate_name`.
    pub fn entity_variants_in_crate(&self, crate_name: &str) -> Vec<&EntityVariantInfo> {
        self.entities
            .iter()
            .filter(|info| info.crate_name() == crate_name)
            .collect()
    }

    /// Every registered component type, in registration order.
    pub fn component_variants(&self) -> &[ComponentVariantInfo] {
        &self.components
    }

    /// Component types defined in the crate `crate_name`.
    pub fn components_in_crate(&self, crate_name: &str) -> Vec<&ComponentVariantInfo> {
        self.components
            .iter()
            .filter(|info| info.crate_name() == crate_name)
            .collect()
    }

    /// Component types advertising capability `C`, in registration order.
    pub fn components_implementing<C: ?Sized + 'static>(&self) -> Vec<&ComponentVariantInfo> {
        self.components
            .iter()
            .filter(|info| info.implements::<C>())
            .collect()
    }

    pub fn component_by_tag(&self, tag: &str) -> Option<&ComponentVariantInfo> {
        self.component_by_tag
            .get(tag)
            .map(|&index| &self.components[index])
    }

    pub fn component_by_type(&self, type_id: TypeId) -> Option<&ComponentVariantInfo> {
        self.component_by_type
            .get(&type_id)
            .map(|&index| &self.components[index])
    }

    /// Tags of all registered component types, sorted.
    pub fn registered_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.component_by_tag.keys().map(|s| s.as_str()).collect();
        tags.sort();
        tags
    }

    // -- instantiation ------------------------------------------------------

    /// Default instance of the component registered under `tag`.
    pub fn instantiate_component(&self, tag: &str) -> Result<Box<dyn ComponentDefinition>, CmsError> {
        self.lookup_tag(tag).map(ComponentVariantInfo::instantiate)
    }

    /// Build a component from its tagged JSON form.
    pub fn deserialize_component(
        &self,
        serialized: &SerializedComponent,
    ) -> Result<Box<dyn ComponentDefinition>, CmsError> {
        let info = self.lookup_tag(&serialized.tag)?;
        match &serialized.data {
            None => Ok(info.instantiate()),
            Some(data) => (info.deserialize)(data.clone()).map_err(|e| {
                CmsError::ComponentSerialization {
                    component: serialized.tag.clone(),
                    details: e.to_string(),
                }
            }),
        }
    }

    /// Tagged JSON form of `component`.
    pub fn serialize_component(
        &self,
        component: &dyn ComponentDefinition,
    ) -> Result<SerializedComponent, CmsError> {
        let info = self
            .component_by_type(concrete_type_id(component))
            .ok_or(CmsError::UnregisteredType {
                type_name: component.type_name(),
            })?;
        let data = (info.serialize)(component)
            .ok_or(CmsError::UnregisteredType {
                type_name: component.type_name(),
            })?
            .map_err(|e| CmsError::ComponentSerialization {
                component: info.tag.clone(),
                details: e.to_string(),
            })?;
        Ok(SerializedComponent::new(&info.tag, data))
    }

    /// Fresh copy of `component`, made through its JSON form.
    pub fn duplicate_component(
        &self,
        component: &dyn ComponentDefinition,
    ) -> Result<Box<dyn ComponentDefinition>, CmsError> {
        self.deserialize_component(&self.serialize_component(component)?)
    }

    fn lookup_tag(&self, tag: &str) -> Result<&ComponentVariantInfo, CmsError> {
        self.component_by_tag(tag)
            .ok_or_else(|| CmsError::UnknownComponent {
                tag: tag.to_owned(),
                registered: self.registered_tags().join(", "),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::tags::{TagSprite, Visual};

    #[derive(Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Health {
        hp: u32,
    }

    crate::component_definition!(Health);

    #[derive(Debug, Default)]
    struct Settings {
        entity: Entity,
    }

    crate::entity_variant!(Settings, entity);

    #[derive(Debug, Default)]
    struct Credits {
        entity: Entity,
    }

    crate::entity_variant!(Credits, entity);

    #[test]
    fn entity_variants_keep_registration_order() {
        let mut registry = TypeRegistry::new();
        registry.register_entity::<Settings>().register_entity::<Credits>();
        registry.register_entity::<Settings>();

        let names: Vec<&str> = registry
            .entity_variants()
            .iter()
            .map(|info| info.type_name)
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("Settings"));
        assert!(names[1].ends_with("Credits"));
    }

    #[test]
    fn instantiated_variant_has_concrete_type() {
        let mut registry = TypeRegistry::new();
        registry.register_entity::<Settings>();
        let variant = registry.entity_variants()[0].instantiate();
        assert!(Settings::downcast_variant(variant.as_ref()).is_some());
        assert!(Credits::downcast_variant(variant.as_ref()).is_none());
    }

    #[test]
    fn crate_scoped_discovery() {
        let mut registry = TypeRegistry::new();
        registry.register_entity::<Settings>();
        registry.register_component::<Health>("health");
        crate::tags::register_builtin_tags(&mut registry);

        assert_eq!(registry.entity_variants_in_crate("cms_core").len(), 1);
        assert!(registry.entity_variants_in_crate("other_crate").is_empty());
        assert_eq!(registry.components_in_crate("cms_core").len(), 5);
    }

    #[test]
    fn empty_registry_discovers_nothing() {
        let registry = TypeRegistry::new();
        assert!(registry.entity_variants().is_empty());
        assert!(registry.component_variants().is_empty());
        assert!(registry.components_implementing::<dyn Visual>().is_empty());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn tag_collision_panics() {
        let mut registry = TypeRegistry::new();
        registry.register_component::<Health>("shared");
        registry.register_component::<TagSprite>("shared");
    }

    #[test]
    fn deserialize_with_and_without_data() {
        let mut registry = TypeRegistry::new();
        registry.register_component::<Health>("health");

        let full = registry
            .deserialize_component(&SerializedComponent::new(
                "health",
                serde_json::json!({ "hp": 12 }),
            ))
            .unwrap();
        assert_eq!(full.as_any().downcast_ref::<Health>(), Some(&Health { hp: 12 }));

        let default = registry
            .deserialize_component(&SerializedComponent::default_of("health"))
            .unwrap();
        assert_eq!(default.as_any().downcast_ref::<Health>(), Some(&Health { hp: 0 }));
    }

    #[test]
    fn unknown_tag_lists_registered_tags() {
        let mut registry = TypeRegistry::new();
        registry.register_component::<Health>("health");
        let err = registry
            .deserialize_component(&SerializedComponent::default_of("mana"))
            .unwrap_err();
        match err {
            CmsError::UnknownComponent { tag, registered } => {
                assert_eq!(tag, "mana");
                assert_eq!(registered, "health");
            }
            other => panic!("expected UnknownComponent, got {other:?}"),
        }
    }

    #[test]
    fn malformed_data_is_a_serialization_error() {
        let mut registry = TypeRegistry::new();
        registry.register_component::<Health>("health");
        let err = registry
            .deserialize_component(&SerializedComponent::new(
                "health",
                serde_json::json!({ "hp": "lots" }),
            ))
            .unwrap_err();
        assert!(matches!(err, CmsError::ComponentSerialization { .. }));
    }

    #[test]
    fn serialize_unregistered_type_fails() {
        let registry = TypeRegistry::new();
        let err = registry.serialize_component(&Health { hp: 1 }).unwrap_err();
        assert!(matches!(err, CmsError::UnregisteredType { .. }));
    }

    #[test]
    fn duplicate_makes_independent_copy() {
        let mut registry = TypeRegistry::new();
        registry.register_component::<Health>("health");
        let original = Health { hp: 3 };
        let mut copy = registry.duplicate_component(&original).unwrap();
        copy.as_any_mut().downcast_mut::<Health>().unwrap().hp = 4;
        assert_eq!(original.hp, 3);
        assert_eq!(copy.as_any().downcast_ref::<Health>(), Some(&Health { hp: 4 }));
    }

    #[test]
    fn picker_instantiates_by_tag() {
        let mut registry = TypeRegistry::new();
        crate::tags::register_builtin_tags(&mut registry);
        let sprite = registry.instantiate_component("tag_sprite").unwrap();
        assert!(sprite.as_any().is::<TagSprite>());
        assert!(registry.instantiate_component("nope").is_err());
    }
}
