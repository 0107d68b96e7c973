//! Entity identifiers, entities and entity variants.
//!
//! An [`Entity`] is an identified bag of component definitions. Code-defined
//! entity types wrap an `Entity` and implement [`EntityVariant`]; the plain
//! `Entity` is itself the universal variant, so every registered variant can
//! be viewed as one.

use std::any::{Any, TypeId};
use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::component::{cast_capability, concrete_type_id, ComponentDefinition};
use crate::discovery::TypeRegistry;
use crate::tags::TagSprite;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// String identifier of an entity, unique within a table.
///
/// Asset-backed entities use their resource-relative path without extension
/// (`CMS/Monsters/Goblin`). Code-defined entities default to their
/// fully-qualified type name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an explicit identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier derived from the fully-qualified name of `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self(std::any::type_name::<T>().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last path segment (`Goblin` for `CMS/Monsters/Goblin`).
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({:?})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// An identified, ordered bag of component definitions.
///
/// Typed queries scan components in insertion order and return the first
/// match. Duplicates of one concrete type are allowed but only the first is
/// reachable through [`Entity::get`].
#[derive(Debug, Default)]
pub struct Entity {
    /// `None` until assigned explicitly or derived on registration.
    pub id: Option<EntityId>,
    components: Vec<Box<dyn ComponentDefinition>>,
}

impl Entity {
    /// Create an empty entity with an explicit id.
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            components: Vec::new(),
        }
    }

    /// Create an entity that takes ownership of an existing component list.
    pub fn with_components(
        id: Option<EntityId>,
        components: Vec<Box<dyn ComponentDefinition>>,
    ) -> Self {
        Self { id, components }
    }

    /// The id, or `""` if none has been assigned yet.
    pub fn id_str(&self) -> &str {
        self.id.as_ref().map(EntityId::as_str).unwrap_or("")
    }

    /// Components in insertion order.
    pub fn components(&self) -> &[Box<dyn ComponentDefinition>] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Append a component without checking for an existing instance.
    pub fn add(&mut self, component: Box<dyn ComponentDefinition>) {
        self.components.push(component);
    }

    /// First component whose concrete type is exactly `V`.
    pub fn get<V: ComponentDefinition>(&self) -> Option<&V> {
        self.components
            .iter()
            .find_map(|component| component.as_any().downcast_ref::<V>())
    }

    /// Mutable access to the first component of type `V`.
    pub fn get_mut<V: ComponentDefinition>(&mut self) -> Option<&mut V> {
        self.components
            .iter_mut()
            .find_map(|component| component.as_any_mut().downcast_mut::<V>())
    }

    /// Get the component of type `V`, appending a default instance first if
    /// there is none. Repeated calls return the same instance.
    pub fn define<V: ComponentDefinition + Default>(&mut self) -> &mut V {
        if !self.is::<V>() {
            trace!(
                entity = self.id_str(),
                component = std::any::type_name::<V>(),
                "defining component"
            );
            self.components.push(Box::new(V::default()));
        }
        self.get_mut::<V>()
            .expect("component was just found or inserted")
    }

    /// Whether a component of exactly type `V` is present.
    pub fn is<V: ComponentDefinition>(&self) -> bool {
        self.get::<V>().is_some()
    }

    /// Existence test that also yields the match.
    pub fn try_get<V: ComponentDefinition>(&self) -> Option<&V> {
        self.get::<V>()
    }

    /// Whether a component of the exact runtime type `type_id` is present.
    pub fn is_type(&self, type_id: TypeId) -> bool {
        self.components
            .iter()
            .any(|component| concrete_type_id(component.as_ref()) == type_id)
    }

    /// First component advertising capability `C` (a trait-object type such
    /// as `dyn Visual`), in insertion order.
    pub fn get_abstract<C: ?Sized + 'static>(&self) -> Option<&C> {
        self.components
            .iter()
            .find_map(|component| cast_capability::<C>(component.as_ref()))
    }

    /// Whether any component advertises capability `C`.
    pub fn is_abstract<C: ?Sized + 'static>(&self) -> bool {
        self.get_abstract::<C>().is_some()
    }

    /// Interface form of [`Entity::get_abstract`].
    ///
    /// Capabilities are always traits, so abstract and interface matching
    /// resolve the same way.
    pub fn is_interface<C: ?Sized + 'static>(&self) -> Option<&C> {
        self.get_abstract::<C>()
    }

    /// Every component advertising capability `C`, in insertion order.
    pub fn all_abstract<C: ?Sized + 'static>(&self) -> Vec<&C> {
        self.components
            .iter()
            .filter_map(|component| cast_capability::<C>(component.as_ref()))
            .collect()
    }

    /// Remove and return the first component of type `V`.
    pub fn remove<V: ComponentDefinition>(&mut self) -> Option<Box<V>> {
        let index = self
            .components
            .iter()
            .position(|component| concrete_type_id(component.as_ref()) == TypeId::of::<V>())?;
        self.components.remove(index).into_any().downcast::<V>().ok()
    }

    /// Registered tags of the components, in order. Unregistered types show
    /// up under their type name.
    pub fn component_tags<'r>(&self, registry: &'r TypeRegistry) -> Vec<&'r str> {
        self.components
            .iter()
            .map(|component| {
                registry
                    .component_by_type(concrete_type_id(component.as_ref()))
                    .map(|info| info.tag.as_str())
                    .unwrap_or_else(|| component.type_name())
            })
            .collect()
    }

    /// Path of the first sprite tag with a non-empty sprite.
    pub fn sprite(&self) -> Option<&str> {
        self.components.iter().find_map(|component| {
            component
                .as_any()
                .downcast_ref::<TagSprite>()
                .filter(|tag| !tag.sprite.is_empty())
                .map(|tag| tag.sprite.as_str())
        })
    }
}

// ---------------------------------------------------------------------------
// EntityVariant
// ---------------------------------------------------------------------------

/// A concrete kind of entity that can live in an
/// [`EntityTable`](crate::table::EntityTable).
///
/// Code-defined variants wrap an [`Entity`] and fill it in `Default::default`;
/// see [`entity_variant!`](crate::entity_variant).
pub trait EntityVariant: Any + fmt::Debug + Send + Sync {
    fn entity(&self) -> &Entity;

    fn entity_mut(&mut self) -> &mut Entity;

    fn as_any(&self) -> &dyn Any;

    /// Fully-qualified name of the concrete variant type.
    fn variant_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// View `variant` as `Self`. This drives the type queries of
    /// [`EntityTable`](crate::table::EntityTable) (`find_by_type`,
    /// `filter_by_type`).
    ///
    /// The default matches only `Self`; [`Entity`] matches every variant. A
    /// variant that other variants embed (a `Monster` inside a `Boss`) must
    /// override this to also return the embedded `Self` of each sub-variant,
    /// otherwise queries for it skip them.
    ///
    /// ```
    /// use std::any::Any;
    /// use cms_core::entity::{Entity, EntityVariant};
    ///
    /// #[derive(Debug, Default)]
    /// struct Monster { entity: Entity }
    ///
    /// #[derive(Debug, Default)]
    /// struct Boss { monster: Monster }
    ///
    /// impl EntityVariant for Monster {
    ///     fn entity(&self) -> &Entity { &self.entity }
    ///     fn entity_mut(&mut self) -> &mut Entity { &mut self.entity }
    ///     fn as_any(&self) -> &dyn Any { self }
    ///
    ///     fn downcast_variant<V: ?Sized + EntityVariant>(variant: &V) -> Option<&Self> {
    ///         let any = variant.as_any();
    ///         any.downcast_ref::<Monster>()
    ///             .or_else(|| any.downcast_ref::<Boss>().map(|boss| &boss.monster))
    ///     }
    /// }
    ///
    /// cms_core::entity_variant!(Boss, monster.entity);
    ///
    /// let boss: &dyn EntityVariant = &Boss::default();
    /// assert!(Monster::downcast_variant(boss).is_some());
    /// ```
    fn downcast_variant<V: ?Sized + EntityVariant>(variant: &V) -> Option<&Self>
    where
        Self: Sized,
    {
        variant.as_any().downcast_ref::<Self>()
    }
}

impl EntityVariant for Entity {
    fn entity(&self) -> &Entity {
        self
    }

    fn entity_mut(&mut self) -> &mut Entity {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn downcast_variant<V: ?Sized + EntityVariant>(variant: &V) -> Option<&Self> {
        Some(variant.entity())
    }
}

/// Implement [`EntityVariant`] for a struct that stores its [`Entity`] in the
/// named field (or a field path such as `monster.entity`).
///
/// ```
/// use cms_core::entity::Entity;
///
/// #[derive(Debug, Default)]
/// pub struct GameRules {
///     entity: Entity,
/// }
///
/// cms_core::entity_variant!(GameRules, entity);
/// ```
#[macro_export]
macro_rules! entity_variant {
    ($ty:ty, $($field:ident).+) => {
        impl $crate::entity::EntityVariant for $ty {
            fn entity(&self) -> &$crate::entity::Entity {
                &self.$($field).+
            }

            fn entity_mut(&mut self) -> &mut $crate::entity::Entity {
                &mut self.$($field).+
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
