//! CMS Core -- entity registry and component composition.
//!
//! This crate provides the data model of the CMS: polymorphic
//! [component definitions](component::ComponentDefinition) grouped into
//! string-identified [entities](entity::Entity), stored in an ordered,
//! id-indexed [`EntityTable`](table::EntityTable). Code-defined entity
//! variants and component types are enumerated through an explicit
//! [`TypeRegistry`](discovery::TypeRegistry) rather than runtime reflection.
//!
//! # Quick Start
//!
//! ```
//! use cms_core::prelude::*;
//!
//! #[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
//! struct Health { hp: u32 }
//! cms_core::component_definition!(Health);
//!
//! let mut table: EntityTable = EntityTable::new();
//! let goblin = table.add(Box::new(Entity::new("CMS/Monsters/Goblin"))).unwrap();
//! goblin.entity_mut().define::<Health>().hp = 12;
//!
//! let found = table.find_by_id("CMS/Monsters/Goblin").unwrap();
//! assert_eq!(found.entity().get::<Health>().map(|h| h.hp), Some(12));
//! assert!(table.add(Box::new(Entity::new("CMS/Monsters/Goblin"))).is_err());
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod discovery;
pub mod entity;
pub mod source;
pub mod table;
pub mod tags;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by CMS operations.
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    /// An entity with this id is already registered.
    #[error("entity id '{id}' is already registered")]
    DuplicateId { id: entity::EntityId },

    /// An explicit entity id was required but the given one is empty.
    #[error("entity id must not be empty")]
    EmptyId,

    /// No entity is registered under this id.
    #[error("unable to resolve entity id '{id}'")]
    NotFound { id: entity::EntityId },

    /// The entity exists but is not of the requested variant.
    #[error("entity '{id}' is a {actual}, not a {expected}")]
    TypeMismatch {
        id: entity::EntityId,
        expected: &'static str,
        actual: &'static str,
    },

    /// The entity exists but carries no component of the requested type.
    #[error("entity '{id}' has no {component} component")]
    MissingComponent {
        id: entity::EntityId,
        component: &'static str,
    },

    /// A record referenced a component tag that has not been registered.
    #[error("component type '{tag}' not registered. Registered components: [{registered}]")]
    UnknownComponent { tag: String, registered: String },

    /// A component's Rust type has no registration.
    #[error("component type {type_name} is not registered")]
    UnregisteredType { type_name: &'static str },

    /// Converting a component to or from JSON failed.
    #[error("failed to (de)serialize component '{component}': {details}")]
    ComponentSerialization { component: String, details: String },

    /// Reading or writing a resource file failed.
    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A resource file could not be parsed as an entity record.
    #[error("invalid entity record {}: {details}", .path.display())]
    InvalidRecord { path: PathBuf, details: String },

    /// No template with this name exists.
    #[error("template '{name}' not found")]
    TemplateNotFound { name: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{ComponentDefinition, SerializedComponent};
    pub use crate::discovery::{ComponentVariantInfo, EntityVariantInfo, TypeRegistry};
    pub use crate::entity::{Entity, EntityId, EntityVariant};
    pub use crate::source::{EntityRecord, EntitySource, MemorySource};
    pub use crate::table::EntityTable;
    pub use crate::tags::{
        register_builtin_tags, EntityReference, TagCmsEntity, TagListCmsEntity, TagMesh,
        TagSprite, Visual,
    };
    pub use crate::CmsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
