//! Built-in tag components shared by most projects.
//!
//! Asset references (sprites, models) are stored as resource paths; the CMS
//! does not load the assets themselves.

use serde::{Deserialize, Serialize};

use crate::discovery::TypeRegistry;
use crate::entity::EntityId;

/// Something that can be previewed in tooling.
pub trait Visual {
    /// Resource path of the preview asset, if one is set.
    fn preview_path(&self) -> Option<&str>;
}

/// A component that points at other entities.
pub trait EntityReference {
    fn referenced_ids(&self) -> Vec<&EntityId>;
}

/// Sprite shown for the entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSprite {
    pub sprite: String,
}

impl Visual for TagSprite {
    fn preview_path(&self) -> Option<&str> {
        non_empty(&self.sprite)
    }
}

crate::component_definition!(TagSprite => Visual);

/// 3D model used for the entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagMesh {
    pub model: String,
}

impl TagMesh {
    /// Model path, or `None` when unset.
    pub fn mesh_path(&self) -> Option<&str> {
        non_empty(&self.model)
    }
}

impl Visual for TagMesh {
    fn preview_path(&self) -> Option<&str> {
        self.mesh_path()
    }
}

crate::component_definition!(TagMesh => Visual);

/// Reference to one other entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagCmsEntity {
    pub entity: Option<EntityId>,
}

impl EntityReference for TagCmsEntity {
    fn referenced_ids(&self) -> Vec<&EntityId> {
        self.entity.iter().collect()
    }
}

crate::component_definition!(TagCmsEntity => EntityReference);

/// References to several other entities, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagListCmsEntity {
    pub entities: Vec<EntityId>,
}

impl EntityReference for TagListCmsEntity {
    fn referenced_ids(&self) -> Vec<&EntityId> {
        self.entities.iter().collect()
    }
}

crate::component_definition!(TagListCmsEntity => EntityReference);

/// Register the built-in tags under their standard names.
pub fn register_builtin_tags(registry: &mut TypeRegistry) {
    registry.register_component::<TagSprite>("tag_sprite");
    registry.register_component::<TagMesh>("tag_mesh");
    registry.register_component::<TagCmsEntity>("tag_cms_entity");
    registry.register_component::<TagListCmsEntity>("tag_list_cms_entity");
}

fn non_empty(path: &str) -> Option<&str> {
    (!path.is_empty()).then_some(path)
}
