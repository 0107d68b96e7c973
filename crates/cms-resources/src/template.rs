//! Entity templates: named component lists saved as JSON.
//!
//! A template captures the components of an existing entity so new entities
//! can start from the same setup. Templates live as
//! `<templates_dir>/<name>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use cms_core::component::{concrete_type_id, ComponentDefinition, SerializedComponent};
use cms_core::discovery::TypeRegistry;
use cms_core::entity::Entity;
use cms_core::CmsError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{check_contained, has_json_extension, read_json, write_json, JSON_EXTENSION};

/// A saved component list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTemplate {
    pub template_name: String,
    #[serde(default)]
    pub components: Vec<SerializedComponent>,
}

/// Folder of [`EntityTemplate`] files.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File of the template `name`. Names that would leave the folder are
    /// rejected.
    fn path_of(&self, name: &str) -> Result<PathBuf, CmsError> {
        check_contained(&self.dir, "template name", name)?;
        Ok(self.dir.join(format!("{name}.{JSON_EXTENSION}")))
    }

    /// Names of all saved templates, sorted. The folder is created if missing.
    pub fn list(&self) -> Result<Vec<String>, CmsError> {
        let io_error = |source| CmsError::Io {
            path: self.dir.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_error)?;

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if !path.is_file() || !has_json_extension(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_ok_and(|path| path.is_file())
    }

    /// Save the components of `entity` under `name`, replacing any template
    /// with the same name.
    pub fn save(
        &self,
        registry: &TypeRegistry,
        name: &str,
        entity: &Entity,
    ) -> Result<PathBuf, CmsError> {
        let components = entity
            .components()
            .iter()
            .map(|component| registry.serialize_component(component.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let template = EntityTemplate {
            template_name: name.to_owned(),
            components,
        };

        let path = self.path_of(name)?;
        write_json(&path, &template)?;
        info!(
            template = name,
            components = template.components.len(),
            "saved entity template"
        );
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<EntityTemplate, CmsError> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(CmsError::TemplateNotFound {
                name: name.to_owned(),
            });
        }
        read_json(&path)
    }

    pub fn delete(&self, name: &str) -> Result<(), CmsError> {
        let path = self.path_of(name)?;
        if !path.is_file() {
            return Err(CmsError::TemplateNotFound {
                name: name.to_owned(),
            });
        }
        fs::remove_file(&path).map_err(|source| CmsError::Io { path, source })?;
        info!(template = name, "deleted entity template");
        Ok(())
    }

    /// Fresh component instances built from the template `name`.
    pub fn instantiate(
        &self,
        registry: &TypeRegistry,
        name: &str,
    ) -> Result<Vec<Box<dyn ComponentDefinition>>, CmsError> {
        self.load(name)?
            .components
            .iter()
            .map(|component| registry.deserialize_component(component))
            .collect()
    }

    /// Add the template's components to `entity`, skipping types the entity
    /// already has. Returns the number of components added.
    pub fn apply(
        &self,
        registry: &TypeRegistry,
        name: &str,
        entity: &mut Entity,
    ) -> Result<usize, CmsError> {
        let mut added = 0;
        for component in self.instantiate(registry, name)? {
            if entity.is_type(concrete_type_id(component.as_ref())) {
                debug!(
                    template = name,
                    component = component.type_name(),
                    "entity already has component, skipping"
                );
                continue;
            }
            entity.add(component);
            added += 1;
        }
        Ok(added)
    }
}
