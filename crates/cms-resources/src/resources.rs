//! Entity files under a resource root.
//!
//! Layout: `<resource_root>/<cms_folder>/**/<Name>.json`. The id of a file is
//! its path relative to the resource root without the extension, so
//! `Resources/CMS/Monsters/Goblin.json` is `CMS/Monsters/Goblin`.
//!
//! Loading trusts the id stored inside the file; [`ResourceDir::auto_fill_ids`]
//! brings stored ids back in line with file locations after moves or renames.

use std::fs;
use std::path::{Path, PathBuf};

use cms_core::component::SerializedComponent;
use cms_core::discovery::TypeRegistry;
use cms_core::entity::EntityId;
use cms_core::source::{EntityRecord, EntitySource};
use cms_core::CmsError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    check_contained, has_json_extension, is_contained, read_json, write_json, JSON_EXTENSION,
};

// ---------------------------------------------------------------------------
// EntityFile
// ---------------------------------------------------------------------------

/// On-disk form of one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub components: Vec<SerializedComponent>,
}

/// Id for the entity file at `path`: the path relative to `resource_root`,
/// `/`-separated, without extension.
///
/// Returns `None` if `path` is outside the root (including through `..`) or
/// is not a JSON file.
pub fn format_entity_id(resource_root: &Path, path: &Path) -> Option<EntityId> {
    if !has_json_extension(path) {
        return None;
    }
    let relative = path.strip_prefix(resource_root).ok()?.with_extension("");
    if !is_contained(&relative) {
        return None;
    }
    let id = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    (!id.is_empty()).then(|| EntityId::new(id))
}

// ---------------------------------------------------------------------------
// ResourceDir
// ---------------------------------------------------------------------------

/// A folder of entity files, usable as an [`EntitySource`].
#[derive(Debug, Clone)]
pub struct ResourceDir {
    resource_root: PathBuf,
    cms_folder: String,
}

impl ResourceDir {
    pub fn new(resource_root: impl Into<PathBuf>, cms_folder: &str) -> Self {
        Self {
            resource_root: resource_root.into(),
            cms_folder: cms_folder.to_owned(),
        }
    }

    pub fn resource_root(&self) -> &Path {
        &self.resource_root
    }

    /// Folder scanned for entity files.
    pub fn cms_root(&self) -> PathBuf {
        self.resource_root.join(&self.cms_folder)
    }

    /// File backing the entity `id`.
    pub fn path_for(&self, id: &EntityId) -> PathBuf {
        self.resource_root
            .join(format!("{}.{}", id.as_str(), JSON_EXTENSION))
    }

    /// Every entity file below the CMS folder, sorted by path.
    ///
    /// A missing CMS folder yields an empty list.
    pub fn entity_files(&self) -> Result<Vec<PathBuf>, CmsError> {
        let root = self.cms_root();
        let mut files = Vec::new();
        if !root.is_dir() {
            debug!(root = %root.display(), "cms folder does not exist");
            return Ok(files);
        }
        collect_json_files(&root, &mut files)?;
        files.sort();
        Ok(files)
    }

    pub fn read_file(&self, path: &Path) -> Result<EntityFile, CmsError> {
        read_json(path)
    }

    pub fn write_file(&self, path: &Path, file: &EntityFile) -> Result<(), CmsError> {
        write_json(path, file)
    }

    /// Create a new entity file `<cms_folder>/<folder>/<name>.json` with its id
    /// already filled in. `folder` may be empty; neither `folder` nor `name`
    /// may be absolute or contain `..`.
    pub fn create_entity(
        &self,
        folder: &str,
        name: &str,
        components: Vec<SerializedComponent>,
    ) -> Result<EntityId, CmsError> {
        let cms_root = self.cms_root();
        check_contained(&cms_root, "folder", folder)?;
        check_contained(&cms_root, "entity name", name)?;

        let mut path = cms_root;
        if !folder.is_empty() {
            path.push(folder);
        }
        path.push(format!("{name}.{JSON_EXTENSION}"));

        let id = format_entity_id(&self.resource_root, &path).ok_or_else(|| {
            CmsError::InvalidRecord {
                path: path.clone(),
                details: "entity path is outside the resource root".to_owned(),
            }
        })?;
        if path.exists() {
            return Err(CmsError::DuplicateId { id });
        }

        let file = EntityFile {
            id: Some(id.clone()),
            components,
        };
        self.write_file(&path, &file)?;
        info!(id = %id, "created entity file");
        Ok(id)
    }

    /// Delete the file backing `id`.
    pub fn remove_entity(&self, id: &EntityId) -> Result<(), CmsError> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(CmsError::NotFound { id: id.clone() });
        }
        fs::remove_file(&path).map_err(|source| CmsError::Io {
            path: path.clone(),
            source,
        })?;
        info!(id = %id, "removed entity file");
        Ok(())
    }

    /// Rewrite every stored id that differs from the file's path-derived id.
    ///
    /// Other fields of the file are preserved. Files that are not JSON
    /// objects are skipped with a warning. Returns the number of files
    /// updated.
    pub fn auto_fill_ids(&self) -> Result<usize, CmsError> {
        let mut updated = 0;
        for path in self.entity_files()? {
            let Some(id) = format_entity_id(&self.resource_root, &path) else {
                warn!(path = %path.display(), "entity file is not under the resource root, skipping");
                continue;
            };

            let mut value: serde_json::Value = read_json(&path)?;
            let Some(object) = value.as_object_mut() else {
                warn!(path = %path.display(), "entity file is not a JSON object, skipping");
                continue;
            };
            if object.get("id").and_then(serde_json::Value::as_str) == Some(id.as_str()) {
                continue;
            }

            object.insert("id".to_owned(), serde_json::Value::String(id.to_string()));
            write_json(&path, &value)?;
            debug!(id = %id, "filled entity id");
            updated += 1;
        }
        info!(updated, "updated entity id(s)");
        Ok(updated)
    }
}

impl EntitySource for ResourceDir {
    fn name(&self) -> &str {
        &self.cms_folder
    }

    fn load(&self, registry: &TypeRegistry) -> Result<Vec<EntityRecord>, CmsError> {
        let files = self.entity_files()?;
        let mut records = Vec::with_capacity(files.len());

        for path in files {
            let file = self.read_file(&path)?;
            let id = match file.id {
                Some(id) if !id.is_empty() => id,
                _ => {
                    let derived = format_entity_id(&self.resource_root, &path).ok_or_else(|| {
                        CmsError::InvalidRecord {
                            path: path.clone(),
                            details: "entity file has no id and is outside the resource root"
                                .to_owned(),
                        }
                    })?;
                    warn!(
                        path = %path.display(),
                        id = %derived,
                        "entity file has no stored id, using its path"
                    );
                    derived
                }
            };

            let components = file
                .components
                .iter()
                .map(|component| registry.deserialize_component(component))
                .collect::<Result<Vec<_>, _>>()?;

            debug!(id = %id, components = components.len(), "loaded entity");
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            records.push(EntityRecord {
                id: Some(id),
                name,
                components,
            });
        }

        Ok(records)
    }
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CmsError> {
    let io_error = |source| CmsError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        if entry.file_type().map_err(io_error)?.is_dir() {
            collect_json_files(&path, out)?;
        } else if has_json_extension(&path) {
            out.push(path);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
