//! CMS Resources -- on-disk entity records for the CMS.
//!
//! Entities authored as data live as JSON files below a resource root. This
//! crate reads them into [`EntityRecord`](cms_core::source::EntityRecord)s and
//! provides the file-level tooling around them.
//!
//! # Modules
//!
//! - [`resources`]: [`ResourceDir`](resources::ResourceDir), an
//!   [`EntitySource`](cms_core::source::EntitySource) over a folder of entity
//!   files, plus path-derived ids and id auto-fill.
//! - [`filter`]: tag filtering and name search over loaded records.
//! - [`template`]: named component-list templates saved next to the assets.

#![deny(unsafe_code)]

pub mod filter;
pub mod resources;
pub mod template;

use std::fs;
use std::path::{Component, Path};

use cms_core::CmsError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use resources::{format_entity_id, EntityFile, ResourceDir};
pub use template::{EntityTemplate, TemplateStore};

/// Extension of entity and template files.
pub const JSON_EXTENSION: &str = "json";

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CmsError> {
    let text = fs::read_to_string(path).map_err(|source| CmsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|e| CmsError::InvalidRecord {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CmsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CmsError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let text = serde_json::to_string_pretty(value).map_err(|e| CmsError::InvalidRecord {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    fs::write(path, text).map_err(|source| CmsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn has_json_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == JSON_EXTENSION)
}

/// True if `path` is relative and made only of plain names, so joining it
/// onto a folder cannot leave that folder.
pub(crate) fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|part| matches!(part, Component::Normal(_) | Component::CurDir))
}

/// Reject a caller-supplied `folder`/`name` segment that would escape `base`.
pub(crate) fn check_contained(base: &Path, what: &str, segment: &str) -> Result<(), CmsError> {
    if is_contained(Path::new(segment)) {
        return Ok(());
    }
    Err(CmsError::InvalidRecord {
        path: base.join(segment),
        details: format!("{what} '{segment}' must be a relative path without '..'"),
    })
}
