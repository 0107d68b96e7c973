//! CMS configuration.
//!
//! Paths default to the usual project layout and can be overridden from a
//! JSON file. Missing fields keep their defaults.

use std::path::{Path, PathBuf};

use cms_resources::{ResourceDir, TemplateStore};
use serde::{Deserialize, Serialize};

/// Where the CMS finds its entity files and templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// Root that entity ids are relative to.
    pub resource_root: PathBuf,
    /// Folder below `resource_root` scanned for entity files.
    pub cms_folder: String,
    pub templates_dir: PathBuf,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            resource_root: PathBuf::from("Assets/Resources"),
            cms_folder: "CMS".to_owned(),
            templates_dir: PathBuf::from("Assets/CMS/Templates"),
        }
    }
}

impl CmsConfig {
    /// Load a config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read CMS config {}: {e}", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("invalid CMS config {}: {e}", path.display()))
    }

    /// Resolve relative paths against `base` (usually the project root).
    pub fn rooted_at(mut self, base: &Path) -> Self {
        if self.resource_root.is_relative() {
            self.resource_root = base.join(&self.resource_root);
        }
        if self.templates_dir.is_relative() {
            self.templates_dir = base.join(&self.templates_dir);
        }
        self
    }

    pub fn resource_dir(&self) -> ResourceDir {
        ResourceDir::new(&self.resource_root, &self.cms_folder)
    }

    pub fn template_store(&self) -> TemplateStore {
        TemplateStore::new(&self.templates_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_project_layout() {
        let config = CmsConfig::default();
        assert_eq!(config.resource_root, PathBuf::from("Assets/Resources"));
        assert_eq!(config.cms_folder, "CMS");
        assert_eq!(config.templates_dir, PathBuf::from("Assets/CMS/Templates"));
        assert_eq!(
            config.resource_dir().cms_root(),
            PathBuf::from("Assets/Resources/CMS")
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: CmsConfig = serde_json::from_str(r#"{ "cms_folder": "Content" }"#).unwrap();
        assert_eq!(config.cms_folder, "Content");
        assert_eq!(config.resource_root, PathBuf::from("Assets/Resources"));
    }

    #[test]
    fn rooted_at_only_touches_relative_paths() {
        let config = CmsConfig {
            templates_dir: std::env::temp_dir(),
            ..Default::default()
        }
        .rooted_at(Path::new("/project"));
        assert_eq!(config.resource_root, PathBuf::from("/project/Assets/Resources"));
        assert_eq!(config.templates_dir, std::env::temp_dir());
    }

    #[test]
    fn from_file_reports_missing_file() {
        let missing = std::env::temp_dir().join("cms-config-does-not-exist.json");
        let err = CmsConfig::from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("failed to read CMS config"));
    }

    #[test]
    fn from_file_reads_json() {
        let path = std::env::temp_dir().join(format!("cms-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "resource_root": "Data", "cms_folder": "Entities" }"#).unwrap();
        let config = CmsConfig::from_file(&path).unwrap();
        assert_eq!(config.resource_root, PathBuf::from("Data"));
        assert_eq!(config.cms_folder, "Entities");
        let _ = std::fs::remove_file(&path);
    }
}
