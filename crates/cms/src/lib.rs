//! CMS -- entity registry façade.
//!
//! This crate ties [`cms_core`] and [`cms_resources`] together into the
//! [`Cms`](facade::Cms) context object: configure where entities come from,
//! `init` to populate the table, query it, `unload` or `reload` to start over.
//!
//! # Quick Start
//!
//! ```no_run
//! use cms::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct GameRules {
//!     entity: Entity,
//! }
//! cms::cms_core::entity_variant!(GameRules, entity);
//!
//! fn main() -> Result<(), anyhow::Error> {
//!     cms::init_tracing()?;
//!
//!     let mut registry = TypeRegistry::new();
//!     register_builtin_tags(&mut registry);
//!     registry.register_entity::<GameRules>();
//!
//!     let config = CmsConfig::from_file("cms.json")?;
//!     let mut cms = Cms::from_config(&config, registry)?;
//!     cms.init()?;
//!
//!     let _rules: &GameRules = cms.get(None);
//!     for (entity, sprite) in cms.get_all_data::<TagSprite>() {
//!         println!("{} -> {}", entity.id_str(), sprite.sprite);
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod facade;
pub mod fingerprint;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the core crate for convenience.
pub use cms_core;

/// Re-export the resources crate for convenience.
pub use cms_resources;

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common CMS usage.
pub mod prelude {
    pub use cms_core::prelude::*;

    pub use crate::config::CmsConfig;
    pub use crate::facade::{Cms, LoadState, ReloadReport};

    pub use cms_resources::filter::{filter_by_tags, search};
    pub use cms_resources::{EntityTemplate, ResourceDir, TemplateStore};
}
