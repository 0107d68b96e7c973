//! The CMS context object.
//!
//! [`Cms`] owns the type registry, the configured entity sources and the
//! entity table. Its lifecycle is a two-state machine:
//!
//! ```text
//! Uninitialized --init()--> Initialized --unload()--> Uninitialized
//! ```
//!
//! `init` populates a fresh table in two passes: every registered entity
//! variant is default-constructed and added first, then every record of
//! every source becomes a plain [`Entity`]. The new table replaces the
//! current one only if population succeeds, so a failed `init` leaves the
//! CMS uninitialized and empty.
//!
//! Lookups come in two flavors. `try_*` methods return [`CmsError`]; the
//! plain forms panic with the same message, for boot code where a missing
//! entity is a configuration error.
//!
//! # Example
//!
//! ```
//! use cms::prelude::*;
//!
//! let mut registry = TypeRegistry::new();
//! register_builtin_tags(&mut registry);
//!
//! let source = MemorySource::new("memory").with_record(
//!     "CMS/Items/Coin",
//!     vec![SerializedComponent::new("tag_sprite", serde_json::json!({ "sprite": "coin.png" }))],
//! );
//! let mut cms = Cms::new(registry).with_source(source);
//! cms.init().unwrap();
//!
//! let coin: &Entity = cms.get(Some("CMS/Items/Coin"));
//! assert_eq!(coin.sprite(), Some("coin.png"));
//! assert_eq!(cms.get_all_data::<TagSprite>().len(), 1);
//! ```

use cms_core::component::ComponentDefinition;
use cms_core::discovery::TypeRegistry;
use cms_core::entity::{Entity, EntityId, EntityVariant};
use cms_core::source::EntitySource;
use cms_core::table::EntityTable;
use cms_core::tags::{TagCmsEntity, TagListCmsEntity};
use cms_core::CmsError;
use tracing::{debug, info, warn};

use crate::config::CmsConfig;
use crate::fingerprint::fingerprint;

// ---------------------------------------------------------------------------
// LoadState
// ---------------------------------------------------------------------------

/// Lifecycle state of a [`Cms`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Initialized,
}

/// Outcome of [`Cms::reload_if_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    /// Whether the table was replaced.
    pub reloaded: bool,
    /// Fingerprint before the call, `None` if the CMS was not initialized.
    pub previous: Option<String>,
    pub current: String,
    pub entities: usize,
}

// ---------------------------------------------------------------------------
// Cms
// ---------------------------------------------------------------------------

/// Entity registry with an explicit `init`/`unload` lifecycle.
#[derive(Debug)]
pub struct Cms {
    registry: TypeRegistry,
    sources: Vec<Box<dyn EntitySource>>,
    table: EntityTable,
    state: LoadState,
}

impl Cms {
    /// An uninitialized CMS with no sources.
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            sources: Vec::new(),
            table: EntityTable::new(),
            state: LoadState::Uninitialized,
        }
    }

    /// Builder-style [`Cms::add_source`].
    pub fn with_source(mut self, source: impl EntitySource + 'static) -> Self {
        self.add_source(Box::new(source));
        self
    }

    /// Add an entity source. Sources are read in the order they were added.
    pub fn add_source(&mut self, source: Box<dyn EntitySource>) {
        debug!(source = source.name(), "added entity source");
        self.sources.push(source);
    }

    /// A CMS reading entity files from the configured resource folder.
    pub fn from_config(config: &CmsConfig, registry: TypeRegistry) -> Result<Self, anyhow::Error> {
        if !config.resource_root.is_dir() {
            return Err(anyhow::anyhow!(
                "resource root {} is not a directory",
                config.resource_root.display()
            ));
        }
        Ok(Self::new(registry).with_source(config.resource_dir()))
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The current table. Empty while uninitialized.
    pub fn table(&self) -> &EntityTable {
        &self.table
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == LoadState::Initialized
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    // -- lifecycle ----------------------------------------------------------

    /// Populate the table. Does nothing if already initialized.
    ///
    /// On error the CMS stays uninitialized with an empty table.
    pub fn init(&mut self) -> Result<(), CmsError> {
        if self.is_initialized() {
            debug!("cms already initialized");
            return Ok(());
        }

        let table = self.populate().map_err(|e| {
            warn!(error = %e, "cms init failed");
            e
        })?;
        self.table = table;
        self.state = LoadState::Initialized;
        info!(entities = self.table.len(), "cms initialized");
        Ok(())
    }

    /// Discard the table and return to the uninitialized state.
    pub fn unload(&mut self) {
        self.table = EntityTable::new();
        self.state = LoadState::Uninitialized;
        info!("cms unloaded");
    }

    /// `unload` followed by `init`.
    pub fn reload(&mut self) -> Result<(), CmsError> {
        self.unload();
        self.init()
    }

    /// Re-read every source and swap the table in only if its fingerprint
    /// differs from the current one. An uninitialized CMS always loads.
    ///
    /// On error the current table is kept.
    pub fn reload_if_changed(&mut self) -> Result<ReloadReport, CmsError> {
        let previous = self.is_initialized().then(|| self.fingerprint());
        let fresh = self.populate()?;
        let current = fingerprint(&self.registry, &fresh);
        let reloaded = previous.as_deref() != Some(current.as_str());

        if reloaded {
            self.table = fresh;
            self.state = LoadState::Initialized;
            info!(entities = self.table.len(), fingerprint = %current, "cms reloaded");
        } else {
            debug!(fingerprint = %current, "cms content unchanged");
        }

        Ok(ReloadReport {
            reloaded,
            previous,
            current,
            entities: self.table.len(),
        })
    }

    /// BLAKE3 digest of the current table content.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.registry, &self.table)
    }

    fn populate(&self) -> Result<EntityTable, CmsError> {
        let mut table: EntityTable = EntityTable::new();

        for info in self.registry.entity_variants() {
            let entry = table.add(info.instantiate())?;
            debug!(id = entry.entity().id_str(), "registered code-defined entity");
        }

        for source in &self.sources {
            let records = source.load(&self.registry)?;
            let count = records.len();
            for record in records {
                table.add(Box::new(record.into_entity()))?;
            }
            debug!(source = source.name(), entities = count, "loaded entity source");
        }

        Ok(table)
    }

    // -- lookup -------------------------------------------------------------

    /// Entity `id` viewed as `T`. Without an id, `T`'s own type name is used,
    /// which finds code-defined singletons.
    pub fn try_get<T: EntityVariant>(&self, id: Option<&str>) -> Result<&T, CmsError> {
        let id = id.map_or_else(EntityId::of::<T>, EntityId::new);
        let entry = self
            .table
            .find_by_id(id.as_str())
            .ok_or_else(|| CmsError::NotFound { id: id.clone() })?;
        T::downcast_variant(entry).ok_or_else(|| CmsError::TypeMismatch {
            id,
            expected: std::any::type_name::<T>(),
            actual: entry.variant_name(),
        })
    }

    /// Like [`Cms::try_get`].
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist or is not a `T`.
    pub fn get<T: EntityVariant>(&self, id: Option<&str>) -> &T {
        match self.try_get::<T>(id) {
            Ok(entry) => entry,
            Err(e) => panic!("{e}"),
        }
    }

    /// Component `V` of entity `id`.
    pub fn try_get_data<V: ComponentDefinition>(&self, id: Option<&str>) -> Result<&V, CmsError> {
        let entity = self.try_get::<Entity>(id)?;
        entity.get::<V>().ok_or_else(|| CmsError::MissingComponent {
            id: EntityId::new(entity.id_str()),
            component: std::any::type_name::<V>(),
        })
    }

    /// Like [`Cms::try_get_data`].
    ///
    /// # Panics
    ///
    /// Panics if the entity does not exist or lacks a `V`.
    pub fn get_data<V: ComponentDefinition>(&self, id: Option<&str>) -> &V {
        match self.try_get_data::<V>(id) {
            Ok(component) => component,
            Err(e) => panic!("{e}"),
        }
    }

    /// Every entity that can be viewed as `T`, in table order.
    pub fn get_all<T: EntityVariant>(&self) -> Vec<&T> {
        self.table.filter_by_type::<T>()
    }

    /// Every entity carrying a `V`, paired with its first `V`, in table order.
    pub fn get_all_data<V: ComponentDefinition>(&self) -> Vec<(&Entity, &V)> {
        self.table
            .get_all()
            .filter_map(|entry| {
                let entity = entry.entity();
                entity.get::<V>().map(|component| (entity, component))
            })
            .collect()
    }

    /// Every entity with a component advertising capability `C`, paired with
    /// the first such component, in table order.
    pub fn get_all_capability<C: ?Sized + 'static>(&self) -> Vec<(&Entity, &C)> {
        self.table
            .get_all()
            .filter_map(|entry| {
                let entity = entry.entity();
                entity.get_abstract::<C>().map(|component| (entity, component))
            })
            .collect()
    }

    // -- references ---------------------------------------------------------

    /// The entity a reference tag points at. An empty reference is `Ok(None)`.
    pub fn resolve(&self, reference: &TagCmsEntity) -> Result<Option<&Entity>, CmsError> {
        reference
            .entity
            .as_ref()
            .map(|id| self.try_get::<Entity>(Some(id.as_str())))
            .transpose()
    }

    /// The entities a list reference points at, in list order.
    pub fn resolve_list(&self, references: &TagListCmsEntity) -> Result<Vec<&Entity>, CmsError> {
        references
            .entities
            .iter()
            .map(|id| self.try_get::<Entity>(Some(id.as_str())))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
