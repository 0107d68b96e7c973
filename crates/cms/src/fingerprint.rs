//! Content fingerprints of a populated entity table.
//!
//! The fingerprint is a BLAKE3 hex digest over every entity's id, variant and
//! serialized components, in table order. Two tables with the same content
//! hash the same, so a reload can be skipped when nothing changed on disk.
//!
//! Components whose type is not registered have no JSON form; their `Debug`
//! output is hashed instead.

use serde::Serialize;

use cms_core::discovery::TypeRegistry;
use cms_core::table::EntityTable;

#[derive(Serialize)]
struct HashableEntity<'a> {
    id: &'a str,
    variant: &'static str,
    components: Vec<serde_json::Value>,
}

/// BLAKE3 hex digest of the table content.
pub fn fingerprint(registry: &TypeRegistry, table: &EntityTable) -> String {
    let entities: Vec<HashableEntity<'_>> = table
        .get_all()
        .map(|entry| HashableEntity {
            id: entry.entity().id_str(),
            variant: entry.variant_name(),
            components: entry
                .entity()
                .components()
                .iter()
                .map(|component| {
                    registry
                        .serialize_component(component.as_ref())
                        .ok()
                        .and_then(|serialized| serde_json::to_value(serialized).ok())
                        .unwrap_or_else(|| serde_json::Value::String(format!("{component:?}")))
                })
                .collect(),
        })
        .collect();

    let json_bytes =
        serde_json::to_vec(&entities).expect("fingerprint state should always be JSON-serializable");

    blake3::hash(&json_bytes).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cms_core::entity::Entity;
    use cms_core::tags::{register_builtin_tags, TagSprite};

    #[derive(Debug, Default)]
    struct Opaque(u8);

    cms_core::component_definition!(Opaque);

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        register_builtin_tags(&mut registry);
        registry
    }

    fn table_with_sprite(sprite: &str) -> EntityTable {
        let mut table: EntityTable = EntityTable::new();
        let mut entity = Entity::new("CMS/Items/Coin");
        entity.define::<TagSprite>().sprite = sprite.to_owned();
        table.add(Box::new(entity)).unwrap();
        table
    }

    #[test]
    fn same_content_same_digest() {
        let registry = registry();
        let a = fingerprint(&registry, &table_with_sprite("coin.png"));
        let b = fingerprint(&registry, &table_with_sprite("coin.png"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn component_value_changes_digest() {
        let registry = registry();
        assert_ne!(
            fingerprint(&registry, &table_with_sprite("coin.png")),
            fingerprint(&registry, &table_with_sprite("gem.png"))
        );
    }

    #[test]
    fn unregistered_components_still_contribute() {
        let registry = registry();
        let build = |value: u8| {
            let mut table: EntityTable = EntityTable::new();
            let mut entity = Entity::new("CMS/Odd");
            entity.add(Box::new(Opaque(value)));
            table.add(Box::new(entity)).unwrap();
            table
        };
        assert_ne!(
            fingerprint(&registry, &build(1)),
            fingerprint(&registry, &build(2))
        );
    }

    #[test]
    fn empty_table_has_stable_digest() {
        let registry = registry();
        let empty: EntityTable = EntityTable::new();
        assert_eq!(fingerprint(&registry, &empty), fingerprint(&registry, &EntityTable::new()));
    }
}
