//! Filtering and searching loaded entity records.
//!
//! Pickers narrow the list of candidate entities in two ways: by allowed
//! component types and by a free-text query over the display name.

use std::any::TypeId;

use cms_core::component::concrete_type_id;
use cms_core::discovery::TypeRegistry;
use cms_core::source::EntityRecord;
use cms_core::CmsError;

/// Records carrying at least one component whose exact type is in `allowed`,
/// in input order.
///
/// An empty `allowed` keeps every record.
pub fn filter_by_tags<'a>(records: &'a [EntityRecord], allowed: &[TypeId]) -> Vec<&'a EntityRecord> {
    if allowed.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| {
            record
                .components
                .iter()
                .any(|component| allowed.contains(&concrete_type_id(component.as_ref())))
        })
        .collect()
}

/// Records whose name contains `query`, ignoring case.
///
/// A blank query keeps every record.
pub fn search<'a>(records: &'a [EntityRecord], query: &str) -> Vec<&'a EntityRecord> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| record.name.to_lowercase().contains(&query))
        .collect()
}

/// Resolve component tags to the type ids [`filter_by_tags`] expects.
pub fn resolve_tags(registry: &TypeRegistry, tags: &[&str]) -> Result<Vec<TypeId>, CmsError> {
    tags.iter()
        .map(|tag| {
            registry
                .component_by_tag(tag)
                .map(|info| info.type_id)
                .ok_or_else(|| CmsError::UnknownComponent {
                    tag: (*tag).to_owned(),
                    registered: registry.registered_tags().join(", "),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cms_core::tags::{register_builtin_tags, TagCmsEntity, TagMesh, TagSprite};

    fn records() -> Vec<EntityRecord> {
        vec![
            EntityRecord::new("CMS/Monsters/Goblin").with(TagSprite {
                sprite: "goblin.png".to_owned(),
            }),
            EntityRecord::new("CMS/Monsters/GoblinKing")
                .with(TagSprite::default())
                .with(TagCmsEntity::default()),
            EntityRecord::new("CMS/Items/Sword"),
        ]
    }

    fn names<'a>(records: &[&'a EntityRecord]) -> Vec<&'a str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn tag_filter_matches_any_allowed_type() {
        let records = records();
        let sprites = filter_by_tags(&records, &[TypeId::of::<TagSprite>()]);
        assert_eq!(names(&sprites), vec!["Goblin", "GoblinKing"]);

        let references = filter_by_tags(&records, &[TypeId::of::<TagCmsEntity>()]);
        assert_eq!(names(&references), vec!["GoblinKing"]);

        let either = filter_by_tags(
            &records,
            &[TypeId::of::<TagCmsEntity>(), TypeId::of::<TagSprite>()],
        );
        assert_eq!(names(&either), vec!["Goblin", "GoblinKing"]);
        assert!(filter_by_tags(&records, &[TypeId::of::<TagMesh>()]).is_empty());

        assert_eq!(filter_by_tags(&records, &[]).len(), 3);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let records = records();
        assert_eq!(names(&search(&records, "gob")), vec!["Goblin", "GoblinKing"]);
        assert_eq!(names(&search(&records, "KING")), vec!["GoblinKing"]);
        assert_eq!(search(&records, "  ").len(), 3);
        assert!(search(&records, "dragon").is_empty());
    }

    #[test]
    fn resolve_tags_by_registration() {
        let mut registry = TypeRegistry::new();
        register_builtin_tags(&mut registry);
        assert_eq!(
            resolve_tags(&registry, &["tag_sprite"]).unwrap(),
            vec![TypeId::of::<TagSprite>()]
        );
        assert!(matches!(
            resolve_tags(&registry, &["tag_ghost"]),
            Err(CmsError::UnknownComponent { .. })
        ));
    }
}
