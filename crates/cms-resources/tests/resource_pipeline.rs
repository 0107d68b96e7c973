//! End-to-end tests: author entity files, fix their ids, load them into a
//! table and narrow the results.

use std::any::TypeId;

use cms_core::prelude::*;
use cms_core::test_support::ScratchDir;
use cms_resources::filter::{filter_by_tags, search};
use cms_resources::{EntityFile, ResourceDir, TemplateStore};

fn registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    register_builtin_tags(&mut registry);
    registry
}

#[test]
fn authored_files_populate_a_table() {
    let root = ScratchDir::new("populate");
    let dir = ResourceDir::new(root.path(), "CMS");
    dir.create_entity(
        "Monsters",
        "Goblin",
        vec![SerializedComponent::new(
            "tag_sprite",
            serde_json::json!({ "sprite": "goblin.png" }),
        )],
    )
    .unwrap();
    dir.create_entity(
        "Quests",
        "Hunt",
        vec![SerializedComponent::new(
            "tag_cms_entity",
            serde_json::json!({ "entity": "CMS/Monsters/Goblin" }),
        )],
    )
    .unwrap();

    let mut table: EntityTable = EntityTable::new();
    for record in dir.load(&registry()).unwrap() {
        table.add(Box::new(record.into_entity())).unwrap();
    }

    let hunt = table.find_by_id("CMS/Quests/Hunt").unwrap().entity();
    let target = hunt.get::<TagCmsEntity>().unwrap().entity.clone().unwrap();
    let goblin = table.find_by_id(target.as_str()).unwrap().entity();
    assert_eq!(goblin.sprite(), Some("goblin.png"));
}

#[test]
fn moved_file_keeps_stale_id_until_auto_fill() {
    let root = ScratchDir::new("moved");
    let dir = ResourceDir::new(root.path(), "CMS");
    let id = dir.create_entity("Old", "Chest", Vec::new()).unwrap();

    let moved = dir.cms_root().join("New/Chest.json");
    std::fs::create_dir_all(moved.parent().unwrap()).unwrap();
    std::fs::rename(dir.path_for(&id), &moved).unwrap();

    let records = dir.load(&registry()).unwrap();
    assert_eq!(records[0].id, Some(EntityId::new("CMS/Old/Chest")));

    assert_eq!(dir.auto_fill_ids().unwrap(), 1);
    let records = dir.load(&registry()).unwrap();
    assert_eq!(records[0].id, Some(EntityId::new("CMS/New/Chest")));
    assert_eq!(
        dir.read_file(&moved).unwrap(),
        EntityFile {
            id: Some(EntityId::new("CMS/New/Chest")),
            components: Vec::new(),
        }
    );
}

#[test]
fn picker_narrows_by_tag_and_name() {
    let root = ScratchDir::new("picker");
    let dir = ResourceDir::new(root.path(), "CMS");
    for (name, tag) in [
        ("Goblin", "tag_sprite"),
        ("Goblet", "tag_mesh"),
        ("Orc", "tag_sprite"),
    ] {
        dir.create_entity("Things", name, vec![SerializedComponent::default_of(tag)])
            .unwrap();
    }
    let records = dir.load(&registry()).unwrap();

    let sprites = filter_by_tags(&records, &[TypeId::of::<TagSprite>()]);
    let names: Vec<&str> = sprites.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Goblin", "Orc"]);

    let gob = search(&records, "GOB");
    let names: Vec<&str> = gob.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Goblet", "Goblin"]);
}

#[test]
fn template_seeds_a_new_entity_file() {
    let root = ScratchDir::new("template-seed");
    let registry = registry();
    let store = TemplateStore::new(root.join("Templates"));

    let mut source = Entity::new("CMS/Monsters/Goblin");
    source.define::<TagSprite>().sprite = "goblin.png".to_owned();
    store.save(&registry, "Monster", &source).unwrap();

    let template = store.load("Monster").unwrap();
    let dir = ResourceDir::new(root.join("Resources"), "CMS");
    dir.create_entity("Monsters", "Troll", template.components)
        .unwrap();

    let records = dir.load(&registry).unwrap();
    let troll = records.into_iter().next().unwrap().into_entity();
    assert_eq!(troll.id_str(), "CMS/Monsters/Troll");
    assert_eq!(troll.sprite(), Some("goblin.png"));
}
