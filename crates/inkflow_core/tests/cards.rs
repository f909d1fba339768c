use inkflow_core::{
    BuiltInIdeaType, CharacterPatch, IdeaPatch, IdeaType, NewCharacter, NewIdea, ProjectDraft,
    Store,
};

#[test]
fn ideas_are_scoped_and_listed_newest_first() {
    let store = Store::open_in_memory().unwrap();
    let other = store.create_project(&ProjectDraft::default()).unwrap();

    let first = store
        .add_idea(NewIdea {
            title: "A map that lies".to_string(),
            ..NewIdea::default()
        })
        .unwrap();
    let second = store
        .add_idea(NewIdea {
            kind: IdeaType::from(BuiltInIdeaType::Mystery),
            title: "Who drew it".to_string(),
            ..NewIdea::default()
        })
        .unwrap();
    store
        .add_idea(NewIdea {
            project_id: Some(other.id.clone()),
            title: "Elsewhere".to_string(),
            ..NewIdea::default()
        })
        .unwrap();

    assert_eq!(first.project_id, "story");
    assert_eq!(first.kind.as_str(), "plot");
    assert_eq!(first.updated_at, None);

    let ids: Vec<_> = store
        .list_ideas(None)
        .unwrap()
        .into_iter()
        .map(|idea| idea.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(store.list_ideas(Some(&other.id)).unwrap().len(), 1);
    assert!(store.list_ideas(Some("nobody")).unwrap().is_empty());
}

#[test]
fn update_idea_merges_present_fields() {
    let store = Store::open_in_memory().unwrap();
    let idea = store
        .add_idea(NewIdea {
            title: "Draft".to_string(),
            body: "Keep me".to_string(),
            ..NewIdea::default()
        })
        .unwrap();

    let updated = store
        .update_idea(
            &idea.id,
            &IdeaPatch {
                title: Some("Final".to_string()),
                kind: Some(IdeaType::parse("Heist beat")),
                ..IdeaPatch::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "Final");
    assert_eq!(updated.body, "Keep me");
    assert_eq!(updated.kind, IdeaType::Custom("Heist beat".to_string()));
    assert_eq!(updated.created_at, idea.created_at);
    assert!(updated.updated_at.is_some());

    assert!(store
        .update_idea("missing", &IdeaPatch::default())
        .unwrap()
        .is_none());
}

#[test]
fn delete_idea_removes_only_that_row() {
    let store = Store::open_in_memory().unwrap();
    let keep = store.add_idea(NewIdea::default()).unwrap();
    let gone = store.add_idea(NewIdea::default()).unwrap();

    store.delete_idea(&gone.id).unwrap();
    store.delete_idea("missing").unwrap();

    let ideas = store.list_ideas(None).unwrap();
    assert_eq!(ideas.len(), 1);
    assert_eq!(ideas[0].id, keep.id);
}

#[test]
fn characters_are_listed_in_creation_order() {
    let store = Store::open_in_memory().unwrap();
    let ilse = store
        .add_character(NewCharacter {
            name: "Ilse".to_string(),
            one_sentence: "Maps the city.".to_string(),
            ..NewCharacter::default()
        })
        .unwrap();
    let bram = store
        .add_character(NewCharacter {
            name: "Bram".to_string(),
            ..NewCharacter::default()
        })
        .unwrap();

    let names: Vec<_> = store
        .list_characters(None)
        .unwrap()
        .into_iter()
        .map(|character| character.name)
        .collect();
    assert_eq!(names, vec!["Ilse", "Bram"]);

    let moved = store
        .update_character(
            &bram.id,
            &CharacterPatch {
                project_id: Some("other".to_string()),
                ..CharacterPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(moved.project_id, "other");
    assert_eq!(moved.name, "Bram");

    store.delete_character(&ilse.id).unwrap();
    assert!(store.list_characters(None).unwrap().is_empty());
    assert_eq!(store.list_characters(Some("other")).unwrap().len(), 1);
}

#[test]
fn custom_idea_types_reject_blank_built_in_and_duplicate_names() {
    let store = Store::open_in_memory().unwrap();

    let omen = store.add_custom_idea_type("  Bad   omen ").unwrap().unwrap();
    assert_eq!(omen.name, "Bad omen");

    assert!(store.add_custom_idea_type("   ").unwrap().is_none());
    assert!(store.add_custom_idea_type("Plot").unwrap().is_none());
    assert!(store.add_custom_idea_type("bad OMEN").unwrap().is_none());

    let ritual = store.add_custom_idea_type("Ritual").unwrap().unwrap();
    let names: Vec<_> = store
        .list_custom_idea_types()
        .unwrap()
        .into_iter()
        .map(|custom| custom.name)
        .collect();
    assert_eq!(names, vec!["Bad omen".to_string(), ritual.name]);
}

#[test]
fn custom_idea_type_names_fold_non_ascii_case() {
    let store = Store::open_in_memory().unwrap();

    assert!(store.add_custom_idea_type("Émigré").unwrap().is_some());
    assert!(store.add_custom_idea_type("émigré").unwrap().is_none());
    assert!(store.add_custom_idea_type("ÉMIGRÉ").unwrap().is_none());
    assert_eq!(store.list_custom_idea_types().unwrap().len(), 1);
}
