use inkflow_core::{ChapterPatch, NewChapter, NewScene, ProjectDraft, ScenePatch, Store};

fn chapter(store: &Store, title: &str) -> inkflow_core::Chapter {
    store
        .add_chapter(NewChapter {
            title: title.to_string(),
            ..NewChapter::default()
        })
        .unwrap()
}

fn scene(store: &Store, chapter_id: &str, title: &str) -> inkflow_core::Scene {
    store
        .add_scene(NewScene {
            chapter_id: chapter_id.to_string(),
            title: title.to_string(),
            ..NewScene::default()
        })
        .unwrap()
}

#[test]
fn chapter_order_defaults_to_count_in_project() {
    let store = Store::open_in_memory().unwrap();
    let first = chapter(&store, "One");
    let second = chapter(&store, "Two");
    assert_eq!(first.order, 0);
    assert_eq!(second.order, 1);

    store.delete_chapter(&first.id).unwrap();
    let third = chapter(&store, "Three");
    assert_eq!(third.order, 1);

    let chapters = store.list_chapters(None).unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].id, second.id);
    assert_eq!(chapters[1].id, third.id);
}

#[test]
fn explicit_order_is_kept() {
    let store = Store::open_in_memory().unwrap();
    let late = store
        .add_chapter(NewChapter {
            title: "Epilogue".to_string(),
            order: Some(10),
            ..NewChapter::default()
        })
        .unwrap();
    let early = chapter(&store, "Prologue");

    assert_eq!(late.order, 10);
    assert_eq!(early.order, 1);
    let titles: Vec<_> = store
        .list_chapters(None)
        .unwrap()
        .into_iter()
        .map(|chapter| chapter.title)
        .collect();
    assert_eq!(titles, vec!["Prologue", "Epilogue"]);
}

#[test]
fn deleting_a_chapter_removes_its_scenes() {
    let store = Store::open_in_memory().unwrap();
    let doomed = chapter(&store, "Doomed");
    let kept = chapter(&store, "Kept");
    let gone = scene(&store, &doomed.id, "Gone");
    scene(&store, &doomed.id, "Also gone");
    let stays = scene(&store, &kept.id, "Stays");

    store.delete_chapter(&doomed.id).unwrap();

    assert!(store.get_scene(&gone.id).unwrap().is_none());
    assert!(store.list_scenes_by_chapter(&doomed.id).unwrap().is_empty());
    let remaining = store.list_scenes(None).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, stays.id);

    let in_project = store.list_scenes(Some("story")).unwrap();
    assert_eq!(in_project.len(), 1);
    assert_eq!(in_project[0].id, stays.id);
}

#[test]
fn scene_order_defaults_to_count_in_chapter() {
    let store = Store::open_in_memory().unwrap();
    let one = chapter(&store, "One");
    let a = scene(&store, &one.id, "A");
    let b = scene(&store, &one.id, "B");
    assert_eq!((a.order, b.order), (0, 1));

    store.delete_scene(&a.id).unwrap();
    let c = scene(&store, &one.id, "C");
    assert_eq!(c.order, 1);
}

#[test]
fn list_scenes_filters_by_project_through_chapters() {
    let store = Store::open_in_memory().unwrap();
    let other = store.create_project(&ProjectDraft::default()).unwrap();

    let mine = chapter(&store, "Mine");
    let theirs = store
        .add_chapter(NewChapter {
            project_id: Some(other.id.clone()),
            title: "Theirs".to_string(),
            ..NewChapter::default()
        })
        .unwrap();
    scene(&store, &mine.id, "Here");
    scene(&store, &theirs.id, "There");

    let here = store.list_scenes(Some("story")).unwrap();
    assert_eq!(here.len(), 1);
    assert_eq!(here[0].title, "Here");
    assert_eq!(store.list_scenes(None).unwrap().len(), 2);

    let empty = store.create_project(&ProjectDraft::default()).unwrap();
    assert!(store.list_scenes(Some(&empty.id)).unwrap().is_empty());
}

#[test]
fn list_scenes_sorts_by_chapter_then_order() {
    let store = Store::open_in_memory().unwrap();
    let b_chapter = store
        .add_chapter(NewChapter {
            title: "B".to_string(),
            ..NewChapter::default()
        })
        .unwrap();
    let a_chapter = chapter(&store, "A");
    store
        .add_scene(NewScene {
            chapter_id: b_chapter.id.clone(),
            title: "b1".to_string(),
            order: Some(1),
            ..NewScene::default()
        })
        .unwrap();
    store
        .add_scene(NewScene {
            chapter_id: b_chapter.id.clone(),
            title: "b0".to_string(),
            order: Some(0),
            ..NewScene::default()
        })
        .unwrap();
    scene(&store, &a_chapter.id, "a0");

    let scenes = store.list_scenes(None).unwrap();
    let mut expected_chapters = vec![a_chapter.id.clone(), b_chapter.id.clone()];
    expected_chapters.sort();
    let chapters: Vec<_> = scenes.iter().map(|scene| scene.chapter_id.clone()).collect();
    assert_eq!(chapters.first(), expected_chapters.first());
    for pair in scenes.windows(2) {
        assert!(
            (pair[0].chapter_id.as_str(), pair[0].order)
                <= (pair[1].chapter_id.as_str(), pair[1].order)
        );
    }

    let in_b: Vec<_> = store
        .list_scenes_by_chapter(&b_chapter.id)
        .unwrap()
        .into_iter()
        .map(|scene| scene.title)
        .collect();
    assert_eq!(in_b, vec!["b0", "b1"]);
}

#[test]
fn updates_merge_and_report_missing_ids() {
    let store = Store::open_in_memory().unwrap();
    let one = chapter(&store, "One");
    let draft = scene(&store, &one.id, "Draft");

    let renamed = store
        .update_chapter(
            &one.id,
            &ChapterPatch {
                title: Some("Opening".to_string()),
                ..ChapterPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(renamed.title, "Opening");
    assert_eq!(renamed.order, 0);
    assert!(renamed.updated_at.is_some());

    let written = store
        .update_scene(
            &draft.id,
            &ScenePatch {
                content: Some("Rain on the glass.".to_string()),
                ..ScenePatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(written.title, "Draft");
    assert_eq!(written.content, "Rain on the glass.");

    assert!(store
        .update_chapter("missing", &ChapterPatch::default())
        .unwrap()
        .is_none());
    assert!(store
        .update_scene("missing", &ScenePatch::default())
        .unwrap()
        .is_none());
}

#[test]
fn outline_groups_scenes_under_ordered_chapters() {
    let store = Store::open_in_memory().unwrap();
    let one = chapter(&store, "One");
    let two = chapter(&store, "Two");
    scene(&store, &two.id, "Two-A");
    scene(&store, &one.id, "One-A");
    scene(&store, &one.id, "One-B");

    let outline = store.load_outline(None).unwrap();
    assert_eq!(outline.scene_count(), 3);
    let shape: Vec<(String, Vec<String>)> = outline
        .chapters
        .iter()
        .map(|entry| {
            (
                entry.chapter.title.clone(),
                entry.scenes.iter().map(|scene| scene.title.clone()).collect(),
            )
        })
        .collect();
    assert_eq!(
        shape,
        vec![
            ("One".to_string(), vec!["One-A".to_string(), "One-B".to_string()]),
            ("Two".to_string(), vec!["Two-A".to_string()]),
        ]
    );
}
