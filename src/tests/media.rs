use crate::prelude::*;
use crate::tests::toolkit::{epoch, list_directory, test_store};
use std::fs;

fn store_with_media() -> (tempfile::TempDir, TrackStore, TrackId) {
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store().with_media(MediaLayout::new(tmp.path()));
    let id = store.create_track();
    let dir = store.media().unwrap().track_directory(id);
    fs::create_dir_all(dir).unwrap();
    (tmp, store, id)
}

#[test]
fn linked_media_is_renamed() {
    let (_tmp, store, id) = store_with_media();
    let dir = store.media().unwrap().track_directory(id);
    fs::write(dir.join("IMG_0001.jpg"), b"first").unwrap();
    fs::write(dir.join("IMG_0002.jpg"), b"second").unwrap();
    fs::write(dir.join("memo.3gpp"), b"voice").unwrap();

    let location = Location::new(45.0, 6.0).with_time(epoch());
    for link in ["IMG_0001.jpg", "IMG_0002.jpg", "memo.3gpp"] {
        store
            .insert_way_point(
                id,
                Some(&location),
                WayPointInput::named("media").with_link(link),
                SensorReading::default(),
            )
            .unwrap();
    }

    let links = store
        .way_points_of(id)
        .unwrap()
        .into_iter()
        .filter_map(|wpt| wpt.link)
        .collect::<Vec<_>>();
    assert_eq!(
        links,
        vec![
            "2024-05-01_10-00-00.jpg",
            "2024-05-01_10-00-000.jpg",
            "2024-05-01_10-00-00.3gpp",
        ]
    );
    assert_eq!(list_directory(&dir), {
        let mut expected = links.clone();
        expected.sort();
        expected
    });
    assert_eq!(
        fs::read(dir.join("2024-05-01_10-00-000.jpg")).unwrap(),
        b"second"
    );
}

#[test]
fn missing_media_keeps_link() {
    let (_tmp, store, id) = store_with_media();
    store
        .insert_way_point(
            id,
            Some(&Location::new(45.0, 6.0)),
            WayPointInput::named("ghost").with_link("nowhere.jpg"),
            SensorReading::default(),
        )
        .unwrap();
    let wpt = &store.way_points_of(id).unwrap()[0];
    assert_eq!(wpt.link.as_deref(), Some("nowhere.jpg"));
}

#[test]
fn media_naming_follows_layout() {
    let (_tmp, store, id) = store_with_media();
    let media = store.media().unwrap();
    let name = media.media_name(id, MediaKind::VoiceRecord, &epoch());
    assert_eq!(name, "2024-05-01_10-00-00.3gpp");
    assert!(media.track_directory(id).ends_with(format!("track{}", id)));
}
