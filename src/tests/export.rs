use crate::prelude::*;
use crate::tests::toolkit::{epoch, list_directory, populated_track, test_store};
use std::{fs, sync::Arc};

fn export(store: &TrackStore, tracks: &[TrackId], config: &ExportConfig) -> Result<ExportReport, Error> {
    export_tracks(
        store,
        tracks,
        config,
        &ProgressSender::none(),
        &CancelToken::new(),
    )
}

#[test]
fn single_track() {
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store();
    let id = populated_track(&store, "Lunch walk", 3, 1);
    let config = ExportConfig::new(tmp.path());

    let report = export(&store, &[id], &config).unwrap();
    let expected = tmp.path().join("Lunch_walk_2024-05-01_10-00-00.gpx");
    assert_eq!(report.files, vec![(id, expected.clone())]);

    let content = fs::read_to_string(&expected).unwrap();
    assert_eq!(content.matches("<trkpt ").count(), 3);
    assert_eq!(content.matches("<wpt ").count(), 1);
    assert!(!content.contains("<hdop>"));
    assert_eq!(store.track(id).unwrap().export_date, Some(epoch()));

    // next export does not overwrite
    let report = export(&store, &[id], &config).unwrap();
    assert_eq!(
        report.files[0].1,
        tmp.path().join("Lunch_walk_2024-05-01_10-00-000.gpx")
    );
}

#[test]
fn directory_per_track() {
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store();
    let named = populated_track(&store, "Lunch walk", 2, 0);
    let unnamed = store.create_track();
    let config = ExportConfig::new(tmp.path().join("exports"))
        .with_directory_per_track(true)
        .with_filename_format(FilenameFormat::NameOnly)
        .with_export_date_update(false);

    export(&store, &[named, unnamed, named], &config).unwrap();
    let base = tmp.path().join("exports");
    assert_eq!(
        list_directory(&base),
        vec!["2024-05-01_10-00-00", "Lunch_walk", "Lunch_walk0"]
    );
    assert_eq!(
        list_directory(&base.join("Lunch_walk0")),
        vec!["Lunch_walk.gpx"]
    );
    assert_eq!(
        list_directory(&base.join("2024-05-01_10-00-00")),
        vec!["2024-05-01_10-00-00.gpx"]
    );
    assert_eq!(store.track(named).unwrap().export_date, None);
}

#[test]
fn non_writable_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store();
    let id = populated_track(&store, "walk", 2, 0);
    // a regular file cannot receive exports
    let base = tmp.path().join("not_a_directory");
    fs::write(&base, b"").unwrap();

    let err = export(&store, &[id], &ExportConfig::new(&base)).unwrap_err();
    match &err {
        Error::Batch(batch) => {
            assert_eq!(batch.failures.len(), 1);
            let (track, cause) = &batch.failures[0];
            assert_eq!(*track, id);
            assert!(matches!(cause, Error::DirectoryNotWritable(path) if *path == base));
        },
        e => panic!("unexpected error {:?}", e),
    }
    assert!(err.to_string().contains("not_a_directory"));
    assert_eq!(list_directory(tmp.path()), vec!["not_a_directory"]);
    assert_eq!(store.track(id).unwrap().export_date, None);
}

#[test]
fn batch_failures_are_collected() {
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store();
    let first = populated_track(&store, "first", 2, 0);
    let second = populated_track(&store, "second", 2, 0);
    let unknown = TrackId(999);

    let err = export(
        &store,
        &[first, unknown, second, TrackId(1000)],
        &ExportConfig::new(tmp.path()),
    )
    .unwrap_err();
    let Error::Batch(batch) = err else {
        panic!("expecting a batch error");
    };
    let failed = batch.failures.iter().map(|(id, _)| *id).collect::<Vec<_>>();
    assert_eq!(failed, vec![unknown, TrackId(1000)]);
    assert!(batch.to_string().starts_with("track #999: unknown track #999"));
    assert!(batch.to_string().ends_with("(and 1 other failure(s))"));

    // independent outcomes
    assert_eq!(list_directory(tmp.path()).len(), 2);
    assert!(store.track(first).unwrap().export_date.is_some());
    assert!(store.track(second).unwrap().export_date.is_some());
}

#[test]
fn media_copy() {
    let tmp = tempfile::tempdir().unwrap();
    let media_root = tmp.path().join("media");
    let store = test_store().with_media(MediaLayout::new(&media_root));
    let id = populated_track(&store, "trip", 1, 0);
    let media = store.media().unwrap().track_directory(id);
    fs::create_dir_all(&media).unwrap();
    fs::write(media.join("a.jpg"), b"a").unwrap();
    fs::write(media.join("b.3gpp"), b"b").unwrap();

    let out = tmp.path().join("out");
    let config = ExportConfig::new(&out)
        .with_media(true)
        .with_directory_per_track(true);
    export(&store, &[id], &config).unwrap();
    assert_eq!(
        list_directory(&out.join("trip")),
        vec!["a.jpg", "b.3gpp", "trip_2024-05-01_10-00-00.gpx"]
    );

    // tracks without media directory export fine
    let bare = populated_track(&store, "bare", 1, 0);
    export(&store, &[bare], &config).unwrap();
    assert_eq!(
        list_directory(&out.join("bare")),
        vec!["bare_2024-05-01_10-00-00.gpx"]
    );
}

#[test]
fn incomplete_media_copy_fails_the_track() {
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store().with_media(MediaLayout::new(tmp.path().join("media")));
    let id = populated_track(&store, "trip", 1, 0);
    let media = store.media().unwrap().track_directory(id);
    fs::create_dir_all(&media).unwrap();
    fs::write(media.join("a.jpg"), b"a").unwrap();
    fs::write(media.join("b.jpg"), b"b").unwrap();

    // a directory is in the way of one media file
    let out = tmp.path().join("out");
    fs::create_dir_all(out.join("a.jpg")).unwrap();

    let err = export(&store, &[id], &ExportConfig::new(&out).with_media(true)).unwrap_err();
    let Error::Batch(batch) = err else {
        panic!("expecting a batch error");
    };
    assert!(matches!(
        batch.failures[0].1,
        Error::MediaCopyIncomplete { track, .. } if track == id
    ));
    // neither the GPX file nor the copied media remain
    assert_eq!(list_directory(&out), vec!["a.jpg"]);
    assert_eq!(store.track(id).unwrap().export_date, None);
}

#[test]
#[cfg(unix)]
fn incomplete_media_copy_removes_track_directory() {
    use std::os::unix::fs::PermissionsExt;
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store().with_media(MediaLayout::new(tmp.path().join("media")));
    let id = populated_track(&store, "trip", 1, 0);
    let media = store.media().unwrap().track_directory(id);
    fs::create_dir_all(&media).unwrap();
    fs::write(media.join("a.jpg"), b"a").unwrap();
    let unreadable = media.join("z.jpg");
    fs::write(&unreadable, b"z").unwrap();
    fs::set_permissions(&unreadable, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&unreadable).is_ok() {
        // privileged user: permissions are not enforced
        return;
    }

    let out = tmp.path().join("out");
    let config = ExportConfig::new(&out)
        .with_media(true)
        .with_directory_per_track(true);
    let err = export(&store, &[id], &config).unwrap_err();
    let Error::Batch(batch) = err else {
        panic!("expecting a batch error");
    };
    assert!(matches!(
        &batch.failures[0].1,
        Error::MediaCopyIncomplete { track, destination }
            if *track == id && *destination == out.join("trip")
    ));
    assert!(list_directory(&out).is_empty());
    assert_eq!(store.track(id).unwrap().export_date, None);
}

#[test]
#[cfg(unix)]
fn read_only_directory() {
    use std::os::unix::fs::PermissionsExt;
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store();
    let id = populated_track(&store, "walk", 2, 0);
    let base = tmp.path().join("read_only");
    fs::create_dir(&base).unwrap();
    fs::set_permissions(&base, fs::Permissions::from_mode(0o555)).unwrap();

    // privileged user: permissions are not enforced
    let enforced = tempfile::tempfile_in(&base).is_err();
    let result = export(&store, &[id], &ExportConfig::new(&base));
    fs::set_permissions(&base, fs::Permissions::from_mode(0o755)).unwrap();
    if !enforced {
        return;
    }

    let Error::Batch(batch) = result.unwrap_err() else {
        panic!("expecting a batch error");
    };
    assert!(matches!(
        &batch.failures[0].1,
        Error::DirectoryNotWritable(path) if *path == base
    ));
    assert!(list_directory(&base).is_empty());
    assert_eq!(store.track(id).unwrap().export_date, None);
}

#[test]
fn invalid_hdop_factor() {
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store();
    let id = populated_track(&store, "walk", 2, 0);
    let out = tmp.path().join("out");
    let config = ExportConfig::new(&out)
        .with_gpx_options(GpxOptions::default().with_hdop(0.0));

    let err = export(&store, &[id], &config).unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::InvalidHdopFactor(f)) if f == 0.0
    ));
    let err = export_track(
        &store,
        id,
        &config.with_gpx_options(GpxOptions::default().with_hdop(-1.0)),
        &ProgressSender::none(),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::InvalidHdopFactor(_))));

    assert!(!out.exists());
    assert_eq!(store.track(id).unwrap().export_date, None);
}

#[test]
fn cancellation() {
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store();
    let id = populated_track(&store, "walk", 5, 0);
    let cancel = CancelToken::new();
    cancel.cancel();

    let config = ExportConfig::new(tmp.path());
    let err = export_track(&store, id, &config, &ProgressSender::none(), &cancel).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    let err = export_tracks(&store, &[id], &config, &ProgressSender::none(), &cancel).unwrap_err();
    assert!(matches!(err, Error::Cancelled));

    assert!(list_directory(tmp.path()).is_empty());
    assert_eq!(store.track(id).unwrap().export_date, None);
}

#[test]
fn background_job() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(test_store());
    let id = populated_track(&store, "walk", 3, 1);
    let config = ExportConfig::new(tmp.path())
        .with_gpx_options(GpxOptions::default().with_hdop(DEFAULT_HDOP_FACTOR));

    let job = ExportJob::new(store.clone(), &[id], config).spawn();
    let progress = job.progress.iter().collect::<Vec<_>>();
    let report = job.join().unwrap();

    let path = tmp.path().join("walk_2024-05-01_10-00-00.gpx");
    assert_eq!(report.files, vec![(id, path.clone())]);
    assert_eq!(
        progress.first(),
        Some(&Progress::TrackStarted {
            track: id,
            points: 3,
            way_points: 1
        })
    );
    assert_eq!(
        progress
            .iter()
            .filter(|p| **p == Progress::Advanced(1))
            .count(),
        4
    );
    assert_eq!(
        progress.last(),
        Some(&Progress::TrackFinished { track: id, path: path.clone() })
    );
    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains("<hdop>2.0</hdop>"));
}

#[test]
#[cfg(feature = "flate2")]
fn gzip_output() {
    let tmp = tempfile::tempdir().unwrap();
    let store = test_store();
    let id = populated_track(&store, "walk", 3, 1);
    let config = ExportConfig::new(tmp.path()).with_gzip(true);
    let report = export(&store, &[id], &config).unwrap();
    let path = &report.files[0].1;
    assert!(path.to_string_lossy().ends_with("walk_2024-05-01_10-00-00.gpx.gz"));

    let copy = store.create_track();
    let summary = import_file(
        &store,
        copy,
        path,
        ImportOptions::default(),
        &ProgressSender::none(),
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(
        summary,
        ImportSummary {
            track_points: 3,
            way_points: 1
        }
    );
}
