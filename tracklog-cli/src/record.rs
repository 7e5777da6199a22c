//! Track recording and management
use clap::ArgMatches;
use itertools::Itertools;

use tracklog::prelude::{TrackId, TrackStore, WayPointInput};

use crate::{cli, Error};

/// Resolves the --track argument, or the active track
fn target_track(store: &TrackStore, matches: &ArgMatches) -> Result<TrackId, Error> {
    match matches.get_one::<TrackId>("track") {
        Some(id) => Ok(*id),
        None => store.active_track().ok_or(Error::NoActiveTrack),
    }
}

pub fn new_track(store: &TrackStore, matches: &ArgMatches) -> Result<(), Error> {
    let id = store.create_track();
    if let Some(name) = matches.get_one::<String>("name") {
        store.rename(id, name)?;
    }
    if let Some(description) = matches.get_one::<String>("description") {
        store.describe(id, description)?;
    }
    if let Some(tags) = matches.get_many::<String>("tag") {
        let tags = tags.map(|tag| tag.as_str()).collect::<Vec<_>>();
        store.set_tags(id, &tags)?;
    }
    info!("track #{} started", id);
    Ok(())
}

pub fn point(store: &TrackStore, matches: &ArgMatches) -> Result<(), Error> {
    let track = target_track(store, matches)?;
    let location = cli::location(matches);
    store.insert_track_point(track, Some(&location), cli::sensors(matches))?;
    debug!("track #{}: new point {:?}", track, location);
    Ok(())
}

pub fn way_point(store: &TrackStore, matches: &ArgMatches) -> Result<(), Error> {
    let track = target_track(store, matches)?;
    let name = matches
        .get_one::<String>("name")
        .map(|name| name.as_str())
        .unwrap_or_default();

    let mut input = WayPointInput::named(name);
    if let Some(link) = matches.get_one::<String>("link") {
        input = input.with_link(link);
    }
    if let Some(uuid) = matches.get_one::<String>("uuid") {
        input = input.with_uuid(uuid);
    }

    let location = cli::location(matches);
    store.insert_way_point(track, Some(&location), input, cli::sensors(matches))?;
    info!("track #{}: new waypoint \"{}\"", track, name);
    Ok(())
}

pub fn stop(store: &TrackStore, matches: &ArgMatches) -> Result<(), Error> {
    let track = target_track(store, matches)?;
    store.stop_tracking(track)?;
    info!("track #{} stopped", track);
    Ok(())
}

pub fn resume(store: &TrackStore, matches: &ArgMatches) -> Result<(), Error> {
    if let Some(track) = matches.get_one::<TrackId>("id") {
        store.set_active(*track)?;
        info!("track #{} resumed", track);
    }
    Ok(())
}

pub fn delete(store: &TrackStore, matches: &ArgMatches) -> Result<(), Error> {
    let tracks = matches
        .get_many::<TrackId>("id")
        .map(|ids| ids.copied().collect::<Vec<_>>())
        .unwrap_or_default();
    for track in tracks {
        store.delete_track(track)?;
        info!("track #{} deleted", track);
    }
    Ok(())
}

/// Prints one line per track, most recent first
pub fn list(store: &TrackStore) {
    for track in store.tracks().into_iter().rev() {
        let (points, way_points) = store.point_counts(track.id).unwrap_or_default();
        let exported = match track.export_date {
            Some(date) => format!("exported {}", date.format("%Y-%m-%d %H:%M:%S")),
            None => "never exported".to_string(),
        };
        println!(
            "{}{:>4} | {:<24} | {} | {:>6} points | {:>3} waypoints | {} | {}",
            if track.active { '*' } else { ' ' },
            track.id,
            track.name,
            track.start_date.format("%Y-%m-%d %H:%M:%S"),
            points,
            way_points,
            track.keywords().join(", "),
            exported,
        );
    }
}
