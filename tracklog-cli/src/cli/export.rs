// Export opmode
use clap::{value_parser, Arg, ArgAction, Command};
use std::{path::PathBuf, str::FromStr};

use tracklog::prelude::{AccuracyMode, CompassMode, FilenameFormat, TrackId, DEFAULT_HDOP_FACTOR};

pub fn subcommand() -> Command {
    Command::new("export")
        .short_flag('x')
        .long_flag("export")
        .arg_required_else_help(true)
        .about("Export tracks as GPX 1.1 files.")
        .arg(
            Arg::new("id")
                .value_name("ID")
                .value_parser(value_parser!(TrackId))
                .action(ArgAction::Append)
                .required_unless_present("all")
                .help("Track(s) to export"),
        )
        .arg(
            Arg::new("all")
                .long("all")
                .action(ArgAction::SetTrue)
                .conflicts_with("id")
                .help("Export all tracks"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FOLDER")
                .value_parser(value_parser!(PathBuf))
                .required(true)
                .help("Export folder, created when missing"),
        )
        .next_help_heading("Layout")
        .arg(
            Arg::new("per-track-dir")
                .long("per-track-dir")
                .action(ArgAction::SetTrue)
                .help("Create one folder per track"),
        )
        .arg(
            Arg::new("filename")
                .long("filename")
                .value_name("FORMAT")
                .value_parser(FilenameFormat::from_str)
                .help("Filename format: \"name\", \"name_date\" (default) or \"date\""),
        )
        .arg(
            Arg::new("media")
                .long("media")
                .action(ArgAction::SetTrue)
                .help("Copy the track media files next to the GPX file"),
        )
        .arg(
            Arg::new("no-date-update")
                .long("no-date-update")
                .action(ArgAction::SetTrue)
                .help("Do not record the export date"),
        )
        .arg(
            Arg::new("gzip")
                .long("gzip")
                .action(ArgAction::SetTrue)
                .help("Gzip compress the GPX files"),
        )
        .next_help_heading("GPX content")
        .arg(
            Arg::new("hdop")
                .long("hdop")
                .action(ArgAction::SetTrue)
                .help("Emit approximated hdop values, from the location accuracy"),
        )
        .arg(
            Arg::new("hdop-factor")
                .long("hdop-factor")
                .value_name("FACTOR")
                .value_parser(super::hdop_factor)
                .requires("hdop")
                .help(format!(
                    "Accuracy to hdop division factor. Defaults to {}",
                    DEFAULT_HDOP_FACTOR
                )),
        )
        .arg(
            Arg::new("compass")
                .long("compass")
                .value_name("MODE")
                .value_parser(CompassMode::from_str)
                .help("Compass readings: \"none\" (default), \"comment\" or \"extension\""),
        )
        .arg(
            Arg::new("accuracy")
                .long("accuracy")
                .value_name("MODE")
                .value_parser(AccuracyMode::from_str)
                .help("Waypoint accuracy: \"none\" (default), \"name\" or \"comment\""),
        )
}
