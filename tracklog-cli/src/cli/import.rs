// Import opmode
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

use tracklog::prelude::TrackId;

pub fn subcommand() -> Command {
    Command::new("import")
        .short_flag('i')
        .long_flag("import")
        .arg_required_else_help(true)
        .about("Import a GPX (or KML) file. Gzip compressed files are supported.")
        .arg(
            Arg::new("file")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILEPATH")
                .action(ArgAction::Set)
                .required(true)
                .help("File to import"),
        )
        .arg(
            Arg::new("track")
                .short('t')
                .long("track")
                .value_name("ID")
                .value_parser(value_parser!(TrackId))
                .action(ArgAction::Set)
                .help("Append to this track. A new (inactive) track is created otherwise."),
        )
        .arg(
            Arg::new("hdop-factor")
                .long("hdop-factor")
                .value_name("FACTOR")
                .value_parser(super::hdop_factor)
                .conflicts_with("no-hdop")
                .help("Factor used to recover the accuracy from hdop values"),
        )
        .arg(
            Arg::new("no-hdop")
                .long("no-hdop")
                .action(ArgAction::SetTrue)
                .help("Do not recover accuracy from hdop values"),
        )
}
