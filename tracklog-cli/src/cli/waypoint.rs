// Waypoint opmode
use clap::{Arg, ArgAction, Command};

pub fn subcommand() -> Command {
    let cmd = Command::new("waypoint")
        .short_flag('w')
        .long_flag("waypoint")
        .arg_required_else_help(true)
        .about("Record a new waypoint, optionally linked to a media file.")
        .arg(super::track_arg())
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("NAME")
                .action(ArgAction::Set)
                .required(true)
                .help("Waypoint name"),
        )
        .arg(
            Arg::new("link")
                .long("link")
                .value_name("FILENAME")
                .action(ArgAction::Set)
                .help("Media file, located in the track media folder.
It is renamed after the waypoint timestamp."),
        )
        .arg(
            Arg::new("uuid")
                .long("uuid")
                .value_name("UUID")
                .action(ArgAction::Set)
                .help("Unique identifier, used to update or delete this waypoint later on."),
        );
    super::location_args(cmd)
}
