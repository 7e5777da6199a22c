// Delete opmode
use clap::{value_parser, Arg, ArgAction, Command};
use tracklog::prelude::TrackId;

pub fn subcommand() -> Command {
    Command::new("delete")
        .long_flag("delete")
        .arg_required_else_help(true)
        .about("Delete tracks, their points and their media files.")
        .arg(
            Arg::new("id")
                .value_name("ID")
                .value_parser(value_parser!(TrackId))
                .action(ArgAction::Append)
                .required(true)
                .help("Track(s) to delete"),
        )
}
