// Resume opmode
use clap::{value_parser, Arg, ArgAction, Command};
use tracklog::prelude::TrackId;

pub fn subcommand() -> Command {
    Command::new("resume")
        .long_flag("resume")
        .arg_required_else_help(true)
        .about("Resume recording an existing track.")
        .arg(
            Arg::new("id")
                .value_name("ID")
                .value_parser(value_parser!(TrackId))
                .action(ArgAction::Set)
                .required(true)
                .help("Track to resume"),
        )
}
