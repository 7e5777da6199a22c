// New track opmode
use clap::{Arg, ArgAction, Command};

pub fn subcommand() -> Command {
    Command::new("new")
        .short_flag('n')
        .long_flag("new")
        .about("Start a new track. The previously active track is stopped.")
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("NAME")
                .action(ArgAction::Set)
                .help("Track name"),
        )
        .arg(
            Arg::new("description")
                .long("description")
                .value_name("TEXT")
                .action(ArgAction::Set)
                .help("Track description"),
        )
        .arg(
            Arg::new("tag")
                .long("tag")
                .value_name("TAG")
                .action(ArgAction::Append)
                .help("Track tag. Use as many as you need."),
        )
}
