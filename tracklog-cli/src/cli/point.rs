// Track point opmode
use clap::Command;

pub fn subcommand() -> Command {
    let cmd = Command::new("point")
        .short_flag('p')
        .long_flag("point")
        .arg_required_else_help(true)
        .about("Record a new track point.")
        .arg(super::track_arg());
    super::location_args(cmd)
}
