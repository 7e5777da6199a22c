// List opmode
use clap::Command;

pub fn subcommand() -> Command {
    Command::new("list")
        .short_flag('l')
        .long_flag("list")
        .about("List all tracks, most recent first.")
}
