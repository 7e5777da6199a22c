// Stop tracking opmode
use clap::Command;

pub fn subcommand() -> Command {
    Command::new("stop")
        .long_flag("stop")
        .about("Stop recording. The track remains available for export.")
        .arg(super::track_arg())
}
