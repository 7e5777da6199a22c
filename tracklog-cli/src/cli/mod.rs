use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, ColorChoice, Command};
use tracklog::prelude::{Location, SensorReading, TrackId};

mod delete;
mod export;
mod import;
mod list;
mod new;
mod point;
mod resume;
mod stop;
mod waypoint;

pub struct Cli {
    /// Arguments passed by user
    pub matches: ArgMatches,
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

impl Cli {
    /// Build new command line interface
    pub fn new() -> Self {
        let cmd = Command::new("tracklog-cli")
            .author("Guillaume W. Bres <guillaume.bressaix@gmail.com>")
            .version(env!("CARGO_PKG_VERSION"))
            .about("GPS track recording, GPX export and import")
            .long_about(
                "tracklog-cli records GPS tracks (points and waypoints),
exports them as GPX 1.1 files and imports GPX or KML routes.",
            )
            .arg_required_else_help(true)
            .color(ColorChoice::Always)
            .next_help_heading("Session")
            .arg(
                Arg::new("data")
                    .short('d')
                    .long("data")
                    .value_name("FOLDER")
                    .value_parser(value_parser!(PathBuf))
                    .global(true)
                    .help("Define custom data location. See --help for more information.")
                    .long_help(
                        "The data folder holds the track store and the media files.
The $TRACKLOG_DATA variable is automatically picked up and always prefered.
Use --data,-d to define it at runtime if you prefer.
When nothing is defined, we simply use a local ./TRACKLOG folder.",
                    ),
            )
            .arg(
                Arg::new("quiet")
                    .short('q')
                    .long("quiet")
                    .action(ArgAction::SetTrue)
                    .global(true)
                    .help("Only report errors"),
            )
            .subcommand(new::subcommand())
            .subcommand(point::subcommand())
            .subcommand(waypoint::subcommand())
            .subcommand(stop::subcommand())
            .subcommand(resume::subcommand())
            .subcommand(list::subcommand())
            .subcommand(delete::subcommand())
            .subcommand(export::subcommand())
            .subcommand(import::subcommand());
        Self {
            matches: cmd.get_matches(),
        }
    }
    /// Returns true if quiet mode is activated
    pub fn quiet(&self) -> bool {
        self.matches.get_flag("quiet")
    }
    /// Returns user defined data location, if any
    pub fn data_location(&self) -> Option<&PathBuf> {
        self.matches.get_one::<PathBuf>("data")
    }
}

/// Optional --track argument, the active track being used otherwise
pub(crate) fn track_arg() -> Arg {
    Arg::new("track")
        .short('t')
        .long("track")
        .value_name("ID")
        .value_parser(value_parser!(TrackId))
        .action(ArgAction::Set)
        .help("Target track. Defaults to the active track.")
}

/// Parses a --hdop-factor value: a strictly positive number
pub(crate) fn hdop_factor(s: &str) -> Result<f64, String> {
    let factor = s
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid hdop factor \"{}\": {}", s, e))?;
    if factor.is_finite() && factor > 0.0 {
        Ok(factor)
    } else {
        Err(format!("hdop factor must be a positive number, got {}", s))
    }
}

/// Position fix arguments, shared by point and waypoint
pub(crate) fn location_args(cmd: Command) -> Command {
    cmd.next_help_heading("Location")
        .arg(
            Arg::new("lat")
                .long("lat")
                .value_name("DEGREES")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true)
                .required(true)
                .help("Latitude in decimal degrees"),
        )
        .arg(
            Arg::new("lon")
                .long("lon")
                .value_name("DEGREES")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true)
                .required(true)
                .help("Longitude in decimal degrees"),
        )
        .arg(
            Arg::new("ele")
                .long("ele")
                .value_name("METERS")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true)
                .help("Altitude in meters"),
        )
        .arg(
            Arg::new("acc")
                .long("acc")
                .value_name("METERS")
                .value_parser(value_parser!(f64))
                .help("Horizontal accuracy in meters"),
        )
        .arg(
            Arg::new("speed")
                .long("speed")
                .value_name("M/S")
                .value_parser(value_parser!(f64))
                .help("Speed in m/s"),
        )
        .arg(
            Arg::new("sat")
                .long("sat")
                .value_name("COUNT")
                .value_parser(value_parser!(u32))
                .help("Number of satellites used in the fix"),
        )
        .next_help_heading("Sensors")
        .arg(
            Arg::new("compass")
                .long("compass")
                .value_name("DEGREES")
                .value_parser(value_parser!(f64))
                .help("Compass azimuth, in [0, 360["),
        )
        .arg(
            Arg::new("compass-acc")
                .long("compass-acc")
                .value_name("CLASS")
                .value_parser(value_parser!(i32))
                .requires("compass")
                .help("Compass accuracy class"),
        )
        .arg(
            Arg::new("baro")
                .long("baro")
                .value_name("HPA")
                .value_parser(value_parser!(f64))
                .help("Atmospheric pressure in hPa"),
        )
}

/// Builds the [Location] described by [location_args]
pub(crate) fn location(matches: &ArgMatches) -> Location {
    let latitude = matches.get_one::<f64>("lat").copied().unwrap_or_default();
    let longitude = matches.get_one::<f64>("lon").copied().unwrap_or_default();
    let mut location = Location::new(latitude, longitude);
    location.elevation = matches.get_one::<f64>("ele").copied();
    location.accuracy = matches.get_one::<f64>("acc").copied();
    location.speed = matches.get_one::<f64>("speed").copied();
    location.satellites = matches.get_one::<u32>("sat").copied();
    location
}

/// Builds the [SensorReading] described by [location_args]
pub(crate) fn sensors(matches: &ArgMatches) -> SensorReading {
    SensorReading {
        compass_heading: matches.get_one::<f64>("compass").copied(),
        compass_accuracy: matches.get_one::<i32>("compass-acc").copied(),
        pressure: matches.get_one::<f64>("baro").copied(),
    }
}

#[cfg(test)]
mod test {
    use super::hdop_factor;
    #[test]
    fn hdop_factor_parsing() {
        assert_eq!(hdop_factor("4"), Ok(4.0));
        assert_eq!(hdop_factor(" 2.5"), Ok(2.5));
        for value in ["0", "-1.0", "inf", "NaN", "four"] {
            assert!(hdop_factor(value).is_err(), "failed for \"{}\"", value);
        }
    }
}
