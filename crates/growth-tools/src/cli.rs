use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use growth_counthistory::TimeAxis;

#[derive(Parser, Debug)]
#[command(name = "growth")]
#[command(about = "Inspect GROWTH event files and extract count histories", long_about = None)]
pub struct Cli {
    /// Enable debug logging (or set RUST_LOG)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump header attributes of an event file
    Show {
        /// Event file (.fits or .fits.gz)
        file: PathBuf,
    },

    /// Bin an event file into a count history and save it as JSON
    Extract(ExtractArgs),

    /// Print the summary of a saved count history
    Summary {
        /// Count history JSON file
        file: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    /// Event file (.fits or .fits.gz)
    pub file: PathBuf,
    /// Bin width in seconds
    pub time_bin_sec: f64,
    /// Output count history JSON file
    pub output: PathBuf,

    /// JSON object with extraction options; flags below override its values
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,
    /// absolute or relative
    #[arg(long)]
    pub time_axis: Option<TimeAxis>,
    /// Reference time (unix seconds); defaults to the first selected event
    #[arg(long, allow_negative_numbers = true)]
    pub time_origin: Option<f64>,
    /// Energy window in keV, lower bound inclusive
    #[arg(long, num_args = 2, value_names = ["LO", "HI"])]
    pub energy_range_kev: Option<Vec<f64>>,
    /// Accepted but not applied as a filter
    #[arg(long, num_args = 2, value_names = ["START", "STOP"])]
    pub time_range: Option<Vec<f64>>,
    /// Keep only events from this channel
    #[arg(long, allow_negative_numbers = true)]
    pub channel: Option<i64>,
    /// Seconds to include before the origin
    #[arg(long, allow_negative_numbers = true)]
    pub duration_before_origin_sec: Option<f64>,
    /// Seconds to include after the origin (0 runs to the last event)
    #[arg(long, allow_negative_numbers = true)]
    pub duration_after_origin_sec: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_extract_flags() {
        let cli = Cli::try_parse_from([
            "growth",
            "extract",
            "run.fits.gz",
            "15",
            "out.json",
            "--time-axis",
            "relative",
            "--energy-range-kev",
            "3000",
            "100000",
            "--channel",
            "0",
            "--duration-before-origin-sec",
            "40",
        ])
        .unwrap();
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.file, PathBuf::from("run.fits.gz"));
        assert_eq!(args.time_bin_sec, 15.0);
        assert_eq!(args.time_axis, Some(TimeAxis::Relative));
        assert_eq!(args.energy_range_kev, Some(vec![3000.0, 100000.0]));
        assert_eq!(args.channel, Some(0));
        assert_eq!(args.duration_before_origin_sec, Some(40.0));
        assert!(args.time_origin.is_none());
        assert!(args.options.is_none());
    }

    #[test]
    fn negative_durations_reach_the_extractor() {
        let cli = Cli::try_parse_from([
            "growth",
            "extract",
            "a.fits",
            "1",
            "o.json",
            "--duration-before-origin-sec",
            "-1",
            "--duration-after-origin-sec",
            "-2.5",
        ])
        .unwrap();
        let Commands::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.duration_before_origin_sec, Some(-1.0));
        assert_eq!(args.duration_after_origin_sec, Some(-2.5));
    }

    #[test]
    fn rejects_unknown_axis() {
        let err = Cli::try_parse_from([
            "growth",
            "extract",
            "a.fits",
            "1",
            "o.json",
            "--time-axis",
            "sideways",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn energy_range_needs_two_values() {
        assert!(Cli::try_parse_from([
            "growth",
            "extract",
            "a.fits",
            "1",
            "o.json",
            "--energy-range-kev",
            "3000",
        ])
        .is_err());
    }

    #[test]
    fn parses_show_and_summary() {
        let cli = Cli::try_parse_from(["growth", "--verbose", "show", "a.fits"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Show { ref file } if file == &PathBuf::from("a.fits")));

        let cli = Cli::try_parse_from(["growth", "summary", "h.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Summary { .. }));
    }
}
