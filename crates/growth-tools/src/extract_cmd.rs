use std::fs;
use std::path::Path;

use growth_counthistory::{extract, write_json_file, ExtractionOptions};
use tracing::info;

use crate::cli::ExtractArgs;
use crate::{ToolError, ToolResult};

/// Load an options object from a JSON file.
pub fn load_options(path: &Path) -> ToolResult<ExtractionOptions> {
    let text = fs::read_to_string(path).map_err(|source| ToolError::OptionsFile {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|source| ToolError::OptionsJson {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(ExtractionOptions::from_json_value(&value)?)
}

/// Options from `--options`, overridden by individual flags.
pub fn resolve_options(args: &ExtractArgs) -> ToolResult<ExtractionOptions> {
    let mut options = match &args.options {
        Some(path) => load_options(path)?,
        None => ExtractionOptions::default(),
    };
    if args.time_axis.is_some() {
        options.time_axis = args.time_axis;
    }
    if args.time_origin.is_some() {
        options.time_origin = args.time_origin;
    }
    if let Some([lo, hi]) = args.energy_range_kev.as_deref() {
        options.energy_range_kev = Some([*lo, *hi]);
    }
    if let Some([start, stop]) = args.time_range.as_deref() {
        options.time_range = Some([*start, *stop]);
    }
    if args.channel.is_some() {
        options.channel = args.channel;
    }
    if args.duration_before_origin_sec.is_some() {
        options.duration_before_origin_sec = args.duration_before_origin_sec;
    }
    if args.duration_after_origin_sec.is_some() {
        options.duration_after_origin_sec = args.duration_after_origin_sec;
    }
    Ok(options)
}

/// Extract a count history from an event file and write it to
/// `args.output`. Returns the history summary.
pub fn run(args: &ExtractArgs) -> ToolResult<String> {
    let options = resolve_options(args)?;
    let eventfile = growth_eventfits::open(&args.file)?;
    let history = extract(&eventfile, args.time_bin_sec, &options)?;
    write_json_file(&args.output, &history)?;
    info!(
        output = %args.output.display(),
        nbins = history.nbins(),
        "wrote count history"
    );
    Ok(format!("{history}\n"))
}
