mod declination;
mod error;
mod output;
mod poi;

use anyhow::Context;
use clap::{builder::PathBufValueParser, value_parser, Arg, ArgAction, Command};
use declination::{DeclinationProvider, FixedDeclination, NoaaDeclination, NOAA_ENDPOINT};
use error::Error;
use itertools::Itertools;
use poi::{NamedPoint, POI_TABLE};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = parse_cmdline();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "transect_poi=debug"
    } else {
        "transect_poi=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: CmdlineArgs) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    let center = match &args.center {
        Some(center) => parse_center(center),
        None => prompt(&mut input, &mut stdout, "Center Point [lat, long]:")
            .and_then(|answer| parse_center(&answer)),
    }
    .context("failed to get the center point")?;

    let mode = match args.mode {
        Some(mode) => mode,
        None => {
            let answer = prompt(&mut input, &mut stdout, "GPX output? [y/n]")
                .context("failed to get the output mode")?;
            OutputMode::from_answer(&answer)
        }
    };

    let provider: Box<dyn DeclinationProvider> = match args.declination {
        Some(declination) => {
            info!("using fixed declination {declination}°");
            Box::new(FixedDeclination(declination))
        }
        None => Box::new(NoaaDeclination::new(args.endpoint, args.api_key)),
    };
    let month = args.month.unwrap_or_else(declination::current_month);

    let results = poi_results(provider.as_ref(), center, month)?;

    match mode {
        OutputMode::Gpx => output::write_gpx_file(&args.output, &results).with_context(|| {
            format!("failed to write GPX file '{}'", args.output.display())
        })?,
        OutputMode::Text => {
            writeln!(stdout)?;
            writeln!(stdout, "{}", output::format_text(&results))?;
        }
    }

    Ok(())
}

/// Looks up the declination once for the center and projects every POI with it.
fn poi_results(
    provider: &dyn DeclinationProvider,
    center: geo::Point,
    month: u32,
) -> anyhow::Result<Vec<NamedPoint>> {
    let declination = provider.declination(center, month).with_context(|| {
        format!(
            "failed to get the declination at ({}, {})",
            center.y(),
            center.x()
        )
    })?;
    debug!("month {month}: declination = {declination}°");

    let results = poi::project(center, declination, POI_TABLE)
        .context("failed to project the points of interest")?;
    info!("projected {} points of interest", results.len());

    Ok(results)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum OutputMode {
    Text,
    Gpx,
}

impl OutputMode {
    fn from_answer(answer: &str) -> Self {
        if answer.to_lowercase().contains('y') {
            OutputMode::Gpx
        } else {
            OutputMode::Text
        }
    }
}

struct CmdlineArgs {
    center: Option<String>,
    mode: Option<OutputMode>,
    output: PathBuf,
    declination: Option<f64>,
    month: Option<u32>,
    endpoint: String,
    api_key: Option<String>,
    verbose: bool,
}

fn build_cmdline() -> Command {
    Command::new("transect_poi")
        .version("0.1.0")
        .about("Lays out transect start/end points around a center, corrected for magnetic declination, as text or a GPX waypoint file.")
        .arg(
            Arg::new("center")
                .long("center")
                .value_name("LAT, LON")
                .allow_hyphen_values(true)
                .help("Center point in decimal degrees. Prompted for when omitted.")
        )
        .arg(
            Arg::new("gpx")
                .long("gpx")
                .action(ArgAction::SetTrue)
                .conflicts_with("text")
                .help("Write a GPX waypoint file instead of asking.")
        )
        .arg(
            Arg::new("text")
                .long("text")
                .action(ArgAction::SetTrue)
                .help("Print the points as text instead of asking.")
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("PATH")
                .value_parser(PathBufValueParser::new())
                .default_value(output::DEFAULT_GPX_PATH)
                .help("Where to write the GPX file.")
        )
        .arg(
            Arg::new("declination")
                .long("declination")
                .value_name("DEGREES")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true)
                .help("Use this declination (positive east) instead of querying NOAA.")
        )
        .arg(
            Arg::new("month")
                .long("month")
                .value_name("1-12")
                .value_parser(value_parser!(u32).range(1..=12))
                .help("Month sent to the declination service. Defaults to the current month.")
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .value_name("URL")
                .default_value(NOAA_ENDPOINT)
                .help("Declination calculator URL.")
        )
        .arg(
            Arg::new("api_key")
                .long("api-key")
                .value_name("KEY")
                .help("API key for the declination calculator.")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging.")
        )
}

fn parse_cmdline() -> CmdlineArgs {
    args_from_matches(&build_cmdline().get_matches())
}

fn args_from_matches(m: &clap::ArgMatches) -> CmdlineArgs {
    let mode = if m.get_flag("gpx") {
        Some(OutputMode::Gpx)
    } else if m.get_flag("text") {
        Some(OutputMode::Text)
    } else {
        None
    };

    CmdlineArgs {
        center: m.get_one::<String>("center").cloned(),
        mode,
        output: m
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(output::DEFAULT_GPX_PATH)),
        declination: m.get_one::<f64>("declination").copied(),
        month: m.get_one::<u32>("month").copied(),
        endpoint: m
            .get_one::<String>("endpoint")
            .cloned()
            .unwrap_or_else(|| NOAA_ENDPOINT.to_string()),
        api_key: m.get_one::<String>("api_key").cloned(),
        verbose: m.get_flag("verbose"),
    }
}

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> error::Result<String> {
    write!(output, "{question}")
        .and_then(|_| output.flush())
        .map_err(|e| Error::input(format!("failed to show prompt: {e}")))?;

    let mut answer = String::new();
    let read = input
        .read_line(&mut answer)
        .map_err(|e| Error::input(format!("failed to read answer: {e}")))?;
    if read == 0 {
        return Err(Error::input("no answer given"));
    }

    Ok(answer.trim().to_string())
}

/// Parses `"lat, lon"` in decimal degrees. Spaces are ignored.
fn parse_center(text: &str) -> error::Result<geo::Point> {
    let Some((lat, lon)) = text.split(',').map(str::trim).collect_tuple() else {
        return Err(Error::input(format!(
            "expected 'lat, lon' but got '{}'",
            text.trim()
        )));
    };

    let lat = lat
        .parse::<f64>()
        .map_err(|_| Error::input(format!("invalid latitude '{lat}'")))?;
    let lon = lon
        .parse::<f64>()
        .map_err(|_| Error::input(format!("invalid longitude '{lon}'")))?;

    Ok(geo::Point::new(lon, lat))
}
