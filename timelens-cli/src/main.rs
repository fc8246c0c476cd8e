//! Timelens CLI - find the historical photograph taken where you stand.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;
use utils::OutputFormat;

const AFTER_HELP: &str = "\
Exit codes:
  0   Match found
  1   Valid request, no match
  64  Invalid arguments (coordinates, radius)
  65  Malformed catalog or landmark data
  66  Input file not found
  69  Vision provider unavailable";

#[derive(Parser)]
#[command(name = "timelens")]
#[command(author, version, about = "Match street photos against historical photographs", long_about = None)]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Suppress human-readable output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the best historical photo for a location
    #[command(allow_negative_numbers = true)]
    Match {
        /// Device latitude in decimal degrees
        #[arg(long, requires = "lon")]
        lat: Option<f64>,

        /// Device longitude in decimal degrees
        #[arg(long, requires = "lat")]
        lon: Option<f64>,

        /// Reported device GPS accuracy in meters (fixes of 100 m or worse are not trusted)
        #[arg(long, default_value_t = 10.0)]
        accuracy: f64,

        /// Compass heading the camera faced, degrees from North
        #[arg(long)]
        heading: Option<f64>,

        /// EXIF latitude, overriding GPS tags embedded in --image
        #[arg(long, requires = "exif_lon")]
        exif_lat: Option<f64>,

        /// Longitude read from the photo's EXIF block
        #[arg(long, requires = "exif_lat")]
        exif_lon: Option<f64>,

        /// Photo to analyse; its EXIF GPS tags are used when present
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,

        /// Catalog JSON file (defaults to the bundled Chicago catalog)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Landmark table JSON file (defaults to the bundled Chicago table)
        #[arg(long, value_name = "FILE")]
        landmarks: Option<PathBuf>,

        /// Use the deterministic mock vision provider instead of OpenAI
        #[arg(long)]
        mock_vision: bool,

        /// Search radius in kilometres
        #[arg(long)]
        radius: Option<f64>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List catalog entries near a location
    #[command(allow_negative_numbers = true)]
    Near {
        /// Latitude in decimal degrees
        #[arg(long)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long)]
        lon: f64,

        /// Search radius in kilometres
        #[arg(long, default_value_t = 1.0)]
        radius: f64,

        /// Catalog JSON file (defaults to the bundled Chicago catalog)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Great-circle distance between two points
    #[command(allow_negative_numbers = true)]
    Distance {
        #[arg(value_name = "LAT1")]
        lat1: f64,
        #[arg(value_name = "LON1")]
        lon1: f64,
        #[arg(value_name = "LAT2")]
        lat2: f64,
        #[arg(value_name = "LON2")]
        lon2: f64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_directive = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "timelens=info",
        (false, 1) => "timelens=debug",
        (false, _) => "timelens=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let quiet = cli.quiet;
    match cli.command {
        Commands::Match {
            lat,
            lon,
            accuracy,
            heading,
            exif_lat,
            exif_lon,
            image,
            catalog,
            landmarks,
            mock_vision,
            radius,
            format,
        } => {
            let args = commands::matching::MatchArgs {
                lat,
                lon,
                accuracy,
                heading,
                exif_lat,
                exif_lon,
                image,
                catalog,
                landmarks,
                mock_vision,
                radius,
                format,
            };
            commands::matching::execute(args, quiet).await
        }
        Commands::Near {
            lat,
            lon,
            radius,
            catalog,
            format,
        } => commands::near::execute(lat, lon, radius, catalog, format, quiet).await,
        Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
            format,
        } => commands::distance::execute(lat1, lon1, lat2, lon2, format),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let exit = match run(cli).await {
        Ok(exit) => exit,
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {message}", "error:".red().bold());
    }
    std::process::exit(exit.code);
}
