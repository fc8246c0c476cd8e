//! Common utility functions shared across CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use timelens_core::{Coordinate, InMemoryCatalog, LandmarkTable, LocationSource};
use tracing::debug;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Load a catalog file, or the bundled Chicago catalog when no path is given.
pub fn load_catalog(path: Option<&Path>) -> Result<InMemoryCatalog> {
    match path {
        Some(path) => InMemoryCatalog::from_path(path)
            .with_context(|| format!("Failed to load catalog: {}", path.display())),
        None => {
            debug!("Using bundled Chicago catalog");
            InMemoryCatalog::chicago().context("Failed to load bundled catalog")
        }
    }
}

/// Load a landmark table, or the bundled Chicago table when no path is given.
pub fn load_landmarks(path: Option<&Path>) -> Result<LandmarkTable> {
    match path {
        Some(path) => LandmarkTable::from_path(path)
            .with_context(|| format!("Failed to load landmark table: {}", path.display())),
        None => LandmarkTable::chicago().context("Failed to load bundled landmark table"),
    }
}

/// Validate a coordinate given on the command line.
pub fn parse_coordinate(
    latitude: f64,
    longitude: f64,
    source: LocationSource,
    what: &str,
) -> Result<Coordinate> {
    Coordinate::new(latitude, longitude, source).with_context(|| format!("Invalid {what}"))
}

/// `850 m` below a kilometre, `1.25 km` above.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// Confidence percentage coloured by band.
pub fn colored_confidence(percent: u8) -> ColoredString {
    let text = format!("{percent}%");
    match percent {
        75..=u8::MAX => text.green().bold(),
        50..=74 => text.yellow(),
        _ => text.red(),
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
