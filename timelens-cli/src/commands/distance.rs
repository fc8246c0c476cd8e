//! Distance command: haversine distance between two points.

use anyhow::Result;
use timelens_core::{distance_km, LocationSource};

use crate::exit_codes::ExitCode;
use crate::utils::{parse_coordinate, print_json, OutputFormat};

/// Execute the distance command.
pub fn execute(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    format: OutputFormat,
) -> Result<ExitCode> {
    let a = parse_coordinate(lat1, lon1, LocationSource::DeviceGps, "first point")?;
    let b = parse_coordinate(lat2, lon2, LocationSource::DeviceGps, "second point")?;
    let km = distance_km(&a, &b);

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "distance_km": km }))?,
        OutputFormat::Text => println!("{km:.3} km"),
    }

    Ok(ExitCode::success())
}
