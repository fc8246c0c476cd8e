//! Near command: list catalog entries around a point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use timelens_core::{distance_km, CatalogStore, LocationSource};

use crate::exit_codes::ExitCode;
use crate::utils::{format_distance, load_catalog, parse_coordinate, print_json, OutputFormat};

#[derive(Serialize)]
struct NearbyEntry<'a> {
    id: &'a str,
    title: &'a str,
    year: i32,
    distance_meters: f64,
    viewing_arc: [u16; 2],
}

/// Execute the near command.
pub async fn execute(
    lat: f64,
    lon: f64,
    radius: f64,
    catalog_path: Option<PathBuf>,
    format: OutputFormat,
    quiet: bool,
) -> Result<ExitCode> {
    let center = parse_coordinate(lat, lon, LocationSource::DeviceGps, "location")?;
    let catalog = load_catalog(catalog_path.as_deref())?;

    let mut entries = catalog
        .query_near(&center, radius)
        .await
        .context("Catalog query failed")?;
    entries.sort_by(|a, b| {
        distance_km(&a.location, &center).total_cmp(&distance_km(&b.location, &center))
    });

    let rows: Vec<NearbyEntry<'_>> = entries
        .iter()
        .map(|e| NearbyEntry {
            id: &e.id,
            title: &e.title,
            year: e.year,
            distance_meters: distance_km(&e.location, &center) * 1000.0,
            viewing_arc: [e.viewing_arc.start_degrees(), e.viewing_arc.end_degrees()],
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text if quiet => {}
        OutputFormat::Text if rows.is_empty() => {
            println!("No catalog entries within {radius} km.");
        }
        OutputFormat::Text => {
            println!(
                "{} {} within {radius} km",
                rows.len().to_string().bold(),
                if rows.len() == 1 { "entry" } else { "entries" }
            );
            println!();
            for row in &rows {
                println!(
                    "   {:>8}  {}  {} ({})  {}",
                    format_distance(row.distance_meters),
                    row.id.dimmed(),
                    row.title,
                    row.year,
                    format!("{}..{} deg", row.viewing_arc[0], row.viewing_arc[1]).dimmed()
                );
            }
        }
    }

    Ok(if rows.is_empty() {
        ExitCode::no_match()
    } else {
        ExitCode::success()
    })
}
