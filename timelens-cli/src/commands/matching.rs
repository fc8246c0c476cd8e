//! Match command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use timelens_core::exif::read_gps;
use timelens_core::{
    LocationSource, MatchOutcome, MatchPipeline, MatchRequest, MatchResult, MatcherConfig,
    MockVision, VisionAnalyzer, VisionProviderConfig, VisionProviderFactory,
};
use tracing::{debug, info};

use crate::exit_codes::ExitCode;
use crate::utils::{
    colored_confidence, format_distance, load_catalog, load_landmarks, parse_coordinate,
    print_json, OutputFormat,
};

/// Arguments for `timelens match`.
#[derive(Debug, Clone)]
pub struct MatchArgs {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub accuracy: f64,
    pub heading: Option<f64>,
    pub exif_lat: Option<f64>,
    pub exif_lon: Option<f64>,
    pub image: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub landmarks: Option<PathBuf>,
    pub mock_vision: bool,
    pub radius: Option<f64>,
    pub format: OutputFormat,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum MatchReport<'a> {
    Matched { result: &'a MatchResult },
    NoLocation,
    NoCandidates { latitude: f64, longitude: f64 },
}

fn build_request(args: &MatchArgs) -> Result<MatchRequest> {
    let mut request = MatchRequest::new();

    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let gps = parse_coordinate(lat, lon, LocationSource::DeviceGps, "device location")?
            .with_accuracy(args.accuracy);
        request = request.with_device_gps(gps);
    }
    if let (Some(lat), Some(lon)) = (args.exif_lat, args.exif_lon) {
        let gps = parse_coordinate(lat, lon, LocationSource::ExifGps, "EXIF location")?;
        request = request.with_exif_gps(gps);
    }
    if let Some(heading) = args.heading {
        request = request.with_heading(heading);
    }
    if let Some(path) = &args.image {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image: {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "Read image");
        if args.exif_lat.is_none() {
            if let Some(gps) = read_gps(&bytes) {
                debug!("Using GPS tags embedded in image");
                request = request.with_exif_gps(gps);
            }
        }
        request = request.with_image(bytes);
    }

    Ok(request)
}

fn vision_provider(args: &MatchArgs) -> Result<Option<Arc<dyn VisionAnalyzer>>> {
    if args.image.is_none() {
        return Ok(None);
    }
    if args.mock_vision {
        debug!("Using mock vision provider");
        return Ok(Some(Arc::new(MockVision::default())));
    }
    VisionProviderFactory::create(VisionProviderConfig::Auto)
        .context("Failed to create vision provider")
}

/// Execute the match command.
pub async fn execute(args: MatchArgs, quiet: bool) -> Result<ExitCode> {
    let mut config = MatcherConfig::from_env().context("Invalid matcher configuration")?;
    if let Some(radius) = args.radius {
        config = config.with_radius_km(radius);
    }
    config.validate().context("Invalid search radius")?;

    let request = build_request(&args)?;
    let catalog = load_catalog(args.catalog.as_deref())?;
    let landmarks = load_landmarks(args.landmarks.as_deref())?;

    let pipeline = MatchPipeline::new(Arc::new(catalog), config)
        .with_vision(vision_provider(&args)?)
        .with_landmarks(Arc::new(landmarks));

    let outcome = pipeline.run(&request).await.context("Match failed")?;

    let exit = match &outcome {
        MatchOutcome::Matched(_) => ExitCode::success(),
        _ => ExitCode::no_match(),
    };

    match args.format {
        OutputFormat::Json => print_json(&report(&outcome))?,
        OutputFormat::Text if !quiet => print_text(&outcome, pipeline.config().radius_km),
        OutputFormat::Text => {}
    }

    Ok(exit)
}

fn report(outcome: &MatchOutcome) -> MatchReport<'_> {
    match outcome {
        MatchOutcome::Matched(result) => MatchReport::Matched { result },
        MatchOutcome::NoLocationAvailable => MatchReport::NoLocation,
        MatchOutcome::NoCandidatesInRange { location } => MatchReport::NoCandidates {
            latitude: location.latitude(),
            longitude: location.longitude(),
        },
    }
}

fn print_text(outcome: &MatchOutcome, radius_km: f64) {
    println!();
    match outcome {
        MatchOutcome::Matched(result) => {
            let entry = &result.candidate;
            println!("{}", "MATCH FOUND".green().bold());
            println!();
            println!("   {} {} ({})", "Photo:".dimmed(), entry.title.bold(), entry.year);
            println!("   {} {}", "Id:".dimmed(), entry.id);
            println!(
                "   {} {}",
                "Distance:".dimmed(),
                format_distance(result.distance_meters)
            );
            println!(
                "   {} {}",
                "Confidence:".dimmed(),
                colored_confidence(result.confidence_percent)
            );
            println!("   {} {}", "Method:".dimmed(), result.match_method);
            println!(
                "   {} {}",
                "Located by:".dimmed(),
                result.query_location.source()
            );
            if !entry.landmark_names.is_empty() {
                let names: Vec<&str> = entry.landmark_names.iter().map(String::as_str).collect();
                println!("   {} {}", "Landmarks:".dimmed(), names.join(", "));
            }
            if let Some(context) = &entry.story_context {
                println!();
                println!("   {}", context.italic());
            }
        }
        MatchOutcome::NoLocationAvailable => {
            println!("{}", "NO LOCATION".yellow().bold());
            println!();
            println!(
                "   Provide --lat/--lon with --accuracy under 100 m, --exif-lat/--exif-lon, or an --image."
            );
        }
        MatchOutcome::NoCandidatesInRange { location } => {
            println!("{}", "NO MATCH".yellow().bold());
            println!();
            println!(
                "   No historical photos within {radius_km} km of {:.4}, {:.4}.",
                location.latitude(),
                location.longitude()
            );
        }
    }
}
