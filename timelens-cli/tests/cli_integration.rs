//! CLI integration tests for timelens-cli.
//!
//! These run the actual binary against the bundled Chicago catalog and
//! temporary catalog files, checking outputs and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a Command for the timelens binary.
fn timelens() -> Command {
    let mut cmd = Command::cargo_bin("timelens").unwrap();
    // Keep the host environment from switching on OpenAI or moving the fallback area.
    cmd.env_remove("OPENAI_API_KEY")
        .env_remove("TIMELENS_RADIUS_KM")
        .env_remove("TIMELENS_FALLBACK_LAT")
        .env_remove("TIMELENS_FALLBACK_LON");
    cmd
}

const CUSTOM_CATALOG: &str = r#"[
  {
    "id": "harbor_1910",
    "title": "Harbor at Dawn",
    "year": 1910,
    "latitude": 10.0,
    "longitude": 20.0,
    "viewing_arc": { "start_degrees": 0, "end_degrees": 90 },
    "landmark_names": ["Lighthouse"],
    "historical_interest_score": 0.8,
    "image_quality_score": 0.7
  }
]"#;

/// Little-endian TIFF whose only tags are a GPS position.
fn photo_with_gps(
    lat: [(u32, u32); 3],
    lat_ref: &str,
    lon: [(u32, u32); 3],
    lon_ref: &str,
) -> Vec<u8> {
    use exif::experimental::Writer;
    use exif::{Field, In, Rational, Tag, Value};

    let dms = |v: [(u32, u32); 3]| {
        Value::Rational(v.iter().map(|&(num, denom)| Rational { num, denom }).collect())
    };
    let ascii = |s: &str| Value::Ascii(vec![s.as_bytes().to_vec()]);
    let fields = [
        Field {
            tag: Tag::GPSLatitudeRef,
            ifd_num: In::PRIMARY,
            value: ascii(lat_ref),
        },
        Field {
            tag: Tag::GPSLatitude,
            ifd_num: In::PRIMARY,
            value: dms(lat),
        },
        Field {
            tag: Tag::GPSLongitudeRef,
            ifd_num: In::PRIMARY,
            value: ascii(lon_ref),
        },
        Field {
            tag: Tag::GPSLongitude,
            ifd_num: In::PRIMARY,
            value: dms(lon),
        },
    ];

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buf = std::io::Cursor::new(Vec::new());
    writer.write(&mut buf, true).unwrap();
    buf.into_inner()
}

/// 41° 52' 41.16" N, 87° 37' 40.08" W (State Street)
const STATE_STREET_LAT: [(u32, u32); 3] = [(41, 1), (52, 1), (4116, 100)];
const STATE_STREET_LON: [(u32, u32); 3] = [(87, 1), (37, 1), (4008, 100)];

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    timelens()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("historical photographs"))
        .stdout(predicate::str::contains("match"))
        .stdout(predicate::str::contains("near"))
        .stdout(predicate::str::contains("distance"));
}

#[test]
fn test_version_displays_version() {
    timelens()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("timelens"));
}

#[test]
fn test_help_shows_exit_codes() {
    timelens()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("64"))
        .stdout(predicate::str::contains("66"));
}

#[test]
fn test_match_help_shows_options() {
    timelens()
        .args(["match", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--heading"))
        .stdout(predicate::str::contains("--image"))
        .stdout(predicate::str::contains("--mock-vision"))
        .stdout(predicate::str::contains("--format"));
}

// ============================================================================
// Distance Command Tests
// ============================================================================

#[test]
fn test_distance_text() {
    timelens()
        .args(["distance", "41.8781", "-87.6278", "41.8917", "-87.6086"])
        .assert()
        .success()
        .stdout(predicate::str::contains("km"));
}

#[test]
fn test_distance_json() {
    let output = timelens()
        .args(["distance", "0", "0", "0", "0", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["distance_km"].as_f64(), Some(0.0));
}

#[test]
fn test_distance_rejects_invalid_latitude() {
    timelens()
        .args(["distance", "95", "0", "0", "0"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("error:"));
}

// ============================================================================
// Match Command Tests
// ============================================================================

#[test]
fn test_match_state_street() {
    timelens()
        .args(["match", "--lat", "41.8781", "--lon", "-87.6278", "--heading", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MATCH FOUND"))
        .stdout(predicate::str::contains("state_street_1950"));
}

#[test]
fn test_match_json_output() {
    let output = timelens()
        .args([
            "match", "--lat", "41.8781", "--lon", "-87.6278", "--heading", "5", "--format",
            "json",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "matched");
    assert_eq!(json["result"]["candidate"]["id"], "state_street_1950");
    assert_eq!(json["result"]["match_method"], "proximity_heading");

    let confidence = json["result"]["confidence_percent"].as_u64().unwrap();
    assert!((20..=95).contains(&confidence));
}

#[test]
fn test_match_far_from_catalog_exits_no_match() {
    timelens()
        .args(["match", "--lat", "45.0", "--lon", "-90.0"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("NO MATCH"));
}

#[test]
fn test_match_untrusted_gps_without_other_sources() {
    // Fixes at 100 m or worse are ignored, leaving no usable location.
    let output = timelens()
        .args([
            "match",
            "--lat",
            "41.8781",
            "--lon",
            "-87.6278",
            "--accuracy",
            "500",
            "--format",
            "json",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "no_location");
}

#[test]
fn test_match_uses_exif_location() {
    timelens()
        .args(["match", "--exif-lat", "41.8781", "--exif-lon", "-87.6278"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MATCH FOUND"));
}

#[test]
fn test_match_reads_gps_embedded_in_image() {
    let temp_dir = TempDir::new().unwrap();
    let image = temp_dir.path().join("street.tiff");
    fs::write(&image, photo_with_gps(STATE_STREET_LAT, "N", STATE_STREET_LON, "W")).unwrap();

    let output = timelens()
        .args(["match", "--format", "json", "--image"])
        .arg(&image)
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "matched");
    assert_eq!(json["result"]["query_location"]["source"], "exif_gps");
}

#[test]
fn test_exif_flags_override_embedded_gps() {
    let temp_dir = TempDir::new().unwrap();
    let image = temp_dir.path().join("street.tiff");
    // Embedded tags point at the southern hemisphere, far from the catalog
    fs::write(&image, photo_with_gps(STATE_STREET_LAT, "S", STATE_STREET_LON, "E")).unwrap();

    timelens()
        .args(["match", "--exif-lat", "41.8781", "--exif-lon", "-87.6278", "--image"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("MATCH FOUND"));
}

#[test]
fn test_match_invalid_latitude() {
    timelens()
        .args(["match", "--lat", "91", "--lon", "0"])
        .assert()
        .code(64);
}

#[test]
fn test_match_negative_radius() {
    timelens()
        .args(["match", "--lat", "41.8781", "--lon", "-87.6278", "--radius", "-1"])
        .assert()
        .code(64);
}

#[test]
fn test_match_missing_image() {
    timelens()
        .args([
            "match",
            "--lat",
            "41.8781",
            "--lon",
            "-87.6278",
            "--image",
            "/nonexistent/photo.jpg",
        ])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read image"));
}

#[test]
fn test_match_with_mock_vision() {
    let temp_dir = TempDir::new().unwrap();
    let image_path = temp_dir.path().join("street.jpg");
    fs::write(&image_path, b"not really a jpeg").unwrap();

    let output = timelens()
        .args([
            "match",
            "--lat",
            "41.8781",
            "--lon",
            "-87.6278",
            "--image",
            image_path.to_str().unwrap(),
            "--mock-vision",
            "--format",
            "json",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["result"]["match_method"], "comprehensive_ai_analysis");
    assert!(json["result"]["ai_analysis"].is_object());
}

#[test]
fn test_match_quiet_prints_nothing() {
    timelens()
        .args(["-q", "match", "--lat", "41.8781", "--lon", "-87.6278"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ============================================================================
// Catalog File Tests
// ============================================================================

#[test]
fn test_match_custom_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = temp_dir.path().join("catalog.json");
    fs::write(&catalog_path, CUSTOM_CATALOG).unwrap();

    timelens()
        .args([
            "match",
            "--lat",
            "10.001",
            "--lon",
            "20.0",
            "--catalog",
            catalog_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Harbor at Dawn"));
}

#[test]
fn test_match_malformed_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = temp_dir.path().join("catalog.json");
    fs::write(&catalog_path, "{ not json").unwrap();

    timelens()
        .args([
            "match",
            "--lat",
            "10.0",
            "--lon",
            "20.0",
            "--catalog",
            catalog_path.to_str().unwrap(),
        ])
        .assert()
        .code(65);
}

#[test]
fn test_match_missing_catalog() {
    timelens()
        .args([
            "match",
            "--lat",
            "10.0",
            "--lon",
            "20.0",
            "--catalog",
            "/nonexistent/catalog.json",
        ])
        .assert()
        .code(66);
}

// ============================================================================
// Near Command Tests
// ============================================================================

#[test]
fn test_near_json_sorted_by_distance() {
    let output = timelens()
        .args([
            "near", "--lat", "41.8781", "--lon", "-87.6278", "--radius", "0.5", "--format",
            "json",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(!rows.is_empty());
    assert_eq!(rows[0]["id"], "state_street_1950");

    let distances: Vec<f64> = rows
        .iter()
        .map(|r| r["distance_meters"].as_f64().unwrap())
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_near_empty_area() {
    timelens()
        .args(["near", "--lat", "0", "--lon", "0"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No catalog entries"));
}
