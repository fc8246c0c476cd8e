//! EXIF GPS tags.
//!
//! EXIF stores latitude and longitude as three unsigned rationals
//! (degrees, minutes, seconds) plus a hemisphere reference.
//! [`read_gps`] pulls those tags out of an uploaded photo (JPEG, TIFF,
//! HEIF, PNG or WebP) and [`ExifGps::to_coordinate`] turns them into a
//! [`Coordinate`].

use std::io::Cursor;

use ::exif::{Exif, In, Reader, Tag, Value};
use tracing::debug;

use crate::geo::{Coordinate, LocationSource};

/// An EXIF unsigned rational, `numerator / denominator`.
pub type Rational = (u32, u32);

/// Degrees/minutes/seconds triple as stored in `GPSLatitude`/`GPSLongitude`.
pub type DmsRationals = [Rational; 3];

/// Raw EXIF GPS tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExifGps<'a> {
    pub latitude: DmsRationals,
    /// `GPSLatitudeRef`, `"N"` or `"S"`
    pub latitude_ref: &'a str,
    pub longitude: DmsRationals,
    /// `GPSLongitudeRef`, `"E"` or `"W"`
    pub longitude_ref: &'a str,
    /// `GPSHPositioningError` in meters, when the camera recorded it
    pub horizontal_error_meters: Option<Rational>,
}

fn rational_to_f64((num, den): Rational) -> Option<f64> {
    (den != 0).then(|| f64::from(num) / f64::from(den))
}

/// Decimal degrees from a DMS triple. `None` on a zero denominator.
pub fn dms_to_decimal(dms: &DmsRationals) -> Option<f64> {
    let degrees = rational_to_f64(dms[0])?;
    let minutes = rational_to_f64(dms[1])?;
    let seconds = rational_to_f64(dms[2])?;
    Some(degrees + minutes / 60.0 + seconds / 3600.0)
}

impl ExifGps<'_> {
    /// Convert to a coordinate tagged [`LocationSource::ExifGps`].
    ///
    /// Returns `None` for malformed tags (zero denominators, unknown
    /// hemisphere refs, out-of-range results); a photo without usable GPS is
    /// normal, not an error.
    pub fn to_coordinate(&self) -> Option<Coordinate> {
        let lat = dms_to_decimal(&self.latitude)?;
        let lon = dms_to_decimal(&self.longitude)?;

        let lat = match self.latitude_ref.trim() {
            "N" | "n" | "" => lat,
            "S" | "s" => -lat,
            other => {
                debug!(latitude_ref = other, "Unknown EXIF latitude reference");
                return None;
            }
        };
        let lon = match self.longitude_ref.trim() {
            "E" | "e" | "" => lon,
            "W" | "w" => -lon,
            other => {
                debug!(longitude_ref = other, "Unknown EXIF longitude reference");
                return None;
            }
        };

        let coordinate = match Coordinate::new(lat, lon, LocationSource::ExifGps) {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "EXIF GPS out of range");
                return None;
            }
        };

        Some(
            match self.horizontal_error_meters.and_then(rational_to_f64) {
                Some(err) => coordinate.with_accuracy(err),
                None => coordinate,
            },
        )
    }
}

fn rationals(exif: &Exif, tag: Tag) -> Option<Vec<Rational>> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(values) => Some(values.iter().map(|r| (r.num, r.denom)).collect()),
        _ => None,
    }
}

fn dms(exif: &Exif, tag: Tag) -> Option<DmsRationals> {
    match rationals(exif, tag)?.as_slice() {
        [d, m, s] => Some([*d, *m, *s]),
        // Some cameras write degrees only
        [d] => Some([*d, (0, 1), (0, 1)]),
        _ => None,
    }
}

fn ascii(exif: &Exif, tag: Tag) -> Option<&str> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(values) => values
            .first()
            .and_then(|v| std::str::from_utf8(v).ok())
            .map(|v| v.trim_end_matches('\0')),
        _ => None,
    }
}

/// Read the GPS position embedded in an image.
///
/// Returns `None` when the image has no EXIF block, no GPS tags, or tags
/// that do not form a valid position.
pub fn read_gps(image: &[u8]) -> Option<Coordinate> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(image)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!(error = %e, "No readable EXIF in image");
            return None;
        }
    };

    let gps = ExifGps {
        latitude: dms(&exif, Tag::GPSLatitude)?,
        latitude_ref: ascii(&exif, Tag::GPSLatitudeRef).unwrap_or_default(),
        longitude: dms(&exif, Tag::GPSLongitude)?,
        longitude_ref: ascii(&exif, Tag::GPSLongitudeRef).unwrap_or_default(),
        horizontal_error_meters: rationals(&exif, Tag::GPSHPositioningError)
            .and_then(|values| values.first().copied()),
    };

    let coordinate = gps.to_coordinate();
    debug!(found = coordinate.is_some(), "Read EXIF GPS");
    coordinate
}
