//! Exit codes following sysexits.h conventions.
//!
//! A valid request that finds nothing exits with [`NO_MATCH`] so scripts can
//! tell "no historical photo here" apart from a failure.

use timelens_core::TimelensError;

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Request was valid but produced no match.
pub const NO_MATCH: i32 = 1;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 2;

/// Command line usage error (invalid coordinates, radius, heading).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// Data format error (malformed catalog or landmark table).
/// Maps to EX_DATAERR from sysexits.h.
pub const DATA_ERROR: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Service unavailable (vision provider).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const UNAVAILABLE: i32 = 69;

/// I/O error (cannot write output).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Represents an exit code with optional error context.
#[derive(Debug)]
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub const fn success() -> Self {
        Self {
            code: SUCCESS,
            message: None,
        }
    }

    pub const fn no_match() -> Self {
        Self {
            code: NO_MATCH,
            message: None,
        }
    }

    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        let core_error = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<TimelensError>());

        let code = match core_error {
            Some(
                TimelensError::InvalidCoordinate { .. }
                | TimelensError::InvalidRadius(_)
                | TimelensError::InvalidViewingArc(_),
            ) => USAGE_ERROR,
            Some(
                TimelensError::Catalog(_)
                | TimelensError::InvalidScore { .. }
                | TimelensError::Serialization(_),
            ) => {
                if message.contains("Failed to read") {
                    INPUT_ERROR
                } else {
                    DATA_ERROR
                }
            }
            Some(
                TimelensError::Vision(_)
                | TimelensError::VisionTimeout { .. }
                | TimelensError::Http(_),
            ) => UNAVAILABLE,
            None if message.contains("Failed to read") => INPUT_ERROR,
            None if message.contains("Failed to write") => IO_ERROR,
            None => GENERAL_ERROR,
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_classifies_core_errors() {
        let err = anyhow::Error::new(TimelensError::InvalidRadius(-1.0));
        assert_eq!(ExitCode::from_anyhow(&err).code, USAGE_ERROR);

        let err = anyhow::Error::new(TimelensError::Catalog("bad json".into()));
        assert_eq!(ExitCode::from_anyhow(&err).code, DATA_ERROR);
    }

    #[test]
    fn test_classifies_context_chain() {
        let err: anyhow::Result<()> = Err(TimelensError::InvalidCoordinate {
            latitude: 95.0,
            longitude: 0.0,
        })
        .context("Invalid query location");
        assert_eq!(ExitCode::from_anyhow(&err.unwrap_err()).code, USAGE_ERROR);
    }

    #[test]
    fn test_missing_file() {
        let err = anyhow::anyhow!("Failed to read image: photo.jpg");
        assert_eq!(ExitCode::from_anyhow(&err).code, INPUT_ERROR);
    }
}
