//! Multipart form parsing helpers
//!
//! Collects the photo and text fields of a `multipart/form-data` upload and
//! offers typed accessors over them.

use std::collections::HashMap;

use axum::extract::Multipart;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::validation::{validate_content_type, validate_file_size};

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct FileField {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

/// Parsed multipart form fields
#[derive(Debug, Default)]
pub struct MultipartFields {
    /// File field (named "file")
    file: Option<FileField>,
    /// Text fields indexed by name
    text_fields: HashMap<String, String>,
}

impl MultipartFields {
    /// Parse all fields from a multipart request
    ///
    /// The `file` field is checked for Content-Type and size as it is read;
    /// every other field is collected as text.
    pub async fn parse(multipart: &mut Multipart, max_file_size: usize) -> Result<Self, ApiError> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();

            if name == "file" {
                let content_type = field.content_type().map(|s| s.to_string());
                let file_name = field.file_name().map(|s| s.to_string());
                validate_content_type(content_type.as_deref())?;

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?
                    .to_vec();
                validate_file_size(data.len(), max_file_size)?;

                fields.file = Some(FileField {
                    data,
                    content_type,
                    file_name,
                });
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
                })?;
                fields.text_fields.insert(name, value);
            }
        }

        Ok(fields)
    }

    /// Take ownership of the uploaded file, if any
    pub fn take_file(&mut self) -> Option<FileField> {
        self.file.take()
    }

    /// Get a text field value, ignoring blank values
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Get a text field parsed as a boolean
    ///
    /// Returns `true` if the field value is "true" (case-insensitive), `false` otherwise.
    pub fn get_bool(&self, name: &str) -> bool {
        self.get_text(name)
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// Get a text field parsed as a number
    ///
    /// - `Ok(Some(v))` if the field exists and parses as a finite number
    /// - `Ok(None)` if the field is missing or blank
    /// - `Err(ApiError)` otherwise
    pub fn get_f64(&self, name: &str) -> Result<Option<f64>, ApiError> {
        match self.get_text(name) {
            Some(raw) => match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Some(value)),
                _ => Err(ApiError::bad_request(format!(
                    "Field '{}' must be a number, got '{}'",
                    name, raw
                ))),
            },
            None => Ok(None),
        }
    }

    /// Get a text field parsed as JSON
    ///
    /// Returns:
    /// - `Ok(Some(T))` if the field exists and is valid JSON
    /// - `Ok(None)` if the field is missing or empty
    /// - `Err(ApiError)` if the field exists but JSON parsing fails
    pub fn get_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ApiError> {
        match self.get_text(name) {
            Some(json) => {
                let value: T = serde_json::from_str(json)
                    .map_err(|e| ApiError::bad_request(format!("Invalid {} JSON: {}", name, e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
