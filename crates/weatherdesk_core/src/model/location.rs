//! Saved location model.
//!
//! # Responsibility
//! - Describe bookmarked places and the detected current position.
//! - Validate coordinates and required fields before persistence.
//!
//! # Invariants
//! - `name` is never blank.
//! - `lat` is finite within [-90, 90]; `lon` is finite within [-180, 180].
//! - At most one stored row has `is_current = true` (enforced by the repository).

use super::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type LocationId = i64;

/// Persisted saved location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedLocation {
    pub id: LocationId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub state: Option<String>,
    pub is_current: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Caller-supplied fields for a new saved location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

impl NewLocation {
    /// Creates a non-current location without region metadata.
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            country: None,
            state: None,
            is_current: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        validate_lat(self.lat)?;
        validate_lon(self.lon)
    }
}

/// Partial update for a saved location.
///
/// `country`/`state` use a nested option: `Some(None)` clears the column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationPatch {
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub country: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub is_current: Option<bool>,
}

impl LocationPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = self.name.as_deref() {
            require_text("name", name)?;
        }
        if let Some(lat) = self.lat {
            validate_lat(lat)?;
        }
        if let Some(lon) = self.lon {
            validate_lon(lon)?;
        }
        Ok(())
    }
}

fn validate_lat(value: f64) -> Result<(), ValidationError> {
    validate_degrees("lat", value, 90.0)
}

fn validate_lon(value: f64) -> Result<(), ValidationError> {
    validate_degrees("lon", value, 180.0)
}

fn validate_degrees(field: &'static str, value: f64, bound: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < -bound || value > bound {
        return Err(ValidationError::InvalidCoordinate { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{LocationPatch, NewLocation};
    use crate::model::validation::ValidationError;

    #[test]
    fn valid_location_passes() {
        assert!(NewLocation::new("Paris", 48.85, 2.35).validate().is_ok());
        assert!(NewLocation::new("Edge", -90.0, 180.0).validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = NewLocation::new(" ", 1.0, 1.0).validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingField { field: "name" });
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        assert!(matches!(
            NewLocation::new("x", 90.5, 0.0).validate(),
            Err(ValidationError::InvalidCoordinate { field: "lat", .. })
        ));
        assert!(matches!(
            NewLocation::new("x", 0.0, f64::NAN).validate(),
            Err(ValidationError::InvalidCoordinate { field: "lon", .. })
        ));
    }

    #[test]
    fn patch_validates_only_present_fields() {
        assert!(LocationPatch::default().is_empty());
        assert!(LocationPatch::default().validate().is_ok());

        let patch = LocationPatch {
            lon: Some(-181.0),
            ..LocationPatch::default()
        };
        assert!(!patch.is_empty());
        assert!(matches!(
            patch.validate(),
            Err(ValidationError::InvalidCoordinate { field: "lon", .. })
        ));
    }

    #[test]
    fn new_location_deserializes_with_defaults() {
        let parsed: NewLocation =
            serde_json::from_str(r#"{"name":"Lyon","lat":45.76,"lon":4.84}"#).unwrap();
        assert_eq!(parsed, NewLocation::new("Lyon", 45.76, 4.84));
    }
}
