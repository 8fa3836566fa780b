use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Geometry discriminator; drivers are only ever located by a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum GeometryType {
    Point,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoPointError {
    #[error("coordinates must contain exactly two values [longitude, latitude], got {0}")]
    Arity(usize),

    #[error("coordinates must be finite numbers")]
    NotFinite,

    #[error("longitude must be within [-180, 180], got {0}")]
    Longitude(f64),

    #[error("latitude must be within [-90, 90], got {0}")]
    Latitude(f64),
}

/// A geodetic point, serialized as `{"type": "Point", "coordinates": [lon, lat]}`.
///
/// Construction validates the coordinates, so every `GeoPoint` holds two
/// finite in-range values with longitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "GeoPointRepr")]
pub struct GeoPoint {
    #[serde(rename = "type")]
    kind: GeometryType,
    /// `[longitude, latitude]`
    #[schema(value_type = Vec<f64>, min_items = 2, max_items = 2)]
    coordinates: [f64; 2],
}

#[derive(Deserialize)]
struct GeoPointRepr {
    #[serde(rename = "type")]
    kind: GeometryType,
    coordinates: Vec<f64>,
}

impl TryFrom<GeoPointRepr> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(repr: GeoPointRepr) -> Result<Self, Self::Error> {
        match (repr.kind, repr.coordinates.as_slice()) {
            (GeometryType::Point, [lon, lat]) => GeoPoint::new(*lon, *lat),
            (_, other) => Err(GeoPointError::Arity(other.len())),
        }
    }
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, GeoPointError> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(GeoPointError::NotFinite);
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::Longitude(longitude));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::Latitude(latitude));
        }

        Ok(Self {
            kind: GeometryType::Point,
            coordinates: [longitude, latitude],
        })
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}
