use chrono::{DateTime, Utc};

use super::GeoPoint;

/// Fields a caller controls; replaced wholesale on update
#[derive(Debug, Clone, PartialEq)]
pub struct DriverFields {
    pub first_name: String,
    pub last_name: String,
    pub plate: String,
    pub taxi_type: String,
    pub car_brand: String,
    pub car_model: String,
    pub location: GeoPoint,
}

/// A registered vehicle record
#[derive(Debug, Clone, PartialEq)]
pub struct Driver {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub plate: String,
    pub taxi_type: String,
    pub car_brand: String,
    pub car_model: String,
    pub location: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    /// New record whose `updated_at` equals `created_at`
    pub fn new(id: String, fields: DriverFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            plate: fields.plate,
            taxi_type: fields.taxi_type,
            car_brand: fields.car_brand,
            car_model: fields.car_model,
            location: fields.location,
            created_at,
            updated_at: created_at,
        }
    }

    /// Copy with every mutable field replaced; `id` and `created_at` are kept
    pub fn replaced_with(&self, fields: DriverFields, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: self.id.clone(),
            first_name: fields.first_name,
            last_name: fields.last_name,
            plate: fields.plate,
            taxi_type: fields.taxi_type,
            car_brand: fields.car_brand,
            car_model: fields.car_model,
            location: fields.location,
            created_at: self.created_at,
            updated_at,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
