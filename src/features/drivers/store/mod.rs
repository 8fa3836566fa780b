//! Persistence interface for the driver directory.
//!
//! The directory and the proximity engine only talk to storage through
//! [`DriverStore`]. Two backends exist: [`PgDriverStore`] (PostgreSQL with
//! PostGIS) and [`MemoryDriverStore`] (process-local, used by tests and for
//! running without a database).

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::drivers::models::{Driver, GeoPoint};

pub use memory::MemoryDriverStore;
pub use postgres::PgDriverStore;

/// Kind of index a store maintains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Spatial index over point geometries
    SpatialPoint,
    /// Ordinary ordered index
    Standard,
}

/// Store-agnostic description of an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub fields: Vec<String>,
    pub kind: IndexKind,
}

impl IndexDescriptor {
    pub fn spatial(name: &str, field: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: vec![field.to_string()],
            kind: IndexKind::SpatialPoint,
        }
    }

    /// Same name, same kind and covering exactly the same fields
    pub fn matches(&self, other: &IndexDescriptor) -> bool {
        self.name == other.name && self.kind == other.kind && self.fields == other.fields
    }
}

/// Outcome of an index creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreation {
    Created,
    /// Another caller created an index with this name first
    AlreadyExists,
}

#[async_trait]
pub trait DriverStore: Send + Sync {
    /// Insert a new record. A plate that is already stored yields `AppError::Conflict`.
    async fn insert(&self, driver: &Driver) -> Result<()>;

    /// Replace the record stored under `id`. Missing records yield `AppError::NotFound`,
    /// a plate owned by another record yields `AppError::Conflict`.
    async fn replace(&self, id: &str, driver: &Driver) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Driver>>;

    async fn find_by_plate(&self, plate: &str) -> Result<Option<Driver>>;

    /// Records in the store's listing order
    async fn find_page(&self, skip: i64, limit: i64) -> Result<Vec<Driver>>;

    /// Records of `taxi_type` within `max_distance_meters` of `origin`, nearest first
    async fn find_near(
        &self,
        origin: GeoPoint,
        max_distance_meters: f64,
        taxi_type: &str,
    ) -> Result<Vec<Driver>>;

    async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>>;

    async fn create_index(&self, index: &IndexDescriptor) -> Result<IndexCreation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_descriptor_matches() {
        let canonical = IndexDescriptor::spatial("drivers_location_gist", "location");

        assert!(canonical.matches(&IndexDescriptor::spatial("drivers_location_gist", "location")));
        assert!(!canonical.matches(&IndexDescriptor::spatial("other_name", "location")));
        assert!(!canonical.matches(&IndexDescriptor::spatial("drivers_location_gist", "plate")));
        assert!(!canonical.matches(&IndexDescriptor {
            name: "drivers_location_gist".to_string(),
            fields: vec!["location".to_string()],
            kind: IndexKind::Standard,
        }));
    }
}
