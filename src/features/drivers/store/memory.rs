use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DriverStore, IndexCreation, IndexDescriptor, IndexKind};
use crate::core::error::{AppError, Result, StorageError};
use crate::features::drivers::models::{Driver, GeoPoint};
use crate::shared::geo::haversine_km;

#[derive(Default)]
struct MemoryState {
    /// Insertion order is the listing order
    drivers: Vec<Driver>,
    indexes: Vec<IndexDescriptor>,
}

/// Process-local driver store.
///
/// Enforces plate uniqueness like a unique index would and refuses proximity
/// queries until a spatial index on `location` has been created.
#[derive(Default)]
pub struct MemoryDriverStore {
    state: RwLock<MemoryState>,
}

impl MemoryDriverStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn plate_conflict(plate: &str) -> AppError {
    AppError::Conflict(format!("Driver with plate '{}' already exists", plate))
}

#[async_trait]
impl DriverStore for MemoryDriverStore {
    async fn insert(&self, driver: &Driver) -> Result<()> {
        let mut state = self.state.write().await;

        if state.drivers.iter().any(|d| d.plate == driver.plate) {
            return Err(plate_conflict(&driver.plate));
        }
        if state.drivers.iter().any(|d| d.id == driver.id) {
            return Err(AppError::Conflict(format!(
                "Driver with id '{}' already exists",
                driver.id
            )));
        }

        state.drivers.push(driver.clone());
        Ok(())
    }

    async fn replace(&self, id: &str, driver: &Driver) -> Result<()> {
        let mut state = self.state.write().await;

        if state
            .drivers
            .iter()
            .any(|d| d.id != id && d.plate == driver.plate)
        {
            return Err(plate_conflict(&driver.plate));
        }

        let slot = state
            .drivers
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Driver '{}' not found", id)))?;
        *slot = driver.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Driver>> {
        let state = self.state.read().await;
        Ok(state.drivers.iter().find(|d| d.id == id).cloned())
    }

    async fn find_by_plate(&self, plate: &str) -> Result<Option<Driver>> {
        let state = self.state.read().await;
        Ok(state.drivers.iter().find(|d| d.plate == plate).cloned())
    }

    async fn find_page(&self, skip: i64, limit: i64) -> Result<Vec<Driver>> {
        let skip = usize::try_from(skip.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);

        let state = self.state.read().await;
        Ok(state
            .drivers
            .iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_near(
        &self,
        origin: GeoPoint,
        max_distance_meters: f64,
        taxi_type: &str,
    ) -> Result<Vec<Driver>> {
        let state = self.state.read().await;

        let has_spatial_index = state.indexes.iter().any(|i| {
            i.kind == IndexKind::SpatialPoint && i.fields.iter().any(|f| f == "location")
        });
        if !has_spatial_index {
            return Err(StorageError::Backend(
                "proximity query requires a spatial index on location".to_string(),
            )
            .into());
        }

        let mut matches: Vec<(f64, &Driver)> = state
            .drivers
            .iter()
            .filter(|d| d.taxi_type == taxi_type)
            .map(|d| {
                let meters = haversine_km(
                    origin.latitude(),
                    origin.longitude(),
                    d.location.latitude(),
                    d.location.longitude(),
                ) * 1000.0;
                (meters, d)
            })
            .filter(|(meters, _)| *meters <= max_distance_meters)
            .collect();

        matches.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(matches.into_iter().map(|(_, d)| d.clone()).collect())
    }

    async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>> {
        let state = self.state.read().await;
        Ok(state.indexes.clone())
    }

    async fn create_index(&self, index: &IndexDescriptor) -> Result<IndexCreation> {
        let mut state = self.state.write().await;

        if state.indexes.iter().any(|i| i.name == index.name) {
            return Ok(IndexCreation::AlreadyExists);
        }

        state.indexes.push(index.clone());
        Ok(IndexCreation::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::drivers::models::DriverFields;
    use chrono::Utc;

    fn driver(id: &str, plate: &str, taxi_type: &str, lon: f64, lat: f64) -> Driver {
        Driver::new(
            id.to_string(),
            DriverFields {
                first_name: "Ali".to_string(),
                last_name: "Veli".to_string(),
                plate: plate.to_string(),
                taxi_type: taxi_type.to_string(),
                car_brand: "Fiat".to_string(),
                car_model: "Egea".to_string(),
                location: GeoPoint::new(lon, lat).unwrap(),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_enforces_unique_plate() {
        let store = MemoryDriverStore::new();
        store
            .insert(&driver("1", "34ABC123", "sedan", 29.0, 41.0))
            .await
            .unwrap();

        let result = store
            .insert(&driver("2", "34ABC123", "suv", 29.0, 41.0))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(store.find_page(0, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let store = MemoryDriverStore::new();
        let result = store
            .replace("missing", &driver("missing", "06XY1", "sedan", 29.0, 41.0))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_replace_rejects_plate_of_other_driver() {
        let store = MemoryDriverStore::new();
        store.insert(&driver("1", "P1", "sedan", 29.0, 41.0)).await.unwrap();
        store.insert(&driver("2", "P2", "sedan", 29.0, 41.0)).await.unwrap();

        let result = store.replace("2", &driver("2", "P1", "sedan", 29.0, 41.0)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        // Keeping its own plate is fine
        store.replace("2", &driver("2", "P2", "suv", 29.0, 41.0)).await.unwrap();
        let stored = store.find_by_id("2").await.unwrap().unwrap();
        assert_eq!(stored.taxi_type, "suv");
    }

    #[tokio::test]
    async fn test_find_page_keeps_insertion_order() {
        let store = MemoryDriverStore::new();
        for i in 0..25 {
            store
                .insert(&driver(&i.to_string(), &format!("P{}", i), "sedan", 29.0, 41.0))
                .await
                .unwrap();
        }

        let page = store.find_page(10, 10).await.unwrap();
        let ids: Vec<_> = page.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "11", "12", "13", "14", "15", "16", "17", "18", "19"]);

        assert_eq!(store.find_page(20, 10).await.unwrap().len(), 5);
        assert!(store.find_page(30, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_near_requires_spatial_index() {
        let store = MemoryDriverStore::new();
        let origin = GeoPoint::new(29.0, 41.0).unwrap();

        let result = store.find_near(origin, 1_000.0, "sedan").await;
        assert!(matches!(result, Err(AppError::Storage(StorageError::Backend(_)))));
    }

    #[tokio::test]
    async fn test_find_near_filters_radius_and_type() {
        let store = MemoryDriverStore::new();
        store
            .create_index(&IndexDescriptor::spatial("drivers_location_gist", "location"))
            .await
            .unwrap();

        store.insert(&driver("far", "P1", "sedan", 29.05, 41.0)).await.unwrap();
        store.insert(&driver("near", "P2", "sedan", 29.001, 41.0)).await.unwrap();
        store.insert(&driver("suv", "P3", "suv", 29.0, 41.0)).await.unwrap();
        store.insert(&driver("mid", "P4", "sedan", 29.01, 41.0)).await.unwrap();

        let origin = GeoPoint::new(29.0, 41.0).unwrap();
        let found = store.find_near(origin, 1_000.0, "sedan").await.unwrap();
        let ids: Vec<_> = found.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
    }

    #[tokio::test]
    async fn test_create_index_twice_reports_existing() {
        let store = MemoryDriverStore::new();
        let index = IndexDescriptor::spatial("drivers_location_gist", "location");

        assert_eq!(
            store.create_index(&index).await.unwrap(),
            IndexCreation::Created
        );
        assert_eq!(
            store.create_index(&index).await.unwrap(),
            IndexCreation::AlreadyExists
        );
        assert_eq!(store.list_indexes().await.unwrap().len(), 1);
    }
}
