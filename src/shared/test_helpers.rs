#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use fake::faker::name::en::{FirstName, LastName};
#[cfg(test)]
use fake::Fake;

#[cfg(test)]
use crate::features::drivers::dtos::{CreateDriverDto, UpdateDriverDto};
#[cfg(test)]
use crate::features::drivers::models::{DriverFields, GeoPoint};
#[cfg(test)]
use crate::features::drivers::store::{DriverStore, IndexDescriptor, MemoryDriverStore};

#[cfg(test)]
const CARS: &[(&str, &str)] = &[
    ("Fiat", "Egea"),
    ("Toyota", "Corolla"),
    ("Hyundai", "i20"),
    ("Renault", "Clio"),
];

#[cfg(test)]
#[allow(dead_code)]
pub fn driver_fields(plate: &str, taxi_type: &str, lon: f64, lat: f64) -> DriverFields {
    let (car_brand, car_model) = CARS[(0..CARS.len()).fake::<usize>()];
    DriverFields {
        first_name: FirstName().fake(),
        last_name: LastName().fake(),
        plate: plate.to_string(),
        taxi_type: taxi_type.to_string(),
        car_brand: car_brand.to_string(),
        car_model: car_model.to_string(),
        location: GeoPoint::new(lon, lat).unwrap(),
    }
}

#[cfg(test)]
#[allow(dead_code)]
pub fn create_driver_dto(plate: &str, taxi_type: &str, lon: f64, lat: f64) -> CreateDriverDto {
    let fields = driver_fields(plate, taxi_type, lon, lat);
    CreateDriverDto {
        first_name: fields.first_name,
        last_name: fields.last_name,
        plate: fields.plate,
        taxi_type: fields.taxi_type,
        car_brand: fields.car_brand,
        car_model: fields.car_model,
        location: fields.location,
        created_at: None,
    }
}

#[cfg(test)]
#[allow(dead_code)]
pub fn update_driver_dto(plate: &str, taxi_type: &str, lon: f64, lat: f64) -> UpdateDriverDto {
    let fields = driver_fields(plate, taxi_type, lon, lat);
    UpdateDriverDto {
        first_name: fields.first_name,
        last_name: fields.last_name,
        plate: fields.plate,
        taxi_type: fields.taxi_type,
        car_brand: fields.car_brand,
        car_model: fields.car_model,
        location: fields.location,
    }
}

/// Memory store that already carries the spatial index on `location`
#[cfg(test)]
#[allow(dead_code)]
pub async fn indexed_memory_store() -> Arc<MemoryDriverStore> {
    let store = Arc::new(MemoryDriverStore::new());
    store
        .create_index(&IndexDescriptor::spatial("drivers_location_gist", "location"))
        .await
        .unwrap();
    store
}
