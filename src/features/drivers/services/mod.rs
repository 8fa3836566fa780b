mod driver_service;
mod geo_index_service;
mod nearby_service;

pub use driver_service::DriverService;
pub use geo_index_service::GeoIndexService;
pub use nearby_service::NearbyDriverService;
