//! Driver directory and nearby driver matching.
//!
//! Drivers are registered vehicles identified by a generated id and a unique
//! license plate. Proximity queries filter by taxi type, select candidates
//! through the store's spatial index and rank them by great-circle distance.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/drivers` | Register a driver |
//! | GET | `/api/drivers` | List drivers (`page`, `pageSize`) |
//! | GET | `/api/drivers/{id}` | Get driver by id |
//! | PUT | `/api/drivers/{id}` | Replace driver fields |
//! | GET | `/api/drivers/plate/{plate}` | Get driver by plate |
//! | GET | `/api/drivers/nearby` | Nearby drivers of a taxi type (`lat`, `lon`, `taxiType`) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use services::{DriverService, GeoIndexService, NearbyDriverService};
pub use store::{DriverStore, MemoryDriverStore, PgDriverStore};
