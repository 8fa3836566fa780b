use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::drivers::handlers;
use crate::features::drivers::services::{DriverService, NearbyDriverService};

/// Create routes for the drivers feature
///
/// `/api/drivers/nearby` and `/api/drivers/plate/{plate}` take precedence
/// over `/api/drivers/{id}`.
pub fn routes(
    driver_service: Arc<DriverService>,
    nearby_service: Arc<NearbyDriverService>,
) -> Router {
    let directory = Router::new()
        .route(
            "/api/drivers",
            get(handlers::list_drivers).post(handlers::create_driver),
        )
        .route(
            "/api/drivers/{id}",
            get(handlers::get_driver).put(handlers::update_driver),
        )
        .route(
            "/api/drivers/plate/{plate}",
            get(handlers::get_driver_by_plate),
        )
        .with_state(driver_service);

    let nearby = Router::new()
        .route("/api/drivers/nearby", get(handlers::find_nearby_drivers))
        .with_state(nearby_service);

    directory.merge(nearby)
}
