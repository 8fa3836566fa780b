use std::sync::Arc;

use crate::core::config::DriversConfig;
use crate::core::deadline::Deadline;
use crate::core::error::{AppError, Result};
use crate::features::drivers::dtos::{NearbyDriverDto, NearbyDriversQuery};
use crate::features::drivers::models::{Driver, GeoPoint};
use crate::features::drivers::services::GeoIndexService;
use crate::features::drivers::store::DriverStore;
use crate::shared::geo::haversine_km;

/// Slack between the store's geodesic radius filter and the spherical distance
const RADIUS_SLACK_METERS: f64 = 1.0;

/// Service answering "which drivers of this type are near this point"
pub struct NearbyDriverService {
    store: Arc<dyn DriverStore>,
    geo_index: Arc<GeoIndexService>,
    config: DriversConfig,
    deadline: Deadline,
}

impl NearbyDriverService {
    pub fn new(
        store: Arc<dyn DriverStore>,
        geo_index: Arc<GeoIndexService>,
        config: DriversConfig,
        deadline: Deadline,
    ) -> Self {
        Self {
            store,
            geo_index,
            config,
            deadline,
        }
    }

    /// Drivers of the requested type within the search radius, nearest first
    pub async fn find_nearby(&self, query: &NearbyDriversQuery) -> Result<Vec<NearbyDriverDto>> {
        let origin =
            GeoPoint::new(query.lon, query.lat).map_err(|e| AppError::Validation(e.to_string()))?;
        if query.taxi_type.trim().is_empty() {
            return Err(AppError::Validation("taxiType must not be empty".to_string()));
        }
        let radius_meters = self.radius_meters(query.max_distance_meters)?;

        self.deadline
            .run("find_nearby_drivers", async {
                if !self.geo_index.is_ready() {
                    tracing::debug!("Spatial index not provisioned yet, provisioning on demand");
                }
                self.geo_index.ensure_index().await?;

                let candidates = self
                    .store
                    .find_near(origin, radius_meters, &query.taxi_type)
                    .await?;

                tracing::debug!(
                    "Nearby search at ({}, {}) for '{}' within {}m returned {} candidates",
                    origin.latitude(),
                    origin.longitude(),
                    query.taxi_type,
                    radius_meters,
                    candidates.len()
                );

                Ok(rank_candidates(origin, radius_meters, candidates))
            })
            .await
    }

    /// Requested radius, or the configured default, capped at the configured maximum
    fn radius_meters(&self, requested: Option<f64>) -> Result<f64> {
        match requested {
            None => Ok(self.config.nearby_distance_meters),
            Some(meters) if meters.is_finite() && meters > 0.0 => {
                Ok(meters.min(self.config.nearby_max_distance_meters))
            }
            Some(meters) => Err(AppError::Validation(format!(
                "maxDistanceMeters must be a positive number, got {}",
                meters
            ))),
        }
    }
}

/// Recompute every candidate's distance in km and stable-sort ascending.
///
/// Candidates arrive in store order, so ties keep that order.
fn rank_candidates(
    origin: GeoPoint,
    radius_meters: f64,
    candidates: Vec<Driver>,
) -> Vec<NearbyDriverDto> {
    let mut ranked: Vec<NearbyDriverDto> = candidates
        .into_iter()
        .map(|driver| {
            let distance_km = haversine_km(
                origin.latitude(),
                origin.longitude(),
                driver.location.latitude(),
                driver.location.longitude(),
            );
            if distance_km * 1000.0 > radius_meters + RADIUS_SLACK_METERS {
                tracing::debug!(
                    "Driver {} returned at {:.3} km, outside the {}m radius",
                    driver.id,
                    distance_km,
                    radius_meters
                );
            }

            NearbyDriverDto {
                first_name: driver.first_name,
                last_name: driver.last_name,
                plate: driver.plate,
                distance_km,
            }
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}
