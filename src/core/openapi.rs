use utoipa::{Modify, OpenApi};

use crate::features::drivers::models::{GeoPoint, GeometryType};
use crate::features::drivers::{dtos as drivers_dtos, handlers as drivers_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        drivers_handlers::create_driver,
        drivers_handlers::update_driver,
        drivers_handlers::get_driver,
        drivers_handlers::get_driver_by_plate,
        drivers_handlers::list_drivers,
        drivers_handlers::find_nearby_drivers,
    ),
    components(
        schemas(
            Meta,
            GeometryType,
            GeoPoint,
            drivers_dtos::CreateDriverDto,
            drivers_dtos::UpdateDriverDto,
            drivers_dtos::CreateDriverResponseDto,
            drivers_dtos::DriverResponseDto,
            drivers_dtos::DriverListResponseDto,
            drivers_dtos::NearbyDriverDto,
            ApiResponse<drivers_dtos::CreateDriverResponseDto>,
            ApiResponse<drivers_dtos::DriverResponseDto>,
            ApiResponse<drivers_dtos::DriverListResponseDto>,
            ApiResponse<Vec<drivers_dtos::NearbyDriverDto>>,
        )
    ),
    tags(
        (name = "drivers", description = "Driver directory and nearby driver search"),
    ),
    info(
        title = "Taxihub API",
        version = "0.1.0",
        description = "API documentation for Taxihub",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_driver_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/api/drivers",
            "/api/drivers/{id}",
            "/api/drivers/plate/{plate}",
            "/api/drivers/nearby",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {}",
                expected
            );
        }
    }

    #[test]
    fn test_info_modifier_overrides_info() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Custom".to_string(),
            version: "9.9.9".to_string(),
            description: "Custom docs".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Custom");
        assert_eq!(doc.info.version, "9.9.9");
        assert_eq!(doc.info.description.as_deref(), Some("Custom docs"));
    }
}
