use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::features::drivers::models::{Driver, DriverFields, GeoPoint};
use crate::shared::constants::CREATED_AT_MAX_SKEW_SECS;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Registration times must lie between the Unix epoch and a few minutes from now
fn registration_time(value: &DateTime<Utc>) -> Result<(), ValidationError> {
    let latest = Utc::now() + Duration::seconds(CREATED_AT_MAX_SKEW_SECS);
    if value.timestamp() < 0 || *value > latest {
        return Err(ValidationError::new("range")
            .with_message("createdAt must be between 1970-01-01 and now".into()));
    }
    Ok(())
}

/// Request DTO for registering a driver
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDriverDto {
    #[validate(
        length(min = 1, max = 100, message = "First name must be 1-100 characters"),
        custom(function = "not_blank")
    )]
    pub first_name: String,

    #[validate(
        length(min = 1, max = 100, message = "Last name must be 1-100 characters"),
        custom(function = "not_blank")
    )]
    pub last_name: String,

    /// License plate, unique across all drivers (exact match)
    #[validate(
        length(min = 1, max = 32, message = "Plate must be 1-32 characters"),
        custom(function = "not_blank")
    )]
    pub plate: String,

    /// Category used to filter nearby queries
    #[serde(alias = "taksiType")]
    #[validate(
        length(min = 1, max = 50, message = "Taxi type must be 1-50 characters"),
        custom(function = "not_blank")
    )]
    pub taxi_type: String,

    #[validate(length(min = 1, max = 100, message = "Car brand must be 1-100 characters"))]
    pub car_brand: String,

    #[validate(length(min = 1, max = 100, message = "Car model must be 1-100 characters"))]
    pub car_model: String,

    pub location: GeoPoint,

    /// Optional registration time; defaults to now
    #[serde(default)]
    #[validate(custom(function = "registration_time"))]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request DTO for replacing a driver's fields
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDriverDto {
    #[validate(
        length(min = 1, max = 100, message = "First name must be 1-100 characters"),
        custom(function = "not_blank")
    )]
    pub first_name: String,

    #[validate(
        length(min = 1, max = 100, message = "Last name must be 1-100 characters"),
        custom(function = "not_blank")
    )]
    pub last_name: String,

    #[validate(
        length(min = 1, max = 32, message = "Plate must be 1-32 characters"),
        custom(function = "not_blank")
    )]
    pub plate: String,

    #[serde(alias = "taksiType")]
    #[validate(
        length(min = 1, max = 50, message = "Taxi type must be 1-50 characters"),
        custom(function = "not_blank")
    )]
    pub taxi_type: String,

    #[validate(length(min = 1, max = 100, message = "Car brand must be 1-100 characters"))]
    pub car_brand: String,

    #[validate(length(min = 1, max = 100, message = "Car model must be 1-100 characters"))]
    pub car_model: String,

    pub location: GeoPoint,
}

impl From<CreateDriverDto> for DriverFields {
    fn from(dto: CreateDriverDto) -> Self {
        Self {
            first_name: dto.first_name,
            last_name: dto.last_name,
            plate: dto.plate,
            taxi_type: dto.taxi_type,
            car_brand: dto.car_brand,
            car_model: dto.car_model,
            location: dto.location,
        }
    }
}

impl From<UpdateDriverDto> for DriverFields {
    fn from(dto: UpdateDriverDto) -> Self {
        Self {
            first_name: dto.first_name,
            last_name: dto.last_name,
            plate: dto.plate,
            taxi_type: dto.taxi_type,
            car_brand: dto.car_brand,
            car_model: dto.car_model,
            location: dto.location,
        }
    }
}

/// Response DTO for driver registration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDriverResponseDto {
    pub id: String,
    /// "<firstName> <lastName>"
    pub name: String,
}

/// Full driver record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverResponseDto {
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

impl From<Driver> for DriverResponseDto {
    fn from(d: Driver) -> Self {
        Self {
            id: d.id,
            first_name: d.first_name,
            last_name: d.last_name,
            plate: d.plate,
            taxi_type: d.taxi_type,
            car_brand: d.car_brand,
            car_model: d.car_model,
            location: d.location,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl From<&DriverResponseDto> for CreateDriverResponseDto {
    fn from(d: &DriverResponseDto) -> Self {
        Self {
            id: d.id.clone(),
            name: format!("{} {}", d.first_name, d.last_name),
        }
    }
}

/// One page of drivers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverListResponseDto {
    pub drivers: Vec<DriverResponseDto>,
}

/// Query params for nearby driver search
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NearbyDriversQuery {
    /// Latitude of the search origin
    pub lat: f64,
    /// Longitude of the search origin
    pub lon: f64,
    /// Exact-match category filter
    #[serde(alias = "taxi_type")]
    pub taxi_type: String,
    /// Search radius in meters; defaults to the configured radius and is capped at the configured maximum
    #[serde(default)]
    pub max_distance_meters: Option<f64>,
}

/// Lightweight projection of a nearby driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyDriverDto {
    pub first_name: String,
    pub last_name: String,
    pub plate: String,
    pub distance_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_json() -> serde_json::Value {
        serde_json::json!({
            "firstName": "Emre",
            "lastName": "Hekan",
            "plate": "34ABC123",
            "taxiType": "sedan",
            "carBrand": "Fiat",
            "carModel": "Egea",
            "location": {"type": "Point", "coordinates": [29.0, 41.0]}
        })
    }

    #[test]
    fn test_create_dto_deserializes_camel_case() {
        let dto: CreateDriverDto = serde_json::from_value(create_json()).unwrap();
        assert_eq!(dto.taxi_type, "sedan");
        assert_eq!(dto.location.longitude(), 29.0);
        assert!(dto.created_at.is_none());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_create_dto_accepts_legacy_taxi_type_key() {
        let mut json = create_json();
        let object = json.as_object_mut().unwrap();
        object.remove("taxiType");
        object.insert("taksiType".to_string(), serde_json::json!("suv"));

        let dto: CreateDriverDto = serde_json::from_value(json).unwrap();
        assert_eq!(dto.taxi_type, "suv");
    }

    #[test]
    fn test_create_dto_rejects_blank_fields() {
        let mut dto: CreateDriverDto = serde_json::from_value(create_json()).unwrap();
        dto.plate = "   ".to_string();
        dto.first_name = String::new();

        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("plate"));
        assert!(fields.contains_key("first_name"));
    }

    #[test]
    fn test_create_dto_bounds_created_at() {
        let mut json = create_json();
        json["createdAt"] = serde_json::json!("2024-05-01T08:30:00.123456Z");
        let dto: CreateDriverDto = serde_json::from_value(json.clone()).unwrap();
        assert!(dto.validate().is_ok());

        for rejected in [
            "+262142-12-31T23:59:59.999999Z",
            "2999-01-01T00:00:00Z",
            "1969-12-31T23:59:59Z",
        ] {
            json["createdAt"] = serde_json::json!(rejected);
            let dto: CreateDriverDto = serde_json::from_value(json.clone()).unwrap();
            let errors = dto.validate().unwrap_err();
            assert!(
                errors.field_errors().contains_key("created_at"),
                "accepted {}",
                rejected
            );
        }
    }

    #[test]
    fn test_create_response_name() {
        let dto: CreateDriverDto = serde_json::from_value(create_json()).unwrap();
        let created_at = Utc::now();
        let driver = Driver::new("abc".to_string(), dto.into(), created_at);

        let response = DriverResponseDto::from(driver);
        let created = CreateDriverResponseDto::from(&response);
        assert_eq!(created.id, "abc");
        assert_eq!(created.name, "Emre Hekan");
    }
}
