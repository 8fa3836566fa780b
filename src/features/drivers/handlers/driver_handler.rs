use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::drivers::dtos::{
    CreateDriverDto, CreateDriverResponseDto, DriverListResponseDto, DriverResponseDto,
    NearbyDriverDto, NearbyDriversQuery, UpdateDriverDto,
};
use crate::features::drivers::services::{DriverService, NearbyDriverService};
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Register a new driver
#[utoipa::path(
    post,
    path = "/api/drivers",
    request_body = CreateDriverDto,
    responses(
        (status = 201, description = "Driver registered", body = ApiResponse<CreateDriverResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Plate already registered"),
        (status = 504, description = "Storage operation timed out")
    ),
    tag = "drivers"
)]
pub async fn create_driver(
    State(service): State<Arc<DriverService>>,
    AppJson(dto): AppJson<CreateDriverDto>,
) -> Result<(StatusCode, Json<ApiResponse<CreateDriverResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let driver = service.create(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(CreateDriverResponseDto::from(&driver)),
            Some("Driver created".to_string()),
            None,
        )),
    ))
}

/// Replace a driver's fields
#[utoipa::path(
    put,
    path = "/api/drivers/{id}",
    params(
        ("id" = String, Path, description = "Driver id")
    ),
    request_body = UpdateDriverDto,
    responses(
        (status = 200, description = "Driver updated", body = ApiResponse<DriverResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Driver not found"),
        (status = 409, description = "Plate belongs to another driver")
    ),
    tag = "drivers"
)]
pub async fn update_driver(
    State(service): State<Arc<DriverService>>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<UpdateDriverDto>,
) -> Result<Json<ApiResponse<DriverResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let driver = service.update(&id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(driver),
        Some("Driver updated".to_string()),
        None,
    )))
}

/// Get a driver by id
#[utoipa::path(
    get,
    path = "/api/drivers/{id}",
    params(
        ("id" = String, Path, description = "Driver id; UUIDs are accepted in any standard encoding")
    ),
    responses(
        (status = 200, description = "Driver details", body = ApiResponse<DriverResponseDto>),
        (status = 404, description = "Driver not found")
    ),
    tag = "drivers"
)]
pub async fn get_driver(
    State(service): State<Arc<DriverService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DriverResponseDto>>> {
    let driver = service.get_by_id(&id).await?;
    Ok(Json(ApiResponse::success(Some(driver), None, None)))
}

/// Get a driver by license plate
#[utoipa::path(
    get,
    path = "/api/drivers/plate/{plate}",
    params(
        ("plate" = String, Path, description = "License plate (exact match)")
    ),
    responses(
        (status = 200, description = "Driver details", body = ApiResponse<DriverResponseDto>),
        (status = 404, description = "Driver not found")
    ),
    tag = "drivers"
)]
pub async fn get_driver_by_plate(
    State(service): State<Arc<DriverService>>,
    Path(plate): Path<String>,
) -> Result<Json<ApiResponse<DriverResponseDto>>> {
    let driver = service.get_by_plate(&plate).await?;
    Ok(Json(ApiResponse::success(Some(driver), None, None)))
}

/// List drivers page by page
#[utoipa::path(
    get,
    path = "/api/drivers",
    params(PaginationQuery),
    responses(
        (status = 200, description = "One page of drivers", body = ApiResponse<DriverListResponseDto>),
        (status = 400, description = "Invalid pagination")
    ),
    tag = "drivers"
)]
pub async fn list_drivers(
    State(service): State<Arc<DriverService>>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> Result<Json<ApiResponse<DriverListResponseDto>>> {
    let drivers = service.list(&query).await?;
    Ok(Json(ApiResponse::success(
        Some(drivers),
        None,
        Some(Meta {
            page: query.page,
            page_size: query.limit(),
        }),
    )))
}

/// Find drivers of a taxi type near a point, nearest first
#[utoipa::path(
    get,
    path = "/api/drivers/nearby",
    params(NearbyDriversQuery),
    responses(
        (status = 200, description = "Nearby drivers ordered by distance", body = ApiResponse<Vec<NearbyDriverDto>>),
        (status = 400, description = "Invalid coordinates, taxi type or radius"),
        (status = 500, description = "Spatial index could not be provisioned"),
        (status = 504, description = "Storage operation timed out")
    ),
    tag = "drivers"
)]
pub async fn find_nearby_drivers(
    State(service): State<Arc<NearbyDriverService>>,
    AppQuery(query): AppQuery<NearbyDriversQuery>,
) -> Result<Json<ApiResponse<Vec<NearbyDriverDto>>>> {
    let drivers = service.find_nearby(&query).await?;
    Ok(Json(ApiResponse::success(Some(drivers), None, None)))
}
