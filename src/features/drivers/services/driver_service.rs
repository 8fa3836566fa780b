use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use uuid::Uuid;

use crate::core::deadline::Deadline;
use crate::core::error::{AppError, Result};
use crate::features::drivers::dtos::{
    CreateDriverDto, DriverListResponseDto, DriverResponseDto, UpdateDriverDto,
};
use crate::features::drivers::models::{Driver, DriverFields};
use crate::features::drivers::store::DriverStore;
use crate::shared::types::PaginationQuery;

/// Current time at the store's timestamp resolution
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// `updated_at` for the next mutation; always after `previous`
fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match previous.checked_add_signed(Duration::microseconds(1)) {
        Some(after) => Ok(now.max(after)),
        None => Err(AppError::Internal("updatedAt cannot be advanced".to_string())),
    }
}

fn plate_taken(plate: &str) -> AppError {
    AppError::Conflict(format!("Driver with plate '{}' already exists", plate))
}

/// Service for the driver directory
pub struct DriverService {
    store: Arc<dyn DriverStore>,
    deadline: Deadline,
}

impl DriverService {
    pub fn new(store: Arc<dyn DriverStore>, deadline: Deadline) -> Self {
        Self { store, deadline }
    }

    /// Register a new driver with a freshly generated id
    pub async fn create(&self, dto: CreateDriverDto) -> Result<DriverResponseDto> {
        self.deadline
            .run("create_driver", async {
                let created_at = dto
                    .created_at
                    .map(|t| t.trunc_subsecs(6))
                    .unwrap_or_else(now);
                let fields = DriverFields::from(dto);

                if self.store.find_by_plate(&fields.plate).await?.is_some() {
                    return Err(plate_taken(&fields.plate));
                }

                let driver = Driver::new(Uuid::new_v4().to_string(), fields, created_at);
                self.store.insert(&driver).await?;

                tracing::info!(
                    "Driver created: id={}, plate={}, name={}",
                    driver.id,
                    driver.plate,
                    driver.full_name()
                );

                Ok(driver.into())
            })
            .await
    }

    /// Replace every mutable field of an existing driver
    pub async fn update(&self, id: &str, dto: UpdateDriverDto) -> Result<DriverResponseDto> {
        self.deadline
            .run("update_driver", async {
                let existing = self.resolve(id).await?;
                let fields = DriverFields::from(dto);

                if let Some(owner) = self.store.find_by_plate(&fields.plate).await? {
                    if owner.id != existing.id {
                        return Err(plate_taken(&fields.plate));
                    }
                }

                let updated_at = next_updated_at(existing.updated_at, now())?;
                let updated = existing.replaced_with(fields, updated_at);
                self.store.replace(&existing.id, &updated).await?;

                tracing::info!("Driver updated: id={}, plate={}", updated.id, updated.plate);

                Ok(updated.into())
            })
            .await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<DriverResponseDto> {
        self.deadline
            .run("get_driver_by_id", async { self.resolve(id).await.map(Into::into) })
            .await
    }

    /// Exact, case-sensitive plate lookup
    pub async fn get_by_plate(&self, plate: &str) -> Result<DriverResponseDto> {
        if plate.trim().is_empty() {
            return Err(AppError::Validation("Plate must not be empty".to_string()));
        }

        self.deadline
            .run("get_driver_by_plate", async {
                self.store
                    .find_by_plate(plate)
                    .await?
                    .map(Into::into)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Driver with plate '{}' not found", plate))
                    })
            })
            .await
    }

    pub async fn list(&self, query: &PaginationQuery) -> Result<DriverListResponseDto> {
        query.validate()?;
        let skip = query
            .offset()
            .ok_or_else(|| AppError::Validation(format!("page {} is out of range", query.page)))?;

        self.deadline
            .run("list_drivers", async {
                let drivers = self.store.find_page(skip, query.limit()).await?;
                Ok(DriverListResponseDto {
                    drivers: drivers.into_iter().map(Into::into).collect(),
                })
            })
            .await
    }

    /// Look a driver up by id, trying the canonical UUID form first and the
    /// raw value second
    async fn resolve(&self, id: &str) -> Result<Driver> {
        if id.trim().is_empty() {
            return Err(AppError::Validation("Driver id must not be empty".to_string()));
        }

        if let Ok(uuid) = Uuid::parse_str(id) {
            let canonical = uuid.to_string();
            if let Some(driver) = self.store.find_by_id(&canonical).await? {
                return Ok(driver);
            }
            if canonical == id {
                return Err(AppError::NotFound(format!("Driver '{}' not found", id)));
            }
        }

        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Driver '{}' not found", id)))
    }
}
