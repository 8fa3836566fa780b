use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{DriverStore, IndexCreation, IndexDescriptor, IndexKind};
use crate::core::error::{AppError, Result, StorageError};
use crate::features::drivers::models::{Driver, GeoPoint};

const DRIVERS_TABLE: &str = "drivers";
const PLATE_CONSTRAINT: &str = "drivers_plate_key";

/// SQLSTATE for `duplicate_table`, raised when an index name is taken
const DUPLICATE_TABLE: &str = "42P07";

const SELECT_DRIVER: &str = r#"
    SELECT
        id, first_name, last_name, plate, taxi_type, car_brand, car_model,
        ST_X(location::geometry) AS lon,
        ST_Y(location::geometry) AS lat,
        created_at, updated_at
    FROM drivers
"#;

/// Database row for a driver; location is unpacked into lon/lat columns
#[derive(Debug, Clone, FromRow)]
struct DriverRow {
    id: String,
    first_name: String,
    last_name: String,
    plate: String,
    taxi_type: String,
    car_brand: String,
    car_model: String,
    lon: f64,
    lat: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DriverRow> for Driver {
    type Error = AppError;

    fn try_from(row: DriverRow) -> Result<Self> {
        let location = GeoPoint::new(row.lon, row.lat).map_err(|e| {
            StorageError::Backend(format!("Driver {} has an invalid location: {}", row.id, e))
        })?;

        Ok(Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            plate: row.plate,
            taxi_type: row.taxi_type,
            car_brand: row.car_brand,
            car_model: row.car_model,
            location,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn rows_into_drivers(rows: Vec<DriverRow>) -> Result<Vec<Driver>> {
    rows.into_iter().map(Driver::try_from).collect()
}

/// Map unique violations on the plate constraint to a conflict
fn map_write_error(e: sqlx::Error, driver: &Driver) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return if db.constraint() == Some(PLATE_CONSTRAINT) {
                AppError::Conflict(format!(
                    "Driver with plate '{}' already exists",
                    driver.plate
                ))
            } else {
                AppError::Conflict(format!("Driver '{}' already exists", driver.id))
            };
        }
    }

    tracing::error!("Failed to write driver {}: {:?}", driver.id, e);
    AppError::from(e)
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Build a descriptor from a `pg_indexes.indexdef` statement, e.g.
/// `CREATE INDEX drivers_location_gist ON public.drivers USING gist (location)`
fn parse_index_definition(name: &str, definition: &str) -> IndexDescriptor {
    let lowered = definition.to_ascii_lowercase();
    let kind = if lowered.contains(" using gist ") {
        IndexKind::SpatialPoint
    } else {
        IndexKind::Standard
    };

    let fields = match (lowered.find('('), lowered.rfind(')')) {
        (Some(start), Some(end)) if start < end => lowered[start + 1..end]
            .split(',')
            .map(|f| f.trim().trim_matches('"').to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        _ => Vec::new(),
    };

    IndexDescriptor {
        name: name.to_string(),
        fields,
        kind,
    }
}

/// PostgreSQL + PostGIS driver store
pub struct PgDriverStore {
    pool: PgPool,
}

impl PgDriverStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverStore for PgDriverStore {
    async fn insert(&self, driver: &Driver) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO drivers (
                id, first_name, last_name, plate, taxi_type, car_brand, car_model,
                location, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                ST_SetSRID(ST_MakePoint($8, $9), 4326)::geography, $10, $11
            )
            "#,
        )
        .bind(&driver.id)
        .bind(&driver.first_name)
        .bind(&driver.last_name)
        .bind(&driver.plate)
        .bind(&driver.taxi_type)
        .bind(&driver.car_brand)
        .bind(&driver.car_model)
        .bind(driver.location.longitude())
        .bind(driver.location.latitude())
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, driver))?;

        Ok(())
    }

    async fn replace(&self, id: &str, driver: &Driver) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE drivers
            SET
                first_name = $2,
                last_name = $3,
                plate = $4,
                taxi_type = $5,
                car_brand = $6,
                car_model = $7,
                location = ST_SetSRID(ST_MakePoint($8, $9), 4326)::geography,
                created_at = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&driver.first_name)
        .bind(&driver.last_name)
        .bind(&driver.plate)
        .bind(&driver.taxi_type)
        .bind(&driver.car_brand)
        .bind(&driver.car_model)
        .bind(driver.location.longitude())
        .bind(driver.location.latitude())
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, driver))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Driver '{}' not found", id)));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Driver>> {
        let row = sqlx::query_as::<_, DriverRow>(&format!("{} WHERE id = $1", SELECT_DRIVER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get driver by id: {:?}", e);
                AppError::from(e)
            })?;

        row.map(Driver::try_from).transpose()
    }

    async fn find_by_plate(&self, plate: &str) -> Result<Option<Driver>> {
        let row = sqlx::query_as::<_, DriverRow>(&format!("{} WHERE plate = $1", SELECT_DRIVER))
            .bind(plate)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get driver by plate: {:?}", e);
                AppError::from(e)
            })?;

        row.map(Driver::try_from).transpose()
    }

    async fn find_page(&self, skip: i64, limit: i64) -> Result<Vec<Driver>> {
        let rows = sqlx::query_as::<_, DriverRow>(&format!(
            "{} ORDER BY created_at, id OFFSET $1 LIMIT $2",
            SELECT_DRIVER
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list drivers: {:?}", e);
            AppError::from(e)
        })?;

        rows_into_drivers(rows)
    }

    async fn find_near(
        &self,
        origin: GeoPoint,
        max_distance_meters: f64,
        taxi_type: &str,
    ) -> Result<Vec<Driver>> {
        // Geography distances are in meters; <-> orders by the spatial index
        let rows = sqlx::query_as::<_, DriverRow>(&format!(
            r#"
            {}
            WHERE taxi_type = $3
            AND ST_DWithin(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $4)
            ORDER BY location <-> ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography
            "#,
            SELECT_DRIVER
        ))
        .bind(origin.longitude())
        .bind(origin.latitude())
        .bind(taxi_type)
        .bind(max_distance_meters)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find nearby drivers: {:?}", e);
            AppError::from(e)
        })?;

        rows_into_drivers(rows)
    }

    async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT indexname::text, indexdef
            FROM pg_indexes
            WHERE schemaname = current_schema() AND tablename = $1
            "#,
        )
        .bind(DRIVERS_TABLE)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list driver indexes: {:?}", e);
            AppError::from(e)
        })?;

        Ok(rows
            .iter()
            .map(|(name, definition)| parse_index_definition(name, definition))
            .collect())
    }

    async fn create_index(&self, index: &IndexDescriptor) -> Result<IndexCreation> {
        if !is_identifier(&index.name)
            || index.fields.is_empty()
            || !index.fields.iter().all(|f| is_identifier(f))
        {
            return Err(StorageError::IndexProvisioning(format!(
                "Invalid index definition: {:?}",
                index
            ))
            .into());
        }

        let method = match index.kind {
            IndexKind::SpatialPoint => "GIST",
            IndexKind::Standard => "BTREE",
        };
        // Identifiers cannot be bound as parameters; they are checked above
        let statement = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} USING {} ({})",
            index.name,
            DRIVERS_TABLE,
            method,
            index.fields.join(", ")
        );

        match sqlx::query(&statement).execute(&self.pool).await {
            Ok(_) => Ok(IndexCreation::Created),
            // Concurrent CREATE INDEX IF NOT EXISTS can still collide in the catalog
            Err(sqlx::Error::Database(db))
                if db.code().as_deref() == Some(DUPLICATE_TABLE) || db.is_unique_violation() =>
            {
                Ok(IndexCreation::AlreadyExists)
            }
            Err(e) => {
                tracing::error!("Failed to create index {}: {:?}", index.name, e);
                Err(AppError::from(e))
            }
        }
    }
}
