use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub drivers: DriversConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Deadline applied to every directory and proximity operation
    pub request_timeout: Duration,
}

/// Which persistence backend serves the driver directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Required when the backend is Postgres
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Search radius settings for nearby driver queries
#[derive(Debug, Clone)]
pub struct DriversConfig {
    /// Radius used when the caller does not supply one
    pub nearby_distance_meters: f64,
    /// Upper bound for caller-supplied radii
    pub nearby_max_distance_meters: f64,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            drivers: DriversConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3;

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

        if request_timeout_secs == 0 {
            return Err("REQUEST_TIMEOUT_SECS must be greater than zero".to_string());
        }

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageBackend {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => StorageBackend::parse(&value)?,
            Err(_) => StorageBackend::Postgres,
        };

        let url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if backend == StorageBackend::Postgres && url.is_none() {
            return Err("DATABASE_URL must be set".to_string());
        }

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            backend,
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl DriversConfig {
    const DEFAULT_NEARBY_DISTANCE_METERS: f64 = 3_000.0;
    const DEFAULT_NEARBY_MAX_DISTANCE_METERS: f64 = 20_000.0;

    pub fn from_env() -> Result<Self, String> {
        let nearby_distance_meters = env::var("NEARBY_DISTANCE_METERS")
            .unwrap_or_else(|_| Self::DEFAULT_NEARBY_DISTANCE_METERS.to_string())
            .parse::<f64>()
            .map_err(|_| "NEARBY_DISTANCE_METERS must be a valid number".to_string())?;

        let nearby_max_distance_meters = env::var("NEARBY_MAX_DISTANCE_METERS")
            .unwrap_or_else(|_| Self::DEFAULT_NEARBY_MAX_DISTANCE_METERS.to_string())
            .parse::<f64>()
            .map_err(|_| "NEARBY_MAX_DISTANCE_METERS must be a valid number".to_string())?;

        Self::new(nearby_distance_meters, nearby_max_distance_meters)
    }

    pub fn new(nearby_distance_meters: f64, nearby_max_distance_meters: f64) -> Result<Self, String> {
        if !(nearby_distance_meters.is_finite() && nearby_distance_meters > 0.0) {
            return Err("NEARBY_DISTANCE_METERS must be a positive number".to_string());
        }
        if !(nearby_max_distance_meters.is_finite() && nearby_max_distance_meters > 0.0) {
            return Err("NEARBY_MAX_DISTANCE_METERS must be a positive number".to_string());
        }
        if nearby_distance_meters > nearby_max_distance_meters {
            return Err(
                "NEARBY_DISTANCE_METERS must not exceed NEARBY_MAX_DISTANCE_METERS".to_string(),
            );
        }

        Ok(Self {
            nearby_distance_meters,
            nearby_max_distance_meters,
        })
    }
}

impl Default for DriversConfig {
    fn default() -> Self {
        Self {
            nearby_distance_meters: Self::DEFAULT_NEARBY_DISTANCE_METERS,
            nearby_max_distance_meters: Self::DEFAULT_NEARBY_MAX_DISTANCE_METERS,
        }
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Taxihub API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Driver directory and nearby driver matching".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(
            StorageBackend::parse("postgres").unwrap(),
            StorageBackend::Postgres
        );
        assert_eq!(
            StorageBackend::parse(" Memory ").unwrap(),
            StorageBackend::Memory
        );
        assert!(StorageBackend::parse("mongo").is_err());
    }

    #[test]
    fn test_drivers_config_rejects_default_above_max() {
        assert!(DriversConfig::new(5_000.0, 1_000.0).is_err());
        assert!(DriversConfig::new(0.0, 1_000.0).is_err());
        assert!(DriversConfig::new(f64::NAN, 1_000.0).is_err());

        let config = DriversConfig::new(1_000.0, 1_000.0).unwrap();
        assert_eq!(config.nearby_distance_meters, 1_000.0);
    }

    #[test]
    fn test_swagger_credentials() {
        let mut config = SwaggerConfig {
            username: Some("admin".to_string()),
            password: None,
            title: "t".to_string(),
            version: "v".to_string(),
            description: "d".to_string(),
        };
        assert_eq!(config.credentials(), None);

        config.password = Some("secret".to_string());
        assert_eq!(config.credentials(), Some("admin:secret".to_string()));
    }
}
