/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Radius of the Earth used by the great-circle distance calculation
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// How far ahead of the server clock a supplied `createdAt` may be
pub const CREATED_AT_MAX_SKEW_SECS: i64 = 300;
