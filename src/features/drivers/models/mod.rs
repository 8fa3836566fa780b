mod driver;
mod location;

pub use driver::{Driver, DriverFields};
pub use location::{GeoPoint, GeometryType};
