pub mod config;
pub mod database;
pub mod deadline;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod openapi;
