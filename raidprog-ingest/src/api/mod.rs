//! HTTP API handlers for raidprog-ingest

pub mod characters;
pub mod health;
pub mod import;

pub use characters::character_routes;
pub use health::health_routes;
pub use import::import_routes;
