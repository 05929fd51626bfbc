//! Development tools for the catalog staging core
//!
//! - [`file_backend`] - JSON-file stand-ins for the backend collaborators
//! - [`replay`] - replays a scripted editing session against `CatalogStaging`

pub mod file_backend;
pub mod replay;
