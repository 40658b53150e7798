// Library exports for folio
// This allows integration tests and the binary to share one module tree

pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod extractors;
pub mod repository;
pub mod routes;
pub mod scaffold;
pub mod state;
