//! API Module
//!
//! HTTP handlers and routing for the cache admin API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Store statistics
//! - `GET /entries/:key` - Metadata for one entry
//! - `DELETE /entries/:key` - Delete one entry
//! - `POST /sweep` - Remove entries older than a horizon

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
