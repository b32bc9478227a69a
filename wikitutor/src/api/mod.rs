//! API module for the Wiki Tutor HTTP server

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{ApiServer, ApiServerConfig};
