// src/lib.rs

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

// The binary and the integration tests both build the app through this.
pub use routes::create_router;
