//! Axum HTTP surface for medifetch (C11).
//!
//! A thin adapter: every handler does argument extraction, one call
//! into [`medifetch_worker::DownloadService`], and response mapping.
//! No business logic lives here -- it belongs in `medifetch-worker`.

#![deny(unsafe_code)]

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::HttpError;
pub use routes::create_router;
pub use state::{AppState, HttpContext, SandboxConfig};
