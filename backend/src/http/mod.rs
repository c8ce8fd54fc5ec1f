//! HTTP server module for the feeds API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Router (router.rs)                                      │
//! │  - Panic recovery, tracing, compression, body limit      │
//! │  - 404 / 405 fallbacks                                   │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Handlers (handlers.rs)                                  │
//! │  - Decode (request.rs), validate, dispatch               │
//! │  - Failures classified by AppError (error.rs)            │
//! └───────────────────┬──────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────────────────┐
//! │  Repository Layer (db/)                                  │
//! │  - LocalRepository / PostgresRepository                  │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod request;
pub mod router;
pub mod server;
pub mod state;

pub use error::AppError;
pub use router::create_router;
pub use server::{serve, serve_with_shutdown, SHUTDOWN_TIMEOUT};
pub use state::AppState;
