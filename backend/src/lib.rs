//! # RSS Feeds Backend
//!
//! CRUD service for RSS feed metadata backed by a relational store.
//!
//! ## Architecture
//!
//! - [`validator`]: field-level rule checking with first-error-wins semantics
//! - [`models`]: the `Feed` entity, its business rules and listing options
//! - [`db`]: repository trait, in-memory and Postgres implementations,
//!   optimistic concurrency on update
//! - [`http`]: axum router, request decoding and error classification
//! - [`config`]: command-line and environment configuration for the server
//!
//! Every update is a compare-and-swap on the feed's `version`: of two
//! concurrent writers presenting the same version, exactly one succeeds and
//! the other receives an edit conflict.

pub mod db;
pub mod error;
pub mod models;
pub mod validator;

#[cfg(feature = "http-server")]
pub mod config;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::ErrorKind;
