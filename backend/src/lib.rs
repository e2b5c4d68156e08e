//! # Yapper Users
//!
//! User identity and follow-graph service.
//!
//! This crate owns users, the directed "follow" relationships between them,
//! and two per-user auxiliary records (profile and preferences). It decides
//! whether a requested mutation is valid, merges partial updates into stored
//! records, and keeps relationship state consistent.
//!
//! ## Architecture
//!
//! - [`models`]: Domain records, request shapes and the three-state [`models::Field`]
//! - [`db`]: Repository traits and the in-memory / Postgres backends
//! - [`services`]: Business rules over injected repositories
//! - [`events`]: Fire-and-forget request event sinks
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod events;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
