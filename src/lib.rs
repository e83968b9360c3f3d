//! Library crate for archery-score-back, exposing modules for binaries and integration tests.

/// Runtime configuration loaded from `config/app.json`.
pub mod config;
/// Storage models, traits and backends.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum route trees.
pub mod routes;
/// Application services invoked by the routes.
pub mod services;
/// Scoring state machine, session controller and shared application state.
pub mod state;
