//! Library crate for buzz-back, exposing modules for binaries and integration tests.

/// Runtime configuration loaded from disk.
pub mod config;
/// Storage layer.
pub mod dao;
mod dto;
mod error;
/// HTTP routers.
pub mod routes;
pub mod services;
/// In-memory games, sessions and shared application state.
pub mod state;
