//! Imghost - personal image hosting core
//!
//! This library crate exposes the services and lifecycle for the binary and
//! for integration testing.

pub mod accounts;
pub mod blobs;
pub mod config;
pub mod context;
pub mod images;
pub mod logging;
pub mod sweeper;

pub use context::AppContext;
