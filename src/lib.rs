//! Z-Ordered Widget Service Library
//!
//! This library crate defines the modules behind the `widget-service` binary (`main.rs`).
//!
//! ## Architecture Modules
//! - **`storage`**: The in-memory widget store. Keeps widgets indexed by id and by
//!   z-coordinate, and shifts overlapping widgets upward so that z stays unique.
//! - **`ratelimit`**: Token buckets with interval refill, one global and one per
//!   operation, reconfigurable while the service runs.
//! - **`widgets`**: The HTTP surface. Validation, pagination, rate-limit headers and
//!   error mapping on top of the store.
//! - **`config`**: Command line and environment configuration.

pub mod config;
pub mod ratelimit;
pub mod storage;
pub mod widgets;
