//! Widget Storage Module
//!
//! In-memory repository of widgets kept in two coupled indexes: by id and by
//! the `z` ordering coordinate.
//!
//! ## Core Concepts
//! - **Uniqueness**: No two live widgets share an id or a `z`.
//! - **Shift**: Inserting or moving onto an occupied `z` moves every widget at
//!   or above it up by one, as a single step invisible to range readers.
//! - **Append**: A widget created without `z` lands just above the current top.
//! - **Collaborators**: Id generation and the clock are injected (`providers`).

pub mod memory;
pub mod providers;
pub mod types;
