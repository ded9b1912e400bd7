//! Rate Limiting Module
//!
//! Per-operation and global request quotas, expressed in requests per minute.
//!
//! ## Core Concepts
//! - **Token bucket**: Each quota is a bucket holding `rpm` tokens that refills
//!   completely once per minute.
//! - **Precedence**: An operation's own bucket wins over the global one. With
//!   neither configured the operation is not limited.
//! - **Hot reconfiguration**: `RateLimitService::apply` swaps buckets at runtime,
//!   keeping the state of any bucket whose rpm did not change.

pub mod bucket;
pub mod service;
pub mod types;
