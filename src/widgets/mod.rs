//! Widgets HTTP Module
//!
//! Exposes the widget store over a REST API.
//!
//! ## Responsibilities
//! - **Service**: Applies rate limits before every store operation and pages range reads.
//! - **Validation**: Turns raw JSON bodies and query strings into store drafts.
//! - **Pagination**: Advertises the next page through a `Link` header keyed on `fromZ`.
//! - **Admin**: Reads and replaces rate limit settings at runtime.
//!
//! ## Submodules
//! - **`service`**: `WidgetService`, composing rate limiting with the store.
//! - **`protocol`**: Endpoints, DTOs and header names.
//! - **`handlers`**: Axum handlers and error-to-response mapping.
//! - **`pagination`**: `Link` header construction.
//! - **`routes`**: Router assembly.

pub mod handlers;
pub mod pagination;
pub mod protocol;
pub mod routes;
pub mod service;

#[cfg(test)]
mod tests;
