//! Axum router for the widgets API.
//!
//! ```text
//! /widgets              GET (paged list), POST (create)
//! /widgets/:id          GET, PUT (partial update), DELETE
//! /admin/rate-limits    GET, PUT (runtime reconfiguration)
//! ```

use super::handlers::*;
use super::protocol::{ENDPOINT_RATE_LIMITS, ENDPOINT_WIDGET, ENDPOINT_WIDGETS, Paging};
use super::service::WidgetService;

use axum::Router;
use axum::extract::Extension;
use axum::routing::get;
use std::sync::Arc;

pub fn router(service: Arc<WidgetService>, paging: Paging) -> Router {
    Router::new()
        .route(
            ENDPOINT_WIDGETS,
            get(handle_list_widgets).post(handle_create_widget),
        )
        .route(
            ENDPOINT_WIDGET,
            get(handle_get_widget)
                .put(handle_update_widget)
                .delete(handle_delete_widget),
        )
        .route(
            ENDPOINT_RATE_LIMITS,
            get(handle_get_rate_limits).put(handle_put_rate_limits),
        )
        .layer(Extension(service))
        .layer(Extension(paging))
}
