use super::pagination::next_page_link;
use super::protocol::{
    CreateWidgetRequest, ErrorResponse, FROM_Z_QP, ListParams, Paging, UpdateWidgetRequest,
    X_NANOS_UNTIL_REFILL, X_REQUESTS_AVAILABLE, X_REQUESTS_PER_MINUTE,
};
use super::service::{ServiceError, ServiceResponse, WidgetService};
use crate::ratelimit::types::{RateLimitSettings, RateLimitStat};
use crate::storage::types::{StoreError, WidgetToCreate, WidgetToUpdate};

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, OriginalUri, Path, Query};
use axum::http::header::{HOST, LINK};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, stat) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::Service(ServiceError::TooManyRequests(stat)) => {
                (StatusCode::TOO_MANY_REQUESTS, Some(*stat))
            }
            ApiError::Service(ServiceError::Store(StoreError::NotFound(_))) => {
                (StatusCode::NOT_FOUND, None)
            }
            ApiError::Service(ServiceError::Store(StoreError::Overflow)) => {
                (StatusCode::CONFLICT, None)
            }
        };

        let message = self.to_string();
        tracing::debug!("Returning {} {}", status, message);

        let mut response = (
            status,
            Json(ErrorResponse {
                status: status.as_u16(),
                message,
            }),
        )
            .into_response();
        add_rate_limit_headers(response.headers_mut(), stat.as_ref());
        response
    }
}

pub async fn handle_create_widget(
    Extension(service): Extension<Arc<WidgetService>>,
    body: Result<Json<CreateWidgetRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    let draft = WidgetToCreate::try_from(req).map_err(ApiError::Validation)?;

    let created = service.create(draft)?;
    tracing::info!("Widget created: {} at z={}", created.model.id, created.model.z);
    Ok(respond(StatusCode::CREATED, created))
}

pub async fn handle_get_widget(
    Extension(service): Extension<Arc<WidgetService>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(respond(StatusCode::OK, service.read_one(&id)?))
}

pub async fn handle_list_widgets(
    Extension(service): Extension<Arc<WidgetService>>,
    Extension(paging): Extension<Paging>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::Validation(e.body_text()))?;
    let per_page = paging
        .resolve(params.per_page)
        .map_err(ApiError::Validation)?;

    let found = service.read_all(per_page, params.from_z)?;
    let link = found.model.next.as_ref().map(|next| {
        let host = headers.get(HOST).and_then(|value| value.to_str().ok());
        next_page_link(host, &uri, FROM_Z_QP, &next.z.to_string())
    });

    let mut response = respond(
        StatusCode::OK,
        ServiceResponse {
            model: found.model.elements,
            rate_limit: found.rate_limit,
        },
    );
    if let Some(link) = link
        && let Ok(value) = HeaderValue::from_str(&link)
    {
        response.headers_mut().insert(LINK, value);
    }
    Ok(response)
}

pub async fn handle_update_widget(
    Extension(service): Extension<Arc<WidgetService>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateWidgetRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    let patch = WidgetToUpdate::try_from(req).map_err(ApiError::Validation)?;

    let updated = service.update(&id, patch)?;
    tracing::info!("Widget updated: {} at z={}", updated.model.id, updated.model.z);
    Ok(respond(StatusCode::OK, updated))
}

pub async fn handle_delete_widget(
    Extension(service): Extension<Arc<WidgetService>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let deleted = service.delete(&id)?;
    tracing::info!("Widget deleted: {}", deleted.model.id);
    Ok(respond(StatusCode::OK, deleted))
}

pub async fn handle_get_rate_limits(
    Extension(service): Extension<Arc<WidgetService>>,
) -> Json<RateLimitSettings> {
    Json(service.rate_limits().settings())
}

pub async fn handle_put_rate_limits(
    Extension(service): Extension<Arc<WidgetService>>,
    body: Result<Json<RateLimitSettings>, JsonRejection>,
) -> Result<Json<RateLimitSettings>, ApiError> {
    let Json(settings) = body.map_err(|e| ApiError::Validation(e.body_text()))?;
    settings.validate().map_err(ApiError::Validation)?;

    service.rate_limits().apply(&settings);
    tracing::info!("Rate limits reconfigured");
    Ok(Json(settings))
}

fn respond<T: Serialize>(status: StatusCode, resp: ServiceResponse<T>) -> Response {
    let mut response = (status, Json(resp.model)).into_response();
    add_rate_limit_headers(response.headers_mut(), resp.rate_limit.as_ref());
    response
}

fn add_rate_limit_headers(headers: &mut HeaderMap, stat: Option<&RateLimitStat>) {
    let Some(stat) = stat else {
        return;
    };
    headers.insert(
        HeaderName::from_static(X_REQUESTS_PER_MINUTE),
        HeaderValue::from(stat.rpm),
    );
    headers.insert(
        HeaderName::from_static(X_REQUESTS_AVAILABLE),
        HeaderValue::from(stat.available),
    );
    headers.insert(
        HeaderName::from_static(X_NANOS_UNTIL_REFILL),
        HeaderValue::from(stat.nanos_until_refill),
    );
}
