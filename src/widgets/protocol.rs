//! Widgets API Protocol
//!
//! Endpoints, request/response DTOs and header names of the public REST API.
//! Request bodies are deserialized with every field optional and validated
//! afterwards, so a missing field yields a readable 400 instead of a generic
//! deserialization failure.

use crate::storage::types::{WidgetToCreate, WidgetToUpdate};
use serde::{Deserialize, Serialize};

// --- API Endpoints ---

pub const ENDPOINT_WIDGETS: &str = "/widgets";
pub const ENDPOINT_WIDGET: &str = "/widgets/:id";
pub const ENDPOINT_RATE_LIMITS: &str = "/admin/rate-limits";

// --- Query parameters ---

pub const PER_PAGE_QP: &str = "perPage";
pub const FROM_Z_QP: &str = "fromZ";

// --- Rate limit headers ---

pub const X_REQUESTS_PER_MINUTE: &str = "x-requests-per-minute";
pub const X_REQUESTS_AVAILABLE: &str = "x-requests-available";
pub const X_NANOS_UNTIL_REFILL: &str = "x-nanos-until-refill";

// --- Data Transfer Objects ---

/// Body of `POST /widgets`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateWidgetRequest {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub z: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl TryFrom<CreateWidgetRequest> for WidgetToCreate {
    type Error = String;

    fn try_from(req: CreateWidgetRequest) -> Result<Self, Self::Error> {
        Ok(WidgetToCreate {
            x: required(req.x, "x")?,
            y: required(req.y, "y")?,
            z: req.z,
            width: required(req.width, "width")?,
            height: required(req.height, "height")?,
        })
    }
}

/// Body of `PUT /widgets/{id}`. At least one field must be present.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateWidgetRequest {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub z: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl TryFrom<UpdateWidgetRequest> for WidgetToUpdate {
    type Error = String;

    fn try_from(req: UpdateWidgetRequest) -> Result<Self, Self::Error> {
        let patch = WidgetToUpdate {
            x: req.x,
            y: req.y,
            z: req.z,
            width: req.width,
            height: req.height,
        };
        if patch.is_empty() {
            return Err("Must provide at least one field for update.".to_string());
        }
        Ok(patch)
    }
}

/// Query string of `GET /widgets`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "perPage")]
    pub per_page: Option<i64>,
    #[serde(rename = "fromZ")]
    pub from_z: Option<i32>,
}

/// Page size policy for `GET /widgets`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub default_per_page: usize,
    pub max_per_page: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            default_per_page: 10,
            max_per_page: 500,
        }
    }
}

impl Paging {
    /// Effective page size: the default when absent, capped at the maximum.
    pub fn resolve(&self, requested: Option<i64>) -> Result<usize, String> {
        match requested {
            None => Ok(self.default_per_page),
            Some(n) if n < 1 => Err(format!("Parameter {} must be at least 1.", PER_PAGE_QP)),
            Some(n) => Ok(usize::try_from(n)
                .unwrap_or(usize::MAX)
                .min(self.max_per_page)),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

fn required(value: Option<i32>, field: &str) -> Result<i32, String> {
    value.ok_or_else(|| format!("Field {} cannot be empty.", field))
}
