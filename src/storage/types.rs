//! Widget Data Types
//!
//! Value types stored by the [`WidgetStore`](super::memory::WidgetStore) and the
//! drafts callers hand to it. Stored widgets are never mutated in place: every
//! change produces a new `Widget` value that replaces the old one in both indexes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A positionable rectangle, ordered by its `z` coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: String,
    pub x: i32,
    pub y: i32,
    /// Ordering coordinate. Unique across all live widgets.
    pub z: i32,
    pub width: i32,
    pub height: i32,
    /// Milliseconds since the Unix epoch of the last create or update.
    pub last_modified: u64,
}

impl Widget {
    /// Copy of this widget moved one coordinate up. `last_modified` is kept,
    /// a shift is not a modification of the widget itself.
    pub(crate) fn moved_up(&self) -> Self {
        Self {
            z: self.z + 1,
            ..self.clone()
        }
    }
}

/// Fields of a widget to be created. `z` is optional: when absent the widget
/// is appended above the current highest one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetToCreate {
    pub x: i32,
    pub y: i32,
    pub z: Option<i32>,
    pub width: i32,
    pub height: i32,
}

/// Partial update. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetToUpdate {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub z: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl WidgetToUpdate {
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.z.is_none()
            && self.width.is_none()
            && self.height.is_none()
    }

    /// Builds the replacement for `existing`.
    pub(crate) fn apply(&self, existing: &Widget, now_ms: u64) -> Widget {
        Widget {
            id: existing.id.clone(),
            x: self.x.unwrap_or(existing.x),
            y: self.y.unwrap_or(existing.y),
            z: self.z.unwrap_or(existing.z),
            width: self.width.unwrap_or(existing.width),
            height: self.height.unwrap_or(existing.height),
            last_modified: now_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Could not find Widget {0}")]
    NotFound(String),
    #[error("z coordinate would exceed {}", i32::MAX)]
    Overflow,
}
