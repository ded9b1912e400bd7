use crate::ratelimit::service::RateLimitService;
use crate::ratelimit::types::{RateLimitOperation, RateLimitStat};
use crate::storage::memory::WidgetStore;
use crate::storage::types::{StoreError, Widget, WidgetToCreate, WidgetToUpdate};

use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Too many requests.")]
    TooManyRequests(RateLimitStat),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A service result paired with the rate limit stat of the request, if any
/// limit applied to it.
#[derive(Debug)]
pub struct ServiceResponse<T> {
    pub model: T,
    pub rate_limit: Option<RateLimitStat>,
}

/// One page of results plus the first element of the following page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub elements: Vec<T>,
    pub next: Option<T>,
}

impl<T> Page<T> {
    /// Splits `elements` (fetched with one extra item) into a page of
    /// `per_page` and the lookahead item.
    pub fn of(mut elements: Vec<T>, per_page: usize) -> Self {
        if elements.len() <= per_page {
            return Self {
                elements,
                next: None,
            };
        }
        let next = elements.drain(per_page..).next();
        Self { elements, next }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// CRUD entry point used by the HTTP handlers.
pub struct WidgetService {
    store: Arc<WidgetStore>,
    limits: Arc<RateLimitService>,
}

impl WidgetService {
    pub fn new(store: Arc<WidgetStore>, limits: Arc<RateLimitService>) -> Self {
        Self { store, limits }
    }

    pub fn create(&self, draft: WidgetToCreate) -> Result<ServiceResponse<Widget>, ServiceError> {
        let rate_limit = self.consume(RateLimitOperation::Create)?;
        let model = self.store.create(draft)?;
        Ok(ServiceResponse { model, rate_limit })
    }

    pub fn read_one(&self, id: &str) -> Result<ServiceResponse<Widget>, ServiceError> {
        let rate_limit = self.consume(RateLimitOperation::ReadOne)?;
        let model = self
            .store
            .read_one(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(ServiceResponse { model, rate_limit })
    }

    pub fn read_all(
        &self,
        per_page: usize,
        from_z: Option<i32>,
    ) -> Result<ServiceResponse<Page<Widget>>, ServiceError> {
        let rate_limit = self.consume(RateLimitOperation::ReadAll)?;
        let found = self.store.read_range(per_page.saturating_add(1), from_z);
        Ok(ServiceResponse {
            model: Page::of(found, per_page),
            rate_limit,
        })
    }

    pub fn update(
        &self,
        id: &str,
        patch: WidgetToUpdate,
    ) -> Result<ServiceResponse<Widget>, ServiceError> {
        let rate_limit = self.consume(RateLimitOperation::Update)?;
        let model = self.store.update(id, patch)?;
        Ok(ServiceResponse { model, rate_limit })
    }

    pub fn delete(&self, id: &str) -> Result<ServiceResponse<Widget>, ServiceError> {
        let rate_limit = self.consume(RateLimitOperation::Delete)?;
        let model = self.store.delete(id)?;
        Ok(ServiceResponse { model, rate_limit })
    }

    pub fn rate_limits(&self) -> &Arc<RateLimitService> {
        &self.limits
    }

    fn consume(
        &self,
        operation: RateLimitOperation,
    ) -> Result<Option<RateLimitStat>, ServiceError> {
        match self.limits.try_consume(operation) {
            Some(stat) if !stat.consumed => {
                tracing::debug!("Rate limited {:?}: {:?}", operation, stat);
                Err(ServiceError::TooManyRequests(stat))
            }
            stat => Ok(stat),
        }
    }
}
