use super::bucket::TokenBucket;
use super::types::{RateLimitOperation, RateLimitSettings, RateLimitStat};

use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Global and per-operation request quotas.
pub struct RateLimitService {
    global: RwLock<Option<Arc<TokenBucket>>>,
    per_operation: DashMap<RateLimitOperation, Arc<TokenBucket>>,
    settings: RwLock<RateLimitSettings>,
}

impl Default for RateLimitService {
    fn default() -> Self {
        Self::new(&RateLimitSettings::default())
    }
}

impl RateLimitService {
    pub fn new(settings: &RateLimitSettings) -> Self {
        let service = Self {
            global: RwLock::new(None),
            per_operation: DashMap::new(),
            settings: RwLock::new(RateLimitSettings::default()),
        };
        service.apply(settings);
        service
    }

    /// Consumes one token for `operation`.
    ///
    /// Returns `None` when no limit applies to the operation. Otherwise the
    /// returned stat says whether the request may proceed.
    pub fn try_consume(&self, operation: RateLimitOperation) -> Option<RateLimitStat> {
        self.bucket_for(operation).map(|bucket| bucket.try_consume())
    }

    pub fn settings(&self) -> RateLimitSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reconfigures quotas. A bucket is only replaced when its rpm changes, so
    /// unrelated limits keep their consumed tokens.
    ///
    /// Concurrent calls are serialized on the settings lock, which stays held
    /// until every bucket is in place.
    pub fn apply(&self, settings: &RateLimitSettings) {
        let mut current_settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        {
            let mut global = self.global.write().unwrap_or_else(PoisonError::into_inner);
            *global = refreshed(global.as_ref(), settings.global);
            tracing::info!("Global rate limit: {:?} rpm", settings.global);
        }

        for operation in RateLimitOperation::ALL {
            let current = self
                .per_operation
                .get(&operation)
                .map(|entry| entry.value().clone());
            match refreshed(current.as_ref(), settings.rpm_for(operation)) {
                Some(bucket) => {
                    self.per_operation.insert(operation, bucket);
                }
                None => {
                    self.per_operation.remove(&operation);
                }
            }
        }

        tracing::debug!("Rate limit settings applied: {:?}", settings);
        *current_settings = settings.clone();
    }

    fn bucket_for(&self, operation: RateLimitOperation) -> Option<Arc<TokenBucket>> {
        if let Some(bucket) = self.per_operation.get(&operation) {
            return Some(bucket.value().clone());
        }
        self.global
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn refreshed(current: Option<&Arc<TokenBucket>>, rpm: Option<u64>) -> Option<Arc<TokenBucket>> {
    let rpm = rpm?;
    match current {
        Some(bucket) if bucket.rpm() == rpm => Some(bucket.clone()),
        _ => Some(Arc::new(TokenBucket::new(rpm))),
    }
}
