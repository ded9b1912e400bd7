use serde::{Deserialize, Serialize};

/// Operations that can be rate limited independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateLimitOperation {
    Create,
    ReadOne,
    ReadAll,
    Update,
    Delete,
}

impl RateLimitOperation {
    pub const ALL: [RateLimitOperation; 5] = [
        RateLimitOperation::Create,
        RateLimitOperation::ReadOne,
        RateLimitOperation::ReadAll,
        RateLimitOperation::Update,
        RateLimitOperation::Delete,
    ];
}

/// Outcome of a single consumption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStat {
    /// `true` if the request was let through.
    pub consumed: bool,
    /// Configured requests per minute of the bucket that was consulted.
    pub rpm: u64,
    /// Tokens left after this attempt.
    pub available: u64,
    /// Nanoseconds until the next refill. `0` when consumed.
    pub nanos_until_refill: u64,
}

/// Requests-per-minute quotas. `None` disables the corresponding limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitSettings {
    pub global: Option<u64>,
    pub create: Option<u64>,
    pub read_one: Option<u64>,
    pub read_all: Option<u64>,
    pub update: Option<u64>,
    pub delete: Option<u64>,
}

impl RateLimitSettings {
    pub fn rpm_for(&self, operation: RateLimitOperation) -> Option<u64> {
        match operation {
            RateLimitOperation::Create => self.create,
            RateLimitOperation::ReadOne => self.read_one,
            RateLimitOperation::ReadAll => self.read_all,
            RateLimitOperation::Update => self.update,
            RateLimitOperation::Delete => self.delete,
        }
    }

    /// A zero quota would reject everything forever; it is refused instead.
    pub fn validate(&self) -> Result<(), String> {
        if self.global == Some(0) {
            return Err("global rpm must be greater than 0".to_string());
        }
        for operation in RateLimitOperation::ALL {
            if self.rpm_for(operation) == Some(0) {
                return Err(format!("{:?} rpm must be greater than 0", operation));
            }
        }
        Ok(())
    }
}
