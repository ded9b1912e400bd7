//! Service configuration.
//!
//! Every option can be given on the command line or through its `WIDGETS_*`
//! environment variable.

use crate::ratelimit::types::RateLimitSettings;
use crate::widgets::protocol::Paging;

use anyhow::{Result, bail};
use clap::Parser;
use std::net::SocketAddr;

#[derive(Debug, Clone, Parser)]
#[command(name = "widget-service")]
#[command(version)]
#[command(about = "CRUD service for z-ordered widgets")]
pub struct Config {
    /// Address the HTTP server listens on.
    #[arg(long, env = "WIDGETS_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Page size used when a listing does not ask for one.
    #[arg(long, env = "WIDGETS_PER_PAGE_DEFAULT", default_value_t = 10)]
    pub per_page_default: usize,

    /// Largest page size a listing may ask for.
    #[arg(long, env = "WIDGETS_PER_PAGE_MAX", default_value_t = 500)]
    pub per_page_max: usize,

    /// Requests per minute shared by all operations without their own limit.
    #[arg(long, env = "WIDGETS_RATE_LIMIT_GLOBAL")]
    pub rate_limit_global: Option<u64>,

    #[arg(long, env = "WIDGETS_RATE_LIMIT_CREATE")]
    pub rate_limit_create: Option<u64>,

    #[arg(long, env = "WIDGETS_RATE_LIMIT_READ_ONE")]
    pub rate_limit_read_one: Option<u64>,

    #[arg(long, env = "WIDGETS_RATE_LIMIT_READ_ALL")]
    pub rate_limit_read_all: Option<u64>,

    #[arg(long, env = "WIDGETS_RATE_LIMIT_UPDATE")]
    pub rate_limit_update: Option<u64>,

    #[arg(long, env = "WIDGETS_RATE_LIMIT_DELETE")]
    pub rate_limit_delete: Option<u64>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.per_page_default < 1 {
            bail!("per-page-default must be at least 1");
        }
        if self.per_page_max < self.per_page_default {
            bail!(
                "per-page-max ({}) must not be below per-page-default ({})",
                self.per_page_max,
                self.per_page_default
            );
        }
        self.rate_limits()
            .validate()
            .map_err(anyhow::Error::msg)?;
        Ok(())
    }

    pub fn paging(&self) -> Paging {
        Paging {
            default_per_page: self.per_page_default,
            max_per_page: self.per_page_max,
        }
    }

    pub fn rate_limits(&self) -> RateLimitSettings {
        RateLimitSettings {
            global: self.rate_limit_global,
            create: self.rate_limit_create,
            read_one: self.rate_limit_read_one,
            read_all: self.rate_limit_read_all,
            update: self.rate_limit_update,
            delete: self.rate_limit_delete,
        }
    }
}
