//! Configuration options for the marketplace client

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::Error;

/// Products shown per catalog page
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Configuration options for the marketplace client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether to refresh an expired session before a request
    pub auto_refresh_token: bool,

    /// Whether a signed-in session is kept for later requests
    pub persist_session: bool,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// The database schema
    pub db_schema: String,

    /// Catalog page size
    pub page_size: usize,

    /// Bucket holding product pictures
    pub product_images_bucket: String,

    /// Bucket holding profile avatars and supplier logos
    pub avatars_bucket: String,

    /// Realtime heartbeat interval
    pub heartbeat_interval: Duration,

    /// How recent a product must be to count as a new arrival
    pub new_arrivals_days: i64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
            db_schema: "public".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            product_images_bucket: "product-images".to_string(),
            avatars_bucket: "avatars".to_string(),
            heartbeat_interval: Duration::from_secs(30),
            new_arrivals_days: 30,
        }
    }
}

impl ClientOptions {
    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set the catalog page size, zero is ignored
    pub fn with_page_size(mut self, value: usize) -> Self {
        if value > 0 {
            self.page_size = value;
        }
        self
    }

    /// Set the product images bucket
    pub fn with_product_images_bucket(mut self, value: &str) -> Self {
        self.product_images_bucket = value.to_string();
        self
    }

    /// Set the avatars bucket
    pub fn with_avatars_bucket(mut self, value: &str) -> Self {
        self.avatars_bucket = value.to_string();
        self
    }

    /// Set the realtime heartbeat interval, zero is ignored
    pub fn with_heartbeat_interval(mut self, value: Duration) -> Self {
        if !value.is_zero() {
            self.heartbeat_interval = value;
        }
        self
    }

    /// Set the new-arrivals window in days
    pub fn with_new_arrivals_days(mut self, value: i64) -> Self {
        self.new_arrivals_days = value;
        self
    }
}

/// Everything needed to stand up a [`crate::Marketplace`] from the environment
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub supabase_url: String,
    pub supabase_key: String,
    pub prefs_dir: Option<PathBuf>,
    pub options: ClientOptions,
}

impl MarketConfig {
    /// Load from `SUPABASE_URL` / `SUPABASE_ANON_KEY` and the optional `SHUK_*` variables
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url = required(&lookup, "SUPABASE_URL")?;
        let supabase_key = required(&lookup, "SUPABASE_ANON_KEY")?;

        let defaults = ClientOptions::default();
        let timeout_secs = parse_or(&lookup, "SHUK_REQUEST_TIMEOUT_SECS", 30u64);
        let mut options = defaults
            .with_page_size(parse_or(&lookup, "SHUK_PAGE_SIZE", DEFAULT_PAGE_SIZE))
            .with_request_timeout(Some(Duration::from_secs(timeout_secs)));

        if let Some(bucket) = lookup("SHUK_PRODUCT_IMAGES_BUCKET") {
            options = options.with_product_images_bucket(&bucket);
        }

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_key,
            prefs_dir: lookup("SHUK_PREFS_DIR").map(PathBuf::from),
            options,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, Error>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::general(format!("{key} must be set")))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}");
            info!("{key} falling back to default: {default}");
            default
        }),
    }
}
