//! Shuk marketplace client
//!
//! A client library for a B2B wholesale marketplace connecting suppliers and
//! buyers, backed by Supabase: auth, table storage, object storage and
//! realtime notifications, plus the in-memory catalog pipeline that the
//! browse and search screens share.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod entities;
pub mod error;
pub mod fetch;
pub mod links;
pub mod models;
pub mod postgrest;
pub mod prefs;
pub mod realtime;
pub mod search_params;
pub mod storage;

use reqwest::Client;
use tracing::debug;

use crate::auth::Auth;
use crate::catalog::Catalog;
use crate::config::{ClientOptions, MarketConfig};
use crate::entities::{Categories, Messages, Notifications, Products, Reviews, Users};
use crate::error::Error;
use crate::postgrest::PostgrestClient;
use crate::realtime::RealtimeClient;
use crate::storage::StorageClient;

/// The main entry point for the marketplace client
#[derive(Clone)]
pub struct Marketplace {
    /// The base URL for the Supabase project
    pub url: String,
    /// The anonymous API key for the project
    pub key: String,
    /// HTTP client shared by every request
    pub http_client: Client,
    /// Auth client for sign-in and the current session
    pub auth: Auth,
    /// Client options
    pub options: ClientOptions,
}

impl Marketplace {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `supabase_url` - The base URL of the Supabase project
    /// * `supabase_key` - The anonymous API key of the project
    ///
    /// # Example
    ///
    /// ```
    /// use shuk::Marketplace;
    ///
    /// let market = Marketplace::new("https://your-project.supabase.co", "your-anon-key").unwrap();
    /// ```
    pub fn new(supabase_url: &str, supabase_key: &str) -> Result<Self, Error> {
        Self::new_with_options(supabase_url, supabase_key, ClientOptions::default())
    }

    /// Create a new client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use shuk::{Marketplace, config::ClientOptions};
    ///
    /// let options = ClientOptions::default().with_page_size(24);
    /// let market = Marketplace::new_with_options(
    ///     "https://your-project.supabase.co",
    ///     "your-anon-key",
    ///     options,
    /// ).unwrap();
    /// ```
    pub fn new_with_options(
        supabase_url: &str,
        supabase_key: &str,
        options: ClientOptions,
    ) -> Result<Self, Error> {
        let url = supabase_url.trim_end_matches('/');
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let auth = Auth::new(url, supabase_key, http_client.clone(), options.clone());
        debug!(%url, "marketplace client ready");

        Ok(Self {
            url: url.to_string(),
            key: supabase_key.to_string(),
            http_client,
            auth,
            options,
        })
    }

    /// Create a client from configuration loaded with [`MarketConfig::from_env`]
    pub fn from_config(config: &MarketConfig) -> Result<Self, Error> {
        Self::new_with_options(&config.supabase_url, &config.supabase_key, config.options.clone())
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// A query client for `table`, authorized as the current user or anonymously
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn run() -> Result<(), shuk::error::Error> {
    /// use shuk::Marketplace;
    ///
    /// let market = Marketplace::new("https://your-project.supabase.co", "your-anon-key")?;
    /// let rows: Vec<serde_json::Value> =
    ///     market.from("categories").await?.select("*").execute().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from(&self, table: &str) -> Result<PostgrestClient, Error> {
        let token = self.auth.bearer().await?;
        Ok(PostgrestClient::new(
            &self.url,
            &self.key,
            &token,
            &self.options.db_schema,
            table,
            self.http_client.clone(),
        ))
    }

    /// Storage client for file operations
    pub async fn storage(&self) -> Result<StorageClient, Error> {
        let token = self.auth.bearer().await?;
        Ok(StorageClient::new(&self.url, &self.key, &token, self.http_client.clone()))
    }

    /// Realtime client for change subscriptions
    pub async fn realtime(&self) -> Result<RealtimeClient, Error> {
        let token = self.auth.bearer().await?;
        Ok(RealtimeClient::new(
            &self.url,
            &self.key,
            &token,
            self.options.heartbeat_interval,
        ))
    }

    /// The filter/sort/paginate pipeline with this client's page size
    pub fn catalog(&self) -> Catalog {
        Catalog::from(&self.options)
    }

    pub fn products(&self) -> Products<'_> {
        Products::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn categories(&self) -> Categories<'_> {
        Categories::new(self)
    }

    pub fn messages(&self) -> Messages<'_> {
        Messages::new(self)
    }

    pub fn reviews(&self) -> Reviews<'_> {
        Reviews::new(self)
    }

    pub fn notifications(&self) -> Notifications<'_> {
        Notifications::new(self)
    }

    /// The signed-in user's id, or an auth error
    pub(crate) fn require_user_id(&self) -> Result<String, Error> {
        self.auth
            .current_user_id()
            .ok_or_else(|| Error::auth("Not logged in"))
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::catalog::{FilterOptions, Page, SortBy};
    pub use crate::config::{ClientOptions, MarketConfig};
    pub use crate::error::Error;
    pub use crate::models::*;
    pub use crate::prefs::Preferences;
    pub use crate::search_params::{SearchState, SearchType};
    pub use crate::Marketplace;
}
