//! Database operations through the PostgREST API

mod filter;
mod query;
mod types;

use reqwest::Client;
use serde::Serialize;

pub use filter::*;
pub use query::*;
pub use types::*;

/// Client for operations on one table
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_url: String,
    target: Target,
}

impl PostgrestClient {
    /// Create a client for `table`, sending `token` as the bearer
    pub(crate) fn new(
        url: &str,
        key: &str,
        token: &str,
        schema: &str,
        table: &str,
        client: Client,
    ) -> Self {
        Self {
            base_url: url.to_string(),
            target: Target {
                url: format!("{}/rest/v1/{}", url, table),
                key: key.to_string(),
                token: token.to_string(),
                schema: schema.to_string(),
                client,
            },
        }
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(self.target.clone(), columns)
    }

    /// Insert data into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(self.target.clone(), values)
    }

    /// Update data in the table
    pub fn update<T: Serialize>(&self, values: T) -> UpdateBuilder<T> {
        UpdateBuilder::new(self.target.clone(), values)
    }

    /// Upsert data in the table (insert or update if it exists)
    pub fn upsert<T: Serialize>(&self, values: T, on_conflict: &str) -> InsertBuilder<T> {
        InsertBuilder::new(self.target.clone(), values).on_conflict(on_conflict)
    }

    /// Delete data from the table
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder::new(self.target.clone())
    }

    /// Call a stored procedure or function
    pub fn rpc<T: Serialize>(&self, function: &str, params: T) -> RpcBuilder<T> {
        let mut target = self.target.clone();
        target.url = format!("{}/rest/v1/rpc/{}", self.base_url, function);
        RpcBuilder::new(target, params)
    }
}
