//! Query builders for table operations

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};
use crate::postgrest::filter::*;
use crate::postgrest::types::*;

/// Where a builder sends its request and with which credentials
#[derive(Debug, Clone)]
pub struct Target {
    pub(crate) url: String,
    pub(crate) key: String,
    pub(crate) token: String,
    pub(crate) schema: String,
    pub(crate) client: Client,
}

impl Target {
    fn prepare<'a>(&'a self, fetch: FetchBuilder<'a>, write: bool) -> FetchBuilder<'a> {
        let profile = if write { "Content-Profile" } else { "Accept-Profile" };
        fetch
            .authorize(&self.key, &self.token)
            .header(profile, &self.schema)
    }
}

/// Row filters shared by the select, update and delete builders
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    params: Vec<(String, String)>,
}

impl Conditions {
    fn push(&mut self, filter: Filter) {
        self.params.push(filter.to_param());
    }

    fn push_or(&mut self, filters: &[Filter]) {
        if filters.is_empty() {
            return;
        }
        let terms: Vec<String> = filters.iter().map(Filter::to_logic_term).collect();
        self.params.push(("or".to_string(), format!("({})", terms.join(","))));
    }

    fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn params(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.params.iter().cloned()
    }
}

macro_rules! filter_methods {
    () => {
        /// Filter rows where column equals a value
        pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
            self.conditions.push(Filter::new(column, FilterOperator::Eq, value.to_string()));
            self
        }

        /// Filter rows where column does not equal a value
        pub fn neq<V: ToString>(mut self, column: &str, value: V) -> Self {
            self.conditions.push(Filter::new(column, FilterOperator::Neq, value.to_string()));
            self
        }

        /// Filter rows where column is in a list of values
        pub fn in_list<V: ToString>(mut self, column: &str, values: &[V]) -> Self {
            self.conditions.push(Filter::in_list(column, values));
            self
        }

        /// Add an arbitrary filter
        pub fn filter(mut self, filter: Filter) -> Self {
            self.conditions.push(filter);
            self
        }
    };
}

/// Builder for SELECT queries
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    target: Target,
    columns: String,
    conditions: Conditions,
    order: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
    count: Option<CountOption>,
}

impl SelectBuilder {
    pub(crate) fn new(target: Target, columns: &str) -> Self {
        Self {
            target,
            columns: columns.to_string(),
            conditions: Conditions::default(),
            order: Vec::new(),
            limit: None,
            offset: None,
            count: None,
        }
    }

    filter_methods!();

    /// Filter rows where column is greater than a value
    pub fn gt<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.conditions.push(Filter::new(column, FilterOperator::Gt, value.to_string()));
        self
    }

    /// Filter rows where column is greater than or equal to a value
    pub fn gte<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.conditions.push(Filter::new(column, FilterOperator::Gte, value.to_string()));
        self
    }

    /// Filter rows where column is less than a value
    pub fn lt<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.conditions.push(Filter::new(column, FilterOperator::Lt, value.to_string()));
        self
    }

    /// Filter rows where column is less than or equal to a value
    pub fn lte<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.conditions.push(Filter::new(column, FilterOperator::Lte, value.to_string()));
        self
    }

    /// Filter rows where column matches a pattern (case insensitive)
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.conditions.push(Filter::new(column, FilterOperator::ILike, pattern));
        self
    }

    /// Filter rows where column is null
    pub fn is_null(mut self, column: &str) -> Self {
        self.conditions.push(Filter::new(column, FilterOperator::Is, "null"));
        self
    }

    /// Keep rows matching any of the filters
    pub fn or(mut self, filters: &[Filter]) -> Self {
        self.conditions.push_or(filters);
        self
    }

    /// Order the results by a column; repeated calls add tie-breakers
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc.nullslast" };
        self.order.push(format!("{}.{}", column, direction));
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    /// Skip a number of rows
    pub fn offset(mut self, count: usize) -> Self {
        self.offset = Some(count);
        self
    }

    /// Rows `from..=to`, zero based
    pub fn range(self, from: usize, to: usize) -> Self {
        self.offset(from).limit(to.saturating_sub(from) + 1)
    }

    /// Ask the backend for a total row count
    pub fn count(mut self, option: CountOption) -> Self {
        self.count = Some(option);
        self
    }

    /// The query parameters this builder sends
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];
        params.extend(self.conditions.params());
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
    }

    fn fetch(&self) -> FetchBuilder<'_> {
        let mut fetch = self
            .target
            .prepare(Fetch::get(&self.target.client, &self.target.url), false)
            .query(self.params());
        if let Some(count) = self.count {
            fetch = fetch.header("Prefer", &format!("count={}", count.as_str()));
        }
        fetch
    }

    /// Execute the query and return the results
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        self.fetch().execute::<Vec<T>>().await
    }

    /// Execute the query and return the rows with the total count
    pub async fn execute_counted<T: DeserializeOwned>(self) -> Result<Counted<T>, Error> {
        let builder = if self.count.is_none() {
            self.count(CountOption::Exact)
        } else {
            self
        };
        let (rows, total) = builder.fetch().execute_with_count::<Vec<T>>().await?;
        Ok(Counted { rows, total })
    }

    /// Execute the query and return the first row, if any
    pub async fn maybe_single<T: DeserializeOwned>(self) -> Result<Option<T>, Error> {
        let results = self.limit(1).execute::<T>().await?;
        Ok(results.into_iter().next())
    }
}

/// Builder for INSERT and UPSERT queries
#[derive(Debug, Clone)]
pub struct InsertBuilder<T: Serialize> {
    target: Target,
    values: T,
    on_conflict: Option<String>,
    returning: ReturnOption,
}

impl<T: Serialize> InsertBuilder<T> {
    pub(crate) fn new(target: Target, values: T) -> Self {
        Self {
            target,
            values,
            on_conflict: None,
            returning: ReturnOption::Representation,
        }
    }

    /// Merge with existing rows that collide on these columns
    pub fn on_conflict(mut self, columns: &str) -> Self {
        self.on_conflict = Some(columns.to_string());
        self
    }

    /// Choose what the backend sends back
    pub fn returning(mut self, option: ReturnOption) -> Self {
        self.returning = option;
        self
    }

    fn fetch(&self) -> Result<FetchBuilder<'_>, Error> {
        let mut prefer = vec![self.returning.as_prefer().to_string()];
        let mut fetch = self
            .target
            .prepare(Fetch::post(&self.target.client, &self.target.url), true);

        if let Some(ref conflict) = self.on_conflict {
            prefer.push("resolution=merge-duplicates".to_string());
            fetch = fetch.query([("on_conflict", conflict.as_str())]);
        }

        fetch.header("Prefer", &prefer.join(",")).json(&self.values)
    }

    /// Execute the query and return the written rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        self.fetch()?.execute::<Vec<R>>().await
    }

    /// Execute the query without reading the response body
    pub async fn execute_no_return(self) -> Result<(), Error> {
        self.returning(ReturnOption::Minimal).fetch()?.execute_empty().await
    }
}

/// Builder for UPDATE queries
#[derive(Debug, Clone)]
pub struct UpdateBuilder<T: Serialize> {
    target: Target,
    values: T,
    conditions: Conditions,
}

impl<T: Serialize> UpdateBuilder<T> {
    pub(crate) fn new(target: Target, values: T) -> Self {
        Self {
            target,
            values,
            conditions: Conditions::default(),
        }
    }

    filter_methods!();

    fn fetch(&self, returning: ReturnOption) -> Result<FetchBuilder<'_>, Error> {
        if self.conditions.is_empty() {
            return Err(Error::database("refusing to update without a filter"));
        }
        self.target
            .prepare(Fetch::patch(&self.target.client, &self.target.url), true)
            .header("Prefer", returning.as_prefer())
            .query(self.conditions.params())
            .json(&self.values)
    }

    /// Execute the query and return the updated rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        self.fetch(ReturnOption::Representation)?
            .execute::<Vec<R>>()
            .await
    }

    /// Execute the query without returning the updated data
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        self.fetch(ReturnOption::Minimal)?.execute_empty().await
    }
}

/// Builder for DELETE queries
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    target: Target,
    conditions: Conditions,
}

impl DeleteBuilder {
    pub(crate) fn new(target: Target) -> Self {
        Self {
            target,
            conditions: Conditions::default(),
        }
    }

    filter_methods!();

    /// Execute the delete
    pub async fn execute(&self) -> Result<(), Error> {
        if self.conditions.is_empty() {
            return Err(Error::database("refusing to delete without a filter"));
        }
        self.target
            .prepare(Fetch::delete(&self.target.client, &self.target.url), true)
            .header("Prefer", ReturnOption::Minimal.as_prefer())
            .query(self.conditions.params())
            .execute_empty()
            .await
    }
}

/// Builder for RPC (stored procedure) calls
#[derive(Debug, Clone)]
pub struct RpcBuilder<T: Serialize> {
    target: Target,
    params: T,
}

impl<T: Serialize> RpcBuilder<T> {
    pub(crate) fn new(target: Target, params: T) -> Self {
        Self { target, params }
    }

    /// Execute the RPC call and return the results
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<R, Error> {
        self.target
            .prepare(Fetch::post(&self.target.client, &self.target.url), true)
            .json(&self.params)?
            .execute::<R>()
            .await
    }

    /// Execute the RPC call for its side effect only
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        self.target
            .prepare(Fetch::post(&self.target.client, &self.target.url), true)
            .json(&self.params)?
            .execute_empty()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target {
            url: "https://demo.supabase.co/rest/v1/products".into(),
            key: "anon".into(),
            token: "anon".into(),
            schema: "public".into(),
            client: Client::new(),
        }
    }

    #[test]
    fn select_params_in_order() {
        let params = SelectBuilder::new(target(), "*")
            .eq("supplier_id", "s1")
            .gte("price", 10)
            .lte("price", 20)
            .order("created_at", false)
            .order("id", true)
            .range(30, 59)
            .params();

        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                ("supplier_id".to_string(), "eq.s1".to_string()),
                ("price".to_string(), "gte.10".to_string()),
                ("price".to_string(), "lte.20".to_string()),
                ("order".to_string(), "created_at.desc.nullslast,id.asc".to_string()),
                ("limit".to_string(), "30".to_string()),
                ("offset".to_string(), "30".to_string()),
            ]
        );
    }

    #[test]
    fn or_groups_render_as_one_param() {
        let params = SelectBuilder::new(target(), "id")
            .or(&[
                Filter::new("sender_id", FilterOperator::Eq, "u1"),
                Filter::new("receiver_id", FilterOperator::Eq, "u1"),
            ])
            .params();
        assert_eq!(
            params[1],
            ("or".to_string(), "(sender_id.eq.u1,receiver_id.eq.u1)".to_string())
        );
    }

    #[tokio::test]
    async fn unfiltered_writes_are_refused() {
        let err = DeleteBuilder::new(target()).execute().await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));

        let err = UpdateBuilder::new(target(), serde_json::json!({"is_active": false}))
            .execute_no_return()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }
}
