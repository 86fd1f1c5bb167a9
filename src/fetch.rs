//! HTTP request helper shared by the auth, table and storage clients

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;

pub(crate) const CLIENT_INFO: &str = concat!("shuk/", env!("CARGO_PKG_VERSION"));

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("X-Client-Info", HeaderValue::from_static(CLIENT_INFO));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add a header to the request, replacing any previous value
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => warn!("Dropping invalid header {name}"),
        }
        self
    }

    /// Add the project key and the bearer token a request is made with
    pub fn authorize(self, api_key: &str, token: &str) -> Self {
        self.header("apikey", api_key).bearer_auth(token)
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Append query parameters, keeping their order and allowing repeated keys
    pub fn query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self)
    }

    /// The final URL including query parameters
    pub fn url(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.url)?;
        if !self.query_params.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                query_pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn build(&self) -> Result<RequestBuilder, Error> {
        let url = self.url()?;
        debug!(method = %self.method, url = %url.path(), "sending request");

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(self.headers.clone());

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let response = self.send_checked().await?;
        let result = response.json::<T>().await?;
        Ok(result)
    }

    /// Execute the request and parse the JSON body together with the
    /// total row count reported in `Content-Range`
    pub async fn execute_with_count<T: DeserializeOwned>(
        &self,
    ) -> Result<(T, Option<usize>), Error> {
        let response = self.send_checked().await?;
        let count = response
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);
        let result = response.json::<T>().await?;
        Ok((result, count))
    }

    /// Execute the request, fail on a non-success status, ignore the body
    pub async fn execute_empty(&self) -> Result<(), Error> {
        self.send_checked().await?;
        Ok(())
    }

    /// Execute the request and return the raw response
    pub async fn execute_raw(&self) -> Result<Response, Error> {
        let req = self.build()?;
        let response = req.send().await?;
        Ok(response)
    }

    async fn send_checked(&self) -> Result<Response, Error> {
        let response = self.execute_raw().await?;
        check_status(response).await
    }
}

/// Turn a non-success response into [`Error::Api`]
pub(crate) async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await?;
    let message = error_message(&text);
    warn!(status = status.as_u16(), %message, "request failed");
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Pull a readable message out of an auth, PostgREST or storage error body
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

/// `0-29/120` → 120, `*/0` → 0, `0-29/*` → None
pub(crate) fn parse_content_range_total(range: &str) -> Option<usize> {
    range.rsplit_once('/').and_then(|(_, total)| total.parse().ok())
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    /// Create a PUT request
    pub fn put<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PUT)
    }

    /// Create a PATCH request
    pub fn patch<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PATCH)
    }

    /// Create a DELETE request
    pub fn delete<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::DELETE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range_total("0-29/120"), Some(120));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-29/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn error_messages_prefer_backend_fields() {
        assert_eq!(
            error_message(
                r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#
            ),
            "JSON object requested, multiple (or no) rows returned"
        );
        assert_eq!(
            error_message(
                r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#
            ),
            "Invalid login credentials"
        );
        assert_eq!(error_message("upstream timeout\n"), "upstream timeout");
    }

    #[test]
    fn query_keeps_repeated_keys_in_order() {
        let client = Client::new();
        let url = Fetch::get(&client, "https://demo.supabase.co/rest/v1/products")
            .query([("price", "gte.10"), ("price", "lte.20")])
            .url()
            .unwrap();
        assert_eq!(url.query(), Some("price=gte.10&price=lte.20"));
    }
}
