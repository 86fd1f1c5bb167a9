//! Storage operations for product pictures, avatars and logos

mod types;

use std::path::Path;

use reqwest::{multipart, Client};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::error::Error;
use crate::fetch::{check_status, Fetch, CLIENT_INFO};

pub use types::*;

/// Client for the hosted object storage
#[derive(Debug, Clone)]
pub struct StorageClient {
    url: String,
    key: String,
    token: String,
    client: Client,
}

/// Client for a specific storage bucket
pub struct BucketClient<'a> {
    storage: &'a StorageClient,
    bucket_id: String,
}

impl StorageClient {
    pub(crate) fn new(url: &str, key: &str, token: &str, client: Client) -> Self {
        Self {
            url: url.to_string(),
            key: key.to_string(),
            token: token.to_string(),
            client,
        }
    }

    fn get_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.url, path)
    }

    /// Get a client for a specific bucket
    pub fn from(&self, bucket_id: &str) -> BucketClient<'_> {
        BucketClient {
            storage: self,
            bucket_id: bucket_id.to_string(),
        }
    }
}

impl<'a> BucketClient<'a> {
    /// Upload a file to the bucket
    pub async fn upload(
        &self,
        path: &str,
        file_data: Vec<u8>,
        options: FileOptions,
    ) -> Result<StoredFile, Error> {
        let url = self
            .storage
            .get_url(&format!("/object/{}/{}", self.bucket_id, path));
        let content_type = options
            .content_type
            .clone()
            .unwrap_or_else(|| guess_content_type(path).to_string());
        let file_name = Path::new(path)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());

        let part = multipart::Part::bytes(file_data)
            .file_name(file_name)
            .mime_str(&content_type)?;
        let form = multipart::Form::new().part("file", part);

        debug!(bucket = %self.bucket_id, %path, "uploading object");
        let response = self
            .storage
            .client
            .post(&url)
            .header("apikey", &self.storage.key)
            .header("Authorization", format!("Bearer {}", self.storage.token))
            .header("X-Client-Info", CLIENT_INFO)
            .header("Cache-Control", format!("max-age={}", options.cache_control))
            .header("x-upsert", options.upsert.to_string())
            .multipart(form)
            .send()
            .await?;

        let response = check_status(response)
            .await
            .map_err(|e| Error::storage(format!("upload of {path} failed: {e}")))?;
        response.json::<UploadResponse>().await?;

        Ok(StoredFile {
            path: path.to_string(),
            public_url: self.get_public_url(path),
        })
    }

    /// Remove objects from the bucket
    pub async fn remove(&self, paths: &[&str]) -> Result<Vec<FileObject>, Error> {
        let url = self.storage.get_url(&format!("/object/{}", self.bucket_id));

        Fetch::delete(&self.storage.client, &url)
            .authorize(&self.storage.key, &self.storage.token)
            .json(&json!({ "prefixes": paths }))?
            .execute::<Vec<FileObject>>()
            .await
    }

    /// Get the public URL for a file
    pub fn get_public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.storage.url, self.bucket_id, path
        )
    }

    /// The object path a public URL of this bucket points at
    pub fn path_from_public_url(&self, public_url: &str) -> Option<String> {
        let prefix = format!(
            "{}/storage/v1/object/public/{}/",
            self.storage.url, self.bucket_id
        );
        public_url.strip_prefix(&prefix).map(str::to_string)
    }
}

/// A collision-free object path `{owner}/{uuid}.{ext}`
pub fn unique_object_path(owner_id: &str, original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string());
    format!("{}/{}.{}", owner_id, Uuid::new_v4(), ext)
}

/// Content type for the picture formats the upload forms accept
pub fn guess_content_type(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_paths_keep_owner_and_extension() {
        let a = unique_object_path("supplier-1", "Olive Oil.JPG");
        let b = unique_object_path("supplier-1", "Olive Oil.JPG");
        assert!(a.starts_with("supplier-1/"));
        assert!(a.ends_with(".jpg"));
        assert_ne!(a, b);
    }

    #[test]
    fn content_types() {
        assert_eq!(guess_content_type("a/b.PNG"), "image/png");
        assert_eq!(guess_content_type("a/b.jpeg"), "image/jpeg");
        assert_eq!(guess_content_type("a/b"), "application/octet-stream");
    }

    #[test]
    fn public_urls_round_trip_to_paths() {
        let storage = StorageClient::new("https://demo.supabase.co", "anon", "anon", Client::new());
        let bucket = storage.from("product-images");
        let url = bucket.get_public_url("s1/abc.png");
        assert_eq!(
            url,
            "https://demo.supabase.co/storage/v1/object/public/product-images/s1/abc.png"
        );
        assert_eq!(bucket.path_from_public_url(&url).as_deref(), Some("s1/abc.png"));
        assert_eq!(bucket.path_from_public_url("https://elsewhere/x.png"), None);
    }
}
