//! Types for storage operations

use serde::{Deserialize, Serialize};

/// What the storage service answers after an upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// `bucket/path` of the stored object
    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "Id")]
    pub id: Option<String>,
}

/// A stored object, as listed or removed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    /// The file name
    pub name: String,

    /// The bucket ID
    pub bucket_id: Option<String>,

    /// The file ID
    pub id: Option<String>,

    /// Creation timestamp
    pub created_at: Option<String>,

    /// File metadata
    pub metadata: Option<serde_json::Value>,
}

/// Options for uploading a file
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// Cache control max-age in seconds
    pub cache_control: String,

    /// Content type header, guessed from the extension when absent
    pub content_type: Option<String>,

    /// Whether to overwrite an existing object
    pub upsert: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            cache_control: "3600".to_string(),
            content_type: None,
            upsert: false,
        }
    }
}

impl FileOptions {
    pub fn with_content_type(mut self, value: &str) -> Self {
        self.content_type = Some(value.to_string());
        self
    }

    pub fn with_upsert(mut self, value: bool) -> Self {
        self.upsert = value;
        self
    }
}

/// Where an uploaded file ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: String,
    pub public_url: String,
}
