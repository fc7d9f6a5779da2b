use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::StorageSettings;

/// Scheme marking a ref into this system's own file storage.
const STORAGE_SCHEME: &str = "cloud://";

/// Errors that can occur when moving files in or out of storage
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Storage API error: {0}")]
    ApiError(String),

    #[error("Invalid storage response: {0}")]
    InvalidResponse(String),
}

/// Is this an own-storage ref (as opposed to a plain URL)?
pub fn is_storage_ref(reference: &str) -> bool {
    reference.starts_with(STORAGE_SCHEME)
}

/// Hosted file storage client
///
/// Uploads re-hosted images, downloads third-party URLs, and converts
/// own-storage refs into short-lived fetchable URLs for the image
/// generation endpoint.
pub struct FileStorage {
    endpoint: String,
    api_key: String,
    env_id: String,
    client: Client,
}

impl FileStorage {
    pub fn new(settings: &StorageSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            env_id: settings.env_id.clone(),
            client,
        }
    }

    /// Upload bytes to a path in own storage. Returns the storage ref.
    pub async fn upload(&self, cloud_path: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        let url = format!(
            "{}/storage/{}/files?path={}",
            self.endpoint,
            self.env_id,
            urlencoding::encode(cloud_path)
        );

        tracing::debug!("Uploading {} bytes to {}", bytes.len(), cloud_path);

        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::ApiError(format!(
                "Failed to upload {}: {}",
                cloud_path,
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        body.get("fileId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StorageError::InvalidResponse("Missing fileId".into()))
    }

    /// Fetch a plain URL's bytes (used for re-hosting third-party images).
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(StorageError::ApiError(format!(
                "Failed to download {}: {}",
                url,
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Convert own-storage refs into short-lived fetchable URLs, one batch
    /// call. Returned in request order.
    pub async fn temp_urls(&self, file_refs: &[String]) -> Result<Vec<String>, StorageError> {
        if file_refs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/storage/{}/temp-urls", self.endpoint, self.env_id);
        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&json!({ "fileIds": file_refs }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::ApiError(format!(
                "Failed to resolve temp URLs: {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let files = body
            .get("files")
            .and_then(Value::as_array)
            .ok_or_else(|| StorageError::InvalidResponse("Missing files array".into()))?;

        Ok(files
            .iter()
            .filter_map(|file| file.get("tempUrl").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// Make a mixed list of image refs fetchable by an external service:
    /// own-storage refs are converted to temp URLs, plain http(s) URLs pass
    /// through, anything else (placeholders, relative paths) is dropped.
    pub async fn to_fetchable_urls(&self, refs: &[String]) -> Result<Vec<String>, StorageError> {
        let storage_refs: Vec<String> = refs
            .iter()
            .filter(|r| is_storage_ref(r))
            .cloned()
            .collect();
        let mut resolved = self.temp_urls(&storage_refs).await?.into_iter();

        let mut urls = Vec::new();
        for reference in refs {
            if is_storage_ref(reference) {
                if let Some(url) = resolved.next() {
                    urls.push(url);
                }
            } else if reference.starts_with("http://") || reference.starts_with("https://") {
                urls.push(reference.clone());
            }
        }
        Ok(urls)
    }

    /// Delete storage refs (cleanup of superseded images).
    pub async fn delete(&self, file_refs: &[String]) -> Result<(), StorageError> {
        if file_refs.is_empty() {
            return Ok(());
        }

        let url = format!("{}/storage/{}/delete", self.endpoint, self.env_id);
        let response = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&json!({ "fileIds": file_refs }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::ApiError(format!(
                "Failed to delete files: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings(endpoint: &str) -> StorageSettings {
        StorageSettings {
            endpoint: endpoint.to_string(),
            api_key: "storage-key".to_string(),
            env_id: "env-1".to_string(),
        }
    }

    #[test]
    fn test_is_storage_ref() {
        assert!(is_storage_ref("cloud://env-1/a/b.jpg"));
        assert!(!is_storage_ref("https://cdn.example.com/a.jpg"));
        assert!(!is_storage_ref("placeholder_1.jpg"));
    }

    #[tokio::test]
    async fn test_upload_returns_file_ref() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/storage/env-1/files")
            .match_query(mockito::Matcher::UrlEncoded(
                "path".into(),
                "a/b.jpg".into(),
            ))
            .with_status(200)
            .with_body(json!({ "fileId": "cloud://env-1/a/b.jpg" }).to_string())
            .create_async()
            .await;

        let storage = FileStorage::new(&test_settings(&server.url()));
        let file_ref = storage.upload("a/b.jpg", vec![1, 2, 3]).await.unwrap();
        assert_eq!(file_ref, "cloud://env-1/a/b.jpg");
    }

    #[tokio::test]
    async fn test_to_fetchable_urls_mixed_refs() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/storage/env-1/temp-urls")
            .with_status(200)
            .with_body(
                json!({
                    "files": [
                        { "fileId": "cloud://env-1/x.jpg", "tempUrl": "https://tmp.example.com/x.jpg" },
                    ],
                })
                .to_string(),
            )
            .create_async()
            .await;

        let storage = FileStorage::new(&test_settings(&server.url()));
        let refs = vec![
            "cloud://env-1/x.jpg".to_string(),
            "https://cdn.example.com/y.jpg".to_string(),
            "placeholder_1.jpg".to_string(),
        ];
        let urls = storage.to_fetchable_urls(&refs).await.unwrap();
        assert_eq!(
            urls,
            vec![
                "https://tmp.example.com/x.jpg".to_string(),
                "https://cdn.example.com/y.jpg".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_to_fetchable_urls_no_storage_refs_skips_call() {
        // No mock server routes needed: all-plain input must not hit the
        // temp-url endpoint at all.
        let storage = FileStorage::new(&test_settings("http://127.0.0.1:1"));
        let refs = vec!["https://cdn.example.com/y.jpg".to_string()];
        let urls = storage.to_fetchable_urls(&refs).await.unwrap();
        assert_eq!(urls, vec!["https://cdn.example.com/y.jpg".to_string()]);
    }
}
