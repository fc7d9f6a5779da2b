use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::StoreSettings;
use crate::models::domain::{
    GeneratedImageRecord, UserAnalysis, UserProfile, WardrobeItem, WardrobeSnapshot,
};
use crate::models::responses::GarmentRecognition;

/// Errors that can occur when talking to the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Store API error: {0}")]
    ApiError(String),

    #[error("Invalid store response: {0}")]
    InvalidResponse(String),
}

/// Collection names in the document store
#[derive(Debug, Clone)]
pub struct StoreCollections {
    pub clothes: String,
    pub profiles: String,
    pub images: String,
}

/// Query window for one page of results.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub skip: u32,
    pub limit: u32,
    pub order_by: Option<String>,
    pub descending: bool,
}

/// Document database client
///
/// Handles all persistence for the wardrobe domain:
/// - Wardrobe items (query, insert from recognition results, soft delete)
/// - User profiles (read with lazy default, field upserts)
/// - Provenance records for re-hosted generated images
pub struct DocumentStore {
    endpoint: String,
    api_key: String,
    env_id: String,
    collections: StoreCollections,
    page_size: u32,
    client: Client,
}

impl DocumentStore {
    pub fn new(settings: &StoreSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            env_id: settings.env_id.clone(),
            collections: StoreCollections {
                clothes: settings.clothes_collection.clone(),
                profiles: settings.profiles_collection.clone(),
                images: settings.images_collection.clone(),
            },
            page_size: settings.page_size.max(1),
            client,
        }
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.env_id, collection
        )
    }

    /// Insert a document, assigning a fresh id when the payload has none.
    /// Returns the document id.
    pub async fn add(&self, collection: &str, document: Value) -> Result<String, StoreError> {
        let mut payload = document;
        let id = match payload.get("_id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = uuid::Uuid::new_v4().to_string();
                if let Some(obj) = payload.as_object_mut() {
                    obj.insert("_id".to_string(), Value::String(id.clone()));
                }
                id
            }
        };

        let response = self
            .client
            .post(self.documents_url(collection))
            .header("X-Api-Key", &self.api_key)
            .header("X-Env-Id", &self.env_id)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::ApiError(format!(
                "Failed to add document to {}: {}",
                collection,
                response.status()
            )));
        }

        tracing::debug!("Added document {} to {}", id, collection);
        Ok(id)
    }

    /// Query one page of documents matching an equality filter.
    pub async fn query(
        &self,
        collection: &str,
        filter: &Value,
        options: &QueryOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let filter_json = serde_json::to_string(filter)
            .map_err(|e| StoreError::InvalidResponse(format!("Unencodable filter: {}", e)))?;
        let mut url = format!(
            "{}?filter={}&skip={}&limit={}",
            self.documents_url(collection),
            urlencoding::encode(&filter_json),
            options.skip,
            options.limit.max(1)
        );
        if let Some(field) = &options.order_by {
            url.push_str(&format!(
                "&orderBy={}&order={}",
                urlencoding::encode(field),
                if options.descending { "desc" } else { "asc" }
            ));
        }

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .header("X-Env-Id", &self.env_id)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::ApiError(format!(
                "Failed to query {}: {}",
                collection,
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let documents = body
            .get("documents")
            .and_then(Value::as_array)
            .ok_or_else(|| StoreError::InvalidResponse("Missing documents array".into()))?;

        Ok(documents
            .iter()
            .map(|doc| doc.get("data").unwrap_or(doc).clone())
            .collect())
    }

    /// Query every matching document, paging at the configured page size
    /// until a short page arrives.
    pub async fn query_all(
        &self,
        collection: &str,
        filter: &Value,
        order_by: Option<&str>,
        descending: bool,
    ) -> Result<Vec<Value>, StoreError> {
        let mut all = Vec::new();
        let mut skip = 0u32;
        loop {
            let options = QueryOptions {
                skip,
                limit: self.page_size,
                order_by: order_by.map(str::to_string),
                descending,
            };
            let page = self.query(collection, filter, &options).await?;
            let page_len = page.len() as u32;
            all.extend(page);
            if page_len < self.page_size {
                break;
            }
            skip += self.page_size;
        }
        tracing::debug!("Queried {} documents from {}", all.len(), collection);
        Ok(all)
    }

    /// Apply a partial update to one document.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: &Value,
    ) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        let response = self
            .client
            .patch(&url)
            .header("X-Api-Key", &self.api_key)
            .header("X-Env-Id", &self.env_id)
            .json(patch)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::ApiError(format!(
                "Failed to update {}/{}: {}",
                collection,
                id,
                response.status()
            )));
        }
        Ok(())
    }

    /// Soft delete: documents are flagged, never physically removed, so the
    /// wardrobe queries must always filter on the flag.
    pub async fn remove(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let patch = json!({
            "isDeleted": true,
            "deleteTime": chrono::Utc::now().to_rfc3339(),
        });
        self.update(collection, id, &patch).await
    }

    /// Count documents matching a filter without fetching them.
    pub async fn count(&self, collection: &str, filter: &Value) -> Result<u64, StoreError> {
        let filter_json = serde_json::to_string(filter)
            .map_err(|e| StoreError::InvalidResponse(format!("Unencodable filter: {}", e)))?;
        let url = format!(
            "{}?filter={}&limit=1",
            self.documents_url(collection),
            urlencoding::encode(&filter_json)
        );

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .header("X-Env-Id", &self.env_id)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::ApiError(format!(
                "Failed to count {}: {}",
                collection,
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        body.get("total")
            .and_then(Value::as_u64)
            .ok_or_else(|| StoreError::InvalidResponse("Missing total".into()))
    }

    /// All of one user's live wardrobe items, newest first.
    pub async fn fetch_wardrobe(&self, owner_id: &str) -> Result<Vec<WardrobeItem>, StoreError> {
        let filter = json!({ "_openid": owner_id, "isDeleted": false });
        let documents = self
            .query_all(&self.collections.clothes, &filter, Some("addTime"), true)
            .await?;

        let items: Vec<WardrobeItem> = documents
            .into_iter()
            .filter_map(|doc| serde_json::from_value(doc).ok())
            .collect();

        tracing::debug!("Fetched {} wardrobe items for {}", items.len(), owner_id);
        Ok(items)
    }

    /// Wardrobe grouped by category with frequency stats, ready for prompt
    /// construction.
    pub async fn wardrobe_snapshot(&self, owner_id: &str) -> Result<WardrobeSnapshot, StoreError> {
        let items = self.fetch_wardrobe(owner_id).await?;
        Ok(WardrobeSnapshot::build(items))
    }

    /// Persist one recognized garment as a wardrobe document.
    pub async fn save_garment(
        &self,
        owner_id: &str,
        recognition: &GarmentRecognition,
        image_ref: &str,
    ) -> Result<String, StoreError> {
        let now = chrono::Utc::now();
        let document = json!({
            "_openid": owner_id,
            "url": image_ref,
            "name": recognition.name,
            "classify": recognition.category.display_name(),
            "categoryId": recognition.category.code(),
            "style": recognition.style,
            "color": recognition.color,
            "stylingAdvice": recognition.styling_advice,
            "tags": recognition.tags.join(" "),
            "confidence": recognition.confidence,
            "aiGenerated": true,
            "imagefrom": "ai_recognition",
            "status": "active",
            "isDeleted": false,
            "addTime": now.format("%Y-%m-%d %H:%M:%S").to_string(),
            "createTime": now.to_rfc3339(),
        });
        self.add(&self.collections.clothes, document).await
    }

    /// The user's profile, or an unsaved default when none exists yet.
    pub async fn get_profile(&self, owner_id: &str) -> Result<UserProfile, StoreError> {
        let filter = json!({ "_openid": owner_id });
        let options = QueryOptions {
            skip: 0,
            limit: 1,
            order_by: None,
            descending: false,
        };
        let documents = self
            .query(&self.collections.profiles, &filter, &options)
            .await?;

        match documents.first() {
            Some(doc) => serde_json::from_value(doc.clone()).map_err(|e| {
                StoreError::InvalidResponse(format!("Failed to parse profile: {}", e))
            }),
            None => Ok(UserProfile::default_for(owner_id)),
        }
    }

    /// Patch the identity fields captured at login.
    pub async fn save_user_info(
        &self,
        owner_id: &str,
        profile: &UserProfile,
    ) -> Result<(), StoreError> {
        self.upsert_profile(
            owner_id,
            json!({
                "nickName": profile.nick_name,
                "avatarUrl": profile.avatar_url,
                "gender": profile.gender,
                "country": profile.country,
                "province": profile.province,
                "city": profile.city,
                "language": profile.language,
            }),
        )
        .await
    }

    pub async fn save_profile_photo(
        &self,
        owner_id: &str,
        file_ref: &str,
    ) -> Result<(), StoreError> {
        self.upsert_profile(owner_id, json!({ "profilePhoto": file_ref }))
            .await
    }

    pub async fn save_style_tags(
        &self,
        owner_id: &str,
        tags: &[String],
    ) -> Result<(), StoreError> {
        self.upsert_profile(owner_id, json!({ "styleTags": tags }))
            .await
    }

    pub async fn save_user_analysis(
        &self,
        owner_id: &str,
        analysis: &UserAnalysis,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(analysis)
            .map_err(|e| StoreError::InvalidResponse(format!("Unencodable analysis: {}", e)))?;
        self.upsert_profile(owner_id, json!({ "userAnalysis": value }))
            .await
    }

    /// Update the existing profile document, or create one. `createTime` is
    /// written only on create; updates leave it untouched.
    async fn upsert_profile(&self, owner_id: &str, fields: Value) -> Result<(), StoreError> {
        let filter = json!({ "_openid": owner_id });
        let options = QueryOptions {
            skip: 0,
            limit: 1,
            order_by: None,
            descending: false,
        };
        let existing = self
            .query(&self.collections.profiles, &filter, &options)
            .await?;

        let now = chrono::Utc::now().to_rfc3339();
        if let Some(id) = existing
            .first()
            .and_then(|doc| doc.get("_id"))
            .and_then(Value::as_str)
        {
            let mut patch = fields;
            if let Some(obj) = patch.as_object_mut() {
                obj.insert("updateTime".to_string(), Value::String(now));
            }
            self.update(&self.collections.profiles, id, &patch).await
        } else {
            let mut document = fields;
            if let Some(obj) = document.as_object_mut() {
                obj.insert("_openid".to_string(), Value::String(owner_id.to_string()));
                obj.insert("createTime".to_string(), Value::String(now.clone()));
                obj.insert("updateTime".to_string(), Value::String(now));
            }
            self.add(&self.collections.profiles, document).await?;
            Ok(())
        }
    }

    /// Record where a generated image came from. Best effort: a failed
    /// insert is logged and swallowed so it can never break the
    /// recommendation that produced the image.
    pub async fn record_generated_image(&self, record: &GeneratedImageRecord) {
        let document = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Unencodable image record: {}", e);
                return;
            }
        };
        if let Err(e) = self.add(&self.collections.images, document).await {
            tracing::warn!("Failed to record generated image: {}", e);
        }
    }
}
