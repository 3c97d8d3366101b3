//! Pure Qdrant REST API client
//!
//! Covers collection lifecycle, point upsert and filtered vector search over
//! Qdrant's HTTP interface. Payload semantics belong to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use qdrant_client::{CreateCollection, Distance, QdrantClient, SearchRequest};
//!
//! let client = QdrantClient::new("http://localhost:6333");
//!
//! if !client.collection_exists("docs").await? {
//!     client
//!         .create_collection("docs", &CreateCollection::new(1536, Distance::Cosine))
//!         .await?;
//! }
//!
//! let hits = client
//!     .search_points("docs", &SearchRequest::new(query_vector, 5))
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{QdrantError, Result};
pub use types::*;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Pure Qdrant API client.
#[derive(Clone)]
pub struct QdrantClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for QdrantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl QdrantClient {
    /// Create a client for the server at `url` (e.g. `http://localhost:6333`).
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: url.into().trim_end_matches('/').to_string(),
            api_key: None,
            timeout: None,
        }
    }

    /// Create from `QDRANT_URL` and optional `QDRANT_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("QDRANT_URL")
            .map_err(|_| QdrantError::Config("QDRANT_URL not set".into()))?;
        let client = Self::new(url);
        Ok(match std::env::var("QDRANT_API_KEY") {
            Ok(key) if !key.is_empty() => client.with_api_key(key),
            _ => client,
        })
    }

    /// Authenticate with an API key (sent as the `api-key` header).
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .http_client
            .request(method, format!("{}/{}", self.base_url, path));

        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, operation: &str) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, operation, "Qdrant request failed");
            QdrantError::from_transport(&e)
        })?;

        let response = ensure_success(response, operation).await?;

        let body: types::ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| QdrantError::Parse(e.to_string()))?;

        Ok(body.result)
    }

    /// Names of all collections.
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let list: types::CollectionsList = self
            .send(self.request(Method::GET, "collections"), "list collections")
            .await?;
        Ok(list.collections.into_iter().map(|c| c.name).collect())
    }

    /// Whether a collection named `name` exists.
    pub async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_collections().await?.iter().any(|c| c == name))
    }

    /// Create a collection. Fails if it already exists.
    pub async fn create_collection(&self, name: &str, definition: &CreateCollection) -> Result<bool> {
        let created: bool = self
            .send(
                self.request(Method::PUT, &format!("collections/{}", name))
                    .json(definition),
                "create collection",
            )
            .await?;

        debug!(
            collection = name,
            size = definition.vectors.size,
            "Created Qdrant collection"
        );
        Ok(created)
    }

    /// Collection status and point count.
    pub async fn get_collection(&self, name: &str) -> Result<CollectionInfo> {
        self.send(
            self.request(Method::GET, &format!("collections/{}", name)),
            "get collection",
        )
        .await
        .map_err(|e| e.for_collection(name))
    }

    /// Delete a collection and all of its points.
    pub async fn delete_collection(&self, name: &str) -> Result<bool> {
        self.send(
            self.request(Method::DELETE, &format!("collections/{}", name)),
            "delete collection",
        )
        .await
    }

    /// Insert or overwrite points. With `wait`, returns once the write is applied.
    pub async fn upsert_points(
        &self,
        name: &str,
        points: &[PointStruct],
        wait: bool,
    ) -> Result<UpdateResult> {
        let start = std::time::Instant::now();

        let result: UpdateResult = self
            .send(
                self.request(Method::PUT, &format!("collections/{}/points", name))
                    .query(&[("wait", wait)])
                    .json(&types::UpsertPoints { points }),
                "upsert points",
            )
            .await
            .map_err(|e| e.for_collection(name))?;

        debug!(
            collection = name,
            points = points.len(),
            duration_ms = start.elapsed().as_millis(),
            "Qdrant upsert"
        );
        Ok(result)
    }

    /// Nearest-neighbour search, best score first.
    pub async fn search_points(
        &self,
        name: &str,
        request: &SearchRequest,
    ) -> Result<Vec<ScoredPoint>> {
        let start = std::time::Instant::now();

        let hits: Vec<ScoredPoint> = self
            .send(
                self.request(Method::POST, &format!("collections/{}/points/search", name))
                    .json(request),
                "search points",
            )
            .await
            .map_err(|e| e.for_collection(name))?;

        debug!(
            collection = name,
            limit = request.limit,
            filtered = request.filter.is_some(),
            hits = hits.len(),
            duration_ms = start.elapsed().as_millis(),
            "Qdrant search"
        );
        Ok(hits)
    }
}

/// Turn a non-2xx response into a typed error, passing 2xx responses through.
async fn ensure_success(response: Response, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<types::ApiErrorBody>(&body)
        .map(|b| b.status.error)
        .unwrap_or(body);

    warn!(status = %status, error = %message, operation, "Qdrant API error");
    Err(QdrantError::from_status(status, message))
}

impl QdrantError {
    /// Classify an HTTP status returned by the server.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        match status {
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => QdrantError::Timeout,
            _ => QdrantError::Api {
                status: status.as_u16(),
                message: message.into(),
            },
        }
    }

    fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            QdrantError::Timeout
        } else {
            QdrantError::Network(error.to_string())
        }
    }

    /// Map a 404 on a collection-scoped endpoint to [`QdrantError::CollectionNotFound`].
    fn for_collection(self, name: &str) -> Self {
        match self {
            QdrantError::Api { status: 404, .. } => QdrantError::CollectionNotFound(name.into()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = QdrantClient::new("http://localhost:6333/")
            .with_api_key("qd-secret")
            .with_timeout(Duration::from_secs(3));

        assert_eq!(client.base_url(), "http://localhost:6333");
        assert_eq!(client.api_key.as_deref(), Some("qd-secret"));
        assert_eq!(client.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = QdrantClient::new("http://localhost:6333").with_api_key("qd-secret");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("qd-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_not_found_maps_to_collection() {
        let err = QdrantError::from_status(StatusCode::NOT_FOUND, "missing").for_collection("docs");
        assert!(matches!(err, QdrantError::CollectionNotFound(ref c) if c == "docs"));

        let err = QdrantError::from_status(StatusCode::BAD_REQUEST, "bad").for_collection("docs");
        assert!(matches!(err, QdrantError::Api { status: 400, .. }));
    }

    #[test]
    fn test_error_body_parsing() {
        let body: types::ApiErrorBody = serde_json::from_str(
            r#"{"status":{"error":"Wrong input: Vector dimension error"},"time":0.0}"#,
        )
        .unwrap();
        assert!(body.status.error.contains("dimension"));
    }
}
