//! WooCommerce publisher
//!
//! Flow per product:
//! 1. upload primary + gallery to `/wp-json/wp/v2/media` (WordPress user auth)
//! 2. duplicate the base product via `/wp-json/wc/v3/products/{id}/duplicate`
//! 3. `PUT /wp-json/wc/v3/products/{id}` with name, status and images
//! 4. attach each media item to the new product (best effort)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

use super::{PublishError, PublishRequest, Publisher};
use crate::core::config::PublishConfig;

const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    id: u64,
    #[serde(default)]
    permalink: Option<String>,
}

pub struct WooCommercePublisher {
    config: PublishConfig,
    client: Client,
}

impl WooCommercePublisher {
    pub fn new(config: PublishConfig) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.config.retry_base * 2u32.pow(attempt)
    }

    async fn upload_media(&self, path: &Path) -> Result<u64, PublishError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image.jpg")
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let mut last_error = String::new();
        for attempt in 0..MAX_ATTEMPTS {
            let result = self
                .client
                .post(self.url("/wp-json/wp/v2/media"))
                .basic_auth(&self.config.wp_user, Some(&self.config.wp_password))
                .header(reqwest::header::CONTENT_TYPE, mime.essence_str())
                .header(
                    reqwest::header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file_name}\""),
                )
                .body(bytes.clone())
                .send()
                .await;

            match result {
                Ok(resp) if resp.status() == StatusCode::CREATED => {
                    let media: MediaResponse = resp
                        .json()
                        .await
                        .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;
                    tracing::debug!(file = %file_name, media_id = media.id, "Media uploaded");
                    return Ok(media.id);
                }
                Ok(resp) => last_error = format!("HTTP {}", resp.status()),
                Err(e) => last_error = e.to_string(),
            }

            if attempt + 1 < MAX_ATTEMPTS {
                let delay = self.backoff(attempt);
                tracing::warn!(file = %file_name, attempt = attempt + 1, error = %last_error, "Upload failed, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }

        Err(PublishError::Upload {
            file: file_name,
            reason: last_error,
        })
    }

    /// Copy of the base product; retried on 500 and timeouts only
    async fn duplicate_base(&self) -> Result<u64, PublishError> {
        let url = self.url(&format!(
            "/wp-json/wc/v3/products/{}/duplicate",
            self.config.base_product_id
        ));

        let mut last_error = String::new();
        for attempt in 0..MAX_ATTEMPTS {
            let result = self
                .client
                .post(&url)
                .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
                .send()
                .await;

            let retryable = match result {
                Ok(resp) if resp.status().is_success() => {
                    let product: ProductResponse = resp
                        .json()
                        .await
                        .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;
                    return Ok(product.id);
                }
                Ok(resp) => {
                    last_error = format!("HTTP {}", resp.status());
                    resp.status() == StatusCode::INTERNAL_SERVER_ERROR
                }
                Err(e) => {
                    last_error = e.to_string();
                    e.is_timeout()
                }
            };

            if !retryable {
                break;
            }
            if attempt + 1 < MAX_ATTEMPTS {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
        }
        Err(PublishError::Duplicate(last_error))
    }

    async fn update_product(
        &self,
        id: u64,
        name: &str,
        media_ids: &[u64],
    ) -> Result<String, PublishError> {
        let images: Vec<_> = media_ids.iter().map(|id| json!({ "id": id })).collect();
        let resp = self
            .client
            .put(self.url(&format!("/wp-json/wc/v3/products/{id}")))
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .json(&json!({
                "name": name,
                "status": "publish",
                "images": images,
            }))
            .send()
            .await
            .map_err(|e| PublishError::Update {
                id,
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(PublishError::Update {
                id,
                reason: format!("HTTP {}", resp.status()),
            });
        }
        let product: ProductResponse = resp
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;
        product
            .permalink
            .ok_or_else(|| PublishError::InvalidResponse(format!("product {id} has no permalink")))
    }

    async fn link_media(&self, media_id: u64, product_id: u64) {
        let result = self
            .client
            .post(self.url(&format!("/wp-json/wp/v2/media/{media_id}")))
            .basic_auth(&self.config.wp_user, Some(&self.config.wp_password))
            .json(&json!({ "post": product_id }))
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => tracing::warn!(media_id, product_id, status = %resp.status(), "Media link failed"),
            Err(e) => tracing::warn!(media_id, product_id, error = %e, "Media link failed"),
        }
    }
}

#[async_trait]
impl Publisher for WooCommercePublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<String, PublishError> {
        let mut media_ids = Vec::with_capacity(1 + request.gallery.len());
        media_ids.push(self.upload_media(&request.primary).await?);
        for image in &request.gallery {
            media_ids.push(self.upload_media(image).await?);
        }

        let product_id = self.duplicate_base().await?;
        let permalink = self
            .update_product(product_id, &request.name, &media_ids)
            .await?;
        for &media_id in &media_ids {
            self.link_media(media_id, product_id).await;
        }

        tracing::info!(product_id, name = %request.name, url = %permalink, "Product published");
        Ok(permalink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path as UrlPath, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{post, put};
    use axum::{Json, Router};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

    #[derive(Default)]
    struct Shop {
        next_media: AtomicU64,
        upload_failures: AtomicU32,
        duplicate_failures: AtomicU32,
        duplicate_calls: AtomicU32,
        links: AtomicU32,
        last_update: std::sync::Mutex<Option<serde_json::Value>>,
    }

    async fn media(State(shop): State<Arc<Shop>>, headers: HeaderMap) -> (AxumStatus, Json<serde_json::Value>) {
        assert!(headers.contains_key("authorization"));
        if shop.upload_failures.load(Ordering::SeqCst) > 0 {
            shop.upload_failures.fetch_sub(1, Ordering::SeqCst);
            return (AxumStatus::BAD_GATEWAY, Json(json!({})));
        }
        let id = 100 + shop.next_media.fetch_add(1, Ordering::SeqCst);
        (AxumStatus::CREATED, Json(json!({ "id": id })))
    }

    async fn duplicate(
        State(shop): State<Arc<Shop>>,
        UrlPath(id): UrlPath<u64>,
    ) -> (AxumStatus, Json<serde_json::Value>) {
        assert_eq!(id, 55);
        shop.duplicate_calls.fetch_add(1, Ordering::SeqCst);
        if shop.duplicate_failures.load(Ordering::SeqCst) > 0 {
            shop.duplicate_failures.fetch_sub(1, Ordering::SeqCst);
            return (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({})));
        }
        (AxumStatus::CREATED, Json(json!({ "id": 900 })))
    }

    async fn update(
        State(shop): State<Arc<Shop>>,
        UrlPath(id): UrlPath<u64>,
        Json(body): Json<serde_json::Value>,
    ) -> Json<serde_json::Value> {
        *shop.last_update.lock().unwrap() = Some(body);
        Json(json!({ "id": id, "permalink": format!("https://shop.test/p/{id}") }))
    }

    async fn link(State(shop): State<Arc<Shop>>) -> Json<serde_json::Value> {
        shop.links.fetch_add(1, Ordering::SeqCst);
        Json(json!({}))
    }

    async fn start(shop: Arc<Shop>) -> String {
        let app = Router::new()
            .route("/wp-json/wp/v2/media", post(media))
            .route("/wp-json/wp/v2/media/{id}", post(link))
            .route("/wp-json/wc/v3/products/{id}/duplicate", post(duplicate))
            .route("/wp-json/wc/v3/products/{id}", put(update))
            .with_state(shop);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config(base_url: String) -> PublishConfig {
        PublishConfig {
            base_url,
            wp_user: "editor".into(),
            wp_password: "app-pass".into(),
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            base_product_id: 55,
            retry_base: Duration::from_millis(1),
        }
    }

    fn request(dir: &Path) -> PublishRequest {
        let primary = dir.join("a.jpg");
        let gallery = dir.join("b.png");
        std::fs::write(&primary, b"jpg").unwrap();
        std::fs::write(&gallery, b"png").unwrap();
        PublishRequest {
            name: "Camiseta - Rojo".into(),
            primary,
            gallery: vec![gallery],
        }
    }

    #[tokio::test]
    async fn test_publish_with_retries() {
        let dir = tempfile::tempdir().unwrap();
        let shop = Arc::new(Shop::default());
        shop.upload_failures.store(2, Ordering::SeqCst);
        shop.duplicate_failures.store(1, Ordering::SeqCst);
        let publisher = WooCommercePublisher::new(config(start(shop.clone()).await)).unwrap();

        let url = publisher.publish(&request(dir.path())).await.unwrap();
        assert_eq!(url, "https://shop.test/p/900");
        assert_eq!(shop.duplicate_calls.load(Ordering::SeqCst), 2);
        assert_eq!(shop.links.load(Ordering::SeqCst), 2);

        let body = shop.last_update.lock().unwrap().clone().unwrap();
        assert_eq!(body["name"], "Camiseta - Rojo");
        assert_eq!(body["status"], "publish");
        assert_eq!(body["images"], json!([{ "id": 100 }, { "id": 101 }]));
    }

    #[tokio::test]
    async fn test_upload_gives_up_after_three_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let shop = Arc::new(Shop::default());
        shop.upload_failures.store(3, Ordering::SeqCst);
        let publisher = WooCommercePublisher::new(config(start(shop.clone()).await)).unwrap();

        let err = publisher.publish(&request(dir.path())).await.unwrap_err();
        assert!(matches!(err, PublishError::Upload { ref file, .. } if file == "a.jpg"));
        assert_eq!(shop.duplicate_calls.load(Ordering::SeqCst), 0);
    }
}
