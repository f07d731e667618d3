//! Shared fixtures for the HTTP tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use batch_server::catalog::TitleCatalog;
use batch_server::publish::{PublishError, PublishRequest, Publisher};
use batch_server::storage::Storage;
use batch_server::watermark::{WatermarkApplier, WatermarkError};
use batch_server::{Config, ServerState};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tower::ServiceExt;

/// Copies the source instead of drawing on it
#[derive(Default)]
pub struct FakeWatermarker {
    pub calls: AtomicUsize,
}

#[async_trait]
impl WatermarkApplier for FakeWatermarker {
    async fn apply(&self, source: &Path, dest: &Path, _label: &str) -> Result<(), WatermarkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !source.exists() {
            return Err(WatermarkError::SourceMissing(source.to_path_buf()));
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(source, dest)?;
        Ok(())
    }
}

/// Publishes everything except names containing `FAIL`
#[derive(Default)]
pub struct FakePublisher {
    pub published: std::sync::Mutex<Vec<PublishRequest>>,
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<String, PublishError> {
        if request.name.contains("FAIL") {
            return Err(PublishError::Duplicate("HTTP 500 Internal Server Error".into()));
        }
        let mut published = self.published.lock().unwrap();
        published.push(request.clone());
        Ok(format!("https://shop.test/p/{}", published.len()))
    }
}

pub struct TestApp {
    pub dir: TempDir,
    pub config: Config,
    pub app: Router,
    pub watermarker: Arc<FakeWatermarker>,
    pub publisher: Arc<FakePublisher>,
}

/// `downloads/Demo/1/P<i>/{a,b,c}.jpg`, oldest first
pub fn write_collection(root: &Path, collection: &str, products: usize) {
    let base = SystemTime::now() - Duration::from_secs(10_000);
    for i in 0..products {
        let dir = root.join(collection).join("1").join(format!("P{i}"));
        std::fs::create_dir_all(&dir).unwrap();
        for (n, file) in ["a.jpg", "b.jpg", "c.jpg"].iter().enumerate() {
            std::fs::write(dir.join(file), format!("{i}-{file}")).unwrap();
            let f = File::options().write(true).open(dir.join(file)).unwrap();
            f.set_modified(base + Duration::from_secs(n as u64)).unwrap();
        }
        File::open(&dir)
            .unwrap()
            .set_modified(base + Duration::from_secs(10 * i as u64))
            .unwrap();
    }
}

pub fn titles() -> TitleCatalog {
    let mut csv = String::from("id,titulo\n");
    for i in 0..40 {
        csv.push_str(&format!("{i},Titulo {i}\n"));
    }
    csv.push_str("99,FAIL title\n");
    TitleCatalog::from_reader(csv.as_bytes()).unwrap()
}

pub fn test_app(products: usize, with_publisher: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_work_dir(dir.path());
    config.download_root = dir.path().join("downloads");
    config.watermark_root = dir.path().join("watermarked");
    config.state_db = dir.path().join("state.redb");
    config.page_size = 25;
    config.publish = None;
    write_collection(&config.download_root, "Demo", products);

    let storage = Storage::open(&config.state_db).unwrap();
    let watermarker = Arc::new(FakeWatermarker::default());
    let publisher = Arc::new(FakePublisher::default());
    let state = ServerState::new(
        config.clone(),
        storage,
        titles(),
        watermarker.clone(),
        with_publisher.then(|| publisher.clone() as Arc<dyn Publisher>),
    );

    TestApp {
        app: batch_server::api::build_app(state),
        dir,
        config,
        watermarker,
        publisher,
    }
}

pub fn work_dir(app: &TestApp) -> PathBuf {
    app.dir.path().to_path_buf()
}

impl TestApp {
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.raw(method, uri, body).await;
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn raw(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = self.app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, bytes)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body)).await
    }

    pub async fn command(&self, session: &str, body: Value) -> Value {
        let (status, json) = self.post(&format!("/api/sessions/{session}/commands"), body).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        json["data"].clone()
    }

    /// Title, color and primary image 0 for every position in `range`
    pub async fn annotate(&self, session: &str, range: std::ops::Range<usize>) {
        for pos in range {
            self.command(
                session,
                serde_json::json!({ "type": "set_title", "position": pos, "title_id": pos }),
            )
            .await;
            self.command(
                session,
                serde_json::json!({ "type": "set_color", "position": pos, "color": "Negro" }),
            )
            .await;
            self.command(
                session,
                serde_json::json!({ "type": "set_primary", "position": pos, "image": 0, "on": true }),
            )
            .await;
        }
    }
}
