//! End-to-end crawl against canned pages

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use album_fetcher::config::{CollectionSpec, Delays};
use album_fetcher::error::{FetchError, FetchResult};
use album_fetcher::{Crawler, PageSource};
use async_trait::async_trait;

const CATEGORY: &str = "https://shop.x.yupoo.com/categories/42";
const LOCK_PAGE: &str = r#"<html><body><div class="indexlock">请输入密码</div></body></html>"#;

#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, String>,
    images: HashMap<String, Vec<u8>>,
    /// url -> number of requests that fail before it starts answering
    flaky: Mutex<HashMap<String, u32>>,
    password: Option<String>,
    unlocked: AtomicBool,
    requests: Mutex<Vec<String>>,
}

impl FakeSite {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    fn image(mut self, url: &str) -> Self {
        self.images.insert(url.to_string(), url.as_bytes().to_vec());
        self
    }

    fn flaky(self, url: &str, failures: u32) -> Self {
        self.flaky.lock().unwrap().insert(url.to_string(), failures);
        self
    }

    fn locked_with(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    fn request_count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    fn not_found(url: &str) -> FetchError {
        FetchError::Status {
            url: url.to_string(),
            status: 404,
        }
    }
}

#[async_trait]
impl PageSource for FakeSite {
    async fn page(&self, url: &str) -> FetchResult<String> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.password.is_some() && !self.unlocked.load(Ordering::SeqCst) {
            return Ok(LOCK_PAGE.to_string());
        }
        self.pages.get(url).cloned().ok_or_else(|| Self::not_found(url))
    }

    async fn image(&self, url: &str) -> FetchResult<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        if let Some(left) = self.flaky.lock().unwrap().get_mut(url)
            && *left > 0
        {
            *left -= 1;
            return Err(FetchError::EmptyBody(url.to_string()));
        }
        self.images.get(url).cloned().ok_or_else(|| Self::not_found(url))
    }

    async fn serves_image(&self, url: &str) -> bool {
        self.images.contains_key(url)
    }

    async fn json(&self, url: &str) -> FetchResult<serde_json::Value> {
        let valid = self
            .password
            .as_ref()
            .is_some_and(|p| url.ends_with(&format!("password={p}")));
        Ok(serde_json::json!({ "data": { "passwordValid": valid } }))
    }

    fn set_password_cookie(&self, _url: &str, password: &str) {
        if self.password.as_deref() == Some(password) {
            self.unlocked.store(true, Ordering::SeqCst);
        }
    }
}

fn spec(end: u32) -> CollectionSpec {
    CollectionSpec {
        url: CATEGORY.to_string(),
        name: None,
        start: 1,
        end,
        password: None,
    }
}

fn two_page_site() -> FakeSite {
    FakeSite::default()
        .page(
            &format!("{CATEGORY}?page=1"),
            r#"<html><body>
                <p>分类"AMIRI系列"下的相册</p>
                <div class="album"><a href="/albums/1?uid=1">3</a><div>Chaqueta Azul</div></div>
                <div class="album"><a href="/albums/2?uid=1">1</a><div>Gorra/Roja</div></div>
            </body></html>"#,
        )
        .page(
            &format!("{CATEGORY}?page=2"),
            r#"<html><body>
                <div class="album"><a href="/albums/3?uid=1">2</a><div>Chaqueta Azul</div></div>
            </body></html>"#,
        )
        .page(
            "https://shop.x.yupoo.com/albums/1?uid=1",
            r#"<html><body>
                <img class="image__img" src="//photo.yupoo.com/shop/aaa/small.jpeg?x=1">
                <img class="image__img" src="https://photo.yupoo.com/shop/bbb/large.jpg">
            </body></html>"#,
        )
        .page(
            "https://shop.x.yupoo.com/albums/2?uid=1",
            r#"<img class="image__img" src="https://photo.yupoo.com/shop/ccc/large.png">"#,
        )
        .page(
            "https://shop.x.yupoo.com/albums/3?uid=1",
            r#"<html><body>
                <img class="image__img" src="https://photo.yupoo.com/shop/aaa/large.jpeg">
                <img class="image__img" src="https://photo.yupoo.com/shop/ddd/large.jpg">
            </body></html>"#,
        )
        .image("https://photo.yupoo.com/shop/aaa/large.jpeg")
        // only the medium tier exists for bbb
        .image("https://photo.yupoo.com/shop/bbb/medium.jpg")
        .image("https://photo.yupoo.com/shop/ccc/large.png")
        .image("https://photo.yupoo.com/shop/ddd/large.jpg")
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_crawl_builds_collection_tree() {
    let site = two_page_site();
    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(&site, out.path(), Delays::none());

    let summary = crawler.run(&spec(2)).await.unwrap();

    assert_eq!(summary.collection, "AMIRI系列");
    assert_eq!(summary.products, 3);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.images, 4);

    let root = out.path().join("AMIRI系列");
    assert_eq!(
        files_in(&root.join("1/Chaqueta Azul")),
        vec!["aaa.jpeg", "bbb.jpg", "ddd.jpg"]
    );
    assert_eq!(files_in(&root.join("1/Gorra-Roja")), vec!["ccc.png"]);
    assert!(!root.join("2").exists());
}

#[tokio::test]
async fn test_cross_page_duplicate_is_merged_into_first_folder() {
    let site = two_page_site();
    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(&site, out.path(), Delays::none());

    let summary = crawler.run(&spec(2)).await.unwrap();

    assert_eq!(summary.cross_page_duplicates.len(), 1);
    let dup = &summary.cross_page_duplicates[0];
    assert_eq!(dup.name, "Chaqueta Azul");
    assert_eq!((dup.page, dup.previous_page), (2, 1));
    assert_eq!(dup.images_added, 1);
    // aaa was already on disk, so only ddd was requested again
    assert_eq!(site.request_count("https://photo.yupoo.com/shop/aaa/large.jpeg"), 1);
}

#[tokio::test]
async fn test_large_tier_is_retried_before_falling_back() {
    let site = two_page_site();
    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(&site, out.path(), Delays::none());

    crawler.run(&spec(1)).await.unwrap();

    assert_eq!(site.request_count("https://photo.yupoo.com/shop/bbb/large.jpg"), 3);
    assert_eq!(site.request_count("https://photo.yupoo.com/shop/bbb/medium.jpg"), 1);
}

#[tokio::test]
async fn test_transient_image_failures_are_retried() {
    let site = two_page_site().flaky("https://photo.yupoo.com/shop/ccc/large.png", 2);
    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(&site, out.path(), Delays::none());

    let summary = crawler.run(&spec(1)).await.unwrap();

    assert_eq!(summary.failed, 0);
    assert_eq!(site.request_count("https://photo.yupoo.com/shop/ccc/large.png"), 3);
    assert!(out.path().join("AMIRI系列/1/Gorra-Roja/ccc.png").exists());
}

#[tokio::test]
async fn test_unreachable_album_counts_as_failed_product() {
    let mut site = two_page_site();
    site.pages.remove("https://shop.x.yupoo.com/albums/2?uid=1");
    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(&site, out.path(), Delays::none());

    let summary = crawler.run(&spec(1)).await.unwrap();

    assert_eq!(summary.products, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(site.request_count("https://shop.x.yupoo.com/albums/2?uid=1"), 3);
}

#[tokio::test]
async fn test_explicit_name_overrides_detection() {
    let site = two_page_site();
    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(&site, out.path(), Delays::none());
    let mut spec = spec(1);
    spec.name = Some("Chaquetas/2024".to_string());

    let summary = crawler.run(&spec).await.unwrap();

    assert_eq!(summary.collection, "Chaquetas-2024");
    assert!(out.path().join("Chaquetas-2024/1/Chaqueta Azul").is_dir());
}

#[tokio::test]
async fn test_password_protected_collection() {
    let out = tempfile::tempdir().unwrap();

    let site = two_page_site().locked_with("secret");
    let crawler = Crawler::new(&site, out.path(), Delays::none());
    let mut wrong = spec(1);
    wrong.password = Some("nope".to_string());
    assert!(matches!(
        crawler.run(&wrong).await,
        Err(FetchError::AuthFailed(_))
    ));

    let site = two_page_site().locked_with("secret");
    let crawler = Crawler::new(&site, out.path(), Delays::none());
    let mut right = spec(1);
    right.password = Some("secret".to_string());
    let summary = crawler.run(&right).await.unwrap();
    assert_eq!(summary.products, 2);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_audit_compares_listing_with_download_tree() {
    let site = two_page_site().page(
        &format!("{CATEGORY}?page=1"),
        r#"<html><body>
            <p>分类"AMIRI系列"下的相册</p>
            <div class="categories__total">共 4 个相册</div>
            <div class="album"><a href="/albums/1?uid=1">3</a><div>Chaqueta Azul</div></div>
            <div class="album"><a href="/albums/2?uid=1">1</a><div>Gorra/Roja</div></div>
        </body></html>"#,
    );
    let out = tempfile::tempdir().unwrap();
    let crawler = Crawler::new(&site, out.path(), Delays::none());
    crawler.run(&spec(2)).await.unwrap();

    let root = out.path().join("AMIRI系列");
    std::fs::remove_dir_all(root.join("1/Gorra-Roja")).unwrap();
    std::fs::create_dir_all(root.join("1/Bolso Viejo")).unwrap();
    let before = site.requests.lock().unwrap().len();

    let audit = crawler.audit(&spec(3)).await.unwrap();

    assert_eq!(audit.collection, "AMIRI系列");
    assert_eq!(audit.total_online, Some(4));
    assert_eq!(audit.online_unique, 2);
    assert_eq!(audit.local_unique, 2);
    assert_eq!(audit.repeated_across_pages, vec!["Chaqueta Azul"]);

    let page1 = &audit.pages[0];
    assert_eq!(page1.containers, 2);
    assert_eq!(page1.missing, vec!["Gorra-Roja"]);
    assert_eq!(page1.extra, vec!["Bolso Viejo"]);
    // merged into page 1, so not missing from page 2
    let page2 = &audit.pages[1];
    assert!(page2.missing.is_empty());
    assert!(page2.local.is_empty());
    assert!(audit.pages[2].unavailable);
    assert_eq!(audit.missing(), 1);
    assert_eq!(audit.extra(), 1);

    // listing pages only, no album or image requests
    let requests = site.requests.lock().unwrap();
    assert!(
        requests[before..]
            .iter()
            .all(|u| u.starts_with(CATEGORY)),
        "{:?}",
        &requests[before..]
    );
    assert!(!root.join("3").exists());
}
