//! 抓取主循环
//!
//! Sequential crawl: listing page → product albums → images. Requests are
//! spaced by [`Delays`]; a failing product or image is logged, counted and
//! skipped, never fatal to the run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use shared::layout::sanitize_filename;
use url::Url;

use crate::auth;
use crate::client::PageSource;
use crate::config::{CollectionSpec, DEFAULT_COLLECTION, Delays, PRODUCT_RETRIES};
use crate::download::{DownloadOutcome, download_image};
use crate::error::FetchResult;
use crate::parse::{self, ImageRef, ProductLink, SkippedDuplicate};

/// A product whose name was already downloaded on an earlier page
#[derive(Debug, Clone)]
pub struct CrossPageDuplicate {
    pub name: String,
    pub page: u32,
    pub url: String,
    pub previous_page: u32,
    pub previous_dir: PathBuf,
    pub images_added: usize,
}

/// Totals of one collection run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub collection: String,
    pub directory: PathBuf,
    pub products: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub images: usize,
    pub same_page_duplicates: Vec<SkippedDuplicate>,
    pub cross_page_duplicates: Vec<CrossPageDuplicate>,
}

impl RunSummary {
    pub fn log(&self) {
        tracing::info!(
            collection = %self.collection,
            products = self.products,
            succeeded = self.succeeded,
            failed = self.failed,
            same_page_duplicates = self.same_page_duplicates.len(),
            cross_page_duplicates = self.cross_page_duplicates.len(),
            images = self.images,
            directory = %self.directory.display(),
            "Collection finished"
        );
        for dup in &self.same_page_duplicates {
            tracing::info!(name = %dup.name, kept = %dup.first_url, skipped = %dup.url, "Duplicate on same page");
        }
        for dup in &self.cross_page_duplicates {
            tracing::info!(
                name = %dup.name,
                page = dup.page,
                previous_page = dup.previous_page,
                images_added = dup.images_added,
                "Duplicate across pages merged"
            );
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ImageCounts {
    downloaded: usize,
    present: usize,
    failed: usize,
}

#[derive(Debug, Clone, Copy)]
struct ProductResult {
    downloaded: usize,
    on_disk: usize,
    ok: bool,
}

fn dir_has_files(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

pub struct Crawler<'a> {
    pub(crate) source: &'a dyn PageSource,
    pub(crate) out_dir: PathBuf,
    delays: Delays,
}

impl<'a> Crawler<'a> {
    pub fn new(source: &'a dyn PageSource, out_dir: impl Into<PathBuf>, delays: Delays) -> Self {
        Self {
            source,
            out_dir: out_dir.into(),
            delays,
        }
    }

    /// Fetch one collection
    pub async fn run(&self, spec: &CollectionSpec) -> FetchResult<RunSummary> {
        spec.validate()?;

        if let Some(password) = &spec.password {
            auth::unlock(self.source, spec, password).await?;
        }

        let collection = self.collection_folder(spec).await;
        let base_dir = self.out_dir.join(&collection);
        tokio::fs::create_dir_all(&base_dir).await?;

        tracing::info!(
            collection = %collection,
            start = spec.start,
            end = spec.end,
            "Fetching collection"
        );

        let mut summary = RunSummary {
            collection,
            directory: base_dir.clone(),
            ..Default::default()
        };
        let mut downloaded_names: HashMap<String, (u32, PathBuf)> = HashMap::new();

        for page in spec.start..=spec.end {
            let page_url = spec.page_url(page);
            let html = match self.listing_page(spec, &page_url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(page, error = %e, "Listing page failed, skipping");
                    continue;
                }
            };
            let Ok(parsed_url) = Url::parse(&page_url) else {
                continue;
            };

            let scan = parse::extract_products(&html, &parsed_url);
            tracing::info!(
                page,
                products = scan.products.len(),
                duplicates = scan.duplicates.len(),
                "Listing page parsed"
            );
            summary.same_page_duplicates.extend(scan.duplicates);

            for product in &scan.products {
                summary.products += 1;
                let folder = sanitize_filename(&product.name);

                if let Some((previous_page, previous_dir)) = downloaded_names.get(&folder)
                    && dir_has_files(previous_dir)
                {
                    let added = self.merge_into(product, previous_dir).await;
                    summary.images += added;
                    summary.cross_page_duplicates.push(CrossPageDuplicate {
                        name: product.name.clone(),
                        page,
                        url: product.url.clone(),
                        previous_page: *previous_page,
                        previous_dir: previous_dir.clone(),
                        images_added: added,
                    });
                    continue;
                }

                let dir = base_dir.join(page.to_string()).join(&folder);
                tracing::info!(name = %product.name, url = %product.url, "Product");
                let result = self.fetch_product(product, &dir).await;
                summary.images += result.downloaded;
                if !result.ok {
                    summary.failed += 1;
                } else if result.on_disk > 0 {
                    downloaded_names.insert(folder, (page, dir));
                }

                tokio::time::sleep(self.delays.between_products).await;
            }
        }

        summary.succeeded = summary.products - summary.failed;
        Ok(summary)
    }

    /// Fetch several collections one after another
    pub async fn run_many(&self, specs: &[CollectionSpec]) -> Vec<FetchResult<RunSummary>> {
        let mut results = Vec::with_capacity(specs.len());
        for (idx, spec) in specs.iter().enumerate() {
            tracing::info!(index = idx + 1, total = specs.len(), url = %spec.url, "Starting collection");
            let result = self.run(spec).await;
            match &result {
                Ok(summary) => summary.log(),
                Err(e) => tracing::error!(url = %spec.url, error = %e, "Collection failed"),
            }
            results.push(result);
        }
        results
    }

    /// Folder name of the collection: explicit name, else detected
    pub(crate) async fn collection_folder(&self, spec: &CollectionSpec) -> String {
        let name = match &spec.name {
            Some(name) => name.clone(),
            None => self.detect_name(spec).await,
        };
        let folder = sanitize_filename(&name);
        if folder.is_empty() {
            DEFAULT_COLLECTION.to_string()
        } else {
            folder
        }
    }

    async fn detect_name(&self, spec: &CollectionSpec) -> String {
        match self.source.page(&spec.page_url(1)).await {
            Ok(html) => parse::extract_category_name(&html, spec.base_url()).unwrap_or_else(|| {
                let fallback = parse::fallback_collection_name(spec.base_url());
                tracing::warn!(name = %fallback, "Collection name not found on page");
                fallback
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load first page to detect collection name");
                DEFAULT_COLLECTION.to_string()
            }
        }
    }

    /// Listing page, re-unlocking once if the password cookie expired
    pub(crate) async fn listing_page(&self, spec: &CollectionSpec, page_url: &str) -> FetchResult<String> {
        let html = self.source.page(page_url).await?;
        match &spec.password {
            Some(password) if parse::is_locked(&html) => {
                tracing::warn!("Session locked again, re-authenticating");
                auth::unlock(self.source, spec, password).await?;
                self.source.page(page_url).await
            }
            _ => Ok(html),
        }
    }

    async fn download_all(&self, urls: &[String], dir: &Path) -> ImageCounts {
        let mut counts = ImageCounts::default();
        for url in urls {
            let Some(image) = ImageRef::parse(url) else {
                tracing::warn!(url = %url, "Unrecognised image URL");
                counts.failed += 1;
                continue;
            };
            match download_image(self.source, &image, dir, &self.delays).await {
                DownloadOutcome::Downloaded => {
                    counts.downloaded += 1;
                    tokio::time::sleep(self.delays.between_images).await;
                }
                DownloadOutcome::AlreadyPresent => counts.present += 1,
                DownloadOutcome::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Download a product, re-fetching its album page when nothing at all
    /// could be saved
    async fn fetch_product(&self, product: &ProductLink, dir: &Path) -> ProductResult {
        for attempt in 0..PRODUCT_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(self.delays.retry_unit * attempt).await;
            }

            let html = match self.source.page(&product.url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(url = %product.url, attempt = attempt + 1, error = %e, "Album page failed");
                    continue;
                }
            };

            let urls = parse::extract_image_urls(&html);
            if urls.is_empty() {
                tracing::warn!(url = %product.url, "Album has no images");
                return ProductResult {
                    downloaded: 0,
                    on_disk: 0,
                    ok: true,
                };
            }

            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                tracing::warn!(dir = %dir.display(), error = %e, "Cannot create product folder");
                break;
            }

            let counts = self.download_all(&urls, dir).await;
            let on_disk = counts.downloaded + counts.present;
            if on_disk == 0 {
                tracing::warn!(url = %product.url, attempt = attempt + 1, "No image could be saved");
                continue;
            }
            tracing::info!(
                downloaded = counts.downloaded,
                present = counts.present,
                failed = counts.failed,
                "Product done"
            );
            return ProductResult {
                downloaded: counts.downloaded,
                on_disk,
                ok: true,
            };
        }

        ProductResult {
            downloaded: 0,
            on_disk: 0,
            ok: false,
        }
    }

    /// Add the images of a cross-page duplicate into the first folder
    async fn merge_into(&self, product: &ProductLink, previous_dir: &Path) -> usize {
        let html = match self.source.page(&product.url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(url = %product.url, error = %e, "Duplicate album page failed");
                return 0;
            }
        };
        let urls = parse::extract_image_urls(&html);
        self.download_all(&urls, previous_dir).await.downloaded
    }
}
