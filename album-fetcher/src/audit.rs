//! 在线与本地对比
//!
//! Read-only comparison of a category as the site lists it against the
//! download tree on disk. Nothing is downloaded and no folder is created.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use shared::layout::sanitize_filename;
use url::Url;

use crate::auth;
use crate::config::CollectionSpec;
use crate::error::FetchResult;
use crate::parse;
use crate::runner::Crawler;

/// One listing page compared with `<collection>/<page>/`
#[derive(Debug, Clone, Default)]
pub struct PageAudit {
    pub page: u32,
    /// Product cards on the page, duplicates included
    pub containers: usize,
    /// Distinct folder names the page maps to
    pub online: BTreeSet<String>,
    /// Names listed more than once on the page
    pub online_duplicates: Vec<String>,
    pub local: BTreeSet<String>,
    /// Online here but not on disk under any page
    pub missing: Vec<String>,
    /// On disk here but not listed on this page
    pub extra: Vec<String>,
    /// Listing page could not be loaded
    pub unavailable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionAudit {
    pub collection: String,
    pub directory: PathBuf,
    /// Count advertised by the category, when the page shows one
    pub total_online: Option<usize>,
    pub pages: Vec<PageAudit>,
    pub online_unique: usize,
    pub local_unique: usize,
    /// Names listed on more than one page
    pub repeated_across_pages: Vec<String>,
}

impl CollectionAudit {
    pub fn missing(&self) -> usize {
        self.pages.iter().map(|p| p.missing.len()).sum()
    }

    pub fn extra(&self) -> usize {
        self.pages.iter().map(|p| p.extra.len()).sum()
    }

    pub fn log(&self) {
        tracing::info!(
            collection = %self.collection,
            total_online = ?self.total_online,
            online_unique = self.online_unique,
            local_unique = self.local_unique,
            missing = self.missing(),
            extra = self.extra(),
            repeated_across_pages = self.repeated_across_pages.len(),
            directory = %self.directory.display(),
            "Audit finished"
        );
        for page in &self.pages {
            if page.unavailable {
                tracing::warn!(page = page.page, "Listing page unavailable");
                continue;
            }
            tracing::info!(
                page = page.page,
                containers = page.containers,
                online = page.online.len(),
                local = page.local.len(),
                missing = page.missing.len(),
                extra = page.extra.len(),
                "Page compared"
            );
            for name in &page.missing {
                tracing::info!(page = page.page, name = %name, "Missing locally");
            }
            for name in &page.extra {
                tracing::info!(page = page.page, name = %name, "Not listed online");
            }
        }
        for name in &self.repeated_across_pages {
            tracing::info!(name = %name, "Listed on several pages");
        }
    }
}

/// Product folders under one page folder; absent folder means none
fn local_products(page_dir: &Path) -> BTreeSet<String> {
    let Ok(entries) = std::fs::read_dir(page_dir) else {
        return BTreeSet::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}

impl Crawler<'_> {
    /// Compare the listed products of `spec` with what is on disk
    pub async fn audit(&self, spec: &CollectionSpec) -> FetchResult<CollectionAudit> {
        spec.validate()?;

        if let Some(password) = &spec.password {
            auth::unlock(self.source, spec, password).await?;
        }

        let collection = self.collection_folder(spec).await;
        let base_dir = self.out_dir.join(&collection);
        tracing::info!(collection = %collection, start = spec.start, end = spec.end, "Auditing collection");

        let mut audit = CollectionAudit {
            collection,
            directory: base_dir.clone(),
            ..Default::default()
        };

        let mut local_all: BTreeSet<String> = BTreeSet::new();
        for page in spec.start..=spec.end {
            local_all.extend(local_products(&base_dir.join(page.to_string())));
        }

        let mut pages_of: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for page in spec.start..=spec.end {
            let mut entry = PageAudit {
                page,
                local: local_products(&base_dir.join(page.to_string())),
                ..Default::default()
            };

            let page_url = spec.page_url(page);
            let html = match self.listing_page(spec, &page_url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(page, error = %e, "Listing page failed");
                    entry.unavailable = true;
                    audit.pages.push(entry);
                    continue;
                }
            };
            if audit.total_online.is_none() {
                audit.total_online = parse::total_albums(&html);
            }
            let Ok(parsed_url) = Url::parse(&page_url) else {
                entry.unavailable = true;
                audit.pages.push(entry);
                continue;
            };

            let scan = parse::extract_products(&html, &parsed_url);
            entry.containers = scan.products.len() + scan.duplicates.len();

            let mut counts: HashMap<String, usize> = HashMap::new();
            for name in scan
                .products
                .iter()
                .map(|p| &p.name)
                .chain(scan.duplicates.iter().map(|d| &d.name))
            {
                *counts.entry(sanitize_filename(name)).or_default() += 1;
            }
            entry.online = counts.keys().cloned().collect();
            entry.online_duplicates = counts
                .into_iter()
                .filter(|(_, n)| *n > 1)
                .map(|(name, _)| name)
                .collect();
            entry.online_duplicates.sort();

            entry.missing = entry.online.difference(&local_all).cloned().collect();
            entry.extra = entry.local.difference(&entry.online).cloned().collect();
            for name in &entry.online {
                pages_of.entry(name.clone()).or_default().push(page);
            }
            audit.pages.push(entry);
        }

        audit.online_unique = pages_of.len();
        audit.local_unique = local_all.len();
        audit.repeated_across_pages = pages_of
            .into_iter()
            .filter(|(_, pages)| pages.len() > 1)
            .map(|(name, _)| name)
            .collect();
        Ok(audit)
    }

    /// Audit several collections one after another
    pub async fn audit_many(&self, specs: &[CollectionSpec]) -> Vec<FetchResult<CollectionAudit>> {
        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            let result = self.audit(spec).await;
            match &result {
                Ok(audit) => audit.log(),
                Err(e) => tracing::error!(url = %spec.url, error = %e, "Audit failed"),
            }
            results.push(result);
        }
        results
    }
}
