//! Download tree reader
//!
//! Layout: `<root>/<collection>/<page>/<product>/<image>`. Pages, products
//! and images are ordered by modification time, oldest first, so the list
//! follows the order in which the fetcher wrote them.

use shared::layout::{self, is_image_file};
use shared::models::{Product, ProductListing};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{CatalogError, CatalogResult};

/// Sub-entries of `dir` (directories or image files) ordered by mtime, then name
fn entries_by_mtime(dir: &Path, want_dirs: bool) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut found: Vec<(SystemTime, String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let meta = entry.metadata()?;
        let keep = if want_dirs {
            meta.is_dir()
        } else {
            meta.is_file() && is_image_file(&path)
        };
        if !keep {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        found.push((mtime, name, path));
    }
    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(found.into_iter().map(|(_, name, path)| (name, path)).collect())
}

#[derive(Debug, Clone)]
pub struct CatalogReader {
    root: PathBuf,
}

impl CatalogReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Top-level folder names, sorted; empty when the root does not exist
    pub fn collections(&self) -> CatalogResult<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = entries_by_mtime(&self.root, true)?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Every product of a collection, page by page
    pub fn products(&self, collection: &str) -> CatalogResult<Vec<Product>> {
        if !layout::is_safe_relative(collection) || collection.contains('/') {
            return Err(CatalogError::InvalidName(collection.to_string()));
        }
        let collection_dir = self.root.join(collection);
        if !collection_dir.is_dir() {
            return Err(CatalogError::CollectionNotFound(collection.to_string()));
        }

        let mut products = Vec::new();
        for (page, page_dir) in entries_by_mtime(&collection_dir, true)? {
            for (name, product_dir) in entries_by_mtime(&page_dir, true)? {
                let images = entries_by_mtime(&product_dir, false)?
                    .into_iter()
                    .map(|(file, _)| file)
                    .collect();
                products.push(Product::new(collection, page.as_str(), name, images));
            }
        }
        tracing::debug!(collection = %collection, products = products.len(), "Catalog scanned");
        Ok(products)
    }

    /// Attach server paths (`<prefix>/<collection>/<page>/<name>/<file>`) for the UI
    pub fn listing(product: &Product, prefix: &str) -> ProductListing {
        let dir = layout::product_dir(&product.collection, &product.page, &product.source_name);
        ProductListing {
            image_paths: product
                .images
                .iter()
                .map(|file| format!("{prefix}/{dir}/{file}"))
                .collect(),
            product: product.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;

    fn touch(path: &Path, age_secs: u64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let file = File::create(path).unwrap();
        let when = SystemTime::now() - Duration::from_secs(age_secs);
        file.set_modified(when).unwrap();
    }

    fn set_dir_mtime(path: &Path, age_secs: u64) {
        let dir = File::open(path).unwrap();
        dir.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        let reader = CatalogReader::new("/nonexistent/downloads");
        assert!(reader.collections().unwrap().is_empty());
        assert!(matches!(
            reader.products("Demo"),
            Err(CatalogError::CollectionNotFound(_))
        ));
    }

    #[test]
    fn test_collections_sorted_by_name() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("Zeta")).unwrap();
        fs::create_dir_all(root.path().join("Alpha系列")).unwrap();
        File::create(root.path().join("notes.txt")).unwrap();
        let reader = CatalogReader::new(root.path());
        assert_eq!(reader.collections().unwrap(), vec!["Alpha系列", "Zeta"]);
    }

    #[test]
    fn test_products_ordered_by_mtime() {
        let root = tempfile::tempdir().unwrap();
        let c = root.path().join("Demo");
        touch(&c.join("1/Gorra/x.jpg"), 50);
        touch(&c.join("1/Bolso/b.JPG"), 90);
        touch(&c.join("1/Bolso/a.png"), 80);
        touch(&c.join("1/Bolso/readme.txt"), 10);
        touch(&c.join("2/Camiseta/z.webp"), 5);
        set_dir_mtime(&c.join("1/Bolso"), 100);
        set_dir_mtime(&c.join("1/Gorra"), 60);
        set_dir_mtime(&c.join("1"), 200);
        set_dir_mtime(&c.join("2"), 30);

        let reader = CatalogReader::new(root.path());
        let products = reader.products("Demo").unwrap();
        let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bolso", "Gorra", "Camiseta"]);
        assert_eq!(products[0].images, vec!["b.JPG", "a.png"]);
        assert_eq!(products[2].page, "2");

        let listing = CatalogReader::listing(&products[0], "downloads");
        assert_eq!(listing.image_paths[0], "downloads/Demo/1/Bolso/b.JPG");
    }

    #[test]
    fn test_collection_name_cannot_escape_root() {
        let root = tempfile::tempdir().unwrap();
        let reader = CatalogReader::new(root.path());
        assert!(matches!(reader.products(".."), Err(CatalogError::InvalidName(_))));
        assert!(matches!(reader.products("a/b"), Err(CatalogError::InvalidName(_))));
    }
}
