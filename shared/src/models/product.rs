//! Product Model

use serde::{Deserialize, Serialize};

use crate::layout;

/// A scraped product as it lives on disk
///
/// `name` is the output folder name; for duplicates it carries the
/// `_copy`/`_copyN` suffix while `source_name` still points at the folder
/// holding the downloaded images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub collection: String,
    pub page: String,
    pub name: String,
    pub source_name: String,
    /// Image file names, oldest first
    pub images: Vec<String>,
}

impl Product {
    pub fn new(
        collection: impl Into<String>,
        page: impl Into<String>,
        name: impl Into<String>,
        images: Vec<String>,
    ) -> Self {
        let name = name.into();
        Self {
            collection: collection.into(),
            page: page.into(),
            source_name: name.clone(),
            name,
            images,
        }
    }

    /// Whether this entry was produced by duplicating another product
    pub fn is_duplicate(&self) -> bool {
        self.name != self.source_name
    }

    /// Key of the original product, shared by all its duplicates
    pub fn origin_key(&self) -> String {
        format!("{}/{}", self.page, self.source_name)
    }

    /// A copy of this product with a different output folder name
    pub fn duplicated_as(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Relative path of the source image `idx` under the download root
    pub fn source_image(&self, idx: usize) -> Option<String> {
        self.images.get(idx).map(|file| {
            format!(
                "{}/{}",
                layout::product_dir(&self.collection, &self.page, &self.source_name),
                file
            )
        })
    }

    /// Relative path of the watermarked image `idx` under the output root
    pub fn output_image(&self, idx: usize) -> Option<String> {
        self.images.get(idx).map(|file| {
            format!(
                "{}/{}",
                layout::product_dir(&self.collection, &self.page, &self.name),
                file
            )
        })
    }
}

/// Product as listed by the catalog, with URL paths for the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub image_paths: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag() -> Product {
        Product::new("Demo", "1", "Bolso", vec!["a.jpg".into(), "b.jpg".into()])
    }

    #[test]
    fn test_paths_use_source_and_output_names() {
        let copy = bag().duplicated_as("Bolso_copy");
        assert!(copy.is_duplicate());
        assert_eq!(copy.source_image(1).as_deref(), Some("Demo/1/Bolso/b.jpg"));
        assert_eq!(
            copy.output_image(1).as_deref(),
            Some("Demo/1/Bolso_copy/b.jpg")
        );
        assert_eq!(copy.source_image(2), None);
    }

    #[test]
    fn test_origin_key_shared_by_duplicates() {
        let p = bag();
        assert!(!p.is_duplicate());
        assert_eq!(p.origin_key(), p.duplicated_as("Bolso_copy2").origin_key());
    }
}
