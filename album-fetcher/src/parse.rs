//! HTML 解析
//!
//! Pure functions over page HTML: lock-page detection, collection name
//! detection, product links on a listing page and image URLs on an album
//! page. Nothing here touches the network.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use url::Url;

use crate::config::{DEFAULT_COLLECTION, IMAGE_HOST};

// Literal patterns; `test_patterns_compile` forces every one of them
static CATEGORY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"分类["'“”]([^"'“”]+)["'“”]下的相册"#)
        .unwrap_or_else(|e| panic!("invalid category label pattern: {e}"))
});

static SERIES_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\S+系列)").unwrap_or_else(|e| panic!("invalid series pattern: {e}"))
});

static BACKGROUND_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(["']?(https?://[^"')]+|//[^"')]+)["']?\)"#)
        .unwrap_or_else(|e| panic!("invalid background url pattern: {e}"))
});

static TOTAL_ALBUMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)共\s*(\d+)\s*个相册|en total (\d+) álbumes|total (\d+) albums|(\d+)\s+albums? total")
        .unwrap_or_else(|e| panic!("invalid album total pattern: {e}"))
});

/// Navigation and language labels that are never product or collection names
const BOILERPLATE: &[&str] = &[
    "登录",
    "注册",
    "home",
    "album",
    "all categories",
    "yupoo",
    "search",
    "qr code",
    "简体中文",
    "english",
    "繁體中文",
    "español",
    "portugues",
    "français",
    "deutsch",
    "русский",
];

/// Path fragments of site chrome images (logos, icons)
const CHROME_IMAGE_PATHS: &[&str] = &["/static/", "/website/", "/icons/"];

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn is_boilerplate(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    BOILERPLATE.contains(&lower.as_str())
}

fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Text that can stand for a product name: not a photo count, not a single
/// character, not a URL, not navigation.
fn is_name_candidate(text: &str) -> bool {
    text.chars().count() > 1 && !is_numeric(text) && !text.starts_with("http") && !is_boilerplate(text)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join(" ")
}

fn digits_after<'a>(haystack: &'a str, marker: &str) -> Option<&'a str> {
    let start = haystack.find(marker)? + marker.len();
    let rest = &haystack[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

/// Numeric id in `/categories/<id>`
pub fn category_id(url: &str) -> Option<&str> {
    digits_after(url, "/categories/")
}

/// Numeric id in `/albums/<id>`
pub fn album_id(href: &str) -> Option<&str> {
    digits_after(href, "/albums/")
}

/// Whether the page is a password prompt instead of content
pub fn is_locked(html: &str) -> bool {
    if html.to_lowercase().contains("indexlock") {
        return true;
    }
    let doc = Html::parse_document(html);
    let text = doc.root_element().text().collect::<String>().to_lowercase();
    text.contains("encrypted") || text.contains("请输入密码") || text.contains("enter password")
}

/// Detect the human collection name on a listing page
///
/// Tried in order: the `分类"X"下的相册` caption, links pointing at the same
/// category, `h1..h3` headings containing `系列`.
pub fn extract_category_name(html: &str, category_url: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    let text = doc.root_element().text().collect::<String>();
    if let Some(caps) = CATEGORY_LABEL.captures(&text) {
        let name = caps[1].trim();
        if !name.is_empty() && !is_boilerplate(name) {
            return Some(name.to_string());
        }
    }

    if let (Some(id), Some(links)) = (category_id(category_url), selector("a[href]")) {
        let target = format!("/categories/{id}");
        for link in doc.select(&links) {
            let href = link.value().attr("href").unwrap_or_default();
            if !href.contains(&target) || href.contains("?page=") {
                continue;
            }
            let label = element_text(link);
            if label.chars().count() >= 3 && !is_boilerplate(&label) {
                return Some(label);
            }
        }
    }

    if let Some(headings) = selector("h1, h2, h3") {
        for heading in doc.select(&headings) {
            let label = element_text(heading);
            if let Some(caps) = SERIES_WORD.captures(&label)
                && !is_boilerplate(&caps[1])
            {
                return Some(caps[1].to_string());
            }
        }
    }

    None
}

/// Name used when detection fails: `Categoria_<id>`, else a fixed default
pub fn fallback_collection_name(category_url: &str) -> String {
    category_id(category_url)
        .map(|id| format!("Categoria_{id}"))
        .unwrap_or_else(|| DEFAULT_COLLECTION.to_string())
}

/// A product album found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLink {
    pub album_id: String,
    pub url: String,
    pub name: String,
}

/// A product skipped because an earlier link on the same page had its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDuplicate {
    pub name: String,
    pub url: String,
    pub first_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProductScan {
    pub products: Vec<ProductLink>,
    pub duplicates: Vec<SkippedDuplicate>,
}

fn inside_site_chrome(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| matches!(a.value().name(), "nav" | "header" | "footer"))
}

/// The anchor text is usually just the photo count; the name sits in the
/// enclosing card.
fn product_name(link: ElementRef<'_>) -> Option<String> {
    let link_text = element_text(link);
    let container = link
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| matches!(a.value().name(), "div" | "article" | "section" | "li"));

    if let Some(container) = container {
        let found = container
            .text()
            .map(str::trim)
            .find(|line| is_name_candidate(line));
        if let Some(line) = found {
            return Some(line.to_string());
        }

        if let Some(headings) = selector("h2, h3, h4") {
            for heading in container.select(&headings) {
                let text = element_text(heading);
                if text != link_text && is_name_candidate(&text) {
                    return Some(text);
                }
            }
        }
    }

    is_name_candidate(&link_text).then_some(link_text)
}

/// Product albums on a listing page, deduplicated by album id, URL and name
pub fn extract_products(html: &str, page_url: &Url) -> ProductScan {
    let doc = Html::parse_document(html);
    let Some(album_links) = selector(r#"a[href*="/albums/"]"#) else {
        return ProductScan::default();
    };

    let mut seen_ids = HashSet::new();
    let mut seen_urls = HashSet::new();
    let mut found = Vec::new();

    for link in doc.select(&album_links) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let listing_param = href.contains("?uid=") || href.contains("&isSubCate=");
        if !listing_param && inside_site_chrome(link) {
            continue;
        }
        let Some(id) = album_id(href) else {
            continue;
        };
        if seen_ids.contains(id) {
            continue;
        }
        let full_url = if href.starts_with("http") {
            href.to_string()
        } else if href.starts_with('/') {
            match page_url.join(href) {
                Ok(u) => u.to_string(),
                Err(_) => continue,
            }
        } else {
            continue;
        };
        if seen_urls.contains(&full_url) {
            continue;
        }
        let Some(name) = product_name(link) else {
            continue;
        };

        seen_ids.insert(id.to_string());
        seen_urls.insert(full_url.clone());
        found.push(ProductLink {
            album_id: id.to_string(),
            url: full_url,
            name,
        });
    }

    let mut first_by_name: HashMap<String, String> = HashMap::new();
    let mut scan = ProductScan::default();
    for product in found {
        match first_by_name.get(&product.name) {
            Some(first_url) => scan.duplicates.push(SkippedDuplicate {
                name: product.name.clone(),
                url: product.url.clone(),
                first_url: first_url.clone(),
            }),
            None => {
                first_by_name.insert(product.name.clone(), product.url.clone());
                scan.products.push(product);
            }
        }
    }
    scan
}

fn img_src<'a>(el: &ElementRef<'a>) -> Option<&'a str> {
    ["src", "data-src", "data-original"]
        .iter()
        .find_map(|attr| el.value().attr(attr).filter(|v| !v.is_empty()))
}

/// Absolute, query-free, large-size URL on the image host
fn normalize_image_url(raw: &str) -> Option<String> {
    let url = if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    };
    if !url.starts_with("http") || !url.contains(IMAGE_HOST) {
        return None;
    }
    let url = url.split('?').next().unwrap_or(&url);
    Some(url.replace("/small.", "/large."))
}

/// Image URLs on an album page, in page order, without duplicates
pub fn extract_image_urls(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut urls: Vec<String> = Vec::new();
    let mut push = |url: String| {
        if !urls.contains(&url) {
            urls.push(url);
        }
    };

    if let Some(viewer) = selector(r#"img[class*="image__img"], img[class*="showalbum__bigimg"]"#) {
        for img in doc.select(&viewer) {
            if let Some(url) = img_src(&img).and_then(normalize_image_url) {
                push(url);
            }
        }
    }

    if let Some(styled) = selector(r#"div[style*="background-image"]"#) {
        for div in doc.select(&styled) {
            let style = div.value().attr("style").unwrap_or_default();
            if let Some(url) = BACKGROUND_URL.captures(style).and_then(|c| normalize_image_url(&c[1])) {
                push(url);
            }
        }
    }

    if let Some(all) = selector("img") {
        for img in doc.select(&all) {
            if let Some(url) = img_src(&img).and_then(normalize_image_url)
                && !CHROME_IMAGE_PATHS.iter().any(|p| url.contains(p))
            {
                push(url);
            }
        }
    }

    urls
}

/// An image on the host, identified by owner and content hash
///
/// Host URLs look like `https://photo.yupoo.com/<owner>/<hash>/<size>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub owner: String,
    pub hash: String,
    pub ext: String,
}

impl ImageRef {
    pub fn parse(url: &str) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        if parsed.host_str()? != IMAGE_HOST {
            return None;
        }
        let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
        let [.., owner, hash, file] = segments.as_slice() else {
            return None;
        };
        let ext = file
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| "jpg".to_string());
        Some(Self {
            owner: owner.to_string(),
            hash: hash.to_string(),
            ext,
        })
    }

    /// URL of this image at a given resolution tier (`large`, `medium`)
    pub fn tier_url(&self, tier: &str) -> String {
        format!(
            "https://{IMAGE_HOST}/{}/{}/{}.{}",
            self.owner, self.hash, tier, self.ext
        )
    }

    /// Saved file name: `<hash>.<ext>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.hash, self.ext)
    }
}

/// Album count the category advertises ("共 N 个相册", "en total N álbumes",
/// "total N albums")
pub fn total_albums(html: &str) -> Option<usize> {
    let doc = Html::parse_document(html);
    let text = doc.root_element().text().collect::<Vec<_>>().join(" ");
    let caps = TOTAL_ALBUMS.captures(&text)?;
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .and_then(|m| m.as_str().parse().ok())
}
