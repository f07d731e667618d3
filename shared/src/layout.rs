//! On-disk layout helpers
//!
//! Both the fetcher and the server agree on `<root>/<collection>/<page>/<product>/<image>`.
//! These helpers keep the naming rules in one place.

use std::path::Path;

/// Longest folder/file name the fetcher will create (in characters)
pub const MAX_NAME_LEN: usize = 250;

/// Folder name used for names that would resolve to `.` or `..`
pub const PLACEHOLDER_NAME: &str = "_";

/// Image file extensions recognised by the catalog (lowercase, no dot)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Sanitize a product or collection name for use as a folder name.
///
/// Path separators become `-`, NUL bytes are dropped and the result is
/// capped at [`MAX_NAME_LEN`] characters. Everything else, including CJK
/// text and punctuation, is kept verbatim. `.` and `..` become
/// [`PLACEHOLDER_NAME`] so a name never points at the parent folder.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| *c != '\0')
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .take(MAX_NAME_LEN)
        .collect();
    match cleaned.trim() {
        "." | ".." => PLACEHOLDER_NAME.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Whether a path has one of the [`IMAGE_EXTENSIONS`] (case-insensitive)
pub fn is_image_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// The `.jpg`/`.jpeg` sibling of a file name, if it has one.
///
/// The image host serves the same hash under either extension, so a
/// download is skipped when its twin is already on disk.
pub fn extension_twin(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" => Some(format!("{stem}.jpeg")),
        "jpeg" => Some(format!("{stem}.jpg")),
        _ => None,
    }
}

/// Relative path of a product folder: `<collection>/<page>/<product>`
pub fn product_dir(collection: &str, page: &str, product: &str) -> String {
    format!("{collection}/{page}/{product}")
}

/// Reject relative paths that could escape their root
/// (absolute paths, `..` components, backslashes, NUL bytes).
pub fn is_safe_relative(path: &str) -> bool {
    if path.is_empty() || path.contains('\0') || path.contains('\\') || path.starts_with('/') {
        return false;
    }
    path.split('/').all(|seg| !seg.is_empty() && seg != "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize_filename("a/b\\c"), "a-b-c");
        assert_eq!(sanitize_filename("  Bolso\0 Negro "), "Bolso Negro");
    }

    #[test]
    fn test_sanitize_never_yields_dot_segments() {
        assert_eq!(sanitize_filename(".."), PLACEHOLDER_NAME);
        assert_eq!(sanitize_filename(" . "), PLACEHOLDER_NAME);
        assert_eq!(sanitize_filename("../.."), "..-..");
        assert_eq!(sanitize_filename("..."), "...");
        assert!(is_safe_relative(&product_dir("Demo", "1", &sanitize_filename(".."))));
    }

    #[test]
    fn test_sanitize_keeps_non_ascii() {
        assert_eq!(sanitize_filename("春季系列「新品」!"), "春季系列「新品」!");
    }

    #[test]
    fn test_sanitize_caps_length_in_chars() {
        let long = "款".repeat(300);
        assert_eq!(sanitize_filename(&long).chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file("a/b/photo.JPG"));
        assert!(is_image_file("x.webp"));
        assert!(!is_image_file("notes.txt"));
        assert!(!is_image_file("noext"));
    }

    #[test]
    fn test_extension_twin() {
        assert_eq!(extension_twin("abc.jpg").as_deref(), Some("abc.jpeg"));
        assert_eq!(extension_twin("abc.jpeg").as_deref(), Some("abc.jpg"));
        assert_eq!(extension_twin("abc.png"), None);
        assert_eq!(extension_twin("abc"), None);
    }

    #[test]
    fn test_is_safe_relative() {
        assert!(is_safe_relative("Demo/1/Bolso/a.jpg"));
        assert!(!is_safe_relative("../secret"));
        assert!(!is_safe_relative("Demo/../../x"));
        assert!(!is_safe_relative("/etc/passwd"));
        assert!(!is_safe_relative("a\\b"));
        assert!(!is_safe_relative("a//b"));
        assert!(!is_safe_relative(""));
    }
}
