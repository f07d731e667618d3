//! `.jpg` / `.jpeg` 重复清理
//!
//! Older runs could save the same hash twice under both extensions. For
//! every such pair the host is asked (HEAD) which extension it really
//! serves; the other file is removed. When the host cannot tell, `.jpeg`
//! is kept.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::client::PageSource;
use crate::config::IMAGE_HOST;

/// Files sharing a stem in one folder, differing only by `.jpg`/`.jpeg`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwinGroup {
    pub dir: PathBuf,
    pub stem: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct FixSummary {
    pub groups: usize,
    pub deleted: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, String)>,
}

fn jpeg_like(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false)
}

fn walk(dir: &Path, found: &mut BTreeMap<(PathBuf, String), Vec<PathBuf>>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, found)?;
        } else if jpeg_like(&path)
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            found
                .entry((dir.to_path_buf(), stem.to_string()))
                .or_default()
                .push(path.clone());
        }
    }
    Ok(())
}

/// All twin groups under `root`
pub fn find_twins(root: &Path) -> std::io::Result<Vec<TwinGroup>> {
    let mut found = BTreeMap::new();
    walk(root, &mut found)?;
    Ok(found
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|((dir, stem), mut files)| {
            files.sort();
            TwinGroup { dir, stem, files }
        })
        .collect())
}

/// Extension the host serves for `hash` (`"jpeg"` when unknown)
pub async fn served_extension(source: &dyn PageSource, owner: &str, hash: &str) -> &'static str {
    for ext in ["jpeg", "jpg"] {
        let url = format!("https://{IMAGE_HOST}/{owner}/{hash}/large.{ext}");
        if source.serves_image(&url).await {
            return ext;
        }
    }
    "jpeg"
}

/// Remove the wrong twin of every group under `root`
pub async fn fix_twins(
    source: &dyn PageSource,
    root: &Path,
    owner: &str,
    dry_run: bool,
) -> std::io::Result<FixSummary> {
    let groups = find_twins(root)?;
    let mut summary = FixSummary {
        groups: groups.len(),
        ..Default::default()
    };

    // one HEAD request per hash, even when it appears in several folders
    let mut served: HashMap<String, &'static str> = HashMap::new();
    for group in &groups {
        if !served.contains_key(&group.stem) {
            let ext = served_extension(source, owner, &group.stem).await;
            served.insert(group.stem.clone(), ext);
        }
    }

    for group in groups {
        let keep_ext = served.get(&group.stem).copied().unwrap_or("jpeg");
        let keep = group
            .files
            .iter()
            .position(|f| {
                f.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(keep_ext))
            })
            .unwrap_or(0);

        for (idx, file) in group.files.iter().enumerate() {
            if idx == keep {
                continue;
            }
            if dry_run {
                tracing::info!(file = %file.display(), "Would delete");
                summary.deleted.push(file.clone());
                continue;
            }
            match tokio::fs::remove_file(file).await {
                Ok(()) => {
                    tracing::info!(file = %file.display(), "Deleted duplicate extension");
                    summary.deleted.push(file.clone());
                }
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "Delete failed");
                    summary.errors.push((file.clone(), e.to_string()));
                }
            }
        }
    }

    Ok(summary)
}
