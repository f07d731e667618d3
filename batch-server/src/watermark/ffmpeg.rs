//! ffmpeg drawtext watermark

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::sync::OnceCell;

use super::{WatermarkApplier, WatermarkError};
use crate::core::config::WatermarkConfig;

/// Escape text for a drawtext `text=` value inside a filtergraph
///
/// Two levels: the drawtext option parser (`\ ' : %`) and then the
/// filtergraph parser (`\ ' , ; [ ]`).
pub fn escape_drawtext(text: &str) -> String {
    let mut option_level = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '\'' | ':' | '%') {
            option_level.push('\\');
        }
        option_level.push(c);
    }

    let mut graph_level = String::with_capacity(option_level.len());
    for c in option_level.chars() {
        if matches!(c, '\\' | '\'' | ',' | ';' | '[' | ']') {
            graph_level.push('\\');
        }
        graph_level.push(c);
    }
    graph_level
}

enum FontSpec {
    File(PathBuf),
    Name(String),
}

pub struct FfmpegWatermarker {
    config: WatermarkConfig,
    available: OnceCell<bool>,
}

impl FfmpegWatermarker {
    pub fn new(config: WatermarkConfig) -> Self {
        Self {
            config,
            available: OnceCell::new(),
        }
    }

    /// `ffmpeg -version` succeeds; checked once per process
    pub async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                let version = Command::new(&self.config.ffmpeg_bin)
                    .arg("-version")
                    .kill_on_drop(true)
                    .output()
                    .await;
                match version {
                    Ok(out) if out.status.success() => true,
                    Ok(out) => {
                        tracing::error!(status = %out.status, "ffmpeg -version failed");
                        false
                    }
                    Err(e) => {
                        tracing::error!(bin = %self.config.ffmpeg_bin, error = %e, "ffmpeg not found");
                        false
                    }
                }
            })
            .await
    }

    fn font(&self) -> Result<FontSpec, WatermarkError> {
        if self.config.font.is_file() {
            return Ok(FontSpec::File(self.config.font.clone()));
        }
        match &self.config.fallback_font {
            Some(name) => {
                tracing::warn!(
                    font = %self.config.font.display(),
                    fallback = %name,
                    "Font file not found, using system font"
                );
                Ok(FontSpec::Name(name.clone()))
            }
            None => Err(WatermarkError::FontMissing(
                self.config.font.display().to_string(),
            )),
        }
    }

    /// The `-vf` argument
    fn filter(&self, label: &str) -> Result<String, WatermarkError> {
        let text = self.config.fixed_text.as_deref().unwrap_or(label);
        let font = match self.font()? {
            FontSpec::File(path) => format!("fontfile={}", escape_drawtext(&path.to_string_lossy())),
            FontSpec::Name(name) => format!("font={}", escape_drawtext(&name)),
        };
        Ok(format!(
            "drawtext=text={}:{}:fontsize={}:fontcolor=white@0.4:shadowcolor=gray@0.9:\
             shadowx=1:shadowy=1:x=(w-text_w)/2:y=(h-text_h)/2",
            escape_drawtext(text),
            font,
            self.config.font_size
        ))
    }
}

#[async_trait]
impl WatermarkApplier for FfmpegWatermarker {
    async fn apply(&self, source: &Path, dest: &Path, label: &str) -> Result<(), WatermarkError> {
        if !tokio::fs::try_exists(source).await.unwrap_or(false) {
            return Err(WatermarkError::SourceMissing(source.to_path_buf()));
        }
        if !self.is_available().await {
            return Err(WatermarkError::ToolMissing(self.config.ffmpeg_bin.clone()));
        }
        let filter = self.filter(label)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let output = Command::new(&self.config.ffmpeg_bin)
            .arg("-y")
            .arg("-i")
            .arg(source)
            .arg("-vf")
            .arg(&filter)
            .args(["-frames:v", "1", "-q:v", "2"])
            .arg(dest)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(3)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join(" | ");
            return Err(WatermarkError::Failed {
                status: output.status.to_string(),
                stderr: tail,
            });
        }

        tracing::debug!(dest = %dest.display(), "Watermark applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(font: PathBuf, fallback: Option<&str>) -> WatermarkConfig {
        WatermarkConfig {
            ffmpeg_bin: "ffmpeg-binary-that-does-not-exist".into(),
            font,
            fallback_font: fallback.map(str::to_string),
            fixed_text: None,
            font_size: 30,
        }
    }

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("Camiseta - Rojo"), "Camiseta - Rojo");
        assert_eq!(escape_drawtext("a:b"), "a\\\\:b");
        assert_eq!(escape_drawtext("it's"), "it\\\\\\'s");
        assert_eq!(escape_drawtext("x,y"), "x\\,y");
    }

    #[test]
    fn test_filter_falls_back_to_font_name() {
        let wm = FfmpegWatermarker::new(config("/nonexistent/font.ttf".into(), Some("Verdana-Bold")));
        let filter = wm.filter("Bolso - Negro").unwrap();
        assert!(filter.starts_with("drawtext=text=Bolso - Negro:font=Verdana-Bold:fontsize=30"));
        assert!(filter.contains("fontcolor=white@0.4"));
        assert!(filter.ends_with("x=(w-text_w)/2:y=(h-text_h)/2"));
    }

    #[test]
    fn test_filter_uses_existing_font_file_and_fixed_text() {
        let dir = tempfile::tempdir().unwrap();
        let font = dir.path().join("brand.ttf");
        std::fs::write(&font, b"ttf").unwrap();
        let mut cfg = config(font.clone(), None);
        cfg.fixed_text = Some("SHOP.COM".into());
        let wm = FfmpegWatermarker::new(cfg);
        let filter = wm.filter("ignored").unwrap();
        assert!(filter.starts_with("drawtext=text=SHOP.COM:fontfile="));
    }

    #[test]
    fn test_missing_font_without_fallback() {
        let wm = FfmpegWatermarker::new(config("/nonexistent/font.ttf".into(), None));
        assert!(matches!(wm.filter("x"), Err(WatermarkError::FontMissing(_))));
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.jpg");
        std::fs::write(&src, b"jpg").unwrap();
        let wm = FfmpegWatermarker::new(config("/nonexistent/font.ttf".into(), Some("Sans")));

        let err = wm.apply(&src, &dir.path().join("out/a.jpg"), "x").await.unwrap_err();
        assert!(matches!(err, WatermarkError::ToolMissing(_)));
        assert!(!wm.is_available().await);

        let err = wm
            .apply(&dir.path().join("missing.jpg"), &dir.path().join("o.jpg"), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, WatermarkError::SourceMissing(_)));
    }

    #[tokio::test]
    async fn test_remove_missing_output_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let wm = FfmpegWatermarker::new(config("/nonexistent/font.ttf".into(), None));
        wm.remove(&dir.path().join("nothing.jpg")).await.unwrap();
    }
}
