use async_trait::async_trait;
use resvg::tiny_skia;
use resvg::usvg::{Options, Tree, fontdb};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{CaptureOptions, Capturer, RasterImage};
use crate::error::CaptureError;
use crate::template::{Rgb, VisualNode};

const FALLBACK_BACKGROUND: Rgb = Rgb::new(0x0a, 0x0a, 0x0a);

/// Rasterizes the card's SVG in-process with resvg
pub struct LocalRasterCapturer {
    fonts_dir: PathBuf,
    font_family: String,
    fontdb: OnceCell<Arc<fontdb::Database>>,
}

impl LocalRasterCapturer {
    pub fn new(fonts_dir: impl Into<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            fonts_dir: fonts_dir.into(),
            font_family: font_family.into(),
            fontdb: OnceCell::new(),
        }
    }

    /// Font database, loaded on first use and shared by every later pass
    async fn font_database(&self) -> Arc<fontdb::Database> {
        self.fontdb
            .get_or_init(|| async {
                let fonts_dir = self.fonts_dir.clone();
                let loaded = tokio::task::spawn_blocking(move || {
                    let mut fontdb = fontdb::Database::new();
                    fontdb.load_system_fonts();
                    if fonts_dir.is_dir() {
                        fontdb.load_fonts_dir(&fonts_dir);
                    }
                    if has_usable_fonts(&fontdb, &fonts_dir) {
                        debug!("Loaded {} font faces", fontdb.len());
                    }
                    fontdb
                })
                .await;

                match loaded {
                    Ok(fontdb) => Arc::new(fontdb),
                    Err(e) => {
                        warn!("Font loading task failed: {}", e);
                        Arc::new(fontdb::Database::new())
                    }
                }
            })
            .await
            .clone()
    }
}

/// Without any face every text node renders blank
fn has_usable_fonts(fontdb: &fontdb::Database, fonts_dir: &Path) -> bool {
    if fontdb.is_empty() {
        warn!(
            "No font faces found on the system or in {}; card text will not render",
            fonts_dir.display()
        );
        return false;
    }
    true
}

#[async_trait]
impl Capturer for LocalRasterCapturer {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn rasterize(
        &self,
        node: &VisualNode,
        options: &CaptureOptions,
    ) -> Result<RasterImage, CaptureError> {
        let fontdb = self.font_database().await;
        let svg = node.to_svg();
        let font_family = self.font_family.clone();
        let options = options.clone();

        match tokio::task::spawn_blocking(move || render_png(&svg, fontdb, font_family, &options)).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Rasterization task failed: {}", e);
                Err(CaptureError::Unknown)
            }
        }
    }
}

fn render_png(
    svg: &str,
    fontdb: Arc<fontdb::Database>,
    font_family: String,
    capture: &CaptureOptions,
) -> Result<RasterImage, CaptureError> {
    let mut options = Options::default();
    options.font_family = font_family;
    options.fontdb = fontdb;

    let tree = Tree::from_str(svg, &options)
        .map_err(|e| CaptureError::raster(format!("Failed to parse SVG: {}", e)))?;

    let (width, height) = capture.pixel_size();
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        CaptureError::raster(format!("Failed to create {}x{} pixmap", width, height))
    })?;

    let background = Rgb::parse_or(&capture.background_color, FALLBACK_BACKGROUND);
    pixmap.fill(tiny_skia::Color::from_rgba8(background.r, background.g, background.b, 255));

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let png = pixmap
        .encode_png()
        .map_err(|e| CaptureError::raster(format!("Failed to encode PNG: {}", e)))?;
    Ok(RasterImage::Png(png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_node;

    #[test]
    fn test_empty_font_database_is_not_usable() {
        assert!(!has_usable_fonts(&fontdb::Database::new(), Path::new("fonts")));
    }

    fn small_options() -> CaptureOptions {
        CaptureOptions {
            width: 108,
            height: 192,
            pixel_density: 2.0,
            background_color: "#0a0a0a".to_string(),
        }
    }

    #[tokio::test]
    async fn test_rasterizes_card_at_device_scale() {
        let capturer = LocalRasterCapturer::new("missing-fonts-dir", "Inter");
        let mut node = sample_node(2, 4);
        node.width = 108;
        node.height = 192;

        let image = capturer.rasterize(&node, &small_options()).await.unwrap();
        let png = image.as_png().expect("local capture yields PNG bytes");

        let decoded = image::load_from_memory(png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (216, 384));

        let corner = decoded.to_rgb8().get_pixel(0, 0).0;
        assert!(corner.iter().all(|channel| *channel < 0x40));
    }

    #[tokio::test]
    async fn test_repeated_passes_match() {
        let capturer = LocalRasterCapturer::new("missing-fonts-dir", "Inter");
        let node = sample_node(1, 1);
        let options = small_options();

        let first = capturer.rasterize(&node, &options).await.unwrap();
        let second = capturer.rasterize(&node, &options).await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_size_is_reported() {
        let fontdb = Arc::new(fontdb::Database::new());
        let options = CaptureOptions {
            width: 0,
            ..small_options()
        };

        let err = render_png(&sample_node(1, 1).to_svg(), fontdb, "Inter".to_string(), &options)
            .unwrap_err();
        assert!(err.to_string().contains("pixmap"));
    }
}
