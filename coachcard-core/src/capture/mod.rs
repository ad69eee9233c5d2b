///! Capture: turning a mounted card into a raster image
///!
///! `Capturer` is the rasterization strategy (local resvg or the remote
///! rendering API); `CaptureEngine` wraps one with the warm-up protocol.

mod engine;
mod local;
mod remote;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

use crate::config::{CaptureConfig, CoreConfig, RendererStrategy};
use crate::error::CaptureError;
use crate::template::VisualNode;

pub use engine::CaptureEngine;
pub use local::LocalRasterCapturer;
pub use remote::{ApiCredentials, RemoteApiCapturer};

/// Output geometry for one capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    pub width: u32,
    pub height: u32,
    pub pixel_density: f32,
    pub background_color: String,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::from(&CaptureConfig::default())
    }
}

impl From<&CaptureConfig> for CaptureOptions {
    fn from(config: &CaptureConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            pixel_density: config.pixel_density,
            background_color: config.background_color.clone(),
        }
    }
}

impl CaptureOptions {
    /// Raster size in device pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        let scale = if self.pixel_density > 0.0 { self.pixel_density } else { 1.0 };
        (
            (self.width as f32 * scale).round() as u32,
            (self.height as f32 * scale).round() as u32,
        )
    }
}

/// A captured raster: encoded PNG bytes, or a URL where the renderer stored it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterImage {
    Png(Vec<u8>),
    Url(String),
}

impl RasterImage {
    /// Something an `<img src>` accepts: a PNG data URL or the remote URL
    pub fn to_data_url(&self) -> String {
        match self {
            RasterImage::Png(bytes) => format!("data:image/png;base64,{}", STANDARD.encode(bytes)),
            RasterImage::Url(url) => url.clone(),
        }
    }

    pub fn as_png(&self) -> Option<&[u8]> {
        match self {
            RasterImage::Png(bytes) => Some(bytes),
            RasterImage::Url(_) => None,
        }
    }
}

/// A rasterization strategy.
///
/// One call is one pass: implementations must not retry or repeat work on
/// their own, the engine decides how many passes run.
#[async_trait]
pub trait Capturer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn rasterize(
        &self,
        node: &VisualNode,
        options: &CaptureOptions,
    ) -> Result<RasterImage, CaptureError>;
}

/// Build the capturer selected by `[renderer] strategy`
pub fn capturer_from_config(config: &CoreConfig) -> anyhow::Result<Arc<dyn Capturer>> {
    let capturer: Arc<dyn Capturer> = match config.renderer.strategy {
        RendererStrategy::Local => Arc::new(LocalRasterCapturer::new(
            &config.renderer.fonts_dir,
            &config.renderer.font_family,
        )),
        RendererStrategy::Remote => Arc::new(RemoteApiCapturer::new(&config.remote)?),
    };
    tracing::info!("Using {} capturer", capturer.name());
    Ok(capturer)
}
