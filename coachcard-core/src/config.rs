use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub branding: BrandingConfig,

    #[serde(default)]
    pub renderer: RendererConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Raster geometry and the stabilization policy used by every capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Device-scale multiplier applied on top of width/height
    #[serde(default = "default_pixel_density")]
    pub pixel_density: f32,

    #[serde(default = "default_background_color")]
    pub background_color: String,

    /// Discarded rasterization passes run before the authoritative one
    #[serde(default = "default_warmup_passes")]
    pub warmup_passes: u32,

    /// Settle time after a mount commits, before the card is considered stable
    #[serde(default = "default_stabilization_delay_ms")]
    pub stabilization_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    #[serde(default = "default_brand_name")]
    pub brand_name: String,

    #[serde(default = "default_coach_handle")]
    pub coach_handle: String,

    #[serde(default = "default_accent_color")]
    pub accent_color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RendererStrategy {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    #[serde(default)]
    pub strategy: RendererStrategy,

    /// Extra font files to load next to the system fonts
    #[serde(default = "default_fonts_dir")]
    pub fonts_dir: String,

    #[serde(default = "default_font_family")]
    pub font_family: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_google_fonts")]
    pub google_fonts: String,

    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,

    #[serde(default = "default_pdf_file_name")]
    pub pdf_file_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_width() -> u32 {
    1080
}

fn default_height() -> u32 {
    1920
}

fn default_pixel_density() -> f32 {
    2.0
}

fn default_background_color() -> String {
    "#0a0a0a".to_string()
}

fn default_warmup_passes() -> u32 {
    1
}

fn default_stabilization_delay_ms() -> u64 {
    200
}

fn default_brand_name() -> String {
    "PipeTrainer".to_string()
}

fn default_coach_handle() -> String {
    "Pipetrainer_11".to_string()
}

fn default_accent_color() -> String {
    "#ccff00".to_string()
}

fn default_fonts_dir() -> String {
    "fonts".to_string()
}

fn default_font_family() -> String {
    "Inter".to_string()
}

fn default_remote_endpoint() -> String {
    "https://hcti.io/v1/image".to_string()
}

fn default_google_fonts() -> String {
    "Inter".to_string()
}

fn default_remote_timeout_secs() -> u64 {
    60
}

fn default_output_directory() -> String {
    "output".to_string()
}

fn default_pdf_file_name() -> String {
    "plan-de-entrenamiento.pdf".to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            pixel_density: default_pixel_density(),
            background_color: default_background_color(),
            warmup_passes: default_warmup_passes(),
            stabilization_delay_ms: default_stabilization_delay_ms(),
        }
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            brand_name: default_brand_name(),
            coach_handle: default_coach_handle(),
            accent_color: default_accent_color(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            strategy: RendererStrategy::default(),
            fonts_dir: default_fonts_dir(),
            font_family: default_font_family(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_remote_endpoint(),
            user_id: String::new(),
            api_key: String::new(),
            google_fonts: default_google_fonts(),
            timeout_secs: default_remote_timeout_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            pdf_file_name: default_pdf_file_name(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            capture: CaptureConfig::default(),
            branding: BrandingConfig::default(),
            renderer: RendererConfig::default(),
            remote: RemoteConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl CoreConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: CoreConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

impl CaptureConfig {
    pub fn stabilization_delay(&self) -> Duration {
        Duration::from_millis(self.stabilization_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.capture.width, 1080);
        assert_eq!(config.capture.height, 1920);
        assert_eq!(config.capture.pixel_density, 2.0);
        assert_eq!(config.capture.warmup_passes, 1);
        assert_eq!(config.capture.stabilization_delay(), Duration::from_millis(200));
        assert_eq!(config.branding.coach_handle, "Pipetrainer_11");
        assert_eq!(config.renderer.strategy, RendererStrategy::Local);
        assert_eq!(config.output.pdf_file_name, "plan-de-entrenamiento.pdf");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[capture]
stabilization_delay_ms = 350
pixel_density = 1.0

[renderer]
strategy = "remote"

[remote]
user_id = "user"
api_key = "key"
"#
        )
        .unwrap();

        let config = CoreConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.capture.stabilization_delay_ms, 350);
        assert_eq!(config.capture.pixel_density, 1.0);
        assert_eq!(config.capture.width, 1080);
        assert_eq!(config.renderer.strategy, RendererStrategy::Remote);
        assert_eq!(config.remote.user_id, "user");
        assert_eq!(config.remote.endpoint, "https://hcti.io/v1/image");
        assert_eq!(config.branding.accent_color, "#ccff00");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.capture.height, 1920);
    }
}
