//! Multi-page document assembly
//!
//! Every captured card becomes one full-bleed page. Pages are sized in
//! logical pixels at 96 per inch, so a 1080x1920 capture gives a
//! 285.75 x 508 mm page whatever the capture's pixel density.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage, Rgba};
use printpdf::{
    ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};
use std::io::BufWriter;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::capture::RasterImage;
use crate::config::CoreConfig;
use crate::error::AssemblyError;
use crate::orchestrator::CapturedImage;
use crate::template::Rgb;

pub const DEFAULT_DOCUMENT_TITLE: &str = "Plan de Entrenamiento";
pub const DEFAULT_FILE_NAME: &str = "plan-de-entrenamiento.pdf";
const LOGICAL_DPI: f32 = 96.0;
const MM_PER_INCH: f32 = 25.4;
const JPEG_QUALITY: u8 = 90;

/// Page size in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

impl PageSize {
    pub fn width_mm(&self) -> f32 {
        px_to_mm(self.width as f32)
    }

    pub fn height_mm(&self) -> f32 {
        px_to_mm(self.height as f32)
    }
}

fn px_to_mm(px: f32) -> f32 {
    px * MM_PER_INCH / LOGICAL_DPI
}

/// Where an image sits on its page, in logical pixels from the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPage {
    pub index: usize,
    pub week_number: u32,
    pub day_number: u32,
    pub size: PageSize,
    pub placement: Placement,
}

/// Finished PDF plus the layout it was built from
#[derive(Debug, Clone)]
pub struct DocumentBuffer {
    pub bytes: Vec<u8>,
    pub pages: Vec<DocumentPage>,
    pub file_name: String,
}

impl DocumentBuffer {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

pub struct DocumentAssembler {
    page_size: PageSize,
    title: String,
    file_name: String,
    background: Rgb,
    http: reqwest::Client,
}

impl DocumentAssembler {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            title: DEFAULT_DOCUMENT_TITLE.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            background: Rgb::new(0x0a, 0x0a, 0x0a),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        let mut assembler = Self::new(PageSize {
            width: config.capture.width,
            height: config.capture.height,
        });
        assembler.file_name = config.output.pdf_file_name.clone();
        assembler.background = Rgb::parse_or(&config.capture.background_color, assembler.background);
        assembler
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Page plan for `images`: one full-bleed page each, in input order
    pub fn layout(&self, images: &[CapturedImage]) -> Result<Vec<DocumentPage>, AssemblyError> {
        if images.is_empty() {
            return Err(AssemblyError::EmptyInput);
        }

        let placement = Placement {
            x: 0.0,
            y: 0.0,
            width: self.page_size.width as f32,
            height: self.page_size.height as f32,
        };

        Ok(images
            .iter()
            .enumerate()
            .map(|(index, image)| DocumentPage {
                index,
                week_number: image.week_number,
                day_number: image.day_number,
                size: self.page_size,
                placement,
            })
            .collect())
    }

    pub async fn assemble(&self, images: &[CapturedImage]) -> Result<DocumentBuffer, AssemblyError> {
        let pages = self.layout(images)?;

        let mut rasters = Vec::with_capacity(images.len());
        for (index, captured) in images.iter().enumerate() {
            let bytes = self.load_bytes(index, &captured.image).await?;
            let decoded = image::load_from_memory(&bytes)
                .map_err(|source| AssemblyError::Decode { index, source })?;
            rasters.push(flatten(&decoded, self.background));
        }

        let title = self.title.clone();
        let page_size = self.page_size;
        let (bytes, pages_written) =
            tokio::task::spawn_blocking(move || write_pdf(&title, page_size, rasters))
                .await
                .map_err(|e| AssemblyError::Pdf(format!("PDF task failed: {}", e)))??;
        if pages_written != pages.len() {
            return Err(AssemblyError::Pdf(format!(
                "wrote {} pages for {} images",
                pages_written,
                pages.len()
            )));
        }

        info!("Assembled {} ({} pages, {} bytes)", self.file_name, pages.len(), bytes.len());
        Ok(DocumentBuffer {
            bytes,
            pages,
            file_name: self.file_name.clone(),
        })
    }

    async fn load_bytes(&self, index: usize, image: &RasterImage) -> Result<Vec<u8>, AssemblyError> {
        match image {
            RasterImage::Png(bytes) => Ok(bytes.clone()),
            RasterImage::Url(url) if url.starts_with("data:") => decode_data_url(url)
                .ok_or_else(|| AssemblyError::Source {
                    index,
                    message: "malformed data URL".to_string(),
                }),
            RasterImage::Url(url) => {
                debug!("Fetching page {} image from {}", index + 1, url);
                let source_error = |message: String| AssemblyError::Source { index, message };

                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| source_error(e.to_string()))?;
                if !response.status().is_success() {
                    warn!("Image fetch for page {} returned {}", index + 1, response.status());
                    return Err(source_error(format!("HTTP {}", response.status())));
                }
                let bytes = response.bytes().await.map_err(|e| source_error(e.to_string()))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let (header, payload) = url.strip_prefix("data:")?.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(payload).ok()
}

/// Drop the alpha channel by compositing over `background`
fn flatten(image: &DynamicImage, background: Rgb) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let blend = |channel: u8, bg: u8| (channel as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(
            x,
            y,
            image::Rgb([blend(r, background.r), blend(g, background.g), blend(b, background.b)]),
        );
    }
    rgb
}

/// Baseline JPEG of `raster`, embedded as a DCT-filtered image stream
fn encode_jpeg(index: usize, raster: &RgbImage) -> Result<Vec<u8>, AssemblyError> {
    let mut jpeg = Vec::new();
    raster
        .write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY))
        .map_err(|e| AssemblyError::Pdf(format!("page {} could not be encoded: {}", index + 1, e)))?;
    Ok(jpeg)
}

/// Returns the PDF bytes and the number of pages written
fn write_pdf(
    title: &str,
    page_size: PageSize,
    rasters: Vec<RgbImage>,
) -> Result<(Vec<u8>, usize), AssemblyError> {
    let page_width = Mm(page_size.width_mm());
    let page_height = Mm(page_size.height_mm());

    let (doc, first_page, first_layer) = PdfDocument::new(title, page_width, page_height, "Page 1");
    let mut pages_written = 0;

    for (index, raster) in rasters.into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(page_width, page_height, format!("Page {}", index + 1));
            doc.get_page(page).get_layer(layer)
        };

        let (width_px, height_px) = raster.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(AssemblyError::Pdf(format!("image {} has no pixels", index)));
        }

        // Width fills the page at this dpi; height is stretched to match
        let dpi = width_px as f32 / (page_size.width_mm() / MM_PER_INCH);
        let natural_height_mm = height_px as f32 / dpi * MM_PER_INCH;

        let image = Image::from(ImageXObject {
            width: Px(width_px as usize),
            height: Px(height_px as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: encode_jpeg(index, &raster)?,
            image_filter: Some(ImageFilter::DCT),
            clipping_bbox: None,
            smask: None,
        });

        image.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm(0.0)),
                dpi: Some(dpi),
                scale_y: Some(page_size.height_mm() / natural_height_mm),
                ..Default::default()
            },
        );
        pages_written += 1;
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| AssemblyError::Pdf(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| AssemblyError::Pdf(e.to_string()))?;
    Ok((bytes, pages_written))
}
