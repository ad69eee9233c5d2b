use anyhow::Context;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;
use tracing::{debug, warn};

use super::{CaptureOptions, Capturer, RasterImage};
use crate::config::RemoteConfig;
use crate::error::{CaptureError, CredentialsError};
use crate::template::VisualNode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiCredentials {
    pub user_id: String,
    pub api_key: String,
}

impl ApiCredentials {
    pub fn new(user_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            api_key: api_key.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.api_key.trim().is_empty()
    }

    /// `Authorization` header value for HTTP Basic auth
    pub fn basic_auth(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", self.user_id, self.api_key)))
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    html: String,
    css: &'a str,
    google_fonts: &'a str,
    viewport_width: u32,
    viewport_height: u32,
    #[serde(serialize_with = "serialize_scale")]
    device_scale: f32,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    url: String,
}

/// Whole scales go out as integers (`2`, not `2.0`)
fn serialize_scale<S: Serializer>(scale: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    if scale.fract() == 0.0 && *scale >= 0.0 {
        serializer.serialize_u64(*scale as u64)
    } else {
        serializer.serialize_f64(f64::from(*scale))
    }
}

/// Posts the card's HTML and CSS to an hcti-style rendering API and
/// returns the URL of the stored image
pub struct RemoteApiCapturer {
    client: reqwest::Client,
    endpoint: String,
    credentials: ApiCredentials,
    google_fonts: String,
}

impl RemoteApiCapturer {
    pub fn new(config: &RemoteConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build rendering API client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            credentials: ApiCredentials::new(&config.user_id, &config.api_key),
            google_fonts: config.google_fonts.clone(),
        })
    }

    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    fn request_body(&self, node: &VisualNode, options: &CaptureOptions) -> ImageRequest<'_> {
        ImageRequest {
            html: node.to_html(),
            css: node.stylesheet(),
            google_fonts: &self.google_fonts,
            viewport_width: options.width,
            viewport_height: options.height,
            device_scale: options.pixel_density,
        }
    }
}

#[async_trait]
impl Capturer for RemoteApiCapturer {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn rasterize(
        &self,
        node: &VisualNode,
        options: &CaptureOptions,
    ) -> Result<RasterImage, CaptureError> {
        if !self.credentials.is_complete() {
            return Err(CredentialsError.into());
        }

        let body = self.request_body(node, options);
        debug!(
            "Requesting remote render of week {} day {} from {}",
            node.week_number, node.day_number, self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, self.credentials.basic_auth())
            .json(&body)
            .send()
            .await
            .map_err(|e| CaptureError::raster(format!("Failed to reach rendering API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Rendering API returned {}: {}", status, message);
            return Err(CaptureError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let data: ImageResponse = response
            .json()
            .await
            .map_err(|e| CaptureError::raster(format!("Invalid rendering API response: {}", e)))?;

        Ok(RasterImage::Url(data.url))
    }
}
