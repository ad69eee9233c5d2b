use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{CaptureOptions, Capturer, RasterImage};
use crate::error::CaptureError;
use crate::mount::MountedTarget;
use crate::template::VisualNode;

/// Runs the warm-up protocol around a `Capturer`.
///
/// The first rasterization of a freshly mounted card is unreliable (fonts
/// and images may still be resolving), so every capture runs at least one
/// discarded pass with the same options before the pass that is returned.
pub struct CaptureEngine {
    capturer: Arc<dyn Capturer>,
    warmup_passes: u32,
}

impl CaptureEngine {
    pub fn new(capturer: Arc<dyn Capturer>) -> Self {
        Self {
            capturer,
            warmup_passes: 1,
        }
    }

    /// Number of discarded passes; never lower than one
    pub fn with_warmup_passes(mut self, passes: u32) -> Self {
        self.warmup_passes = passes.max(1);
        self
    }

    pub fn warmup_passes(&self) -> u32 {
        self.warmup_passes
    }

    /// Capture whatever is mounted in `target`
    pub async fn capture(
        &self,
        target: &MountedTarget<'_>,
        options: &CaptureOptions,
    ) -> Result<RasterImage, CaptureError> {
        let node = target.node()?;
        self.capture_node(node, options).await
    }

    pub async fn capture_node(
        &self,
        node: &VisualNode,
        options: &CaptureOptions,
    ) -> Result<RasterImage, CaptureError> {
        for pass in 0..self.warmup_passes {
            debug!(
                "Warm-up pass {}/{} for week {} day {}",
                pass + 1,
                self.warmup_passes,
                node.week_number,
                node.day_number
            );
            self.run_pass(node, options).await?;
        }

        let image = self.run_pass(node, options).await?;
        debug!(
            "Captured week {} day {} with {} capturer",
            node.week_number,
            node.day_number,
            self.capturer.name()
        );
        Ok(image)
    }

    async fn run_pass(
        &self,
        node: &VisualNode,
        options: &CaptureOptions,
    ) -> Result<RasterImage, CaptureError> {
        match AssertUnwindSafe(self.capturer.rasterize(node, options))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!("{} capturer panicked during rasterization", self.capturer.name());
                Err(CaptureError::Unknown)
            }
        }
    }
}
