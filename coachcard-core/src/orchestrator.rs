//! Batch capture orchestration
//!
//! Walks a plan week by week and day by day, mounting each rendered card in
//! the staging area and capturing it. The first failure aborts the batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use coachcard_common::{WorkoutDay, WorkoutPlan};

use crate::capture::{CaptureEngine, CaptureOptions, RasterImage, capturer_from_config};
use crate::config::{BrandingConfig, CoreConfig};
use crate::error::{BatchAbortError, CaptureError};
use crate::mount::StagingArea;
use crate::template::{self, RenderContext};

/// One captured day card
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    pub week_number: u32,
    pub day_number: u32,
    pub day_label: String,
    pub muscle_group: String,
    pub image: RasterImage,
}

impl CapturedImage {
    /// Gallery identity: one image per (week, day)
    pub fn key(&self) -> (u32, u32) {
        (self.week_number, self.day_number)
    }

    pub fn data_url(&self) -> String {
        self.image.to_data_url()
    }

    /// File name stem used when writing the image to disk
    pub fn file_stem(&self) -> String {
        format!("semana-{}-dia-{}", self.week_number, self.day_number)
    }
}

/// Shared flag to stop a running `generate_all` between days
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BatchCaptureOrchestrator {
    engine: CaptureEngine,
    staging: Arc<StagingArea>,
    options: CaptureOptions,
    branding: BrandingConfig,
    gallery: Vec<CapturedImage>,
    cancel: Option<CancelFlag>,
}

impl BatchCaptureOrchestrator {
    pub fn new(
        engine: CaptureEngine,
        staging: Arc<StagingArea>,
        options: CaptureOptions,
        branding: BrandingConfig,
    ) -> Self {
        Self {
            engine,
            staging,
            options,
            branding,
            gallery: Vec::new(),
            cancel: None,
        }
    }

    /// Orchestrator with the capturer, staging area and options described by `config`
    pub fn from_config(config: &CoreConfig) -> anyhow::Result<Self> {
        let engine = CaptureEngine::new(capturer_from_config(config)?)
            .with_warmup_passes(config.capture.warmup_passes);
        let staging = Arc::new(StagingArea::from_config(&config.capture));
        Ok(Self::new(
            engine,
            staging,
            CaptureOptions::from(&config.capture),
            config.branding.clone(),
        ))
    }

    pub fn with_cancellation(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    pub fn gallery(&self) -> &[CapturedImage] {
        &self.gallery
    }

    pub fn take_gallery(&mut self) -> Vec<CapturedImage> {
        std::mem::take(&mut self.gallery)
    }

    pub fn clear_gallery(&mut self) {
        self.gallery.clear();
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }

    async fn capture_day(
        &self,
        day: &WorkoutDay,
        week_number: u32,
    ) -> Result<CapturedImage, CaptureError> {
        let context = RenderContext::new(week_number)
            .with_branding(&self.branding)
            .with_size(self.options.width, self.options.height);
        let node = template::render(day, &context);

        let target = self.staging.mount(node).await;
        let image = self.engine.capture(&target, &self.options).await?;
        target.unmount();

        Ok(CapturedImage {
            week_number,
            day_number: day.day_number,
            day_label: day.day_label.clone(),
            muscle_group: day.muscle_group.clone(),
            image,
        })
    }

    /// Capture a single day and store it in the gallery, replacing any
    /// earlier capture of the same week and day
    pub async fn generate_one(
        &mut self,
        day: &WorkoutDay,
        week_number: u32,
    ) -> Result<CapturedImage, CaptureError> {
        let captured = match self.capture_day(day, week_number).await {
            Ok(captured) => captured,
            Err(e) => {
                warn!("Capture of week {} {} failed: {}", week_number, day.day_label, e);
                return Err(e);
            }
        };

        self.store(captured.clone());
        info!("Captured week {} {}", week_number, day.day_label);
        Ok(captured)
    }

    fn store(&mut self, image: CapturedImage) {
        match self.gallery.iter().position(|entry| entry.key() == image.key()) {
            Some(index) => self.gallery[index] = image,
            None => {
                let index = self.gallery.partition_point(|entry| entry.key() < image.key());
                self.gallery.insert(index, image);
            }
        }
    }

    /// Left fold over every day of the plan; stops at the first failure
    async fn capture_plan(&self, plan: &WorkoutPlan) -> Result<Vec<CapturedImage>, BatchAbortError> {
        let total = plan.day_count();
        let mut images = Vec::with_capacity(total);

        for week in &plan.weeks {
            for day in &week.days {
                if self.is_cancelled() {
                    return Err(BatchAbortError::Cancelled {
                        completed: images.len(),
                        total,
                    });
                }

                let image = self
                    .capture_day(day, week.week_number)
                    .await
                    .map_err(|source| BatchAbortError::DayFailed {
                        week_number: week.week_number,
                        day_number: day.day_number,
                        day_label: day.day_label.clone(),
                        source,
                    })?;
                images.push(image);
            }
        }

        Ok(images)
    }

    /// Capture every day of `plan` in week order, then day order.
    ///
    /// Succeeds only if every day succeeds; the gallery is then replaced
    /// with the new images. On failure the gallery keeps its old contents.
    pub async fn generate_all(
        &mut self,
        plan: &WorkoutPlan,
    ) -> Result<&[CapturedImage], BatchAbortError> {
        match self.capture_plan(plan).await {
            Ok(images) => {
                info!("Generated {} images for '{}'", images.len(), plan.title);
                self.gallery = images;
                Ok(&self.gallery)
            }
            Err(e) => {
                warn!("Plan generation aborted: {}", e);
                Err(e)
            }
        }
    }
}
