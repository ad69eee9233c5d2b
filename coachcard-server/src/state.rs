use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use coachcard_core::capture::capturer_from_config;
use coachcard_core::config::CoreConfig;
use coachcard_core::{
    BatchCaptureOrchestrator, CaptureEngine, CaptureOptions, Capturer, DocumentAssembler,
    StagingArea,
};

/// Shared by every request. The staging area is the only capture resource;
/// each request gets its own orchestrator on top of it.
pub struct AppState {
    pub core: CoreConfig,
    capturer: Arc<dyn Capturer>,
    staging: Arc<StagingArea>,
    started_at: Instant,
    images_generated: AtomicU64,
    documents_generated: AtomicU64,
}

impl AppState {
    pub fn new(core: CoreConfig, capturer: Arc<dyn Capturer>, staging: Arc<StagingArea>) -> Self {
        Self {
            core,
            capturer,
            staging,
            started_at: Instant::now(),
            images_generated: AtomicU64::new(0),
            documents_generated: AtomicU64::new(0),
        }
    }

    pub fn from_config(core: CoreConfig) -> anyhow::Result<Self> {
        let capturer = capturer_from_config(&core)?;
        let staging = Arc::new(StagingArea::from_config(&core.capture));
        Ok(Self::new(core, capturer, staging))
    }

    pub fn orchestrator(&self) -> BatchCaptureOrchestrator {
        let engine = CaptureEngine::new(self.capturer.clone())
            .with_warmup_passes(self.core.capture.warmup_passes);
        BatchCaptureOrchestrator::new(
            engine,
            self.staging.clone(),
            CaptureOptions::from(&self.core.capture),
            self.core.branding.clone(),
        )
    }

    pub fn assembler(&self) -> DocumentAssembler {
        DocumentAssembler::from_config(&self.core)
    }

    pub fn capturer_name(&self) -> &'static str {
        self.capturer.name()
    }

    pub fn record_images(&self, count: u64) {
        self.images_generated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_document(&self) {
        self.documents_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn images_generated(&self) -> u64 {
        self.images_generated.load(Ordering::Relaxed)
    }

    pub fn documents_generated(&self) -> u64 {
        self.documents_generated.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
