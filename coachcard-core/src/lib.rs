pub mod capture;
pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod mount;
pub mod orchestrator;
pub mod template;

#[cfg(test)]
mod testing;

pub use capture::{CaptureEngine, CaptureOptions, Capturer, RasterImage};
pub use document::{DocumentAssembler, DocumentBuffer};
pub use error::{AssemblyError, BatchAbortError, CaptureError, CredentialsError};
pub use mount::{MountedTarget, StagingArea};
pub use orchestrator::{BatchCaptureOrchestrator, CancelFlag, CapturedImage};
