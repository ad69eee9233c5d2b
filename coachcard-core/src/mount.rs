//! Offscreen staging area
//!
//! A single slot that holds the card being captured. Mounting waits for the
//! slot, commits the card, lets one scheduling turn pass and then the
//! stabilization delay before handing out a `MountedTarget`. Dropping the
//! target always empties the slot, whatever happened in between.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::clock::{Clock, TokioClock};
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::template::VisualNode;

pub struct StagingArea {
    slot: Mutex<Option<VisualNode>>,
    active: AtomicBool,
    mounts: AtomicUsize,
    clock: Arc<dyn Clock>,
    stabilization_delay: Duration,
}

impl StagingArea {
    pub fn new(clock: Arc<dyn Clock>, stabilization_delay: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            active: AtomicBool::new(false),
            mounts: AtomicUsize::new(0),
            clock,
            stabilization_delay,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(Arc::new(TokioClock), config.stabilization_delay())
    }

    /// Mount `node` and wait until it is stable.
    ///
    /// Concurrent callers queue on the slot, so at most one card is mounted
    /// at any time.
    pub async fn mount(&self, node: VisualNode) -> MountedTarget<'_> {
        let mut slot = self.slot.lock().await;
        let (week, day) = (node.week_number, node.day_number);
        *slot = Some(node);
        self.active.store(true, Ordering::SeqCst);
        self.mounts.fetch_add(1, Ordering::SeqCst);
        debug!("Mounted week {} day {}", week, day);

        // Built before waiting: if this future is dropped mid-wait the guard
        // still unmounts.
        let target = MountedTarget { slot, area: self };

        tokio::task::yield_now().await;
        self.clock.sleep(self.stabilization_delay).await;
        target
    }

    pub fn is_mounted(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Total mounts since creation
    pub fn mount_count(&self) -> usize {
        self.mounts.load(Ordering::SeqCst)
    }

    pub fn stabilization_delay(&self) -> Duration {
        self.stabilization_delay
    }
}

/// Exclusive handle on the mounted card; unmounts on drop
pub struct MountedTarget<'a> {
    slot: MutexGuard<'a, Option<VisualNode>>,
    area: &'a StagingArea,
}

impl MountedTarget<'_> {
    pub fn node(&self) -> Result<&VisualNode, CaptureError> {
        self.slot.as_ref().ok_or(CaptureError::MissingTarget)
    }

    pub fn unmount(self) {}
}

impl Drop for MountedTarget<'_> {
    fn drop(&mut self) {
        if let Some(node) = self.slot.take() {
            debug!("Unmounted week {} day {}", node.week_number, node.day_number);
        }
        self.area.active.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingClock, StalledClock, sample_node};

    fn staging(delay_ms: u64) -> (Arc<StagingArea>, Arc<RecordingClock>) {
        let clock = Arc::new(RecordingClock::default());
        let area = Arc::new(StagingArea::new(clock.clone(), Duration::from_millis(delay_ms)));
        (area, clock)
    }

    #[tokio::test]
    async fn test_mount_waits_for_stabilization() {
        let (area, clock) = staging(200);

        let target = area.mount(sample_node(1, 2)).await;
        assert!(area.is_mounted());
        assert_eq!(target.node().unwrap().day_number, 2);
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(200)]);

        target.unmount();
        assert!(!area.is_mounted());
        assert_eq!(area.mount_count(), 1);
    }

    #[tokio::test]
    async fn test_unmounts_when_work_fails() {
        let (area, _clock) = staging(0);

        let result: Result<(), CaptureError> = async {
            let _target = area.mount(sample_node(1, 1)).await;
            Err(CaptureError::raster("boom"))
        }
        .await;

        assert!(result.is_err());
        assert!(!area.is_mounted());
    }

    #[tokio::test]
    async fn test_unmounts_when_task_panics() {
        let (area, _clock) = staging(0);

        let task_area = area.clone();
        let joined = tokio::spawn(async move {
            let _target = task_area.mount(sample_node(1, 1)).await;
            panic!("renderer crashed");
        })
        .await;

        assert!(joined.is_err());
        assert!(!area.is_mounted());

        let target = area.mount(sample_node(1, 2)).await;
        assert_eq!(target.node().unwrap().day_number, 2);
    }

    #[tokio::test]
    async fn test_cancelled_mount_leaves_slot_empty() {
        let area = Arc::new(StagingArea::new(Arc::new(StalledClock), Duration::from_millis(200)));

        let pending = tokio::time::timeout(Duration::from_millis(10), area.mount(sample_node(1, 1))).await;
        assert!(pending.is_err());
        assert!(!area.is_mounted());
    }

    #[tokio::test]
    async fn test_concurrent_mounts_are_serialized() {
        let (area, _clock) = staging(0);

        let first = area.mount(sample_node(1, 1)).await;

        let waiting_area = area.clone();
        let waiter = tokio::spawn(async move {
            let target = waiting_area.mount(sample_node(1, 2)).await;
            target.node().unwrap().day_number
        });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        assert_eq!(first.node().unwrap().day_number, 1);

        drop(first);
        assert_eq!(waiter.await.unwrap(), 2);
        assert_eq!(area.mount_count(), 2);
    }
}
