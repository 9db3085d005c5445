//! Worker pool for CPU-bound rasterization and OCR.
//!
//! OCR runs on tokio's blocking thread pool, gated by a semaphore sized to
//! the number of OCR workers. A second semaphore bounds how many documents
//! may be admitted (running or waiting) at once. Each submission gets a
//! deadline scaled by document size; when it expires the backend is told
//! to stop through its [`CancelFlag`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::models::DocumentText;
use crate::ocr::{CancelFlag, DocumentOcr, OcrError};

const MIB: usize = 1024 * 1024;

/// Errors from the OCR pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("OCR did not finish within {0:?}")]
    Timeout(Duration),

    #[error("too many documents queued")]
    QueueFull,

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("worker failed: {0}")]
    Worker(String),

    #[error("worker pool is shut down")]
    Closed,
}

/// How long a submission may take, scaled by payload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlinePolicy {
    pub base: Duration,
    /// Added once per started MiB of payload.
    pub per_mib: Duration,
}

impl DeadlinePolicy {
    pub fn new(base: Duration, per_mib: Duration) -> Self {
        Self { base, per_mib }
    }

    pub fn deadline_for(&self, payload_len: usize) -> Duration {
        let started_mib = u32::try_from(payload_len.div_ceil(MIB)).unwrap_or(u32::MAX);
        self.base.saturating_add(self.per_mib.saturating_mul(started_mib))
    }
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(60))
    }
}

/// Available parallelism minus one (for connection I/O), at least 1.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// Bounded pool executing OCR off the I/O scheduler.
#[derive(Clone)]
pub struct WorkerPool {
    ocr: Arc<dyn DocumentOcr>,
    workers: Arc<Semaphore>,
    admission: Arc<Semaphore>,
    worker_count: usize,
    deadline: DeadlinePolicy,
}

impl WorkerPool {
    /// Create a pool with `worker_count` OCR workers and room for
    /// `queue_depth` further documents waiting for a worker.
    pub fn new(
        ocr: Arc<dyn DocumentOcr>,
        worker_count: usize,
        queue_depth: usize,
        deadline: DeadlinePolicy,
    ) -> Self {
        let worker_count = worker_count.max(1);
        Self {
            ocr,
            workers: Arc::new(Semaphore::new(worker_count)),
            admission: Arc::new(Semaphore::new(worker_count + queue_depth)),
            worker_count,
            deadline,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn deadline_policy(&self) -> DeadlinePolicy {
        self.deadline
    }

    pub fn backend_name(&self) -> &'static str {
        self.ocr.name()
    }

    /// Run OCR on `document`, bounded by the size-scaled deadline.
    pub async fn submit(&self, document: Vec<u8>) -> Result<DocumentText, PipelineError> {
        let admission = Arc::clone(&self.admission)
            .try_acquire_owned()
            .map_err(|_| PipelineError::QueueFull)?;

        let deadline = self.deadline.deadline_for(document.len());
        let cancel = CancelFlag::new();
        let start = Instant::now();
        let bytes = document.len();

        match tokio::time::timeout(deadline, self.run(document, admission, cancel.clone())).await
        {
            Ok(result) => {
                if let Ok(text) = &result {
                    tracing::info!(
                        "OCR finished: {} bytes, {} pages in {:?}",
                        bytes,
                        text.page_count(),
                        start.elapsed()
                    );
                }
                result
            }
            Err(_) => {
                cancel.cancel();
                tracing::warn!("OCR of {} bytes exceeded {:?}, cancelling", bytes, deadline);
                Err(PipelineError::Timeout(deadline))
            }
        }
    }

    async fn run(
        &self,
        document: Vec<u8>,
        admission: OwnedSemaphorePermit,
        cancel: CancelFlag,
    ) -> Result<DocumentText, PipelineError> {
        let worker = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| PipelineError::Closed)?;

        let ocr = Arc::clone(&self.ocr);
        // The permits travel with the blocking task: a timed-out task keeps
        // its slot until it actually stops.
        let handle = tokio::task::spawn_blocking(move || {
            let _permits = (admission, worker);
            ocr.recognize(&document, &cancel)
        });

        let pages = handle
            .await
            .map_err(|e| PipelineError::Worker(e.to_string()))??;
        Ok(DocumentText::from_pages(pages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawPageText;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct PagesOcr(Vec<RawPageText>);

    impl DocumentOcr for PagesOcr {
        fn name(&self) -> &'static str {
            "pages"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn availability_hint(&self) -> String {
            String::new()
        }
        fn recognize(&self, _: &[u8], _: &CancelFlag) -> Result<Vec<RawPageText>, OcrError> {
            Ok(self.0.clone())
        }
    }

    struct FailingOcr;

    impl DocumentOcr for FailingOcr {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn availability_hint(&self) -> String {
            String::new()
        }
        fn recognize(&self, _: &[u8], _: &CancelFlag) -> Result<Vec<RawPageText>, OcrError> {
            Err(OcrError::OcrFailed("unreadable document".to_string()))
        }
    }

    /// Blocks until released or cancelled.
    #[derive(Default)]
    struct StuckOcr {
        started: AtomicBool,
        release: AtomicBool,
        saw_cancel: AtomicBool,
    }

    impl DocumentOcr for StuckOcr {
        fn name(&self) -> &'static str {
            "stuck"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn availability_hint(&self) -> String {
            String::new()
        }
        fn recognize(&self, _: &[u8], cancel: &CancelFlag) -> Result<Vec<RawPageText>, OcrError> {
            self.started.store(true, Ordering::SeqCst);
            while !self.release.load(Ordering::SeqCst) {
                if cancel.is_cancelled() {
                    self.saw_cancel.store(true, Ordering::SeqCst);
                    return Err(OcrError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Ok(vec![RawPageText::new(0, "released")])
        }
    }

    async fn wait_for(flag: &AtomicBool) {
        for _ in 0..400 {
            if flag.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("flag never set");
    }

    #[test]
    fn test_deadline_scales_per_started_mib() {
        let policy = DeadlinePolicy::default();
        assert_eq!(policy.deadline_for(0), Duration::from_secs(60));
        assert_eq!(policy.deadline_for(1), Duration::from_secs(120));
        assert_eq!(policy.deadline_for(MIB), Duration::from_secs(120));
        assert_eq!(policy.deadline_for(3 * MIB), Duration::from_secs(240));
        assert_eq!(policy.deadline_for(3 * MIB + 1), Duration::from_secs(300));
    }

    #[test]
    fn test_default_worker_count_at_least_one() {
        assert!(default_worker_count() >= 1);
    }

    #[tokio::test]
    async fn test_submit_joins_pages_in_order() {
        let ocr = PagesOcr(vec![
            RawPageText::new(1, "second"),
            RawPageText::new(0, "first"),
        ]);
        let pool = WorkerPool::new(Arc::new(ocr), 2, 4, DeadlinePolicy::default());

        let text = pool.submit(b"%PDF".to_vec()).await.unwrap();
        assert_eq!(text.page_count(), 2);
        assert!(text.as_str().starts_with("first"));
        assert!(text.as_str().ends_with("second"));
    }

    #[tokio::test]
    async fn test_ocr_failure_is_reported() {
        let pool = WorkerPool::new(Arc::new(FailingOcr), 1, 0, DeadlinePolicy::default());
        let err = pool.submit(b"%PDF".to_vec()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Ocr(OcrError::OcrFailed(_))));
    }

    #[tokio::test]
    async fn test_timeout_cancels_worker() {
        let ocr = Arc::new(StuckOcr::default());
        let policy = DeadlinePolicy::new(Duration::from_millis(50), Duration::ZERO);
        let pool = WorkerPool::new(ocr.clone(), 1, 0, policy);

        let err = pool.submit(b"%PDF".to_vec()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(d) if d == Duration::from_millis(50)));
        wait_for(&ocr.saw_cancel).await;
    }

    #[tokio::test]
    async fn test_admission_is_bounded() {
        let ocr = Arc::new(StuckOcr::default());
        let pool = WorkerPool::new(ocr.clone(), 1, 0, DeadlinePolicy::default());

        let busy = pool.clone();
        let first = tokio::spawn(async move { busy.submit(b"one".to_vec()).await });
        wait_for(&ocr.started).await;

        let err = pool.submit(b"two".to_vec()).await.unwrap_err();
        assert!(matches!(err, PipelineError::QueueFull));

        ocr.release.store(true, Ordering::SeqCst);
        let text = first.await.unwrap().unwrap();
        assert_eq!(text.as_str(), "released");

        // The slot is free again once the first document is done.
        assert!(pool.submit(b"three".to_vec()).await.is_ok());
    }
}
