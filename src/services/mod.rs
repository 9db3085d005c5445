//! Service layer: the OCR worker pool and the per-connection session logic.
//!
//! Services are independent of the transport, so the TCP server and the
//! tests drive the same code.

pub mod session;
pub mod workers;

pub use session::{SessionError, SessionHandler, SessionState};
pub use workers::{default_worker_count, DeadlinePolicy, PipelineError, WorkerPool};
