//! Per-connection session handling.
//!
//! One document per connection: read until the peer half-closes, run the
//! pipeline, write back either the raw OCR text or an `ERROR:` message, and
//! close. Extraction and persistence happen on the way out; a failed save is
//! logged but never replaces the text the caller receives.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::workers::{PipelineError, WorkerPool};
use crate::extract::extract_fields;
use crate::models::DocumentText;
use crate::repository::RecordStore;

/// How long an oversized upload is drained before the refusal is sent anyway.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Reading,
    Dispatching,
    AwaitingResult,
    Responding,
    Closed,
    Error,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Reading => "reading",
            SessionState::Dispatching => "dispatching",
            SessionState::AwaitingResult => "awaiting_result",
            SessionState::Responding => "responding",
            SessionState::Closed => "closed",
            SessionState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("empty payload")]
    EmptyPayload,

    #[error("payload larger than {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("transfer failed: {0}")]
    Transfer(#[from] std::io::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl SessionError {
    /// The text sent to the client in place of a result.
    pub fn client_message(&self) -> String {
        match self {
            SessionError::EmptyPayload => "ERROR: Empty PDF data received.".to_string(),
            SessionError::PayloadTooLarge { limit } => {
                format!("ERROR: PDF data exceeds the {} byte limit.", limit)
            }
            SessionError::Transfer(e) => format!("ERROR: Transfer failed: {}", e),
            SessionError::Pipeline(PipelineError::Timeout(_)) => {
                "ERROR: OCR process timed out on the server.".to_string()
            }
            SessionError::Pipeline(PipelineError::QueueFull) => {
                "ERROR: Server is busy, try again later.".to_string()
            }
            SessionError::Pipeline(e) => {
                format!("ERROR: An unexpected server error occurred: {}", e)
            }
        }
    }
}

struct Session<'a> {
    peer: &'a str,
    state: SessionState,
}

impl<'a> Session<'a> {
    fn new(peer: &'a str) -> Self {
        Self {
            peer,
            state: SessionState::Reading,
        }
    }

    fn enter(&mut self, next: SessionState) {
        tracing::debug!("[{}] {} -> {}", self.peer, self.state, next);
        self.state = next;
    }
}

/// Runs the document pipeline for individual connections.
#[derive(Clone)]
pub struct SessionHandler {
    pool: WorkerPool,
    store: Arc<dyn RecordStore>,
    max_payload: usize,
}

impl SessionHandler {
    pub fn new(pool: WorkerPool, store: Arc<dyn RecordStore>, max_payload: usize) -> Self {
        Self {
            pool,
            store,
            max_payload,
        }
    }

    /// Serve one connection to completion.
    ///
    /// The stream is shut down exactly once whatever the outcome. Returns the
    /// document text that was sent back, or the error whose message was.
    pub async fn handle<S>(&self, mut stream: S, peer: &str) -> Result<DocumentText, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut session = Session::new(peer);
        let mut outcome = self.process(&mut stream, &mut session).await;

        let written = match &outcome {
            Ok(text) => stream.write_all(text.as_str().as_bytes()).await,
            Err(e) => {
                session.enter(SessionState::Error);
                tracing::warn!("[{}] {}", peer, e);
                stream.write_all(e.client_message().as_bytes()).await
            }
        };
        if let Err(e) = written {
            tracing::warn!("[{}] Failed to send response: {}", peer, e);
            if outcome.is_ok() {
                outcome = Err(SessionError::Transfer(e));
            }
        }

        if let Err(e) = stream.shutdown().await {
            tracing::debug!("[{}] Shutdown failed: {}", peer, e);
        }
        session.enter(SessionState::Closed);
        outcome
    }

    async fn process<S>(
        &self,
        stream: &mut S,
        session: &mut Session<'_>,
    ) -> Result<DocumentText, SessionError>
    where
        S: AsyncRead + Unpin,
    {
        let payload = self.read_payload(stream).await?;
        tracing::info!("[{}] Received {} bytes", session.peer, payload.len());

        session.enter(SessionState::Dispatching);
        let submission = self.pool.submit(payload);
        session.enter(SessionState::AwaitingResult);
        let text = submission.await?;

        session.enter(SessionState::Responding);
        let record = extract_fields(text.as_str());
        tracing::info!(
            "[{}] Extracted {} fields from {} pages",
            session.peer,
            record.len(),
            text.page_count()
        );
        if let Err(e) = self.store.save(&record, text.as_str()).await {
            tracing::warn!("[{}] Failed to save record: {}", session.peer, e);
        }

        Ok(text)
    }

    /// Read until end of input, refusing payloads over the size limit.
    ///
    /// The rest of an oversized upload is read and discarded up to the peer's
    /// half-close, so the peer is not still writing when the refusal goes out.
    async fn read_payload<S>(&self, stream: &mut S) -> Result<Vec<u8>, SessionError>
    where
        S: AsyncRead + Unpin,
    {
        let mut payload = Vec::new();
        let limit = u64::try_from(self.max_payload).unwrap_or(u64::MAX);
        (&mut *stream)
            .take(limit.saturating_add(1))
            .read_to_end(&mut payload)
            .await?;

        if payload.is_empty() {
            return Err(SessionError::EmptyPayload);
        }
        if payload.len() > self.max_payload {
            let mut sink = tokio::io::sink();
            let drain = tokio::io::copy(stream, &mut sink);
            match tokio::time::timeout(DRAIN_TIMEOUT, drain).await {
                Ok(Ok(discarded)) => tracing::debug!("Discarded {} further bytes", discarded),
                Ok(Err(e)) => tracing::debug!("Drain failed: {}", e),
                Err(_) => tracing::debug!("Drain timed out after {:?}", DRAIN_TIMEOUT),
            }
            return Err(SessionError::PayloadTooLarge {
                limit: self.max_payload,
            });
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_messages_are_marked() {
        let errors = [
            SessionError::EmptyPayload,
            SessionError::PayloadTooLarge { limit: 10 },
            SessionError::Transfer(std::io::Error::other("reset")),
            SessionError::Pipeline(PipelineError::Timeout(Duration::from_secs(240))),
            SessionError::Pipeline(PipelineError::QueueFull),
            SessionError::Pipeline(PipelineError::Worker("panicked".to_string())),
        ];
        for error in &errors {
            assert!(error.client_message().starts_with("ERROR: "), "{:?}", error);
        }
        assert_eq!(
            SessionError::EmptyPayload.client_message(),
            "ERROR: Empty PDF data received."
        );
        assert_eq!(
            errors[3].client_message(),
            "ERROR: OCR process timed out on the server."
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::AwaitingResult.to_string(), "awaiting_result");
    }
}
