//! TCP server accepting one document per connection.
//!
//! All connection I/O runs on the caller's (single-threaded) runtime; each
//! accepted connection gets its own task and OCR is handed to the worker
//! pool.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};

use crate::config::Settings;
use crate::ocr::{DocumentOcr, TesseractBackend};
use crate::repository::{AsyncSqlitePool, DieselRecordRepository};
use crate::services::{SessionHandler, WorkerPool};

/// A bound listener plus the handler every connection is served with.
pub struct Server {
    listener: TcpListener,
    handler: SessionHandler,
}

impl Server {
    pub async fn bind(addr: impl ToSocketAddrs, handler: SessionHandler) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, handler })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` completes.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutting down server");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };

                    let handler = self.handler.clone();
                    tokio::spawn(async move {
                        let peer = addr.to_string();
                        tracing::info!("[{}] Connection opened", peer);
                        match handler.handle(stream, &peer).await {
                            Ok(text) => tracing::info!(
                                "[{}] Connection closed, sent {} bytes",
                                peer,
                                text.as_str().len()
                            ),
                            Err(e) => tracing::info!("[{}] Connection closed: {}", peer, e),
                        }
                    });
                }
            }
        }
    }
}

/// Build the production handler: Tesseract OCR and the SQLite record store.
pub async fn build_handler(settings: &Settings) -> anyhow::Result<SessionHandler> {
    let backend = TesseractBackend::with_settings(settings.ocr.clone());
    if !backend.is_available() {
        tracing::warn!("{}", backend.availability_hint());
    }

    settings.ensure_directories()?;
    let repo = DieselRecordRepository::new(AsyncSqlitePool::new(&settings.database_url()));
    repo.init_schema().await?;

    let pool = WorkerPool::new(
        Arc::new(backend),
        settings.workers,
        settings.queue_depth,
        settings.deadline_policy(),
    );
    tracing::info!(
        "Using {} OCR workers ({}), queue depth {}",
        pool.worker_count(),
        pool.backend_name(),
        settings.queue_depth
    );

    Ok(SessionHandler::new(
        pool,
        Arc::new(repo),
        settings.max_payload_bytes,
    ))
}

/// Start the document server and run until Ctrl-C.
pub async fn serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let handler = build_handler(settings).await?;
    let server = Server::bind(bind, handler).await?;
    tracing::info!("Listening on {}", server.local_addr()?);

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
