//! Client side of the document protocol.
//!
//! Write the whole document, half-close, then read the single response
//! until the server closes the connection.

use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

/// Marker the server puts in front of every error response.
pub const ERROR_MARKER: &str = "ERROR:";

/// Whether a response is an error message rather than document text.
pub fn is_error_response(response: &str) -> bool {
    response.starts_with(ERROR_MARKER)
}

/// Exchange one document for one response over an open stream.
pub async fn exchange<S>(mut stream: S, document: &[u8]) -> std::io::Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(document).await?;
    stream.shutdown().await?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}

/// Connect to `addr` and send `document`.
pub async fn send_document(addr: impl ToSocketAddrs, document: &[u8]) -> std::io::Result<String> {
    let stream = TcpStream::connect(addr).await?;
    exchange(stream, document).await
}

/// Read a file and send it as one document.
pub async fn send_file(addr: impl ToSocketAddrs, path: &Path) -> std::io::Result<String> {
    let document = tokio::fs::read(path).await?;
    send_document(addr, &document).await
}
