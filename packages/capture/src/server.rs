//! Disposable HTTP server for rendered documents
//!
//! This server is NOT a daemon. It:
//! - Binds a random local port
//! - Serves one document to the first request
//! - Shuts down after that request (or a timeout)

use std::net::TcpListener;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

use crate::{CaptureError, Result};

const SERVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Disposable server that serves a single document
pub struct DocumentServer {
    server: Server,
    port: u16,
    body: String,
    content_type: Header,
}

impl DocumentServer {
    /// Create a new server on a random available port
    pub fn new(body: String, content_type: &str) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();

        let server = Server::from_listener(listener, None)
            .map_err(|e| CaptureError::Io(std::io::Error::other(e.to_string())))?;

        let content_type = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
            .map_err(|_| {
                CaptureError::Io(std::io::Error::other(format!(
                    "invalid content type: {content_type}"
                )))
            })?;

        Ok(Self {
            server,
            port,
            body,
            content_type,
        })
    }

    /// Get the URL for accessing this server
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }

    /// Answer the first request received within `timeout`
    pub fn serve_once(&self, timeout: Duration) -> Result<()> {
        if let Ok(Some(request)) = self.server.recv_timeout(timeout) {
            let response =
                Response::from_string(self.body.as_str()).with_header(self.content_type.clone());
            request.respond(response)?;
        }

        Ok(())
    }
}

/// Start a disposable server in a background thread and return its URL
///
/// Join the handle once the document has been loaded.
pub fn serve_document(
    body: String,
    content_type: &str,
) -> Result<(String, thread::JoinHandle<()>)> {
    serve_document_with_timeout(body, content_type, SERVE_TIMEOUT)
}

/// Like [`serve_document`], but the server gives up after `timeout` when no
/// request arrives
pub fn serve_document_with_timeout(
    body: String,
    content_type: &str,
    timeout: Duration,
) -> Result<(String, thread::JoinHandle<()>)> {
    let server = DocumentServer::new(body, content_type)?;
    let url = server.url();

    let handle = thread::spawn(move || {
        if let Err(e) = server.serve_once(timeout) {
            tracing::warn!(error = %e, "Document server failed to respond");
        }
    });

    Ok((url, handle))
}
