//! The transport collaborator boundary.
//!
//! The engine performs no socket or TLS I/O of its own. The embedder
//! implements [`Transport`] on top of whatever stack it runs (a
//! non-blocking TCP socket, a TLS session, an in-memory pipe in tests) and
//! its readiness loop resumes the stages the engine parks.

use thiserror::Error;

/// Outcome of one non-blocking transport step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Progress {
    /// The step finished.
    Complete,
    /// The operation was started but has not finished; resume it when the
    /// socket becomes ready.
    Pending,
    /// Partial progress was made; resume on the next readiness event.
    Interrupted,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("transport is closed")]
    Closed,
    #[error("TLS is not available on this transport")]
    TlsUnavailable,
    #[error("TLS handshake failed: {0}")]
    Tls(String),
}

/// Non-blocking transport for one client connection.
///
/// Implementations must never block: a step that cannot finish
/// immediately returns [`Progress::Pending`] or [`Progress::Interrupted`]
/// and is picked up again through the matching `resume_*` method. TLS is
/// a runtime capability; a transport without it reports
/// [`TransportError::TlsUnavailable`] from the TLS stages.
pub trait Transport {
    /// Start a non-blocking TCP connect to `host:port`.
    fn start_connect(&mut self, host: &str, port: u16) -> Result<Progress, TransportError>;

    /// Continue a connect previously reported as pending.
    fn resume_connect(&mut self) -> Result<Progress, TransportError>;

    /// Start a TLS handshake, presenting `server_name` for SNI.
    fn start_tls(&mut self, server_name: &str) -> Result<Progress, TransportError>;

    /// Continue a TLS handshake previously reported as pending or
    /// interrupted.
    fn resume_tls(&mut self) -> Result<Progress, TransportError>;

    /// Queue an encoded packet for transmission. Sends on one transport
    /// are delivered in call order.
    fn send(&mut self, packet: &[u8]) -> Result<(), TransportError>;

    /// Close the connection. Closing twice is a no-op.
    fn close(&mut self);
}
