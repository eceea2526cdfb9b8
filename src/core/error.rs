use thiserror::Error;

/// Errors that can occur while building, submitting or authenticating invoices.
///
/// A remote rejection of an invoice is not an error: it is reported through
/// [`Bill::is_authorized`](super::Bill::is_authorized) with the normalized
/// response still attached to the bill.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AfipError {
    /// Missing or invalid enumerated value. Fatal to the invoice, never retried.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Configuration lacks the seller identity or the ticket is unusable.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// Certificate or private key file not found.
    #[error("missing certificate: {0}")]
    MissingCertificate(String),

    /// Last-authorized-number lookup failed.
    #[error("remote query failed: {0}")]
    RemoteQuery(String),

    /// Response did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Network or HTTP failure while talking to a web service.
    #[error("transport error: {0}")]
    Transport(String),

    /// WSAA refused the login or returned an unreadable ticket.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Local file handling (ticket store, signer process).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AfipError {
    pub(crate) fn invalid(field: &str, value: impl std::fmt::Display) -> Self {
        Self::InvalidAttribute(format!("{field}: unsupported value `{value}`"))
    }
}
