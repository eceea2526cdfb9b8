//! WSAA access tickets and the provider interface the billing client uses.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::error::AfipError;
use super::wire::WireValue;

/// Signed access ticket issued by WSAA for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTicket {
    pub token: String,
    pub sign: String,
    pub expires_at: DateTime<FixedOffset>,
}

impl AuthTicket {
    pub fn new(
        token: impl Into<String>,
        sign: impl Into<String>,
        expires_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            token: token.into(),
            sign: sign.into(),
            expires_at,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// `Auth` element sent with every WSFE call.
    pub fn auth_header(&self, cuit: &str) -> WireValue {
        WireValue::map()
            .with_text("Token", self.token.clone())
            .with_text("Sign", self.sign.clone())
            .with_text("Cuit", cuit)
    }
}

/// Source of currently valid WSAA tickets.
///
/// Refreshing expired tickets is the provider's job; callers ask for a ticket
/// on every authorization.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn auth_ticket(&self) -> Result<AuthTicket, AfipError>;
}

#[async_trait]
impl<T: CredentialProvider + ?Sized> CredentialProvider for Arc<T> {
    async fn auth_ticket(&self) -> Result<AuthTicket, AfipError> {
        (**self).auth_ticket().await
    }
}

/// Hands out one fixed ticket, e.g. obtained by another process.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    ticket: AuthTicket,
}

impl StaticCredentials {
    pub fn new(ticket: AuthTicket) -> Self {
        Self { ticket }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn auth_ticket(&self) -> Result<AuthTicket, AfipError> {
        if !self.ticket.is_valid() {
            return Err(AfipError::MissingCredentials(format!(
                "ticket expired at {}",
                self.ticket.expires_at
            )));
        }
        Ok(self.ticket.clone())
    }
}
