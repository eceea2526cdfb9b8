use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::login::Wsaa;
use super::signer::CmsSigner;
use crate::core::{AfipError, AuthTicket, CredentialProvider};
use crate::soap::SoapChannel;

/// Daily ticket cache on disk, one JSON file per CUIT and day.
#[derive(Debug, Clone)]
pub struct TicketStore {
    dir: PathBuf,
    cuit: String,
}

impl TicketStore {
    pub fn new(dir: impl Into<PathBuf>, cuit: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            cuit: cuit.into(),
        }
    }

    /// Store under the system temporary directory.
    pub fn in_temp_dir(cuit: impl Into<String>) -> Self {
        Self::new(std::env::temp_dir(), cuit)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{dir}/factura_{cuit}_{YYYY_MM_DD}.json`
    pub fn path_on(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("factura_{}_{}.json", self.cuit, date.format("%Y_%m_%d")))
    }

    pub fn path(&self) -> PathBuf {
        self.path_on(Local::now().date_naive())
    }

    /// Today's ticket, if one was stored. A file that does not parse is
    /// ignored.
    pub fn load(&self) -> Result<Option<AuthTicket>, AfipError> {
        let path = self.path();
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&data) {
            Ok(ticket) => Ok(Some(ticket)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable ticket file");
                Ok(None)
            }
        }
    }

    /// Write `ticket` as today's file and return its path.
    pub fn save(&self, ticket: &AuthTicket) -> Result<PathBuf, AfipError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path();
        let json = serde_json::to_string_pretty(ticket)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&path, json)?;
        debug!(path = %path.display(), "stored WSAA ticket");
        Ok(path)
    }
}

/// [`CredentialProvider`] backed by WSAA.
///
/// Tickets are looked up in memory, then in the [`TicketStore`]; only when
/// neither holds a valid one is a new login performed and persisted. The
/// lock is held across the whole refresh, so concurrent callers share one
/// login: WSAA refuses a second ticket while the first is still valid.
pub struct TicketProvider<C, S> {
    wsaa: Wsaa<C, S>,
    store: TicketStore,
    current: Mutex<Option<AuthTicket>>,
}

impl<C: SoapChannel, S: CmsSigner> TicketProvider<C, S> {
    pub fn new(wsaa: Wsaa<C, S>, store: TicketStore) -> Self {
        Self {
            wsaa,
            store,
            current: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &TicketStore {
        &self.store
    }
}

#[async_trait]
impl<C: SoapChannel, S: CmsSigner> CredentialProvider for TicketProvider<C, S> {
    async fn auth_ticket(&self) -> Result<AuthTicket, AfipError> {
        let mut current = self.current.lock().await;
        if let Some(ticket) = current.as_ref().filter(|t| t.is_valid()) {
            return Ok(ticket.clone());
        }

        if let Some(ticket) = self.store.load()?.filter(AuthTicket::is_valid) {
            debug!(expires_at = %ticket.expires_at, "reusing stored WSAA ticket");
            *current = Some(ticket.clone());
            return Ok(ticket);
        }

        let ticket = self.wsaa.login().await?;
        self.store.save(&ticket)?;
        *current = Some(ticket.clone());
        Ok(ticket)
    }
}
