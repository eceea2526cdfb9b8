//! Process configuration: seller tax profile, target environment, certificate
//! paths and SOAP logging options.
//!
//! Everything here is built once at startup and passed by reference.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::AfipError;
use super::tables::{Concept, Currency, DocumentType, IvaCondition};

/// Seller identity and invoicing defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaxProfileConfig")]
pub struct TaxProfile {
    cuit: String,
    sale_point: String,
    own_iva_condition: IvaCondition,
    default_document_type: DocumentType,
    default_currency: Currency,
    default_concept: Concept,
}

/// Unvalidated form of [`TaxProfile`] as read from a config file.
#[derive(Debug, Deserialize)]
struct TaxProfileConfig {
    cuit: String,
    sale_point: String,
    own_iva_condition: IvaCondition,
    #[serde(default)]
    default_document_type: Option<DocumentType>,
    #[serde(default)]
    default_currency: Option<Currency>,
    #[serde(default)]
    default_concept: Option<Concept>,
}

impl TryFrom<TaxProfileConfig> for TaxProfile {
    type Error = AfipError;

    fn try_from(c: TaxProfileConfig) -> Result<Self, Self::Error> {
        let mut profile = TaxProfile::new(c.cuit, c.sale_point, c.own_iva_condition)?;
        if let Some(d) = c.default_document_type {
            profile.default_document_type = d;
        }
        if let Some(m) = c.default_currency {
            profile.default_currency = m;
        }
        if let Some(k) = c.default_concept {
            profile.default_concept = k;
        }
        Ok(profile)
    }
}

impl TaxProfile {
    /// Create a profile with the usual defaults: CUIT documents, pesos, and
    /// "Productos y Servicios".
    ///
    /// # Errors
    ///
    /// `MissingCredentials` for an empty CUIT, `InvalidAttribute` for a
    /// malformed CUIT or sale point, or an own IVA condition that cannot
    /// issue invoices.
    pub fn new(
        cuit: impl Into<String>,
        sale_point: impl Into<String>,
        own_iva_condition: IvaCondition,
    ) -> Result<Self, AfipError> {
        let cuit = cuit.into().replace('-', "");
        let sale_point = sale_point.into();

        if cuit.is_empty() {
            return Err(AfipError::MissingCredentials("CUIT is not set".into()));
        }
        if cuit.len() != 11 || !cuit.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AfipError::invalid("cuit", &cuit));
        }
        if sale_point.is_empty()
            || sale_point.len() > 5
            || !sale_point.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(AfipError::invalid("sale_point", &sale_point));
        }
        if !own_iva_condition.can_issue() {
            return Err(AfipError::InvalidAttribute(format!(
                "own_iva_condition: `{own_iva_condition}` is invalid for a seller"
            )));
        }

        Ok(Self {
            cuit,
            sale_point,
            own_iva_condition,
            default_document_type: DocumentType::Cuit,
            default_currency: Currency::Peso,
            default_concept: Concept::ProductosYServicios,
        })
    }

    /// Read the profile from `AFIP_CUIT`, `AFIP_SALE_POINT`,
    /// `AFIP_OWN_IVA_CONDITION` and the optional `AFIP_DEFAULT_DOCUMENT`,
    /// `AFIP_DEFAULT_CURRENCY`, `AFIP_DEFAULT_CONCEPT`.
    pub fn from_env() -> Result<Self, AfipError> {
        let cuit = env::var("AFIP_CUIT")
            .map_err(|_| AfipError::MissingCredentials("AFIP_CUIT is not set".into()))?;
        let sale_point = env::var("AFIP_SALE_POINT").unwrap_or_else(|_| "0001".into());
        let own = env::var("AFIP_OWN_IVA_CONDITION")
            .unwrap_or_else(|_| IvaCondition::ResponsableInscripto.name().into())
            .parse()?;

        let mut profile = Self::new(cuit, sale_point, own)?;
        if let Ok(v) = env::var("AFIP_DEFAULT_DOCUMENT") {
            profile.default_document_type = v.parse()?;
        }
        if let Ok(v) = env::var("AFIP_DEFAULT_CURRENCY") {
            profile.default_currency = v.parse()?;
        }
        if let Ok(v) = env::var("AFIP_DEFAULT_CONCEPT") {
            profile.default_concept = v.parse()?;
        }
        Ok(profile)
    }

    pub fn with_default_document_type(mut self, document_type: DocumentType) -> Self {
        self.default_document_type = document_type;
        self
    }

    pub fn with_default_currency(mut self, currency: Currency) -> Self {
        self.default_currency = currency;
        self
    }

    pub fn with_default_concept(mut self, concept: Concept) -> Self {
        self.default_concept = concept;
        self
    }

    pub fn cuit(&self) -> &str {
        &self.cuit
    }

    pub fn sale_point(&self) -> &str {
        &self.sale_point
    }

    pub fn own_iva_condition(&self) -> IvaCondition {
        self.own_iva_condition
    }

    pub fn default_document_type(&self) -> DocumentType {
        self.default_document_type
    }

    pub fn default_currency(&self) -> Currency {
        self.default_currency
    }

    pub fn default_concept(&self) -> Concept {
        self.default_concept
    }
}

/// AFIP deployment the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Homologation servers.
    #[default]
    Testing,
    Production,
}

impl Environment {
    pub fn wsaa_url(&self) -> &'static str {
        match self {
            Self::Testing => "https://wsaahomo.afip.gov.ar/ws/services/LoginCms",
            Self::Production => "https://wsaa.afip.gov.ar/ws/services/LoginCms",
        }
    }

    pub fn wsfe_url(&self) -> &'static str {
        match self {
            Self::Testing => "https://wswhomo.afip.gov.ar/wsfev1/service.asmx",
            Self::Production => "https://servicios1.afip.gov.ar/wsfev1/service.asmx",
        }
    }

    /// `AFIP_ENV`; anything other than `production` selects testing.
    pub fn from_env() -> Self {
        match env::var("AFIP_ENV").as_deref() {
            Ok("production") => Self::Production,
            _ => Self::Testing,
        }
    }
}

/// Paths used to sign WSAA login requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateConfig {
    pub cert: PathBuf,
    pub pkey: PathBuf,
    #[serde(default = "default_openssl")]
    pub openssl_bin: PathBuf,
}

fn default_openssl() -> PathBuf {
    PathBuf::from("openssl")
}

impl CertificateConfig {
    pub fn new(cert: impl Into<PathBuf>, pkey: impl Into<PathBuf>) -> Self {
        Self {
            cert: cert.into(),
            pkey: pkey.into(),
            openssl_bin: default_openssl(),
        }
    }

    pub fn openssl_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.openssl_bin = path.into();
        self
    }

    /// `AFIP_CERT`, `AFIP_PKEY` and optional `OPENSSL_PATH`. Files are checked.
    pub fn from_env() -> Result<Self, AfipError> {
        let cert = env::var("AFIP_CERT")
            .map_err(|_| AfipError::MissingCertificate("AFIP_CERT is not set".into()))?;
        let pkey = env::var("AFIP_PKEY")
            .map_err(|_| AfipError::MissingCertificate("AFIP_PKEY is not set".into()))?;
        let mut config = Self::new(cert, pkey);
        if let Ok(bin) = env::var("OPENSSL_PATH") {
            config.openssl_bin = bin.into();
        }
        config.check()?;
        Ok(config)
    }

    /// Fail with `MissingCertificate` unless both files exist.
    pub fn check(&self) -> Result<(), AfipError> {
        for file in [&self.pkey, &self.cert] {
            if !file.is_file() {
                return Err(AfipError::MissingCertificate(format!(
                    "{} does not exist",
                    file.display()
                )));
            }
        }
        Ok(())
    }
}

/// Severity for logged SOAP envelopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

/// Controls logging of raw SOAP traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOptions {
    /// Emit request and response envelopes.
    pub log: bool,
    /// Re-indent envelopes before emitting them.
    pub pretty_xml: bool,
    pub level: LogLevel,
}

impl LogOptions {
    /// Logging on; pretty printing follows `log` unless set explicitly.
    pub fn enabled() -> Self {
        Self {
            log: true,
            pretty_xml: true,
            level: LogLevel::Debug,
        }
    }

    pub fn pretty_xml(mut self, pretty: bool) -> Self {
        self.pretty_xml = pretty;
        self
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// `AFIP_LOG=true` turns envelope logging on.
    pub fn from_env() -> Self {
        if env::var("AFIP_LOG").as_deref() == Ok("true") {
            Self::enabled()
        } else {
            Self::default()
        }
    }
}
