//! Generic SOAP 1.1 RPC channel.
//!
//! A channel takes an operation name and a body tree and returns the parsed
//! `Body` of the response. It knows nothing about invoices; WSFE and WSAA both
//! go through it.

mod parse;
pub(crate) mod xml_utils;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::{AfipError, LogOptions, WireValue};

pub use parse::{parse_envelope, parse_xml};
pub use xml_utils::{SOAP_ENV_NS, build_envelope, pretty_print};

/// Request/response RPC over SOAP.
#[async_trait]
pub trait SoapChannel: Send + Sync {
    /// Invoke `operation` with `body` as its children; returns the response
    /// `Body` content (e.g. a map holding `{operation}Response`).
    async fn call(&self, operation: &str, body: WireValue) -> Result<WireValue, AfipError>;
}

#[async_trait]
impl<T: SoapChannel + ?Sized> SoapChannel for Arc<T> {
    async fn call(&self, operation: &str, body: WireValue) -> Result<WireValue, AfipError> {
        (**self).call(operation, body).await
    }
}

/// [`SoapChannel`] over HTTPS with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpSoapChannel {
    client: reqwest::Client,
    endpoint: String,
    namespace: String,
    send_action: bool,
    log: LogOptions,
}

impl HttpSoapChannel {
    /// Channel posting to `endpoint`, with operations qualified by
    /// `namespace`. The `SOAPAction` header is `{namespace}{operation}`.
    pub fn new(endpoint: impl Into<String>, namespace: impl Into<String>) -> Result<Self, AfipError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AfipError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            namespace: namespace.into(),
            send_action: true,
            log: LogOptions::default(),
        })
    }

    /// Replace the HTTP client, e.g. to set a different timeout or proxy.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_log(mut self, log: LogOptions) -> Self {
        self.log = log;
        self
    }

    /// Send an empty `SOAPAction` header instead of a qualified one.
    pub fn without_soap_action(mut self) -> Self {
        self.send_action = false;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn soap_action(&self, operation: &str) -> String {
        if self.send_action {
            format!("{}{}", self.namespace, operation)
        } else {
            String::new()
        }
    }

    /// POST a ready-made envelope and return the raw response text.
    ///
    /// Non-2xx responses are returned as long as they carry a SOAP envelope,
    /// since faults arrive with HTTP 500.
    pub async fn post(&self, operation: &str, envelope: String) -> Result<String, AfipError> {
        xml_utils::log_envelope(&self.log, "request", operation, &envelope);

        let resp = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}\"", self.soap_action(operation)))
            .body(envelope)
            .send()
            .await
            .map_err(|e| AfipError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AfipError::Transport(e.to_string()))?;

        xml_utils::log_envelope(&self.log, "response", operation, &body);

        if !status.is_success() && !body.contains("Envelope") {
            return Err(AfipError::Transport(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl SoapChannel for HttpSoapChannel {
    async fn call(&self, operation: &str, body: WireValue) -> Result<WireValue, AfipError> {
        let envelope = build_envelope(&self.namespace, operation, &body)?;
        let xml = self.post(operation, envelope).await?;
        parse_envelope(&xml)
    }
}
