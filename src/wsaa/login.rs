use chrono::{DateTime, FixedOffset, Local};
use tracing::{debug, info};

use super::signer::CmsSigner;
use super::tra::build_tra;
use crate::core::{AfipError, AuthTicket, Environment, LogOptions, WireValue};
use crate::soap::{HttpSoapChannel, SoapChannel, build_envelope, parse_envelope, parse_xml};

/// Namespace of the `LoginCms` service.
pub const WSAA_NAMESPACE: &str = "http://wsaa.view.sua.dvadac.desein.afip.gov";
pub const LOGIN_CMS: &str = "loginCms";
/// Service the tickets are requested for.
pub const WSFE_SERVICE: &str = "wsfe";

fn login_body(cms: &str) -> WireValue {
    WireValue::map().with_text("in0", cms)
}

/// Full `loginCms` SOAP envelope carrying the signed TRA.
pub fn build_login_request(cms: &str) -> Result<String, AfipError> {
    build_envelope(WSAA_NAMESPACE, LOGIN_CMS, &login_body(cms))
}

/// Parse a raw `loginCms` HTTP response into a ticket.
///
/// # Errors
///
/// `Authentication` for SOAP faults (e.g. `coe.alreadyAuthenticated`) and for
/// responses that do not carry a complete `loginTicketResponse`.
pub fn parse_login_response(xml: &str) -> Result<AuthTicket, AfipError> {
    let body = parse_envelope(xml).map_err(into_authentication)?;
    ticket_from_body(&body)
}

fn into_authentication(err: AfipError) -> AfipError {
    match err {
        AfipError::Protocol(msg) => AfipError::Authentication(msg),
        other => other,
    }
}

fn ticket_from_body(body: &WireValue) -> Result<AuthTicket, AfipError> {
    // The ticket is an XML document escaped inside loginCmsReturn.
    let inner = body
        .path(&["loginCmsResponse", "loginCmsReturn"])
        .and_then(WireValue::as_text)
        .ok_or_else(|| AfipError::Authentication("response lacks loginCmsReturn".into()))?;

    let doc = parse_xml(inner).map_err(into_authentication)?;
    let response = doc
        .get("loginTicketResponse")
        .ok_or_else(|| AfipError::Authentication("not a loginTicketResponse".into()))?;

    let field = |path: &[&str]| {
        response
            .path(path)
            .and_then(WireValue::as_text)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AfipError::Authentication(format!("loginTicketResponse lacks {}", path.join("/")))
            })
    };

    let token = field(&["credentials", "token"])?;
    let sign = field(&["credentials", "sign"])?;
    let expiration = field(&["header", "expirationTime"])?;
    let expires_at: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(expiration.trim())
        .map_err(|e| AfipError::Authentication(format!("bad expirationTime `{expiration}`: {e}")))?;

    Ok(AuthTicket::new(token, sign, expires_at))
}

/// WSAA client: builds the TRA, signs it and exchanges it for a ticket.
pub struct Wsaa<C, S> {
    channel: C,
    signer: S,
    service: String,
}

impl<S: CmsSigner> Wsaa<HttpSoapChannel, S> {
    pub fn for_environment(
        environment: Environment,
        signer: S,
        log: LogOptions,
    ) -> Result<Self, AfipError> {
        let channel = HttpSoapChannel::new(environment.wsaa_url(), WSAA_NAMESPACE)?
            .without_soap_action()
            .with_log(log);
        Ok(Self::new(channel, signer))
    }
}

impl<C: SoapChannel, S: CmsSigner> Wsaa<C, S> {
    pub fn new(channel: C, signer: S) -> Self {
        Self {
            channel,
            signer,
            service: WSFE_SERVICE.to_string(),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Request a fresh ticket.
    pub async fn login(&self) -> Result<AuthTicket, AfipError> {
        self.login_at(Local::now().fixed_offset()).await
    }

    pub async fn login_at(&self, now: DateTime<FixedOffset>) -> Result<AuthTicket, AfipError> {
        let tra = build_tra(now, &self.service);
        let cms = self.signer.sign(&tra).await?;
        debug!(service = %self.service, "calling loginCms");

        let body = self
            .channel
            .call(LOGIN_CMS, login_body(&cms))
            .await
            .map_err(into_authentication)?;
        let ticket = ticket_from_body(&body)?;
        info!(service = %self.service, expires_at = %ticket.expires_at, "WSAA ticket issued");
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_envelope() {
        let xml = build_login_request("TUlJRzVR").unwrap();
        assert!(xml.contains(
            "<loginCms xmlns=\"http://wsaa.view.sua.dvadac.desein.afip.gov\">"
        ));
        assert!(xml.contains("<in0>TUlJRzVR</in0>"));
    }

    #[test]
    fn fault_is_authentication_error() {
        let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <soapenv:Fault>
      <faultcode>ns1:cms.cert.expired</faultcode>
      <faultstring>Certificado expirado</faultstring>
    </soapenv:Fault>
  </soapenv:Body>
</soapenv:Envelope>"#;
        let err = parse_login_response(xml).unwrap_err();
        assert!(matches!(err, AfipError::Authentication(ref m) if m.contains("cms.cert.expired")));
    }

    #[test]
    fn missing_credentials_rejected() {
        let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <loginCmsResponse xmlns="http://wsaa.view.sua.dvadac.desein.afip.gov">
      <loginCmsReturn>&lt;loginTicketResponse&gt;&lt;header&gt;&lt;expirationTime&gt;2024-03-01T22:00:00-03:00&lt;/expirationTime&gt;&lt;/header&gt;&lt;/loginTicketResponse&gt;</loginCmsReturn>
    </loginCmsResponse>
  </soapenv:Body>
</soapenv:Envelope>"#;
        let err = parse_login_response(xml).unwrap_err();
        assert!(err.to_string().contains("credentials/token"));
    }
}
