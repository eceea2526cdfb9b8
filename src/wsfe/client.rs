use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::sequence;
use crate::core::{
    AfipError, Bill, BillType, CredentialProvider, Environment, LogOptions, TaxProfile, WireValue,
    build_request, join, normalize, solicitar_messages,
};
use crate::soap::{HttpSoapChannel, SoapChannel};

pub const FECAE_SOLICITAR: &str = "FECAESolicitar";
pub const FE_DUMMY: &str = "FEDummy";

/// WSFE target namespace; also the `SOAPAction` prefix.
pub const WSFE_NAMESPACE: &str = "http://ar.gov.afip.dif.FEV1/";

/// Health of the WSFE infrastructure as reported by `FEDummy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub app_server: String,
    pub db_server: String,
    pub auth_server: String,
}

impl ServerStatus {
    pub fn is_ok(&self) -> bool {
        [&self.app_server, &self.db_server, &self.auth_server]
            .iter()
            .all(|s| s.as_str() == "OK")
    }
}

/// Submits bills to WSFE's `FECAESolicitar`.
///
/// The client holds no per-invoice state; each [`authorize`](Self::authorize)
/// call fetches a ticket, queries the next voucher number and performs one
/// round trip. The normalized outcome is stored on the [`Bill`].
pub struct AuthorizationClient<C, P> {
    profile: TaxProfile,
    channel: C,
    credentials: P,
}

impl<P: CredentialProvider> AuthorizationClient<HttpSoapChannel, P> {
    /// Client talking HTTPS to the WSFE endpoint of `environment`.
    pub fn for_environment(
        environment: Environment,
        profile: TaxProfile,
        credentials: P,
        log: LogOptions,
    ) -> Result<Self, AfipError> {
        Ok(Self::new(profile, super::wsfe_channel(environment, log)?, credentials))
    }
}

impl<C: SoapChannel, P: CredentialProvider> AuthorizationClient<C, P> {
    pub fn new(profile: TaxProfile, channel: C, credentials: P) -> Self {
        Self {
            profile,
            channel,
            credentials,
        }
    }

    pub fn profile(&self) -> &TaxProfile {
        &self.profile
    }

    async fn auth(&self) -> Result<WireValue, AfipError> {
        let ticket = self.credentials.auth_ticket().await?;
        debug!(expires_at = %ticket.expires_at, "using WSAA ticket");
        Ok(ticket.auth_header(self.profile.cuit()))
    }

    /// Last voucher number AFIP authorized for `bill_type` at the profile's
    /// sale point.
    pub async fn last_authorized(&self, bill_type: BillType) -> Result<u64, AfipError> {
        let auth = self.auth().await?;
        sequence::last_authorized_number(&self.channel, auth, self.profile.sale_point(), bill_type)
            .await
    }

    /// Authorize `bill` dated today (local time).
    ///
    /// Returns whether AFIP approved it. A rejection is `Ok(false)`; the
    /// normalized response and AFIP's observations stay on the bill either way.
    ///
    /// # Errors
    ///
    /// Errors from the credential provider, `RemoteQuery` when the voucher
    /// number cannot be resolved, `Transport` for network failures and
    /// `Protocol` for unexpected response shapes.
    pub async fn authorize(&self, bill: &mut Bill) -> Result<bool, AfipError> {
        self.authorize_on(bill, Local::now().date_naive()).await
    }

    /// Same as [`authorize`](Self::authorize) with an explicit voucher date,
    /// which is also the default service period and due date.
    pub async fn authorize_on(&self, bill: &mut Bill, today: NaiveDate) -> Result<bool, AfipError> {
        let auth = self.auth().await?;
        let bill_type = bill.bill_type();
        let number = sequence::next_bill_number(
            &self.channel,
            auth.clone(),
            self.profile.sale_point(),
            bill_type,
        )
        .await?;

        let request = build_request(&self.profile, bill, number, today);
        debug!(
            bill_type = bill_type.code(),
            number,
            total = %request.detail.imp_total,
            "submitting FECAESolicitar"
        );

        let raw = self
            .channel
            .call(FECAE_SOLICITAR, request.to_wire(auth))
            .await?;
        let response = normalize(&request, &raw)?;
        let messages = solicitar_messages(&raw);

        let authorized = response.is_authorized();
        if authorized {
            info!(
                bill_type = bill_type.code(),
                number,
                cae = response.cae.as_deref().unwrap_or(""),
                "invoice authorized"
            );
        } else {
            warn!(
                bill_type = bill_type.code(),
                number,
                header_result = %response.header_result,
                detail_result = %response.detail_result,
                reasons = %join(&messages),
                "invoice rejected"
            );
        }

        bill.set_response(response, messages);
        Ok(authorized)
    }

    /// Call `FEDummy`, which needs no ticket.
    pub async fn dummy(&self) -> Result<ServerStatus, AfipError> {
        let raw = self.channel.call(FE_DUMMY, WireValue::map()).await?;
        let result = raw
            .path(&["FEDummyResponse", "FEDummyResult"])
            .ok_or_else(|| AfipError::Protocol("response lacks FEDummyResult".into()))?;
        let field = |name: &str| result.text_of(name).unwrap_or_default().to_string();
        Ok(ServerStatus {
            app_server: field("AppServer"),
            db_server: field("DbServer"),
            auth_server: field("AuthServer"),
        })
    }
}
