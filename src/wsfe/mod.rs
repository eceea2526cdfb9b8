//! WSFE (`wsfev1`) invoice authorization.
//!
//! [`AuthorizationClient`] ties the pieces together: a ticket from a
//! [`CredentialProvider`](crate::core::CredentialProvider), the next voucher
//! number from `FECompUltimoAutorizado`, the request built from a
//! [`Bill`](crate::core::Bill), and the normalized `FECAESolicitar` response.

mod client;
pub mod sequence;

pub use client::*;
pub use sequence::{FE_COMP_ULTIMO_AUTORIZADO, last_authorized_number, next_bill_number};

use crate::core::{AfipError, Environment, LogOptions};
use crate::soap::HttpSoapChannel;

/// HTTPS channel to the WSFE endpoint of `environment`.
pub fn wsfe_channel(environment: Environment, log: LogOptions) -> Result<HttpSoapChannel, AfipError> {
    Ok(HttpSoapChannel::new(environment.wsfe_url(), WSFE_NAMESPACE)?.with_log(log))
}
