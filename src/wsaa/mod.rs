//! WSAA authentication: access ticket requests (TRA), CMS signing, the
//! `loginCms` exchange and a daily on-disk ticket cache.

mod login;
mod signer;
mod store;
mod tra;

pub use login::{
    LOGIN_CMS, WSAA_NAMESPACE, WSFE_SERVICE, Wsaa, build_login_request, parse_login_response,
};
pub use signer::{CmsSigner, OpensslSigner};
pub use store::{TicketProvider, TicketStore};
pub use tra::{CLOCK_SKEW_SECS, TICKET_LIFETIME_SECS, build_tra};
