//! Core invoice types, AFIP tables, tax arithmetic and the request/response
//! pipeline.
//!
//! Nothing in this module touches the network: it validates invoices, builds
//! `FECAESolicitar` request trees and normalizes response trees. Transport
//! lives in [`crate::soap`], and the orchestration in [`crate::wsfe`].

mod bill;
mod error;
mod profile;
mod request;
mod response;
pub mod tables;
pub mod tax;
mod ticket;
mod wire;

pub use bill::*;
pub use error::*;
pub use profile::*;
pub use request::*;
pub use response::*;
pub use tables::{
    AlicIva, BillLetter, BillType, Concept, Currency, DocumentType, InvoiceType, IvaCondition,
};
pub use ticket::*;
pub use wire::*;
