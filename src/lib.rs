//! # factura
//!
//! Client for AFIP's electronic invoicing web services (Argentina):
//! WSAA access tickets and WSFE invoice authorization (CAE).
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Amounts are rounded half away from zero to two decimals, as AFIP expects.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use factura::core::*;
//! use rust_decimal_macros::dec;
//!
//! let profile = TaxProfile::new("20-28774002-7", "0002", IvaCondition::ResponsableInscripto)
//!     .unwrap();
//! let bill = Bill::new(
//!     &profile,
//!     InvoiceAttributes::new(dec!(100), IvaCondition::ConsumidorFinal, InvoiceType::Invoice)
//!         .document_type(DocumentType::Dni)
//!         .document_number("30123456"),
//! )
//! .unwrap();
//!
//! assert_eq!(bill.bill_type().code(), "06");
//! assert_eq!(bill.total(), dec!(121.00));
//!
//! let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let request = build_request(&profile, &bill, 42, today);
//! assert_eq!(request.detail.cbte_fch, today);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` | Tables, invoices, tax arithmetic, request/response mapping |
//! | `soap` | SOAP 1.1 envelope building, parsing and HTTPS channel |
//! | `wsfe` (default) | `FECAESolicitar`, `FECompUltimoAutorizado`, `FEDummy` |
//! | `wsaa` (default) | TRA signing, `loginCms` and the ticket cache |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "soap")]
pub mod soap;

#[cfg(feature = "wsfe")]
pub mod wsfe;

#[cfg(feature = "wsaa")]
pub mod wsaa;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
