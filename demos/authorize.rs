//! Authorize one invoice against the homologation servers.
//!
//! Needs `AFIP_CUIT`, `AFIP_SALE_POINT`, `AFIP_OWN_IVA_CONDITION`, `AFIP_CERT`
//! and `AFIP_PKEY`. Set `AFIP_LOG=true` to print the SOAP traffic.

use factura::core::*;
use factura::wsaa::{OpensslSigner, TicketProvider, TicketStore, Wsaa};
use factura::wsfe::AuthorizationClient;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AfipError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("factura=debug")),
        )
        .init();

    let environment = Environment::from_env();
    let log = LogOptions::from_env();
    let profile = TaxProfile::from_env()?;
    let signer = OpensslSigner::new(CertificateConfig::from_env()?)?;

    let credentials = TicketProvider::new(
        Wsaa::for_environment(environment, signer, log)?,
        TicketStore::in_temp_dir(profile.cuit()),
    );
    let client = AuthorizationClient::for_environment(environment, profile, credentials, log)?;

    let status = client.dummy().await?;
    println!("WSFE status: {status:?}");

    let mut bill = Bill::new(
        client.profile(),
        InvoiceAttributes::new(dec!(100), IvaCondition::ConsumidorFinal, InvoiceType::Invoice)
            .document_type(DocumentType::Dni)
            .document_number("30123456"),
    )?;

    if client.authorize(&mut bill).await? {
        let response = bill.response().map(|r| r.cae.clone().unwrap_or_default());
        println!("Authorized, CAE {}", response.unwrap_or_default());
    } else {
        println!("Rejected:");
        for message in bill.remote_messages() {
            println!("  {message}");
        }
    }
    Ok(())
}
