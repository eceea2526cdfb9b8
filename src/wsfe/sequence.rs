//! Voucher numbering. AFIP is the only source of truth: numbers are queried
//! per authorization and never cached.

use tracing::debug;

use crate::core::{AfipError, BillType, MessageKind, WireValue, remote_messages};
use crate::soap::SoapChannel;

pub const FE_COMP_ULTIMO_AUTORIZADO: &str = "FECompUltimoAutorizado";

const RESULT_PATH: [&str; 2] = [
    "FECompUltimoAutorizadoResponse",
    "FECompUltimoAutorizadoResult",
];

/// Last voucher number AFIP authorized for `sale_point` and `bill_type`.
///
/// `auth` is the `Auth` element (token, sign, CUIT). Any failure, whether
/// transport, shape or an AFIP-reported error, is a `RemoteQuery` error.
/// Nothing is retried.
pub async fn last_authorized_number<C: SoapChannel + ?Sized>(
    channel: &C,
    auth: WireValue,
    sale_point: &str,
    bill_type: BillType,
) -> Result<u64, AfipError> {
    let body = WireValue::map()
        .with("Auth", auth)
        .with_text("PtoVta", sale_point)
        .with_text("CbteTipo", bill_type.code());

    let raw = channel
        .call(FE_COMP_ULTIMO_AUTORIZADO, body)
        .await
        .map_err(|e| AfipError::RemoteQuery(e.to_string()))?;

    let result = raw.path(&RESULT_PATH).ok_or_else(|| {
        AfipError::RemoteQuery(format!("response lacks {}", RESULT_PATH.join("/")))
    })?;

    // AFIP fills CbteNro with 0 alongside Errors, so errors win.
    let errors: Vec<_> = remote_messages(result)
        .into_iter()
        .filter(|m| m.kind == MessageKind::Error)
        .collect();
    if !errors.is_empty() {
        return Err(AfipError::RemoteQuery(crate::core::join(&errors)));
    }

    let number = result
        .text_of("CbteNro")
        .ok_or_else(|| AfipError::RemoteQuery("response lacks CbteNro".into()))?;

    let last = number
        .trim()
        .parse::<u64>()
        .map_err(|e| AfipError::RemoteQuery(format!("CbteNro `{number}` is not a number: {e}")))?;
    debug!(sale_point, bill_type = bill_type.code(), last, "last authorized voucher");
    Ok(last)
}

/// Number to use for the next voucher: `last + 1`. It is sent as both
/// `CbteDesde` and `CbteHasta`, since every request carries one invoice.
pub async fn next_bill_number<C: SoapChannel + ?Sized>(
    channel: &C,
    auth: WireValue,
    sale_point: &str,
    bill_type: BillType,
) -> Result<u64, AfipError> {
    let last = last_authorized_number(channel, auth, sale_point, bill_type).await?;
    last.checked_add(1)
        .ok_or_else(|| AfipError::RemoteQuery(format!("CbteNro {last} cannot be incremented")))
}
