//! Flattening of the `FECAESolicitar` round trip into one record.
//!
//! The record combines the request as it was sent (header, detail, and the
//! single `AlicIva` line lifted to the top level) with the result codes from
//! the response. Field mapping:
//!
//! | Source | Wire field | Record field |
//! |---|---|---|
//! | `FeCabResp` | `Resultado` | `header_result` |
//! | `FeCabResp` | `FchProceso` | `authorized_on` |
//! | `FECAEDetResponse` | `Resultado` | `detail_result` |
//! | `FECAEDetResponse` | `CAE` | `cae` |
//! | `FECAEDetResponse` | `CAEFchVto` | `cae_due_date` |
//! | `AlicIva` | `Id` / `Importe` / `BaseImp` | `iva_id` / `iva_importe` / `iva_base_imp` |
//! | `FECAEDetRequest` | `MonId` / `MonCotiz` / `DocNro` | `moneda` / `cotizacion` / `doc_num` |
//! | `FeCabReq`, `FECAEDetRequest` | everything else | snake_case of the wire name |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::AfipError;
use super::request::{InvoiceRequest, format_date};
use super::wire::WireValue;

/// Result code AFIP uses for "approved".
pub const APPROVED: &str = "A";

/// Normalized outcome of one authorization attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub header_result: String,
    pub authorized_on: Option<String>,
    pub detail_result: String,
    pub cae_due_date: Option<String>,
    pub cae: Option<String>,
    pub iva_id: String,
    pub iva_importe: Decimal,
    pub moneda: String,
    pub cotizacion: Decimal,
    pub iva_base_imp: Decimal,
    pub doc_num: Option<String>,
    pub cant_reg: u32,
    pub cbte_tipo: String,
    pub pto_vta: String,
    pub concepto: String,
    pub doc_tipo: String,
    pub cbte_fch: String,
    pub imp_tot_conc: Decimal,
    pub imp_op_ex: Decimal,
    pub imp_trib: Decimal,
    pub imp_neto: Decimal,
    pub imp_iva: Decimal,
    pub imp_total: Decimal,
    pub cbte_desde: u64,
    pub cbte_hasta: u64,
    pub fch_serv_desde: String,
    pub fch_serv_hasta: String,
    pub fch_vto_pago: String,
}

impl AuthorizationResponse {
    /// Both the batch header and the invoice detail were approved.
    pub fn is_authorized(&self) -> bool {
        self.header_result == APPROVED && self.detail_result == APPROVED
    }
}

/// Where a [`RemoteMessage`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// `Errors/Err`: request-level failure.
    Error,
    /// `Observaciones/Obs`: reason attached to a rejected (or observed) detail.
    Observation,
    /// `Events/Evt`: service announcements.
    Event,
}

/// A code/message pair reported by WSFE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub kind: MessageKind,
    pub code: String,
    pub message: String,
}

impl std::fmt::Display for RemoteMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

const RESPONSE_PATH: [&str; 2] = ["FECAESolicitarResponse", "FECAESolicitarResult"];

/// Flatten the sent `request` and the raw `FECAESolicitar` response body.
///
/// # Errors
///
/// `Protocol` when the result containers or result codes are missing. A
/// response carrying only `Errors` is reported the same way, with the remote
/// messages in the error text.
pub fn normalize(
    request: &InvoiceRequest,
    raw: &WireValue,
) -> Result<AuthorizationResponse, AfipError> {
    let result = raw.path(&RESPONSE_PATH).ok_or_else(|| {
        AfipError::Protocol("response lacks FECAESolicitarResponse/FECAESolicitarResult".into())
    })?;

    let Some(header) = result.get("FeCabResp") else {
        let errors = collect(result, "Errors", "Err", MessageKind::Error);
        return Err(AfipError::Protocol(if errors.is_empty() {
            "response lacks FeCabResp".into()
        } else {
            join(&errors)
        }));
    };
    let detail = result
        .path(&["FeDetResp", "FECAEDetResponse"])
        .ok_or_else(|| AfipError::Protocol("response lacks FeDetResp/FECAEDetResponse".into()))?;

    let header_result = header
        .text_of("Resultado")
        .ok_or_else(|| AfipError::Protocol("FeCabResp lacks Resultado".into()))?;
    let detail_result = detail
        .text_of("Resultado")
        .ok_or_else(|| AfipError::Protocol("FECAEDetResponse lacks Resultado".into()))?;

    let h = &request.header;
    let d = &request.detail;

    Ok(AuthorizationResponse {
        header_result: header_result.to_string(),
        authorized_on: header.text_of("FchProceso").map(str::to_string),
        detail_result: detail_result.to_string(),
        cae_due_date: detail.text_of("CAEFchVto").map(str::to_string),
        cae: detail.text_of("CAE").map(str::to_string),
        iva_id: d.iva.id.clone(),
        iva_importe: d.iva.importe,
        moneda: d.mon_id.clone(),
        cotizacion: d.mon_cotiz,
        iva_base_imp: d.iva.base_imp,
        doc_num: d.doc_nro.clone(),
        cant_reg: h.cant_reg,
        cbte_tipo: h.cbte_tipo.code().to_string(),
        pto_vta: h.pto_vta.clone(),
        concepto: d.concepto.clone(),
        doc_tipo: d.doc_tipo.clone(),
        cbte_fch: format_date(d.cbte_fch),
        imp_tot_conc: d.imp_tot_conc,
        imp_op_ex: d.imp_op_ex,
        imp_trib: d.imp_trib,
        imp_neto: d.imp_neto,
        imp_iva: d.imp_iva,
        imp_total: d.imp_total,
        cbte_desde: d.cbte_desde,
        cbte_hasta: d.cbte_hasta,
        fch_serv_desde: format_date(d.fch_serv_desde),
        fch_serv_hasta: format_date(d.fch_serv_hasta),
        fch_vto_pago: format_date(d.fch_vto_pago),
    })
}

/// Errors, observations and events found anywhere in a WSFE result.
pub fn remote_messages(result: &WireValue) -> Vec<RemoteMessage> {
    let mut messages = collect(result, "Errors", "Err", MessageKind::Error);
    if let Some(detail) = result.path(&["FeDetResp", "FECAEDetResponse"]) {
        messages.extend(collect(
            detail,
            "Observaciones",
            "Obs",
            MessageKind::Observation,
        ));
    }
    messages.extend(collect(result, "Events", "Evt", MessageKind::Event));
    messages
}

/// Messages of the `FECAESolicitar` result inside a raw response body.
pub fn solicitar_messages(raw: &WireValue) -> Vec<RemoteMessage> {
    raw.path(&RESPONSE_PATH)
        .map(remote_messages)
        .unwrap_or_default()
}

fn collect(node: &WireValue, list: &str, item: &str, kind: MessageKind) -> Vec<RemoteMessage> {
    node.get(list)
        .map(|l| {
            l.get_all(item)
                .map(|m| RemoteMessage {
                    kind,
                    code: m.text_of("Code").unwrap_or_default().to_string(),
                    message: m.text_of("Msg").unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn join(messages: &[RemoteMessage]) -> String {
    messages
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
