#![cfg(feature = "wsfe")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use factura::core::*;
use factura::soap::{SoapChannel, parse_envelope};
use factura::wsfe::*;
use rust_decimal_macros::dec;

/// Canned responses per operation; records every call.
#[derive(Default)]
struct MockChannel {
    responses: HashMap<String, Result<WireValue, String>>,
    calls: Mutex<Vec<(String, WireValue)>>,
}

impl MockChannel {
    fn respond(mut self, operation: &str, body: WireValue) -> Self {
        self.responses.insert(operation.to_string(), Ok(body));
        self
    }

    fn fail(mut self, operation: &str, message: &str) -> Self {
        self.responses.insert(operation.to_string(), Err(message.to_string()));
        self
    }

    fn calls(&self) -> Vec<(String, WireValue)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SoapChannel for MockChannel {
    async fn call(&self, operation: &str, body: WireValue) -> Result<WireValue, AfipError> {
        self.calls.lock().unwrap().push((operation.to_string(), body));
        match self.responses.get(operation) {
            Some(Ok(v)) => Ok(v.clone()),
            Some(Err(m)) => Err(AfipError::Transport(m.clone())),
            None => Err(AfipError::Protocol(format!("unexpected operation {operation}"))),
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn profile() -> TaxProfile {
    TaxProfile::new("20287740027", "0002", IvaCondition::ResponsableInscripto).unwrap()
}

fn credentials() -> StaticCredentials {
    let expires_at = (Utc::now() + Duration::hours(12)).fixed_offset();
    StaticCredentials::new(AuthTicket::new("TOKEN", "SIGN", expires_at))
}

fn bill() -> Bill {
    Bill::new(
        &profile(),
        InvoiceAttributes::new(dec!(100), IvaCondition::ConsumidorFinal, InvoiceType::Invoice)
            .document_type(DocumentType::Dni)
            .document_number("30123456"),
    )
    .unwrap()
}

fn last_authorized(number: &str) -> WireValue {
    WireValue::map().with(
        "FECompUltimoAutorizadoResponse",
        WireValue::map().with(
            "FECompUltimoAutorizadoResult",
            WireValue::map()
                .with_text("PtoVta", "2")
                .with_text("CbteTipo", "6")
                .with_text("CbteNro", number),
        ),
    )
}

fn solicitar(header: &str, detail: WireValue) -> WireValue {
    WireValue::map().with(
        "FECAESolicitarResponse",
        WireValue::map().with(
            "FECAESolicitarResult",
            WireValue::map()
                .with(
                    "FeCabResp",
                    WireValue::map()
                        .with_text("FchProceso", "20240305101500")
                        .with_text("Resultado", header),
                )
                .with("FeDetResp", WireValue::map().with("FECAEDetResponse", detail)),
        ),
    )
}

#[tokio::test]
async fn authorizes_with_next_number() {
    let channel = Arc::new(
        MockChannel::default()
            .respond(FE_COMP_ULTIMO_AUTORIZADO, last_authorized("41"))
            .respond(
                FECAE_SOLICITAR,
                solicitar(
                    "A",
                    WireValue::map()
                        .with_text("Resultado", "A")
                        .with_text("CAE", "74103451234567")
                        .with_text("CAEFchVto", "20240315"),
                ),
            ),
    );
    let client = AuthorizationClient::new(profile(), channel.clone(), credentials());
    let mut bill = bill();

    let authorized = client.authorize_on(&mut bill, date(2024, 3, 5)).await.unwrap();
    assert!(authorized);
    assert!(bill.is_authorized());

    let response = bill.response().unwrap();
    assert_eq!(response.cae.as_deref(), Some("74103451234567"));
    assert_eq!(response.cbte_desde, 42);
    assert_eq!(response.cbte_hasta, 42);
    assert_eq!(response.imp_total, dec!(121.00));
    assert_eq!(response.cbte_fch, "20240305");

    let calls = channel.calls();
    assert_eq!(calls.len(), 2);
    let (op, body) = &calls[0];
    assert_eq!(op, FE_COMP_ULTIMO_AUTORIZADO);
    assert_eq!(body.text_of("PtoVta"), Some("0002"));
    assert_eq!(body.text_of("CbteTipo"), Some("06"));
    assert_eq!(body.path(&["Auth", "Token"]).and_then(WireValue::as_text), Some("TOKEN"));

    let (op, body) = &calls[1];
    assert_eq!(op, FECAE_SOLICITAR);
    let det = body.path(&["FeCAEReq", "FeDetReq", "FECAEDetRequest"]).unwrap();
    assert_eq!(det.text_of("CbteDesde"), Some("42"));
    assert_eq!(det.text_of("ImpTotal"), Some("121.00"));
    assert_eq!(body.path(&["Auth", "Cuit"]).and_then(WireValue::as_text), Some("20287740027"));
}

#[tokio::test]
async fn rejection_keeps_observations() {
    let channel = MockChannel::default()
        .respond(FE_COMP_ULTIMO_AUTORIZADO, last_authorized("0"))
        .respond(
            FECAE_SOLICITAR,
            solicitar(
                "R",
                WireValue::map().with_text("Resultado", "R").with(
                    "Observaciones",
                    WireValue::map().with(
                        "Obs",
                        WireValue::map()
                            .with_text("Code", "10016")
                            .with_text("Msg", "El numero o fecha del comprobante no se corresponde"),
                    ),
                ),
            ),
        );
    let client = AuthorizationClient::new(profile(), channel, credentials());
    let mut bill = bill();

    let authorized = client.authorize_on(&mut bill, date(2024, 3, 5)).await.unwrap();
    assert!(!authorized);
    assert!(!bill.is_authorized());
    assert_eq!(bill.response().unwrap().cbte_desde, 1);
    assert_eq!(bill.response().unwrap().cae, None);

    let messages = bill.remote_messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Observation);
    assert_eq!(messages[0].code, "10016");
}

#[tokio::test]
async fn malformed_response_is_protocol_error() {
    let channel = MockChannel::default()
        .respond(FE_COMP_ULTIMO_AUTORIZADO, last_authorized("7"))
        .respond(FECAE_SOLICITAR, WireValue::map().with_text("Unexpected", "x"));
    let client = AuthorizationClient::new(profile(), channel, credentials());
    let mut bill = bill();

    let err = client.authorize_on(&mut bill, date(2024, 3, 5)).await.unwrap_err();
    assert!(matches!(err, AfipError::Protocol(_)));
    assert!(bill.response().is_none());
}

#[tokio::test]
async fn request_errors_surface_as_protocol_error() {
    let errors = WireValue::map().with(
        "FECAESolicitarResponse",
        WireValue::map().with(
            "FECAESolicitarResult",
            WireValue::map().with(
                "Errors",
                WireValue::map().with(
                    "Err",
                    WireValue::map()
                        .with_text("Code", "600")
                        .with_text("Msg", "ValidacionDeToken: No aparecio CUIT en lista de relaciones"),
                ),
            ),
        ),
    );
    let channel = MockChannel::default()
        .respond(FE_COMP_ULTIMO_AUTORIZADO, last_authorized("7"))
        .respond(FECAE_SOLICITAR, errors);
    let client = AuthorizationClient::new(profile(), channel, credentials());

    let err = client.authorize_on(&mut bill(), date(2024, 3, 5)).await.unwrap_err();
    assert!(matches!(err, AfipError::Protocol(ref m) if m.contains("[600]")));
}

#[tokio::test]
async fn sequence_failure_is_remote_query_error() {
    let channel = Arc::new(
        MockChannel::default()
            .fail(FE_COMP_ULTIMO_AUTORIZADO, "connection reset")
            .respond(FECAE_SOLICITAR, WireValue::map()),
    );
    let client = AuthorizationClient::new(profile(), channel.clone(), credentials());

    let err = client.authorize_on(&mut bill(), date(2024, 3, 5)).await.unwrap_err();
    assert!(matches!(err, AfipError::RemoteQuery(ref m) if m.contains("connection reset")));
    // No authorization attempted without a number.
    assert_eq!(channel.calls().len(), 1);
}

fn last_authorized_with_error(code: &str, msg: &str) -> WireValue {
    WireValue::map().with(
        "FECompUltimoAutorizadoResponse",
        WireValue::map().with(
            "FECompUltimoAutorizadoResult",
            WireValue::map()
                .with_text("PtoVta", "0")
                .with_text("CbteTipo", "0")
                .with_text("CbteNro", "0")
                .with(
                    "Errors",
                    WireValue::map().with(
                        "Err",
                        WireValue::map().with_text("Code", code).with_text("Msg", msg),
                    ),
                ),
        ),
    )
}

#[tokio::test]
async fn sequence_errors_reported() {
    let channel = MockChannel::default().respond(
        FE_COMP_ULTIMO_AUTORIZADO,
        last_authorized_with_error("11002", "Punto de venta inexistente"),
    );
    let client = AuthorizationClient::new(profile(), channel, credentials());

    let err = client.last_authorized(BillType::FacturaB).await.unwrap_err();
    assert!(matches!(err, AfipError::RemoteQuery(ref m) if m.contains("[11002]")));
}

#[tokio::test]
async fn sequence_error_with_zero_number_stops_authorization() {
    let channel = Arc::new(
        MockChannel::default()
            .respond(
                FE_COMP_ULTIMO_AUTORIZADO,
                last_authorized_with_error("600", "ValidacionDeToken: token expirado"),
            )
            .respond(FECAE_SOLICITAR, WireValue::map()),
    );
    let client = AuthorizationClient::new(profile(), channel.clone(), credentials());

    let err = next_bill_number(
        &*channel,
        WireValue::map().with_text("Token", "t"),
        "0002",
        BillType::FacturaB,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AfipError::RemoteQuery(ref m) if m.contains("token expirado")));

    let mut bill = bill();
    let err = client.authorize_on(&mut bill, date(2024, 3, 5)).await.unwrap_err();
    assert!(matches!(err, AfipError::RemoteQuery(ref m) if m.contains("[600]")));
    assert!(bill.response().is_none());
    assert!(channel.calls().iter().all(|(op, _)| op != FECAE_SOLICITAR));
}

#[tokio::test]
async fn events_alongside_number_are_not_errors() {
    let result = WireValue::map().with(
        "FECompUltimoAutorizadoResponse",
        WireValue::map().with(
            "FECompUltimoAutorizadoResult",
            WireValue::map()
                .with_text("PtoVta", "2")
                .with_text("CbteTipo", "6")
                .with_text("CbteNro", "9")
                .with(
                    "Events",
                    WireValue::map().with(
                        "Evt",
                        WireValue::map().with_text("Code", "1").with_text("Msg", "Mantenimiento programado"),
                    ),
                ),
        ),
    );
    let channel = MockChannel::default().respond(FE_COMP_ULTIMO_AUTORIZADO, result);
    let client = AuthorizationClient::new(profile(), channel, credentials());

    assert_eq!(client.last_authorized(BillType::FacturaB).await.unwrap(), 9);
}

#[tokio::test]
async fn expired_ticket_stops_before_network() {
    let expired = StaticCredentials::new(AuthTicket::new(
        "TOKEN",
        "SIGN",
        (Utc::now() - Duration::minutes(1)).fixed_offset(),
    ));
    let channel = Arc::new(MockChannel::default());
    let client = AuthorizationClient::new(profile(), channel.clone(), expired);

    let err = client.authorize_on(&mut bill(), date(2024, 3, 5)).await.unwrap_err();
    assert!(matches!(err, AfipError::MissingCredentials(_)));
    assert!(channel.calls().is_empty());
}

#[tokio::test]
async fn dummy_reports_server_status() {
    let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <FEDummyResponse xmlns="http://ar.gov.afip.dif.FEV1/">
      <FEDummyResult>
        <AppServer>OK</AppServer>
        <DbServer>OK</DbServer>
        <AuthServer>OK</AuthServer>
      </FEDummyResult>
    </FEDummyResponse>
  </soap:Body>
</soap:Envelope>"#;
    let channel = MockChannel::default().respond(FE_DUMMY, parse_envelope(xml).unwrap());
    let client = AuthorizationClient::new(profile(), channel, credentials());

    let status = client.dummy().await.unwrap();
    assert!(status.is_ok());
    assert_eq!(status.db_server, "OK");
}
