//! `FECAESolicitar` request assembly.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::bill::Bill;
use super::profile::TaxProfile;
use super::tables::BillType;
use super::wire::{WireValue, format_decimal};

/// Date layout used by every WSFE date field.
pub const WIRE_DATE_FORMAT: &str = "%Y%m%d";

pub fn format_date(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

/// `FeCabReq`: batch header. One invoice per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestHeader {
    pub cant_reg: u32,
    pub pto_vta: String,
    pub cbte_tipo: BillType,
}

/// `AlicIva`: the single IVA line embedded in the detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IvaLine {
    pub id: String,
    pub base_imp: Decimal,
    pub importe: Decimal,
}

/// `FECAEDetRequest`: one invoice. Field order follows the WSFE schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestDetail {
    pub concepto: String,
    pub doc_tipo: String,
    pub doc_nro: Option<String>,
    pub cbte_desde: u64,
    pub cbte_hasta: u64,
    pub cbte_fch: NaiveDate,
    pub imp_total: Decimal,
    pub imp_tot_conc: Decimal,
    pub imp_neto: Decimal,
    pub imp_op_ex: Decimal,
    pub imp_trib: Decimal,
    pub imp_iva: Decimal,
    pub fch_serv_desde: NaiveDate,
    pub fch_serv_hasta: NaiveDate,
    pub fch_vto_pago: NaiveDate,
    pub mon_id: String,
    pub mon_cotiz: Decimal,
    pub iva: IvaLine,
}

/// Wire-ready authorization request. Immutable once sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceRequest {
    pub header: RequestHeader,
    pub detail: RequestDetail,
}

/// Assemble the request for `bill` under `sequence_number`.
///
/// Service period and due date default to `today`, which is also the voucher
/// date. IVA sum and total come from the bill's compute-once cache.
pub fn build_request(
    profile: &TaxProfile,
    bill: &Bill,
    sequence_number: u64,
    today: NaiveDate,
) -> InvoiceRequest {
    let (iva_code, _) = bill.applicable_iva();
    let net = bill.net();
    let iva_sum = bill.iva_sum();

    InvoiceRequest {
        header: RequestHeader {
            cant_reg: 1,
            pto_vta: profile.sale_point().to_string(),
            cbte_tipo: bill.bill_type(),
        },
        detail: RequestDetail {
            concepto: bill.concept().code().to_string(),
            doc_tipo: bill.document_type().code().to_string(),
            doc_nro: bill.document_number().map(str::to_string),
            cbte_desde: sequence_number,
            cbte_hasta: sequence_number,
            cbte_fch: today,
            imp_total: bill.total(),
            imp_tot_conc: Decimal::ZERO,
            imp_neto: net,
            imp_op_ex: Decimal::ZERO,
            imp_trib: Decimal::ZERO,
            imp_iva: iva_sum,
            fch_serv_desde: bill.date_from().unwrap_or(today),
            fch_serv_hasta: bill.date_to().unwrap_or(today),
            fch_vto_pago: bill.due_date().unwrap_or(today),
            mon_id: bill.currency().code().to_string(),
            mon_cotiz: Decimal::ONE,
            iva: IvaLine {
                id: iva_code.to_string(),
                base_imp: net,
                importe: iva_sum,
            },
        },
    }
}

impl InvoiceRequest {
    /// `FeCAEReq` element.
    pub fn fe_cae_req(&self) -> WireValue {
        let h = &self.header;
        let header = WireValue::map()
            .with_text("CantReg", h.cant_reg.to_string())
            .with_text("PtoVta", h.pto_vta.clone())
            .with_text("CbteTipo", h.cbte_tipo.code());

        WireValue::map().with("FeCabReq", header).with(
            "FeDetReq",
            WireValue::map().with("FECAEDetRequest", self.detail.to_wire()),
        )
    }

    /// Full `FECAESolicitar` body: the auth header followed by `FeCAEReq`.
    pub fn to_wire(&self, auth: WireValue) -> WireValue {
        WireValue::map()
            .with("Auth", auth)
            .with("FeCAEReq", self.fe_cae_req())
    }
}

impl RequestDetail {
    fn to_wire(&self) -> WireValue {
        let iva = WireValue::map().with(
            "AlicIva",
            WireValue::map()
                .with_text("Id", self.iva.id.clone())
                .with_text("BaseImp", format_decimal(self.iva.base_imp))
                .with_text("Importe", format_decimal(self.iva.importe)),
        );

        WireValue::map()
            .with_text("Concepto", self.concepto.clone())
            .with_text("DocTipo", self.doc_tipo.clone())
            .with_opt("DocNro", self.doc_nro.clone())
            .with_text("CbteDesde", self.cbte_desde.to_string())
            .with_text("CbteHasta", self.cbte_hasta.to_string())
            .with_text("CbteFch", format_date(self.cbte_fch))
            .with_text("ImpTotal", format_decimal(self.imp_total))
            .with_text("ImpTotConc", format_decimal(self.imp_tot_conc))
            .with_text("ImpNeto", format_decimal(self.imp_neto))
            .with_text("ImpOpEx", format_decimal(self.imp_op_ex))
            .with_text("ImpTrib", format_decimal(self.imp_trib))
            .with_text("ImpIVA", format_decimal(self.imp_iva))
            .with_text("FchServDesde", format_date(self.fch_serv_desde))
            .with_text("FchServHasta", format_date(self.fch_serv_hasta))
            .with_text("FchVtoPago", format_date(self.fch_vto_pago))
            .with_text("MonId", self.mon_id.clone())
            .with_text("MonCotiz", format_decimal(self.mon_cotiz))
            .with("Iva", iva)
    }
}
