use std::cell::OnceCell;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::AfipError;
use super::profile::TaxProfile;
use super::response::{AuthorizationResponse, RemoteMessage};
use super::tables::{self, AlicIva, BillType, Concept, Currency, DocumentType, InvoiceType, IvaCondition};
use super::tax;

/// Caller-supplied attributes of one invoice.
///
/// Document type, currency and concept fall back to the [`TaxProfile`]
/// defaults; service period and due date fall back to the request date.
///
/// ```
/// use factura::core::*;
/// use rust_decimal_macros::dec;
///
/// let attrs = InvoiceAttributes::new(dec!(100), IvaCondition::ConsumidorFinal, InvoiceType::Invoice)
///     .document_type(DocumentType::Dni)
///     .document_number("30111222");
/// assert_eq!(attrs.document_number.as_deref(), Some("30111222"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceAttributes {
    pub net: Decimal,
    pub iva_condition: IvaCondition,
    pub invoice_type: InvoiceType,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub document_type: Option<DocumentType>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub concept: Option<Concept>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl InvoiceAttributes {
    pub fn new(net: Decimal, iva_condition: IvaCondition, invoice_type: InvoiceType) -> Self {
        Self {
            net,
            iva_condition,
            invoice_type,
            document_number: None,
            document_type: None,
            currency: None,
            concept: None,
            date_from: None,
            date_to: None,
            due_date: None,
        }
    }

    pub fn document_number(mut self, number: impl Into<String>) -> Self {
        self.document_number = Some(number.into());
        self
    }

    pub fn document_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = Some(document_type);
        self
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn concept(mut self, concept: Concept) -> Self {
        self.concept = Some(concept);
        self
    }

    pub fn service_period(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }
}

/// A validated invoice, ready to be authorized.
///
/// Bill type and IVA rate are resolved when the bill is created, so invalid
/// combinations fail here instead of after a network round trip. After
/// [`authorize`](crate::wsfe::AuthorizationClient::authorize) the normalized
/// response stays attached to the bill.
#[derive(Debug, Clone)]
pub struct Bill {
    net: Decimal,
    iva_condition: IvaCondition,
    invoice_type: InvoiceType,
    document_number: Option<String>,
    document_type: DocumentType,
    currency: Currency,
    concept: Concept,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    bill_type: BillType,
    alic_iva: AlicIva,
    iva_sum: OnceCell<Decimal>,
    response: Option<AuthorizationResponse>,
    remote_messages: Vec<RemoteMessage>,
}

impl Bill {
    /// Validate `attrs` against the seller's profile.
    ///
    /// # Errors
    ///
    /// `InvalidAttribute` for a negative net amount or a seller/buyer/type
    /// combination missing from the AFIP tables.
    pub fn new(profile: &TaxProfile, attrs: InvoiceAttributes) -> Result<Self, AfipError> {
        if attrs.net.is_sign_negative() {
            return Err(AfipError::invalid("net", attrs.net));
        }
        let own = profile.own_iva_condition();
        let bill_type = tables::bill_type(own, attrs.iva_condition, attrs.invoice_type)?;
        let alic_iva = tables::alic_iva(own, attrs.iva_condition)?;

        Ok(Self {
            net: attrs.net,
            iva_condition: attrs.iva_condition,
            invoice_type: attrs.invoice_type,
            document_number: attrs.document_number.filter(|n| !n.is_empty()),
            document_type: attrs
                .document_type
                .unwrap_or_else(|| profile.default_document_type()),
            currency: attrs.currency.unwrap_or_else(|| profile.default_currency()),
            concept: attrs.concept.unwrap_or_else(|| profile.default_concept()),
            date_from: attrs.date_from,
            date_to: attrs.date_to,
            due_date: attrs.due_date,
            bill_type,
            alic_iva,
            iva_sum: OnceCell::new(),
            response: None,
            remote_messages: Vec::new(),
        })
    }

    pub fn net(&self) -> Decimal {
        self.net
    }

    /// Replace the net amount.
    ///
    /// An IVA sum already computed for this bill is kept: [`iva_sum`](Self::iva_sum)
    /// is compute-once, so it will not follow the new net.
    pub fn set_net(&mut self, net: Decimal) {
        self.net = net;
    }

    pub fn iva_condition(&self) -> IvaCondition {
        self.iva_condition
    }

    pub fn invoice_type(&self) -> InvoiceType {
        self.invoice_type
    }

    pub fn document_number(&self) -> Option<&str> {
        self.document_number.as_deref()
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn concept(&self) -> Concept {
        self.concept
    }

    pub fn date_from(&self) -> Option<NaiveDate> {
        self.date_from
    }

    pub fn date_to(&self) -> Option<NaiveDate> {
        self.date_to
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn bill_type(&self) -> BillType {
        self.bill_type
    }

    pub fn alic_iva(&self) -> AlicIva {
        self.alic_iva
    }

    /// IVA `(code, multiplier)` for this bill.
    pub fn applicable_iva(&self) -> (&'static str, Decimal) {
        (self.alic_iva.code(), self.alic_iva.multiplier())
    }

    /// IVA amount. Computed on first call and cached for the life of the bill.
    pub fn iva_sum(&self) -> Decimal {
        *self
            .iva_sum
            .get_or_init(|| tax::calculate_iva_sum(self.net, self.alic_iva.multiplier()))
    }

    /// Current net plus the (cached) IVA sum.
    pub fn total(&self) -> Decimal {
        tax::calculate_total(self.net, self.iva_sum())
    }

    /// Normalized response of the last authorization attempt.
    pub fn response(&self) -> Option<&AuthorizationResponse> {
        self.response.as_ref()
    }

    /// Observations and errors AFIP attached to the last response.
    pub fn remote_messages(&self) -> &[RemoteMessage] {
        &self.remote_messages
    }

    /// True only when AFIP accepted both the batch header and the detail.
    pub fn is_authorized(&self) -> bool {
        self.response
            .as_ref()
            .is_some_and(AuthorizationResponse::is_authorized)
    }

    pub(crate) fn set_response(
        &mut self,
        response: AuthorizationResponse,
        messages: Vec<RemoteMessage>,
    ) {
        self.response = Some(response);
        self.remote_messages = messages;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn profile() -> TaxProfile {
        TaxProfile::new("20287740027", "0002", IvaCondition::ResponsableInscripto).unwrap()
    }

    #[test]
    fn defaults_come_from_profile() {
        let profile = profile().with_default_currency(Currency::Dolar);
        let attrs =
            InvoiceAttributes::new(dec!(10), IvaCondition::ConsumidorFinal, InvoiceType::Invoice);
        let bill = Bill::new(&profile, attrs).unwrap();
        assert_eq!(bill.currency(), Currency::Dolar);
        assert_eq!(bill.document_type(), DocumentType::Cuit);
        assert_eq!(bill.concept(), Concept::ProductosYServicios);
        assert_eq!(bill.bill_type(), BillType::FacturaB);
    }

    #[test]
    fn iva_sum_is_compute_once() {
        let attrs = InvoiceAttributes::new(
            dec!(100),
            IvaCondition::ResponsableInscripto,
            InvoiceType::Invoice,
        );
        let mut bill = Bill::new(&profile(), attrs).unwrap();
        assert_eq!(bill.iva_sum(), dec!(21.00));
        bill.set_net(dec!(200));
        assert_eq!(bill.iva_sum(), dec!(21.00));
        assert_eq!(bill.total(), dec!(221.00));
    }

    #[test]
    fn negative_net_rejected() {
        let attrs =
            InvoiceAttributes::new(dec!(-1), IvaCondition::ConsumidorFinal, InvoiceType::Invoice);
        assert!(matches!(
            Bill::new(&profile(), attrs),
            Err(AfipError::InvalidAttribute(_))
        ));
    }

    #[test]
    fn empty_document_number_dropped() {
        let attrs =
            InvoiceAttributes::new(dec!(1), IvaCondition::ConsumidorFinal, InvoiceType::Invoice)
                .document_number("");
        let bill = Bill::new(&profile(), attrs).unwrap();
        assert!(bill.document_number().is_none());
    }

    #[test]
    fn not_authorized_without_response() {
        let attrs =
            InvoiceAttributes::new(dec!(1), IvaCondition::ConsumidorFinal, InvoiceType::Invoice);
        let bill = Bill::new(&profile(), attrs).unwrap();
        assert!(!bill.is_authorized());
        assert!(bill.response().is_none());
    }
}
