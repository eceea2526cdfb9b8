//! AFIP code tables.
//!
//! Legal categories are closed enums; every enum knows its AFIP wire code.
//! Parsing from symbolic names happens at the type boundary and fails with
//! [`AfipError::InvalidAttribute`], so an invalid invoice never reaches the
//! network.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::AfipError;

/// IVA (VAT) registration category of a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum IvaCondition {
    ResponsableInscripto,
    ResponsableMonotributo,
    ConsumidorFinal,
    Exento,
}

impl IvaCondition {
    pub const ALL: [IvaCondition; 4] = [
        Self::ResponsableInscripto,
        Self::ResponsableMonotributo,
        Self::ConsumidorFinal,
        Self::Exento,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ResponsableInscripto => "responsable_inscripto",
            Self::ResponsableMonotributo => "responsable_monotributo",
            Self::ConsumidorFinal => "consumidor_final",
            Self::Exento => "exento",
        }
    }

    /// Whether a seller registered under this condition can issue invoices
    /// through WSFE.
    pub fn can_issue(&self) -> bool {
        matches!(
            self,
            Self::ResponsableInscripto | Self::ResponsableMonotributo
        )
    }
}

impl FromStr for IvaCondition {
    type Err = AfipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| AfipError::invalid("iva_condition", s))
    }
}

impl TryFrom<String> for IvaCondition {
    type Error = AfipError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for IvaCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of voucher, independent of its letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum InvoiceType {
    Invoice,
    Debit,
    Credit,
    Receipt,
}

impl InvoiceType {
    pub const ALL: [InvoiceType; 4] = [Self::Invoice, Self::Debit, Self::Credit, Self::Receipt];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Receipt => "receipt",
        }
    }
}

impl FromStr for InvoiceType {
    type Err = AfipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| AfipError::invalid("invoice_type", s))
    }
}

impl TryFrom<String> for InvoiceType {
    type Error = AfipError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for InvoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Voucher letter, decided by the seller/buyer IVA conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillLetter {
    A,
    B,
    C,
}

/// AFIP voucher type (`CbteTipo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillType {
    FacturaA,
    NotaDebitoA,
    NotaCreditoA,
    ReciboA,
    FacturaB,
    NotaDebitoB,
    NotaCreditoB,
    ReciboB,
    FacturaC,
    NotaDebitoC,
    NotaCreditoC,
    ReciboC,
}

impl BillType {
    pub fn new(letter: BillLetter, invoice_type: InvoiceType) -> Self {
        use BillLetter::*;
        use InvoiceType::*;
        match (letter, invoice_type) {
            (A, Invoice) => Self::FacturaA,
            (A, Debit) => Self::NotaDebitoA,
            (A, Credit) => Self::NotaCreditoA,
            (A, Receipt) => Self::ReciboA,
            (B, Invoice) => Self::FacturaB,
            (B, Debit) => Self::NotaDebitoB,
            (B, Credit) => Self::NotaCreditoB,
            (B, Receipt) => Self::ReciboB,
            (C, Invoice) => Self::FacturaC,
            (C, Debit) => Self::NotaDebitoC,
            (C, Credit) => Self::NotaCreditoC,
            (C, Receipt) => Self::ReciboC,
        }
    }

    /// `CbteTipo` wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FacturaA => "01",
            Self::NotaDebitoA => "02",
            Self::NotaCreditoA => "03",
            Self::ReciboA => "04",
            Self::FacturaB => "06",
            Self::NotaDebitoB => "07",
            Self::NotaCreditoB => "08",
            Self::ReciboB => "09",
            Self::FacturaC => "11",
            Self::NotaDebitoC => "12",
            Self::NotaCreditoC => "13",
            Self::ReciboC => "15",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let all = [BillLetter::A, BillLetter::B, BillLetter::C];
        all.into_iter()
            .flat_map(|l| InvoiceType::ALL.map(|t| Self::new(l, t)))
            .find(|b| b.code() == code)
    }

    pub fn letter(&self) -> BillLetter {
        match self {
            Self::FacturaA | Self::NotaDebitoA | Self::NotaCreditoA | Self::ReciboA => {
                BillLetter::A
            }
            Self::FacturaB | Self::NotaDebitoB | Self::NotaCreditoB | Self::ReciboB => {
                BillLetter::B
            }
            _ => BillLetter::C,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FacturaA => "Factura A",
            Self::NotaDebitoA => "Nota de Débito A",
            Self::NotaCreditoA => "Nota de Crédito A",
            Self::ReciboA => "Recibo A",
            Self::FacturaB => "Factura B",
            Self::NotaDebitoB => "Nota de Débito B",
            Self::NotaCreditoB => "Nota de Crédito B",
            Self::ReciboB => "Recibo B",
            Self::FacturaC => "Factura C",
            Self::NotaDebitoC => "Nota de Débito C",
            Self::NotaCreditoC => "Nota de Crédito C",
            Self::ReciboC => "Recibo C",
        }
    }
}

/// IVA rate (`AlicIva`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlicIva {
    Zero,
    TenFive,
    TwentyOne,
    TwentySeven,
}

impl AlicIva {
    /// `AlicIva.Id` wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Zero => "03",
            Self::TenFive => "04",
            Self::TwentyOne => "05",
            Self::TwentySeven => "06",
        }
    }

    /// Fraction of the net amount charged as IVA.
    pub fn multiplier(&self) -> Decimal {
        match self {
            Self::Zero => Decimal::ZERO,
            Self::TenFive => dec!(0.105),
            Self::TwentyOne => dec!(0.21),
            Self::TwentySeven => dec!(0.27),
        }
    }
}

/// Invoice currency (`MonId`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Currency {
    Peso,
    Dolar,
    Real,
    Euro,
    Oro,
}

impl Currency {
    pub const ALL: [Currency; 5] = [Self::Peso, Self::Dolar, Self::Real, Self::Euro, Self::Oro];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Peso => "PES",
            Self::Dolar => "DOL",
            Self::Real => "012",
            Self::Euro => "060",
            Self::Oro => "049",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Peso => "peso",
            Self::Dolar => "dolar",
            Self::Real => "real",
            Self::Euro => "euro",
            Self::Oro => "oro",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Peso => "Pesos Argentinos",
            Self::Dolar => "Dolar Estadounidense",
            Self::Real => "Real",
            Self::Euro => "Euro",
            Self::Oro => "Gramos de Oro Fino",
        }
    }
}

impl FromStr for Currency {
    type Err = AfipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s || c.code() == s)
            .ok_or_else(|| AfipError::invalid("currency", s))
    }
}

impl TryFrom<String> for Currency {
    type Error = AfipError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Buyer identification document (`DocTipo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum DocumentType {
    Cuit,
    Cuil,
    Cdi,
    Le,
    Lc,
    CiExtranjera,
    EnTramite,
    ActaNacimiento,
    Pasaporte,
    CiBsAsRnp,
    Dni,
    Otro,
}

impl DocumentType {
    pub const ALL: [DocumentType; 12] = [
        Self::Cuit,
        Self::Cuil,
        Self::Cdi,
        Self::Le,
        Self::Lc,
        Self::CiExtranjera,
        Self::EnTramite,
        Self::ActaNacimiento,
        Self::Pasaporte,
        Self::CiBsAsRnp,
        Self::Dni,
        Self::Otro,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Cuit => "80",
            Self::Cuil => "86",
            Self::Cdi => "87",
            Self::Le => "89",
            Self::Lc => "90",
            Self::CiExtranjera => "91",
            Self::EnTramite => "92",
            Self::ActaNacimiento => "93",
            Self::Pasaporte => "94",
            Self::CiBsAsRnp => "95",
            Self::Dni => "96",
            Self::Otro => "99",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cuit => "cuit",
            Self::Cuil => "cuil",
            Self::Cdi => "cdi",
            Self::Le => "le",
            Self::Lc => "lc",
            Self::CiExtranjera => "ci_extranjera",
            Self::EnTramite => "en_tramite",
            Self::ActaNacimiento => "acta_nacimiento",
            Self::Pasaporte => "pasaporte",
            Self::CiBsAsRnp => "ci_bs_as_rnp",
            Self::Dni => "dni",
            Self::Otro => "otro",
        }
    }

    /// Label used by AFIP's parameter tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cuit => "CUIT",
            Self::Cuil => "CUIL",
            Self::Cdi => "CDI",
            Self::Le => "LE",
            Self::Lc => "LC",
            Self::CiExtranjera => "CI Extranjera",
            Self::EnTramite => "en tramite",
            Self::ActaNacimiento => "Acta Nacimiento",
            Self::Pasaporte => "Pasaporte",
            Self::CiBsAsRnp => "CI Bs. As. RNP",
            Self::Dni => "DNI",
            Self::Otro => "Doc. (Otro)",
        }
    }
}

impl FromStr for DocumentType {
    type Err = AfipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name() == s || d.label() == s)
            .ok_or_else(|| AfipError::invalid("document_type", s))
    }
}

impl TryFrom<String> for DocumentType {
    type Error = AfipError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What the invoice bills for (`Concepto`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Concept {
    Productos,
    Servicios,
    ProductosYServicios,
}

impl Concept {
    pub const ALL: [Concept; 3] = [Self::Productos, Self::Servicios, Self::ProductosYServicios];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Productos => "01",
            Self::Servicios => "02",
            Self::ProductosYServicios => "03",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Productos => "productos",
            Self::Servicios => "servicios",
            Self::ProductosYServicios => "productos_y_servicios",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Productos => "Productos",
            Self::Servicios => "Servicios",
            Self::ProductosYServicios => "Productos y Servicios",
        }
    }
}

impl FromStr for Concept {
    type Err = AfipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s || c.label() == s)
            .ok_or_else(|| AfipError::invalid("concept", s))
    }
}

impl TryFrom<String> for Concept {
    type Error = AfipError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Voucher letter for a seller/buyer pair.
pub fn bill_letter(own: IvaCondition, buyer: IvaCondition) -> Result<BillLetter, AfipError> {
    use IvaCondition::*;
    match (own, buyer) {
        (ResponsableInscripto, ResponsableInscripto) => Ok(BillLetter::A),
        (ResponsableInscripto, _) => Ok(BillLetter::B),
        (ResponsableMonotributo, _) => Ok(BillLetter::C),
        (own, _) => Err(AfipError::InvalidAttribute(format!(
            "own_iva_condition: `{own}` cannot issue invoices"
        ))),
    }
}

/// `CbteTipo` for the (own condition, buyer condition, invoice type) triple.
pub fn bill_type(
    own: IvaCondition,
    buyer: IvaCondition,
    invoice_type: InvoiceType,
) -> Result<BillType, AfipError> {
    Ok(BillType::new(bill_letter(own, buyer)?, invoice_type))
}

/// IVA rate that applies when `own` bills `buyer`.
///
/// Monotributo sellers do not discriminate IVA, so every C voucher carries the
/// zero rate.
pub fn alic_iva(own: IvaCondition, buyer: IvaCondition) -> Result<AlicIva, AfipError> {
    use IvaCondition::*;
    match (own, buyer) {
        (ResponsableInscripto, Exento) => Ok(AlicIva::Zero),
        (ResponsableInscripto, _) => Ok(AlicIva::TwentyOne),
        (ResponsableMonotributo, _) => Ok(AlicIva::Zero),
        (own, _) => Err(AfipError::InvalidAttribute(format!(
            "own_iva_condition: `{own}` has no applicable IVA table"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inscripto_to_inscripto_is_a() {
        let bt = bill_type(
            IvaCondition::ResponsableInscripto,
            IvaCondition::ResponsableInscripto,
            InvoiceType::Invoice,
        )
        .unwrap();
        assert_eq!(bt, BillType::FacturaA);
        assert_eq!(bt.code(), "01");
    }

    #[test]
    fn inscripto_to_final_consumer_is_b() {
        let bt = bill_type(
            IvaCondition::ResponsableInscripto,
            IvaCondition::ConsumidorFinal,
            InvoiceType::Credit,
        )
        .unwrap();
        assert_eq!(bt.code(), "08");
        assert_eq!(bt.letter(), BillLetter::B);
    }

    #[test]
    fn monotributo_always_c() {
        for buyer in IvaCondition::ALL {
            let bt = bill_type(IvaCondition::ResponsableMonotributo, buyer, InvoiceType::Receipt)
                .unwrap();
            assert_eq!(bt, BillType::ReciboC);
            assert_eq!(bt.code(), "15");
        }
    }

    #[test]
    fn non_issuing_own_condition_rejected() {
        for own in [IvaCondition::ConsumidorFinal, IvaCondition::Exento] {
            for buyer in IvaCondition::ALL {
                let err = bill_type(own, buyer, InvoiceType::Invoice).unwrap_err();
                assert!(matches!(err, AfipError::InvalidAttribute(_)));
                assert!(alic_iva(own, buyer).is_err());
            }
        }
    }

    #[test]
    fn bill_type_codes_round_trip() {
        for code in ["01", "02", "03", "04", "06", "07", "08", "09", "11", "12", "13", "15"] {
            assert_eq!(BillType::from_code(code).unwrap().code(), code);
        }
        assert!(BillType::from_code("05").is_none());
    }

    #[test]
    fn exento_buyer_gets_zero_rate() {
        let alic = alic_iva(IvaCondition::ResponsableInscripto, IvaCondition::Exento).unwrap();
        assert_eq!(alic.code(), "03");
        assert_eq!(alic.multiplier(), Decimal::ZERO);
    }

    #[test]
    fn parse_symbolic_names_and_labels() {
        assert_eq!("consumidor_final".parse::<IvaCondition>().unwrap(), IvaCondition::ConsumidorFinal);
        assert_eq!("CUIT".parse::<DocumentType>().unwrap(), DocumentType::Cuit);
        assert_eq!("dni".parse::<DocumentType>().unwrap().code(), "96");
        assert_eq!(
            "Productos y Servicios".parse::<Concept>().unwrap(),
            Concept::ProductosYServicios
        );
        assert_eq!("peso".parse::<Currency>().unwrap().code(), "PES");
        assert_eq!("DOL".parse::<Currency>().unwrap(), Currency::Dolar);
    }

    #[test]
    fn parse_unknown_names_rejected() {
        assert!(matches!(
            "monotributista".parse::<IvaCondition>(),
            Err(AfipError::InvalidAttribute(_))
        ));
        assert!("factura".parse::<InvoiceType>().is_err());
        assert!("yen".parse::<Currency>().is_err());
        assert!("passport".parse::<DocumentType>().is_err());
        assert!("".parse::<Concept>().is_err());
    }
}
