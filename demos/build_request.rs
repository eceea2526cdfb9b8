use chrono::NaiveDate;
use factura::core::*;
use rust_decimal_macros::dec;

fn main() -> Result<(), AfipError> {
    // Responsable inscripto selling to a final consumer: Factura B at 21%
    let profile = TaxProfile::new("20-28774002-7", "0002", IvaCondition::ResponsableInscripto)?;
    let bill = Bill::new(
        &profile,
        InvoiceAttributes::new(dec!(100), IvaCondition::ConsumidorFinal, InvoiceType::Invoice)
            .document_type(DocumentType::Dni)
            .document_number("30123456")
            .concept(Concept::Servicios)
            .service_period(
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap_or_default(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap_or_default(),
            ),
    )?;

    println!("{} ({})", bill.bill_type().description(), bill.bill_type().code());
    println!("Net:   {}", bill.net());
    println!("IVA:   {}", bill.iva_sum());
    println!("Total: {}", bill.total());

    let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default();
    let request = build_request(&profile, &bill, 1, today);
    let ticket_less = WireValue::map()
        .with_text("Token", "...")
        .with_text("Sign", "...")
        .with_text("Cuit", profile.cuit());

    println!("{:#?}", request.to_wire(ticket_less));
    Ok(())
}
