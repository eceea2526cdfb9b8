use quick_xml::Reader;
use quick_xml::events::Event;

use crate::core::{AfipError, WireValue};

/// Parse an XML document into a [`WireValue`] rooted at a synthetic map whose
/// only child is the document element. Namespace prefixes are dropped.
pub fn parse_xml(xml: &str) -> Result<WireValue, AfipError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // (element name, children, text)
    let mut stack: Vec<(String, Vec<(String, WireValue)>, String)> =
        vec![(String::new(), Vec::new(), String::new())];

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = std::str::from_utf8(e.local_name().as_ref())
                    .unwrap_or("")
                    .to_string();
                stack.push((name, Vec::new(), String::new()));
            }
            Ok(Event::Empty(ref e)) => {
                let name = std::str::from_utf8(e.local_name().as_ref())
                    .unwrap_or("")
                    .to_string();
                if let Some(top) = stack.last_mut() {
                    top.1.push((name, WireValue::Text(String::new())));
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| AfipError::Protocol(format!("XML parse error: {e}")))?;
                if let Some(top) = stack.last_mut() {
                    top.2.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    top.2.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(AfipError::Protocol("unbalanced XML end tag".into()));
                }
                if let Some((name, children, text)) = stack.pop() {
                    let value = if children.is_empty() {
                        WireValue::Text(text)
                    } else {
                        WireValue::Map(children)
                    };
                    if let Some(parent) = stack.last_mut() {
                        parent.1.push((name, value));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AfipError::Protocol(format!("XML parse error: {e}")));
            }
            _ => {}
        }
    }

    match stack.pop() {
        Some((_, children, _)) if stack.is_empty() && !children.is_empty() => {
            Ok(WireValue::Map(children))
        }
        _ => Err(AfipError::Protocol("truncated or empty XML document".into())),
    }
}

/// Parse a SOAP response and return the content of `Body`.
///
/// # Errors
///
/// `Protocol` when the document is not a SOAP envelope or carries a `Fault`.
pub fn parse_envelope(xml: &str) -> Result<WireValue, AfipError> {
    let doc = parse_xml(xml)?;
    let body = doc
        .path(&["Envelope", "Body"])
        .ok_or_else(|| AfipError::Protocol("response is not a SOAP envelope".into()))?;

    if let Some(fault) = body.get("Fault") {
        let code = fault.text_of("faultcode").unwrap_or("unknown");
        let message = fault.text_of("faultstring").unwrap_or("no fault string");
        return Err(AfipError::Protocol(format!("SOAP fault {code}: {message}")));
    }

    Ok(body.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefixes_and_nests() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <FECompUltimoAutorizadoResponse xmlns="http://ar.gov.afip.dif.FEV1/">
      <FECompUltimoAutorizadoResult>
        <PtoVta>2</PtoVta>
        <CbteTipo>6</CbteTipo>
        <CbteNro>41</CbteNro>
      </FECompUltimoAutorizadoResult>
    </FECompUltimoAutorizadoResponse>
  </soap:Body>
</soap:Envelope>"#;
        let body = parse_envelope(xml).unwrap();
        let nro = body
            .path(&[
                "FECompUltimoAutorizadoResponse",
                "FECompUltimoAutorizadoResult",
                "CbteNro",
            ])
            .and_then(WireValue::as_text);
        assert_eq!(nro, Some("41"));
    }

    #[test]
    fn empty_elements_are_empty_text() {
        let doc = parse_xml("<a><b/><c></c><d>x &amp; y</d></a>").unwrap();
        let a = doc.get("a").unwrap();
        assert_eq!(a.get("b"), Some(&WireValue::Text(String::new())));
        assert_eq!(a.get("c"), Some(&WireValue::Text(String::new())));
        assert_eq!(a.text_of("d"), Some("x & y"));
    }

    #[test]
    fn fault_is_protocol_error() {
        let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <soapenv:Fault>
      <faultcode>ns1:coe.alreadyAuthenticated</faultcode>
      <faultstring>El CEE ya posee un TA valido para el acceso al WSN solicitado</faultstring>
    </soapenv:Fault>
  </soapenv:Body>
</soapenv:Envelope>"#;
        let err = parse_envelope(xml).unwrap_err();
        assert!(err.to_string().contains("coe.alreadyAuthenticated"));
    }

    #[test]
    fn not_an_envelope() {
        assert!(matches!(
            parse_envelope("<html><body>502 Bad Gateway</body></html>"),
            Err(AfipError::Protocol(_))
        ));
    }

    #[test]
    fn truncated_document() {
        assert!(parse_xml("<a><b>1</b>").is_err());
        assert!(parse_xml("").is_err());
    }
}
