use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

use crate::core::{AfipError, LogLevel, LogOptions, WireValue};

/// SOAP 1.1 envelope namespace.
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

fn xml_io(e: std::io::Error) -> AfipError {
    AfipError::Protocol(format!("XML write error: {e}"))
}

/// Streams a [`WireValue`] tree as indented XML.
struct EnvelopeWriter(Writer<Cursor<Vec<u8>>>);

impl EnvelopeWriter {
    fn new() -> Result<Self, AfipError> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
        Ok(Self(writer))
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), AfipError> {
        let mut start = BytesStart::new(name);
        start.extend_attributes(attrs.iter().copied());
        self.0.write_event(Event::Start(start)).map_err(xml_io)
    }

    fn close(&mut self, name: &str) -> Result<(), AfipError> {
        self.0
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)
    }

    /// `value` as element `name`; maps recurse in insertion order.
    fn value(&mut self, name: &str, value: &WireValue) -> Result<(), AfipError> {
        self.open(name, &[])?;
        match value {
            WireValue::Text(text) => self
                .0
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_io)?,
            WireValue::Map(children) => {
                for (child, v) in children {
                    self.value(child, v)?;
                }
            }
        }
        self.close(name)
    }

    fn finish(self) -> Result<String, AfipError> {
        String::from_utf8(self.0.into_inner().into_inner())
            .map_err(|e| AfipError::Protocol(format!("XML UTF-8 error: {e}")))
    }
}

/// Wrap `body` in a SOAP 1.1 envelope as the children of `operation`, with
/// `namespace` as the default namespace of the operation element.
pub fn build_envelope(
    namespace: &str,
    operation: &str,
    body: &WireValue,
) -> Result<String, AfipError> {
    let mut w = EnvelopeWriter::new()?;
    w.open("soap:Envelope", &[("xmlns:soap", SOAP_ENV_NS)])?;
    w.open("soap:Body", &[])?;
    w.open(operation, &[("xmlns", namespace)])?;
    for (name, value) in body.children() {
        w.value(name, value)?;
    }
    w.close(operation)?;
    w.close("soap:Body")?;
    w.close("soap:Envelope")?;
    w.finish()
}

/// Re-indent an XML document. Returns the input unchanged if it does not parse.
pub fn pretty_print(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => {
                if writer.write_event(event).is_err() {
                    return xml.to_string();
                }
            }
            Err(_) => return xml.to_string(),
        }
    }

    String::from_utf8(writer.into_inner().into_inner()).unwrap_or_else(|_| xml.to_string())
}

/// Emit a SOAP envelope according to `opts`.
pub fn log_envelope(opts: &LogOptions, direction: &str, operation: &str, xml: &str) {
    if !opts.log {
        return;
    }
    let body = if opts.pretty_xml {
        pretty_print(xml)
    } else {
        xml.to_string()
    };
    match opts.level {
        LogLevel::Trace => tracing::trace!(operation, direction, "{body}"),
        LogLevel::Debug => tracing::debug!(operation, direction, "{body}"),
        LogLevel::Info => tracing::info!(operation, direction, "{body}"),
        LogLevel::Warn => tracing::warn!(operation, direction, "{body}"),
        LogLevel::Error => tracing::error!(operation, direction, "{body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wraps_operation() {
        let body = WireValue::map()
            .with("Auth", WireValue::map().with_text("Token", "t&k"))
            .with_text("PtoVta", "2");
        let xml = build_envelope("http://ar.gov.afip.dif.FEV1/", "FECompUltimoAutorizado", &body)
            .unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(
            "<FECompUltimoAutorizado xmlns=\"http://ar.gov.afip.dif.FEV1/\">"
        ));
        assert!(xml.contains("<Token>t&amp;k</Token>"));
        assert!(xml.contains("<PtoVta>2</PtoVta>"));
        assert!(xml.contains("</soap:Envelope>"));
    }

    #[test]
    fn pretty_print_indents() {
        let pretty = pretty_print("<a><b>1</b></a>");
        assert_eq!(pretty, "<a>\n  <b>1</b>\n</a>");
    }

    #[test]
    fn pretty_print_keeps_garbage() {
        assert_eq!(pretty_print("<a><b></a>"), "<a><b></a>");
    }
}
