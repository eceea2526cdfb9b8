//! Ordered element tree exchanged with the SOAP channel.
//!
//! Request bodies are encoded into a [`WireValue`] and responses come back as
//! one, with namespace prefixes already stripped. Element order is preserved
//! because the WSFE schema uses `xs:sequence`.

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Leaf element content (possibly empty).
    Text(String),
    /// Child elements in document order. Names may repeat.
    Map(Vec<(String, WireValue)>),
}

impl WireValue {
    pub fn map() -> Self {
        Self::Map(Vec::new())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Append a child. No-op on a text node.
    pub fn with(mut self, name: impl Into<String>, value: WireValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, Self::text(value))
    }

    /// Append a child only when `value` is present.
    pub fn with_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.with_text(name, v),
            None => self,
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: WireValue) {
        if let Self::Map(children) = self {
            children.push((name.into(), value));
        }
    }

    /// First child named `name`.
    pub fn get(&self, name: &str) -> Option<&WireValue> {
        match self {
            Self::Map(children) => children.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            Self::Text(_) => None,
        }
    }

    /// All children named `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a WireValue> + 'a {
        let children: &[(String, WireValue)] = match self {
            Self::Map(children) => children.as_slice(),
            Self::Text(_) => &[],
        };
        children.iter().filter(move |(k, _)| k == name).map(|(_, v)| v)
    }

    /// Follow a chain of first-children.
    pub fn path(&self, names: &[&str]) -> Option<&WireValue> {
        names.iter().try_fold(self, |node, name| node.get(name))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t.as_str()),
            Self::Map(_) => None,
        }
    }

    /// Text of the child `name`, if it is a non-empty leaf.
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(WireValue::as_text)
            .filter(|t| !t.is_empty())
    }

    pub fn children(&self) -> &[(String, WireValue)] {
        match self {
            Self::Map(children) => children.as_slice(),
            Self::Text(_) => &[],
        }
    }
}

/// Format a Decimal for the wire with at least 2 decimal places.
/// Trailing zeros beyond that are stripped.
pub fn format_decimal(d: Decimal) -> String {
    let s = d.normalize().to_string();
    if let Some(dot_pos) = s.find('.') {
        let decimals = s.len() - dot_pos - 1;
        if decimals < 2 {
            format!("{s}{}", "0".repeat(2 - decimals))
        } else {
            s
        }
    } else {
        format!("{s}.00")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format_decimal_cases() {
        assert_eq!(format_decimal(dec!(100)), "100.00");
        assert_eq!(format_decimal(dec!(121.0)), "121.00");
        assert_eq!(format_decimal(dec!(10.5)), "10.50");
        assert_eq!(format_decimal(dec!(1833.48)), "1833.48");
        assert_eq!(format_decimal(dec!(0)), "0.00");
        assert_eq!(format_decimal(dec!(0.105)), "0.105");
    }

    #[test]
    fn path_and_optional_children() {
        let tree = WireValue::map().with(
            "Outer",
            WireValue::map()
                .with_text("A", "1")
                .with_opt("B", None::<String>)
                .with_opt("C", Some("3")),
        );
        assert_eq!(tree.path(&["Outer", "A"]).and_then(WireValue::as_text), Some("1"));
        assert!(tree.path(&["Outer", "B"]).is_none());
        assert_eq!(tree.get("Outer").unwrap().text_of("C"), Some("3"));
        assert!(tree.path(&["Outer", "A", "deeper"]).is_none());
    }

    #[test]
    fn repeated_children() {
        let tree = WireValue::map()
            .with_text("Obs", "first")
            .with_text("Obs", "second");
        let all: Vec<_> = tree.get_all("Obs").filter_map(WireValue::as_text).collect();
        assert_eq!(all, vec!["first", "second"]);
        assert_eq!(tree.text_of("Obs"), Some("first"));
    }
}
