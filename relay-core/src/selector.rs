//! The configuration object consulted by adaptive dispatch and activation.

use std::collections::BTreeMap;
use std::fmt;

/// A bag of configuration values: an optional protocol, flat string
/// parameters, and per-method parameter overrides.
///
/// Method-scoped lookups fall back to the flat parameters, so a method
/// override only needs to carry the keys it actually changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    protocol: Option<String>,
    params: BTreeMap<String, String>,
    method_params: BTreeMap<String, BTreeMap<String, String>>,
}

impl Selector {
    /// An empty selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty selector with the given protocol.
    pub fn with_protocol(protocol: impl Into<String>) -> Self {
        Self {
            protocol: Some(protocol.into()),
            ..Self::default()
        }
    }

    /// Adds a flat parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds a method-scoped parameter.
    pub fn with_method_param(
        mut self,
        method: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.method_params
            .entry(method.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// The protocol, if set.
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// A flat parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// A flat parameter, or `default` when absent.
    pub fn param_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.param(key).unwrap_or(default)
    }

    /// A method-scoped parameter, falling back to the flat parameters.
    pub fn method_param(&self, method: &str, key: &str) -> Option<&str> {
        self.method_params
            .get(method)
            .and_then(|scoped| scoped.get(key))
            .map(String::as_str)
            .or_else(|| self.param(key))
    }

    /// Iterates the flat parameters in key order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The merged view used by activation matching: flat parameters plus
    /// method-scoped ones flattened to `method.key`, in key order.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut merged: BTreeMap<String, String> = self.params.clone();
        for (method, scoped) in &self.method_params {
            for (key, value) in scoped {
                merged.insert(format!("{method}.{key}"), value.clone());
            }
        }
        merged.into_iter().collect()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.protocol.as_deref().unwrap_or("-"))?;
        let mut first = true;
        for (key, value) in self.entries() {
            if first {
                write!(f, "?")?;
                first = false;
            } else {
                write!(f, "&")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Argument types from which an adaptive adapter can extract a selector.
///
/// Contract methods that take the selector indirectly (wrapped in some
/// call-context argument) implement this on the carrier type; the adapter
/// treats `None` as a missing selector and reports it as a dispatch error.
pub trait SelectorCarrier {
    /// The carried selector, if present.
    fn selector(&self) -> Option<&Selector>;
}

impl SelectorCarrier for Selector {
    fn selector(&self) -> Option<&Selector> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_param_falls_back_to_flat() {
        let sel = Selector::new()
            .with_param("timeout", "100")
            .with_method_param("send", "timeout", "250");

        assert_eq!(sel.method_param("send", "timeout"), Some("250"));
        assert_eq!(sel.method_param("recv", "timeout"), Some("100"));
        assert_eq!(sel.method_param("recv", "retries"), None);
    }

    #[test]
    fn entries_flatten_method_params() {
        let sel = Selector::with_protocol("tcp")
            .with_param("cache", "lru")
            .with_method_param("list", "cache", "none");

        let entries = sel.entries();
        assert!(entries.contains(&("cache".into(), "lru".into())));
        assert!(entries.contains(&("list.cache".into(), "none".into())));
    }

    #[test]
    fn display_renders_protocol_and_params() {
        let sel = Selector::with_protocol("udp").with_param("retries", "2");
        assert_eq!(sel.to_string(), "udp://?retries=2");
        assert_eq!(Selector::new().to_string(), "-://");
    }
}
