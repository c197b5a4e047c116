//! Request Key Module
//!
//! Canonical cache keys derived from an endpoint and its query parameters.

use std::collections::BTreeMap;
use std::fmt;

// == Request Key ==
/// Deterministic identifier for one logical upstream request.
///
/// Two requests with the same endpoint and the same parameter values produce
/// the same key regardless of parameter insertion order; the parameter map is
/// a `BTreeMap`, so ordering is inherent rather than enforced at call sites.
/// Callers strip empty values before building the map (`to_query` on the
/// param structs), so absent and empty parameters never differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    /// Builds the key as `endpoint?k1=v1&k2=v2` with keys in sorted order.
    pub fn new(endpoint: &str, params: &BTreeMap<String, String>) -> Self {
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        Self(format!("{}?{}", endpoint, query))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
