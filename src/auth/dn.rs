//! Distinguished-name tokenization and order-independent matching.

use std::collections::BTreeSet;

/// Splits a DN on both `,` and `/` separators, trims whitespace, and drops
/// empty segments, so `CN=foo, O=bar` and `/O=bar/CN=foo` tokenize to the
/// same set.
pub fn tokenize(dn: &str) -> BTreeSet<String> {
    dn.split([',', '/'])
        .map(|segment| segment.trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// `true` iff `dn`'s token set equals any of `trusted`'s tokenizations.
pub fn matches_any(dn: &str, trusted: &[String]) -> bool {
    let dn_tokens = tokenize(dn);
    trusted.iter().any(|candidate| tokenize(candidate) == dn_tokens)
}
