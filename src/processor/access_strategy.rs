//! Access-strategy attachment.
//!
//! A static table mapping the server's configured auth methods to the
//! access strategy a client is told to use for each resource. Kept as a
//! single function rather than a pluggable trait: spec.md names an exact
//! table, not an open-ended strategy, so a trait here would just be
//! indirection with one implementation.

use serde_json::{json, Value};

use crate::config::AuthMethod;

pub fn access_strategies_for(methods: &[AuthMethod]) -> Vec<Value> {
    if methods.contains(&AuthMethod::Open) {
        vec![json!({"type": "open"})]
    } else if methods.contains(&AuthMethod::Basic) || methods.contains(&AuthMethod::Mtls) {
        vec![json!({"type": "sap:cmp-mtls:v1"})]
    } else {
        vec![json!({"type": "open"})]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_method_yields_open_strategy() {
        let strategies = access_strategies_for(&[AuthMethod::Open]);
        assert_eq!(strategies, vec![json!({"type": "open"})]);
    }

    #[test]
    fn basic_method_yields_mtls_style_strategy() {
        let strategies = access_strategies_for(&[AuthMethod::Basic]);
        assert_eq!(strategies, vec![json!({"type": "sap:cmp-mtls:v1"})]);
    }

    #[test]
    fn open_takes_priority_when_combined_with_basic() {
        let strategies = access_strategies_for(&[AuthMethod::Basic, AuthMethod::Open]);
        assert_eq!(strategies, vec![json!({"type": "open"})]);
    }

    #[test]
    fn mtls_alone_yields_mtls_style_strategy() {
        let strategies = access_strategies_for(&[AuthMethod::Mtls]);
        assert_eq!(strategies, vec![json!({"type": "sap:cmp-mtls:v1"})]);
    }
}
