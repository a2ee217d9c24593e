//! Document validation seam.
//!
//! The ORD JSON schema itself is an external collaborator: this crate
//! specifies the interface a validator must satisfy, not the schema. The
//! default implementation only checks the one invariant the repository
//! itself depends on (the `openResourceDiscovery` version marker); a
//! deployment that needs full schema conformance swaps in its own
//! `DocumentValidator`.

use serde_json::Value;

pub trait DocumentValidator: Send + Sync {
    fn validate(&self, document: &Value) -> Result<(), String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MinimalOrdValidator;

impl DocumentValidator for MinimalOrdValidator {
    fn validate(&self, document: &Value) -> Result<(), String> {
        match document.get("openResourceDiscovery") {
            Some(Value::String(_)) => Ok(()),
            Some(_) => Err("openResourceDiscovery must be a string".to_string()),
            None => Err("missing openResourceDiscovery field".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_document_with_version_marker() {
        let validator = MinimalOrdValidator;
        assert!(validator.validate(&json!({"openResourceDiscovery": "1.9"})).is_ok());
    }

    #[test]
    fn rejects_document_missing_version_marker() {
        let validator = MinimalOrdValidator;
        assert!(validator.validate(&json!({"apiResources": []})).is_err());
    }
}
