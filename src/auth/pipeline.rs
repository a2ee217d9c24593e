//! Composes the configured auth strategies as an OR, short-circuiting in
//! the order they're listed under `authentication.methods`.

use axum::http::HeaderMap;

use crate::config::{AuthMethod, AuthenticationConfig};

use super::basic::BasicAuthStrategy;
use super::errors::{AuthError, AuthResult};
use super::mtls::{MtlsHeaders, MtlsOutcome, MtlsVerifier};

/// Outcome of a successful auth check, carrying enough detail for the
/// caller to decide whether an audit event is warranted.
pub enum AuthDecision {
    Open,
    Basic,
    Mtls,
    MtlsExpiredWindow { subject: String },
}

pub struct AuthPipeline {
    methods: Vec<AuthMethod>,
    basic: BasicAuthStrategy,
    mtls: MtlsVerifier,
}

impl AuthPipeline {
    pub fn new(config: &AuthenticationConfig) -> Self {
        Self {
            methods: config.methods.clone(),
            basic: BasicAuthStrategy::new(config.basic_auth_users.clone()),
            mtls: MtlsVerifier {
                trusted_issuers: config.sap_cf_mtls.trusted_issuers.clone(),
                trusted_subjects: config.sap_cf_mtls.trusted_subjects.clone(),
                decode_base64_headers: config.sap_cf_mtls.decode_base64_headers,
            },
        }
    }

    /// Appends discovered trusted issuer/subject DNs (spec.md §4.F's
    /// startup discovery step) to the mTLS strategy's trusted lists.
    pub fn extend_trusted_dns(&mut self, issuers: Vec<String>, subjects: Vec<String>) {
        self.mtls.trusted_issuers.extend(issuers);
        self.mtls.trusted_subjects.extend(subjects);
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> AuthResult<AuthDecision> {
        for method in &self.methods {
            match method {
                AuthMethod::Open => return Ok(AuthDecision::Open),
                AuthMethod::Basic => {
                    if let Some(header) = headers
                        .get(axum::http::header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                    {
                        if self.basic.verify_header(header).is_ok() {
                            return Ok(AuthDecision::Basic);
                        }
                    }
                }
                AuthMethod::Mtls => {
                    let mtls_headers = extract_mtls_headers(headers);
                    match self.mtls.verify(&mtls_headers) {
                        MtlsOutcome::Accepted => return Ok(AuthDecision::Mtls),
                        MtlsOutcome::AcceptedWithExpiredWindow { subject } => {
                            return Ok(AuthDecision::MtlsExpiredWindow { subject })
                        }
                        MtlsOutcome::Rejected => {}
                    }
                }
            }
        }
        Err(AuthError::NoStrategyAccepted)
    }
}

fn extract_mtls_headers(headers: &HeaderMap) -> MtlsHeaders {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };
    MtlsHeaders {
        client_verify: get("x-ssl-client-verify"),
        subject_dn: get("x-ssl-client-subject-dn"),
        issuer_dn: get("x-ssl-client-issuer-dn"),
        root_ca_dn: get("x-ssl-client-root-ca-dn"),
        forwarded_client_cert: get("x-forwarded-client-cert"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config_with(methods: Vec<AuthMethod>) -> AuthenticationConfig {
        AuthenticationConfig {
            methods,
            basic_auth_users: Default::default(),
            sap_cf_mtls: Default::default(),
        }
    }

    #[test]
    fn open_method_accepts_any_request() {
        let pipeline = AuthPipeline::new(&config_with(vec![AuthMethod::Open]));
        let headers = HeaderMap::new();
        assert!(matches!(
            pipeline.authenticate(&headers).unwrap(),
            AuthDecision::Open
        ));
    }

    #[test]
    fn basic_only_rejects_requests_without_header() {
        let pipeline = AuthPipeline::new(&config_with(vec![AuthMethod::Basic]));
        let headers = HeaderMap::new();
        assert!(pipeline.authenticate(&headers).is_err());
    }

    #[test]
    fn basic_accepts_valid_credentials() {
        let hash = super::super::crypto::hash_bcrypt("pw").unwrap();
        let mut users = std::collections::HashMap::new();
        users.insert("alice".to_string(), hash);
        let config = AuthenticationConfig {
            methods: vec![AuthMethod::Basic],
            basic_auth_users: users,
            sap_cf_mtls: Default::default(),
        };
        let pipeline = AuthPipeline::new(&config);

        let mut headers = HeaderMap::new();
        let encoded = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            "alice:pw",
        );
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
        );
        assert!(matches!(
            pipeline.authenticate(&headers).unwrap(),
            AuthDecision::Basic
        ));
    }
}
