//! Gateway configuration.
//!
//! Loaded from a JSON file, then overridden field-by-field from environment
//! variables (the teacher's `HttpServerConfig` follows the same
//! defaults-then-override shape, just without the env layer). `.env` is
//! loaded once by `main` via `dotenvy` before any of this runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GatewayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Local,
    Github,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationConfig {
    #[serde(default)]
    pub methods: Vec<AuthMethod>,
    #[serde(default)]
    pub basic_auth_users: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub sap_cf_mtls: MtlsConfig,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            methods: vec![AuthMethod::Open],
            basic_auth_users: Default::default(),
            sap_cf_mtls: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Open,
    Basic,
    Mtls,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MtlsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub trusted_issuers: Vec<String>,
    #[serde(default)]
    pub trusted_subjects: Vec<String>,
    #[serde(default)]
    pub config_endpoints: Vec<String>,
    #[serde(default)]
    pub decode_base64_headers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_source_type")]
    pub source_type: SourceType,
    #[serde(default)]
    pub ord_directory: PathBuf,
    #[serde(default = "default_documents_subdir")]
    pub ord_documents_sub_directory: String,
    pub base_url: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub github_api_url: Option<String>,
    #[serde(default)]
    pub github_repository: Option<String>,
    #[serde(default)]
    pub github_branch: Option<String>,
    #[serde(default)]
    pub github_token: Option<String>,

    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default = "default_update_delay_ms")]
    pub update_delay_ms: u64,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub authentication: AuthenticationConfig,

    #[serde(default = "default_status_dashboard_enabled")]
    pub status_dashboard_enabled: bool,

    #[serde(default)]
    pub include_build_number: bool,
}

fn default_source_type() -> SourceType {
    SourceType::Local
}
fn default_documents_subdir() -> String {
    "documents".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_update_delay_ms() -> u64 {
    5_000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_status_dashboard_enabled() -> bool {
    true
}

impl GatewayConfig {
    /// Load from a JSON file, then apply environment variable overrides,
    /// then validate.
    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Internal(format!("reading config {}: {e}", path.display())))?;
        let mut config: GatewayConfig = serde_json::from_str(&contents)
            .map_err(|e| GatewayError::Internal(format!("parsing config {}: {e}", path.display())))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        use std::env;

        if let Ok(v) = env::var("ORD_SOURCE_TYPE") {
            self.source_type = match v.to_lowercase().as_str() {
                "github" => SourceType::Github,
                _ => SourceType::Local,
            };
        }
        if let Ok(v) = env::var("ORD_DIRECTORY") {
            self.ord_directory = PathBuf::from(v);
        }
        if let Ok(v) = env::var("ORD_DOCUMENTS_SUBDIR") {
            self.ord_documents_sub_directory = v;
        }
        if let Ok(v) = env::var("ORD_BASE_URL") {
            self.base_url = v;
        }
        if let Ok(v) = env::var("ORD_HOST") {
            self.host = v;
        }
        if let Ok(v) = env::var("ORD_PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
        if let Ok(v) = env::var("ORD_GITHUB_API_URL") {
            self.github_api_url = Some(v);
        }
        if let Ok(v) = env::var("ORD_GITHUB_REPOSITORY") {
            self.github_repository = Some(v);
        }
        if let Ok(v) = env::var("ORD_GITHUB_BRANCH") {
            self.github_branch = Some(v);
        }
        if let Ok(v) = env::var("ORD_GITHUB_TOKEN") {
            self.github_token = Some(v);
        }
        if let Ok(v) = env::var("ORD_WEBHOOK_SECRET") {
            self.webhook_secret = Some(v);
        }
        if let Ok(v) = env::var("ORD_UPDATE_DELAY_MS") {
            if let Ok(ms) = v.parse() {
                self.update_delay_ms = ms;
            }
        }
        if let Ok(v) = env::var("ORD_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("ORD_STATUS_DASHBOARD_ENABLED") {
            self.status_dashboard_enabled = v == "true" || v == "1";
        }
        if let Ok(v) = env::var("ORD_INCLUDE_BUILD_NUMBER") {
            self.include_build_number = v == "true" || v == "1";
        }

        if let Ok(v) = env::var("BASIC_AUTH") {
            if v == "true" || v == "1" {
                if !self.authentication.methods.contains(&AuthMethod::Basic) {
                    self.authentication.methods.push(AuthMethod::Basic);
                }
            }
        }
        if let Ok(v) = env::var("MTLS_MODE") {
            self.authentication.sap_cf_mtls.enabled = v != "off" && !v.is_empty();
            if self.authentication.sap_cf_mtls.enabled
                && !self.authentication.methods.contains(&AuthMethod::Mtls)
            {
                self.authentication.methods.push(AuthMethod::Mtls);
            }
        }
        if let Ok(v) = env::var("MTLS_TRUSTED_ISSUERS") {
            self.authentication.sap_cf_mtls.trusted_issuers = split_csv(&v);
        }
        if let Ok(v) = env::var("MTLS_TRUSTED_SUBJECTS") {
            self.authentication.sap_cf_mtls.trusted_subjects = split_csv(&v);
        }
        if let Ok(v) = env::var("MTLS_CONFIG_ENDPOINTS") {
            self.authentication.sap_cf_mtls.config_endpoints = split_csv(&v);
        }
        if let Ok(v) = env::var("MTLS_DECODE_BASE64_HEADERS") {
            self.authentication.sap_cf_mtls.decode_base64_headers = v == "true" || v == "1";
        }
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.base_url.trim().is_empty() {
            return Err(GatewayError::Internal("baseUrl must not be empty".into()));
        }
        let url = Url::parse(&self.base_url)
            .map_err(|e| GatewayError::Internal(format!("baseUrl is not a valid URL: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(GatewayError::Internal(
                "baseUrl must use the http or https scheme".into(),
            ));
        }

        if self.source_type == SourceType::Github {
            if self.github_repository.as_deref().unwrap_or("").is_empty() {
                return Err(GatewayError::Internal(
                    "githubRepository is required when sourceType is github".into(),
                ));
            }
            if self.github_branch.as_deref().unwrap_or("").is_empty() {
                return Err(GatewayError::Internal(
                    "githubBranch is required when sourceType is github".into(),
                ));
            }
        } else if self.ord_directory.as_os_str().is_empty() {
            return Err(GatewayError::Internal(
                "ordDirectory is required when sourceType is local".into(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("config.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn loads_minimal_local_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"sourceType":"local","ordDirectory":"/tmp/ord","baseUrl":"https://example.com"}"#,
        );
        let config = GatewayConfig::load(&path).unwrap();
        assert_eq!(config.source_type, SourceType::Local);
        assert_eq!(config.port, 8080);
        assert_eq!(config.ord_documents_sub_directory, "documents");
    }

    #[test]
    fn rejects_missing_base_url() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), r#"{"sourceType":"local","ordDirectory":"/tmp/ord","baseUrl":""}"#);
        assert!(GatewayConfig::load(&path).is_err());
    }

    #[test]
    fn rejects_github_source_without_repository() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"sourceType":"github","baseUrl":"https://example.com","githubBranch":"main"}"#,
        );
        assert!(GatewayConfig::load(&path).is_err());
    }

    #[test]
    fn env_override_replaces_port() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"sourceType":"local","ordDirectory":"/tmp/ord","baseUrl":"https://example.com"}"#,
        );
        std::env::set_var("ORD_PORT", "9999");
        let config = GatewayConfig::load(&path).unwrap();
        std::env::remove_var("ORD_PORT");
        assert_eq!(config.port, 9999);
    }
}
