//! Startup discovery of additional trusted issuer/subject DNs from
//! `sapCfMtls.configEndpoints` (spec.md §4.F), merged with the statically
//! configured lists.

use serde::Deserialize;
use std::time::Duration;

use crate::observability::Logger;

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct DiscoveryRecord {
    #[serde(rename = "certIssuer")]
    cert_issuer: Option<String>,
    #[serde(rename = "certSubject")]
    cert_subject: Option<String>,
}

#[derive(Debug, Default)]
pub struct DiscoveredDns {
    pub issuers: Vec<String>,
    pub subjects: Vec<String>,
}

/// Queries every configured endpoint and merges the discovered DNs,
/// deduplicating against each other by DN-token equality. A failing or
/// slow endpoint is logged and skipped rather than blocking startup.
pub async fn discover(endpoints: &[String]) -> DiscoveredDns {
    let mut discovered = DiscoveredDns::default();
    if endpoints.is_empty() {
        return discovered;
    }

    let client = match reqwest::Client::builder().timeout(DISCOVERY_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            Logger::warn("mtls_discovery_client_build_failed", &[("error", &e.to_string())]);
            return discovered;
        }
    };

    for endpoint in endpoints {
        match fetch_one(&client, endpoint).await {
            Ok(records) => {
                for record in records {
                    if let Some(issuer) = record.cert_issuer {
                        if !super::dn::matches_any(&issuer, &discovered.issuers) {
                            discovered.issuers.push(issuer);
                        }
                    }
                    if let Some(subject) = record.cert_subject {
                        if !super::dn::matches_any(&subject, &discovered.subjects) {
                            discovered.subjects.push(subject);
                        }
                    }
                }
            }
            Err(e) => {
                Logger::warn(
                    "mtls_discovery_endpoint_failed",
                    &[("endpoint", endpoint), ("error", &e.to_string())],
                );
            }
        }
    }

    discovered
}

async fn fetch_one(
    client: &reqwest::Client,
    endpoint: &str,
) -> Result<Vec<DiscoveryRecord>, reqwest::Error> {
    let response = client.get(endpoint).send().await?.error_for_status()?;
    response.json::<Vec<DiscoveryRecord>>().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_endpoint_list_discovers_nothing() {
        let discovered = discover(&[]).await;
        assert!(discovered.issuers.is_empty());
        assert!(discovered.subjects.is_empty());
    }
}
