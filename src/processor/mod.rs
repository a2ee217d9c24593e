//! Document processor: validates, rewrites, and caches ORD documents.

mod access_strategy;
mod cache;
mod url_rewrite;
mod warmer;

pub use cache::FqnEntry;
pub use warmer::Warmer;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::AuthMethod;
use crate::repository::DocumentRepository;

pub struct DocumentProcessor {
    repository: Arc<DocumentRepository>,
    cache: cache::ProcessorCache,
    warmer: Arc<Warmer>,
    base_url: String,
    auth_methods: Vec<AuthMethod>,
}

impl DocumentProcessor {
    pub fn new(repository: Arc<DocumentRepository>, base_url: String, auth_methods: Vec<AuthMethod>) -> Self {
        Self {
            repository,
            cache: cache::ProcessorCache::new(),
            warmer: Arc::new(Warmer::new()),
            base_url,
            auth_methods,
        }
    }

    fn fingerprint(&self) -> String {
        self.repository.get_directory_hash("documents")
    }

    /// A processed document, ready to serve. Reads through the
    /// fingerprint-keyed cache.
    pub fn get_processed_document(&self, rel_path: &str) -> Option<Value> {
        let fingerprint = self.fingerprint();
        let repository = Arc::clone(&self.repository);
        let base_url = self.base_url.clone();
        let methods = self.auth_methods.clone();
        let rel_path_owned = rel_path.to_string();
        let fp_for_process = fingerprint.clone();
        self.cache.get_or_insert_document(&fingerprint, rel_path, move || {
            let raw = repository.get_document(&rel_path_owned)?;
            Some(process_document(raw, &base_url, &methods, &fp_for_process))
        })
    }

    /// Aggregated `{openResourceDiscoveryV1: {documents: [...]}}` listing.
    pub fn get_ord_configuration(&self) -> Value {
        let fingerprint = self.fingerprint();
        let repository = Arc::clone(&self.repository);
        let methods = self.auth_methods.clone();
        self.cache.get_or_insert_ord_config(&fingerprint, move || {
            let paths = repository.list_files("documents", true);
            let documents: Vec<Value> = paths
                .iter()
                .filter(|p| p.ends_with(".json"))
                .filter_map(|p| repository.get_document(p).map(|doc| (p, doc)))
                .map(|(p, doc)| {
                    let perspective = perspective_of(&doc);
                    json!({
                        "url": format!("/ord/v1/{p}"),
                        "accessStrategies": access_strategy::access_strategies_for(&methods),
                        "perspective": perspective,
                    })
                })
                .collect();
            json!({"openResourceDiscoveryV1": {"documents": documents}})
        })
    }

    pub fn get_document_paths(&self) -> Vec<String> {
        let fingerprint = self.fingerprint();
        let repository = Arc::clone(&self.repository);
        self.cache.get_or_insert_document_paths(&fingerprint, move || {
            repository
                .list_files("documents", true)
                .into_iter()
                .filter(|p| p.ends_with(".json"))
                .collect()
        })
    }

    /// Maps each resource's ORD id to the files it references.
    pub fn get_fqn_map(&self) -> HashMap<String, Vec<FqnEntry>> {
        let fingerprint = self.fingerprint();
        let repository = Arc::clone(&self.repository);
        self.cache.get_or_insert_fqn_map(&fingerprint, move || {
            let mut map: HashMap<String, Vec<FqnEntry>> = HashMap::new();
            for rel_path in repository.list_files("documents", true) {
                if !rel_path.ends_with(".json") {
                    continue;
                }
                let Some(doc) = repository.get_document(&rel_path) else {
                    continue;
                };
                for (ord_id, file_path) in resource_definitions(&doc) {
                    let file_name = file_path.rsplit('/').next().unwrap_or(&file_path).to_string();
                    map.entry(ord_id).or_default().push(FqnEntry {
                        file_name,
                        file_path,
                    });
                }
            }
            map
        })
    }

    /// Runs a document fetched outside the `documents/` tree (a resource
    /// file that turned out to itself be an ORD document) through the same
    /// rewrite/perspective/baseUrl pipeline as a cached document, without
    /// touching the cache.
    pub fn process_ad_hoc_document(&self, doc: Value) -> Value {
        let fingerprint = self.fingerprint();
        process_document(doc, &self.base_url, &self.auth_methods, &fingerprint)
    }

    /// Off-request-path cache population for a newly swapped fingerprint.
    pub fn warm(self: &Arc<Self>) {
        let fingerprint = self.fingerprint();
        let processor = Arc::clone(self);
        self.warmer.warm(&fingerprint, move |cancel| {
            if cancel.load(std::sync::atomic::Ordering::SeqCst) {
                return;
            }
            for rel_path in processor.get_document_paths() {
                if cancel.load(std::sync::atomic::Ordering::SeqCst) {
                    return;
                }
                processor.get_processed_document(&rel_path);
            }
            processor.get_ord_configuration();
            processor.get_fqn_map();
            crate::observability::log_event(crate::observability::Event::CacheWarmed);
        });
    }
}

fn process_document(mut doc: Value, base_url: &str, methods: &[AuthMethod], fingerprint: &str) -> Value {
    rewrite_resources(&mut doc, methods);

    let perspective = perspective_of(&doc);
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("perspective".to_string(), json!(perspective));
    }

    if perspective == "system-version" && doc.get("describedSystemVersion").is_none() {
        let prefix: String = fingerprint.chars().take(8).collect();
        if let Some(obj) = doc.as_object_mut() {
            obj.insert(
                "describedSystemVersion".to_string(),
                json!({"version": format!("1.0.0-{prefix}")}),
            );
        }
    }

    if let Some(instance) = doc
        .as_object_mut()
        .and_then(|obj| obj.get_mut("describedSystemInstance"))
        .and_then(|v| v.as_object_mut())
    {
        instance.insert("baseUrl".to_string(), json!(base_url));
    } else if let Some(obj) = doc.as_object_mut() {
        obj.insert(
            "describedSystemInstance".to_string(),
            json!({"baseUrl": base_url}),
        );
    }

    doc
}

fn rewrite_resources(doc: &mut Value, methods: &[AuthMethod]) {
    let strategies = access_strategy::access_strategies_for(methods);
    for kind in ["apiResources", "eventResources"] {
        let Some(resources) = doc.get_mut(kind).and_then(|v| v.as_array_mut()) else {
            continue;
        };
        for resource in resources {
            let ord_id = resource
                .get("ordId")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let Some(definitions) = resource
                .get_mut("resourceDefinitions")
                .and_then(|v| v.as_array_mut())
            else {
                continue;
            };
            for definition in definitions {
                if let Some(url) = definition.get("url").and_then(|v| v.as_str()).map(str::to_string) {
                    let rewritten = url_rewrite::rewrite_resource_url(&url, &ord_id);
                    if let Some(obj) = definition.as_object_mut() {
                        obj.insert("url".to_string(), json!(rewritten));
                        obj.insert("accessStrategies".to_string(), json!(strategies.clone()));
                    }
                }
            }
        }
    }
}

fn perspective_of(doc: &Value) -> String {
    doc.get("perspective")
        .and_then(|v| v.as_str())
        .unwrap_or("system-instance")
        .to_string()
}

fn resource_definitions(doc: &Value) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for kind in ["apiResources", "eventResources"] {
        let Some(resources) = doc.get(kind).and_then(|v| v.as_array()) else {
            continue;
        };
        for resource in resources {
            let Some(ord_id) = resource.get("ordId").and_then(|v| v.as_str()) else {
                continue;
            };
            let Some(definitions) = resource.get("resourceDefinitions").and_then(|v| v.as_array()) else {
                continue;
            };
            for definition in definitions {
                if let Some(url) = definition.get("url").and_then(|v| v.as_str()) {
                    out.push((ord_id.to_string(), url.to_string()));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::FingerprintSource;
    use serde_json::json;
    use tempfile::TempDir;

    fn repository_with(dir: &std::path::Path, file: &str, contents: Value) -> Arc<DocumentRepository> {
        std::fs::create_dir_all(dir.join("documents")).unwrap();
        std::fs::write(dir.join("documents").join(file), contents.to_string()).unwrap();
        Arc::new(DocumentRepository::new(dir.to_path_buf(), FingerprintSource::Local))
    }

    #[test]
    fn url_rewrite_matches_spec_example() {
        let dir = TempDir::new().unwrap();
        let doc = json!({
            "openResourceDiscovery": "1.9",
            "apiResources": [{
                "ordId": "ns:apiResource:Foo:v1",
                "resourceDefinitions": [{
                    "url": "../ns_apiResource_Foo_v1/openapi.json",
                    "type": "openapi-v3",
                    "mediaType": "application/json"
                }]
            }]
        });
        let repository = repository_with(dir.path(), "a.json", doc);
        let processor = DocumentProcessor::new(
            repository,
            "https://example.com".to_string(),
            vec![AuthMethod::Open],
        );

        let processed = processor.get_processed_document("documents/a.json").unwrap();
        let url = processed["apiResources"][0]["resourceDefinitions"][0]["url"]
            .as_str()
            .unwrap();
        assert_eq!(url, "/ord/v1/ns:apiResource:Foo:v1/openapi.json");
    }

    #[test]
    fn missing_perspective_defaults_to_system_instance() {
        let dir = TempDir::new().unwrap();
        let doc = json!({"openResourceDiscovery": "1.9"});
        let repository = repository_with(dir.path(), "a.json", doc);
        let processor = DocumentProcessor::new(
            repository,
            "https://example.com".to_string(),
            vec![AuthMethod::Open],
        );
        let processed = processor.get_processed_document("documents/a.json").unwrap();
        assert_eq!(processed["perspective"], "system-instance");
    }

    #[test]
    fn system_version_perspective_gets_described_system_version() {
        let dir = TempDir::new().unwrap();
        let doc = json!({"openResourceDiscovery": "1.9", "perspective": "system-version"});
        let repository = repository_with(dir.path(), "a.json", doc);
        let processor = DocumentProcessor::new(
            repository,
            "https://example.com".to_string(),
            vec![AuthMethod::Open],
        );
        let processed = processor.get_processed_document("documents/a.json").unwrap();
        let version = processed["describedSystemVersion"]["version"].as_str().unwrap();
        assert!(version.starts_with("1.0.0-"));
    }

    #[test]
    fn base_url_is_always_overwritten() {
        let dir = TempDir::new().unwrap();
        let doc = json!({
            "openResourceDiscovery": "1.9",
            "describedSystemInstance": {"baseUrl": "https://stale.example.com"}
        });
        let repository = repository_with(dir.path(), "a.json", doc);
        let processor = DocumentProcessor::new(
            repository,
            "https://fresh.example.com".to_string(),
            vec![AuthMethod::Open],
        );
        let processed = processor.get_processed_document("documents/a.json").unwrap();
        assert_eq!(
            processed["describedSystemInstance"]["baseUrl"],
            "https://fresh.example.com"
        );
    }

    #[test]
    fn fqn_map_collects_resource_files() {
        let dir = TempDir::new().unwrap();
        let doc = json!({
            "openResourceDiscovery": "1.9",
            "apiResources": [{
                "ordId": "ns:apiResource:Foo:v1",
                "resourceDefinitions": [{"url": "/docs/openapi.json", "type": "openapi-v3", "mediaType": "application/json"}]
            }]
        });
        let repository = repository_with(dir.path(), "a.json", doc);
        let processor = DocumentProcessor::new(
            repository,
            "https://example.com".to_string(),
            vec![AuthMethod::Open],
        );
        let map = processor.get_fqn_map();
        let entries = map.get("ns:apiResource:Foo:v1").unwrap();
        assert_eq!(entries[0].file_name, "openapi.json");
    }

    #[test]
    fn ord_configuration_gives_each_document_its_own_real_url() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("documents").join("nested")).unwrap();
        std::fs::write(
            dir.path().join("documents").join("a.json"),
            json!({"openResourceDiscovery": "1.9"}).to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("documents").join("nested").join("b.json"),
            json!({"openResourceDiscovery": "1.9"}).to_string(),
        )
        .unwrap();
        let repository = Arc::new(DocumentRepository::new(dir.path().to_path_buf(), FingerprintSource::Local));
        let processor = DocumentProcessor::new(
            repository,
            "https://example.com".to_string(),
            vec![AuthMethod::Open],
        );

        let config = processor.get_ord_configuration();
        let urls: Vec<&str> = config["openResourceDiscoveryV1"]["documents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["url"].as_str().unwrap())
            .collect();

        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&"/ord/v1/documents/a.json"));
        assert!(urls.contains(&"/ord/v1/documents/nested/b.json"));
        assert_ne!(urls[0], urls[1]);
    }
}
