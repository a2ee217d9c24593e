//! Fingerprint-keyed caches for processed documents.
//!
//! All four maps share one fingerprint epoch. When the observed
//! fingerprint changes, the whole cache state is replaced atomically
//! (readers never see a mix of two epochs' entries) by swapping a single
//! `RwLock<CacheState>`.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::repository::NO_CONTENT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FqnEntry {
    pub file_name: String,
    pub file_path: String,
}

#[derive(Default)]
struct CacheState {
    fingerprint: String,
    processed_documents: HashMap<String, Value>,
    ord_config: Option<Value>,
    document_paths: Option<Vec<String>>,
    fqn_map: Option<HashMap<String, Vec<FqnEntry>>>,
}

pub struct ProcessorCache {
    state: RwLock<CacheState>,
}

impl Default for ProcessorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorCache {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CacheState {
                fingerprint: NO_CONTENT.to_string(),
                ..Default::default()
            }),
        }
    }

    fn ensure_epoch(&self, fingerprint: &str) {
        let needs_reset = {
            let state = self.state.read().unwrap();
            state.fingerprint != fingerprint
        };
        if needs_reset {
            let mut state = self.state.write().unwrap();
            if state.fingerprint != fingerprint {
                *state = CacheState {
                    fingerprint: fingerprint.to_string(),
                    ..Default::default()
                };
            }
        }
    }

    pub fn get_or_insert_document(
        &self,
        fingerprint: &str,
        rel_path: &str,
        compute: impl FnOnce() -> Option<Value>,
    ) -> Option<Value> {
        self.ensure_epoch(fingerprint);

        if let Some(existing) = self.state.read().unwrap().processed_documents.get(rel_path) {
            return Some(existing.clone());
        }

        let computed = compute()?;
        let mut state = self.state.write().unwrap();
        if state.fingerprint == fingerprint {
            state
                .processed_documents
                .insert(rel_path.to_string(), computed.clone());
        }
        Some(computed)
    }

    pub fn get_or_insert_ord_config(
        &self,
        fingerprint: &str,
        compute: impl FnOnce() -> Value,
    ) -> Value {
        self.ensure_epoch(fingerprint);
        if let Some(existing) = self.state.read().unwrap().ord_config.clone() {
            return existing;
        }
        let computed = compute();
        let mut state = self.state.write().unwrap();
        if state.fingerprint == fingerprint {
            state.ord_config = Some(computed.clone());
        }
        computed
    }

    pub fn get_or_insert_document_paths(
        &self,
        fingerprint: &str,
        compute: impl FnOnce() -> Vec<String>,
    ) -> Vec<String> {
        self.ensure_epoch(fingerprint);
        if let Some(existing) = self.state.read().unwrap().document_paths.clone() {
            return existing;
        }
        let computed = compute();
        let mut state = self.state.write().unwrap();
        if state.fingerprint == fingerprint {
            state.document_paths = Some(computed.clone());
        }
        computed
    }

    pub fn get_or_insert_fqn_map(
        &self,
        fingerprint: &str,
        compute: impl FnOnce() -> HashMap<String, Vec<FqnEntry>>,
    ) -> HashMap<String, Vec<FqnEntry>> {
        self.ensure_epoch(fingerprint);
        if let Some(existing) = self.state.read().unwrap().fqn_map.clone() {
            return existing;
        }
        let computed = compute();
        let mut state = self.state.write().unwrap();
        if state.fingerprint == fingerprint {
            state.fqn_map = Some(computed.clone());
        }
        computed
    }

    pub fn current_fingerprint(&self) -> String {
        self.state.read().unwrap().fingerprint.clone()
    }
}
