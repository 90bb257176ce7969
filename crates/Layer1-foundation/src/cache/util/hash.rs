//! Hashing utilities for cache keys
//!
//! Keys are SHA-256 over a tagged, length-prefixed stream of facets, so
//! absent, null and empty values never collide.

use serde_json::Value;
use sha2::{Digest, Sha256};

const TAG_ABSENT: u8 = 0;
const TAG_NULL: u8 = 1;
const TAG_STR: u8 = 2;
const TAG_JSON: u8 = 3;
const TAG_BYTES: u8 = 4;

/// SHA-256 of raw bytes, hex encoded
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Serialize JSON with object keys sorted at every level
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // String keys always serialize
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(v) = map.get(key) {
                    write_canonical(v, out);
                }
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Incremental builder for a fixed-length hex cache identity
///
/// Order matters: the same facets pushed in a different order produce a
/// different fingerprint.
#[derive(Clone)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    /// Start a fingerprint scoped to a domain (e.g. "transformer", "content_fetch")
    pub fn new(domain: &str) -> Self {
        let mut fp = Self {
            hasher: Sha256::new(),
        };
        fp.write_chunk(domain.as_bytes());
        fp
    }

    /// Facet not configured at all
    pub fn push_absent(&mut self, label: &str) -> &mut Self {
        self.write_label(label, TAG_ABSENT);
        self
    }

    /// Facet configured as an explicit null
    pub fn push_null(&mut self, label: &str) -> &mut Self {
        self.write_label(label, TAG_NULL);
        self
    }

    pub fn push_str(&mut self, label: &str, value: &str) -> &mut Self {
        self.write_label(label, TAG_STR);
        self.write_chunk(value.as_bytes());
        self
    }

    /// Structured facet, hashed in canonical key order
    pub fn push_json(&mut self, label: &str, value: &Value) -> &mut Self {
        self.write_label(label, TAG_JSON);
        self.write_chunk(canonical_json(value).as_bytes());
        self
    }

    pub fn push_bytes(&mut self, label: &str, value: &[u8]) -> &mut Self {
        self.write_label(label, TAG_BYTES);
        self.write_chunk(value);
        self
    }

    /// Optional string: `None` is hashed as absent
    pub fn push_opt_str(&mut self, label: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) => self.push_str(label, v),
            None => self.push_absent(label),
        }
    }

    /// 64 hex chars
    pub fn finalize(self) -> String {
        hex::encode(self.hasher.finalize())
    }

    fn write_label(&mut self, label: &str, tag: u8) {
        self.write_chunk(label.as_bytes());
        self.hasher.update([tag]);
    }

    fn write_chunk(&mut self, bytes: &[u8]) {
        self.hasher.update((bytes.len() as u64).to_be_bytes());
        self.hasher.update(bytes);
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fingerprint").finish_non_exhaustive()
    }
}
