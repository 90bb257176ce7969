//! Cache identity of a transformer
//!
//! The identity hashes every facet that can change what the provider
//! returns, in a fixed order. Each facet is one of three [`Setting`] states
//! and each state hashes to different bytes. Structured facets go through
//! canonical JSON, so map ordering never changes the identity.
//!
//! Provider and model are hashed as the engine resolves them against the
//! config, so a transformer that leaves them unset follows config changes
//! and provider aliases share one entry.

use prism_foundation::{Content, Fingerprint, PrismConfig};
use serde::Serialize;
use serde_json::Value;

use crate::engine::{resolve_model, resolve_provider};
use crate::options::Setting;
use crate::transformer::Transformer;

const IDENTITY_DOMAIN: &str = "transformer";
const KEY_DOMAIN: &str = "transformation";

/// 64 hex char identity of a transformer's configuration
pub fn cache_identity(transformer: &dyn Transformer, config: &PrismConfig) -> String {
    let options = transformer.options();
    let mut fp = Fingerprint::new(IDENTITY_DOMAIN);

    fp.push_str("name", transformer.name())
        .push_str("prompt", &transformer.prompt());

    push_str_setting(&mut fp, "system_prompt", &options.system_prompt);
    let provider = resolve_provider(&options.provider, config).ok();
    match (provider, &options.provider) {
        (Some(provider), _) => {
            fp.push_str("provider", &provider.to_string());
        }
        // Unparseable names never reach a provider; keep them apart anyway
        (None, setting) => push_str_setting(&mut fp, "provider_unresolved", setting),
    }
    fp.push_str("model", &resolve_model(&options.model, provider, config));
    push_float_setting(&mut fp, "temperature", &options.temperature);
    push_float_setting(&mut fp, "top_p", &options.top_p);
    push_json_setting(&mut fp, "tools", &options.tools);
    push_int_setting(&mut fp, "timeout", &options.timeout);
    push_int_setting(&mut fp, "connect_timeout", &options.connect_timeout);
    push_json_setting(&mut fp, "output_format", &options.output_format);

    fp.finalize()
}

/// Cache key hash for running `transformer` over `content`
///
/// This is the hash only; `ResultCache::key` adds the namespace prefix.
pub fn cache_key(transformer: &dyn Transformer, content: &Content, config: &PrismConfig) -> String {
    let mut fp = Fingerprint::new(KEY_DOMAIN);
    fp.push_str("identity", &cache_identity(transformer, config))
        .push_str("content", &content.digest());
    fp.finalize()
}

// ============================================================================
// Facet writers
// ============================================================================

fn push_setting<T>(
    fp: &mut Fingerprint,
    label: &str,
    setting: &Setting<T>,
    write: impl FnOnce(&mut Fingerprint, &T),
) {
    match setting {
        Setting::Unset => {
            fp.push_absent(label);
        }
        Setting::Null => {
            fp.push_null(label);
        }
        Setting::Value(value) => write(fp, value),
    }
}

fn push_str_setting(fp: &mut Fingerprint, label: &str, setting: &Setting<String>) {
    push_setting(fp, label, setting, |fp, value| {
        fp.push_str(label, value);
    });
}

// Bit pattern, so NaN and infinities stay distinct from each other and from null
fn push_float_setting(fp: &mut Fingerprint, label: &str, setting: &Setting<f32>) {
    push_setting(fp, label, setting, |fp, value| {
        fp.push_bytes(label, &value.to_bits().to_be_bytes());
    });
}

fn push_int_setting(fp: &mut Fingerprint, label: &str, setting: &Setting<i64>) {
    push_setting(fp, label, setting, |fp, value| {
        fp.push_bytes(label, &value.to_be_bytes());
    });
}

fn push_json_setting<T: Serialize>(fp: &mut Fingerprint, label: &str, setting: &Setting<T>) {
    push_setting(fp, label, setting, |fp, value| {
        let json = serde_json::to_value(value).unwrap_or(Value::Null);
        fp.push_json(label, &json);
    });
}
