//! Client session persistence: anti-forgery token plus a mergeable settings
//! blob.
//!
//! # Design
//! - Storage sits behind a trait seam so merge semantics test without a DOM.
//! - Settings are one JSON object persisted as a single blob; updates are a
//!   shallow merge so later logins only overwrite the keys they carry.
//! - All operations are synchronous and side-effect only the persisted blob.

use serde_json::Value;
use vaultgate_api_models::{Settings, TemplateFactor};

/// Persisted key holding the anti-forgery token.
pub const TOKEN_KEY: &str = "vaultgate.csrf_token";
/// Persisted key holding the JSON-encoded settings blob.
pub const SETTINGS_KEY: &str = "vaultgate.settings";

/// Minimal key/value persistence seam, backed by localStorage in the browser.
pub trait StorageBackend {
    /// Read a stored value, `None` when missing.
    fn get(&self, key: &str) -> Option<String>;
    /// Store a value under `key`.
    fn set(&mut self, key: &str, value: &str);
    /// Remove the value under `key`, if any.
    fn remove(&mut self, key: &str);
}

/// In-memory backend for host-side tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage(std::collections::HashMap<String, String>);

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.0.remove(key);
    }
}

/// Persistent session credential + settings store.
#[derive(Debug)]
pub struct SessionStore<B> {
    backend: B,
}

impl<B: StorageBackend> SessionStore<B> {
    /// Wrap a storage backend.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Current anti-forgery token; `None` when unset or empty.
    pub fn token(&self) -> Option<String> {
        self.backend.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// Store or remove the anti-forgery token.
    pub fn set_token(&mut self, token: Option<&str>) {
        match token {
            Some(token) if !token.is_empty() => self.backend.set(TOKEN_KEY, token),
            _ => self.backend.remove(TOKEN_KEY),
        }
    }

    /// Current settings blob; an empty map when unset or unreadable.
    pub fn settings(&self) -> Settings {
        self.backend
            .get(SETTINGS_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Shallow-merge `partial` into the stored settings: incoming keys
    /// overwrite same-named existing keys, all others are retained.
    pub fn merge_settings(&mut self, partial: Settings) {
        let mut merged = self.settings();
        for (key, value) in partial {
            merged.insert(key, value);
        }
        if let Ok(raw) = serde_json::to_string(&merged) {
            self.backend.set(SETTINGS_KEY, &raw);
        }
    }

    /// Remove both the token and the settings blob.
    pub fn clear(&mut self) {
        self.backend.remove(TOKEN_KEY);
        self.backend.remove(SETTINGS_KEY);
    }

    /// Display name of the logged-in user (`cn`), when known.
    pub fn display_name(&self) -> Option<String> {
        self.settings()
            .get("cn")
            .and_then(Value::as_str)
            .map(ToString::to_string)
    }

    /// Idle timeout in seconds; `None` (or zero) disables the auto-logout.
    pub fn idle_timeout(&self) -> Option<u64> {
        self.settings()
            .get("timeout")
            .and_then(Value::as_u64)
            .filter(|secs| *secs > 0)
    }

    /// Interval in seconds between background auth probes, when configured.
    pub fn probe_interval(&self) -> Option<u64> {
        self.settings()
            .get("interval")
            .and_then(Value::as_u64)
            .filter(|secs| *secs > 0)
    }

    /// Cached backend-login template; defaults to showing the form.
    pub fn backend_template(&self) -> TemplateFactor {
        self.settings()
            .get("template")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryStorage, SessionStore};
    use serde_json::{Map, json};
    use vaultgate_api_models::TemplateFactor;

    fn store() -> SessionStore<MemoryStorage> {
        SessionStore::new(MemoryStorage::default())
    }

    fn settings(value: serde_json::Value) -> Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn token_round_trips_and_treats_empty_as_unset() {
        let mut session = store();
        assert_eq!(session.token(), None);
        session.set_token(Some("tok123"));
        assert_eq!(session.token().as_deref(), Some("tok123"));
        session.set_token(Some(""));
        assert_eq!(session.token(), None);
        session.set_token(None);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn settings_merge_keeps_unrelated_keys() {
        let mut session = store();
        session.merge_settings(settings(json!({"a": 1})));
        session.merge_settings(settings(json!({"b": 2})));
        let merged = session.settings();
        assert_eq!(merged.get("a"), Some(&json!(1)));
        assert_eq!(merged.get("b"), Some(&json!(2)));
    }

    #[test]
    fn settings_merge_overwrites_same_named_keys() {
        let mut session = store();
        session.merge_settings(settings(json!({"timeout": 600, "cn": "Jo"})));
        session.merge_settings(settings(json!({"timeout": 30})));
        assert_eq!(session.idle_timeout(), Some(30));
        assert_eq!(session.display_name().as_deref(), Some("Jo"));
    }

    #[test]
    fn settings_default_to_empty_map() {
        let session = store();
        assert!(session.settings().is_empty());
    }

    #[test]
    fn clear_removes_token_and_settings_together() {
        let mut session = store();
        session.set_token(Some("tok123"));
        session.merge_settings(settings(json!({"timeout": 600})));
        session.clear();
        assert_eq!(session.token(), None);
        assert!(session.settings().is_empty());
    }

    #[test]
    fn zero_timeout_disables_auto_logout() {
        let mut session = store();
        session.merge_settings(settings(json!({"timeout": 0})));
        assert_eq!(session.idle_timeout(), None);
    }

    #[test]
    fn backend_template_defaults_to_mask() {
        let mut session = store();
        assert_eq!(session.backend_template(), TemplateFactor::Mask);
        session.merge_settings(settings(
            json!({"template": {"type": "redirect", "url": "https://idp.example"}}),
        ));
        assert_eq!(
            session.backend_template(),
            TemplateFactor::Redirect {
                url: "https://idp.example".to_string()
            }
        );
    }
}
