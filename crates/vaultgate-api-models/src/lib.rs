#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Vaultgate API.
//!
//! Every JSON endpoint wraps its payload in the same [`Envelope`]; the types
//! here mirror that contract field-for-field so the web client and any future
//! CLI decode responses identically. No I/O lives in this crate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Mergeable client settings blob, keyed by setting name.
///
/// Kept as a raw JSON object because the server may add keys the client does
/// not know yet; updates are shallow-merged key by key.
pub type Settings = serde_json::Map<String, Value>;

/// Uniform response envelope returned by every JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Envelope<T> {
    /// Human-readable outcome message, when the server supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Endpoint-specific payload; `null`/absent when there is none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Which authentication factors remain unmet, attached to a 401 response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AuthStatus {
    /// Unmet user-credential factor, with how to satisfy it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserFactor>,
    /// Whether the backend (vault source) factor is satisfied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<bool>,
    /// Whether the vault file is unlocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<bool>,
}

/// How the user-credential factor must be satisfied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UserFactor {
    /// An external SSO hop is required before the client can continue.
    Redirect {
        /// Absolute URL of the identity provider to visit.
        url: String,
    },
    /// Show the username/password form.
    Mask,
    /// No credential input is needed, but the login flow must still be
    /// entered (auto-submit, e.g. header-based auth).
    None,
    /// Unrecognized login type; an error condition on the client.
    #[serde(other)]
    Unknown,
}

/// How the optional backend-login stage must be satisfied.
///
/// Sourced from locally cached [`Settings`], not from the 401 payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplateFactor {
    /// An external hop completes the backend login.
    Redirect {
        /// Absolute URL to visit.
        url: String,
    },
    /// Show the backend credential form.
    #[default]
    Mask,
}

/// Session credentials issued on a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionData {
    /// Anti-forgery token required on subsequent mutating calls.
    pub csrf_token: String,
    /// Client settings to merge into the persisted blob.
    pub settings: Settings,
}

/// Optional post-logout instruction, e.g. finishing an SSO logout externally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LogoutAction {
    /// Action discriminator; currently only `"redirect"` is meaningful.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Redirect target when `kind` is `"redirect"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl LogoutAction {
    /// External logout URL to visit, when the server requested one.
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        match self.kind.as_deref() {
            Some("redirect") => self.url.as_deref(),
            _ => None,
        }
    }
}

/// One group node of the vault tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    /// Stable group identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Builtin icon index, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<usize>,
    /// Custom icon identifier, served via the icon endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_icon_uuid: Option<Uuid>,
    /// Child groups, recursively.
    #[serde(default)]
    pub children: Vec<Group>,
    /// Whether the node starts expanded in the tree view.
    #[serde(default)]
    pub expanded: bool,
}

/// Payload of the group-tree endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupTree {
    /// Root of the vault group hierarchy.
    pub groups: Group,
    /// Group to preselect, when the server remembers one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_selected: Option<Uuid>,
}

/// One group's entry listing (also the shape of search results).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryGroup {
    /// Display title of the group (or the search summary).
    pub title: String,
    /// Builtin icon index, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<usize>,
    /// Custom icon identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_icon_uuid: Option<Uuid>,
    /// Entries contained in the group.
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// One vault entry. Protected values are never present here; they are
/// fetched individually on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Entry {
    /// Stable entry identifier.
    pub id: Uuid,
    /// Display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Account username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Names of binary attachments available for download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<Vec<String>>,
    /// Names of string fields whose values are protected (fetched on demand).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<HashMap<String, ()>>,
    /// Entry tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Builtin icon index, when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<usize>,
    /// Custom icon identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_icon_uuid: Option<Uuid>,
    /// Primary URL field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Additional string fields; protected ones arrive as `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strings: Option<HashMap<String, Option<String>>>,
}

impl Entry {
    /// Whether the named string field is protected.
    #[must_use]
    pub fn is_protected(&self, name: &str) -> bool {
        self.protected
            .as_ref()
            .is_some_and(|set| set.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthStatus, Envelope, LogoutAction, SessionData, TemplateFactor, UserFactor};
    use serde_json::json;

    #[test]
    fn envelope_tolerates_missing_fields() {
        let env: Envelope<AuthStatus> = serde_json::from_str("{}").unwrap();
        assert_eq!(env.message, None);
        assert!(env.data.is_none());

        let env: Envelope<AuthStatus> =
            serde_json::from_value(json!({"message": "unauthorized", "data": null})).unwrap();
        assert_eq!(env.message.as_deref(), Some("unauthorized"));
        assert!(env.data.is_none());
    }

    #[test]
    fn user_factor_parses_all_wire_types() {
        let redirect: UserFactor =
            serde_json::from_value(json!({"type": "redirect", "url": "https://sso.example/x"}))
                .unwrap();
        assert_eq!(
            redirect,
            UserFactor::Redirect {
                url: "https://sso.example/x".to_string()
            }
        );
        let mask: UserFactor = serde_json::from_value(json!({"type": "mask"})).unwrap();
        assert_eq!(mask, UserFactor::Mask);
        let none: UserFactor = serde_json::from_value(json!({"type": "none"})).unwrap();
        assert_eq!(none, UserFactor::None);
    }

    #[test]
    fn unrecognized_user_factor_maps_to_unknown() {
        let unknown: UserFactor =
            serde_json::from_value(json!({"type": "saml_artifact"})).unwrap();
        assert_eq!(unknown, UserFactor::Unknown);
    }

    #[test]
    fn auth_status_fields_are_independent() {
        let status: AuthStatus =
            serde_json::from_value(json!({"backend": true, "db": false})).unwrap();
        assert!(status.user.is_none());
        assert_eq!(status.backend, Some(true));
        assert_eq!(status.db, Some(false));
    }

    #[test]
    fn template_factor_defaults_to_mask() {
        assert_eq!(TemplateFactor::default(), TemplateFactor::Mask);
        let redirect: TemplateFactor =
            serde_json::from_value(json!({"type": "redirect", "url": "https://idp.example"}))
                .unwrap();
        assert_eq!(
            redirect,
            TemplateFactor::Redirect {
                url: "https://idp.example".to_string()
            }
        );
    }

    #[test]
    fn session_data_carries_settings_verbatim() {
        let data: SessionData = serde_json::from_value(json!({
            "csrf_token": "tok123",
            "settings": {"cn": "Jo User", "timeout": 600, "interval": 60}
        }))
        .unwrap();
        assert_eq!(data.csrf_token, "tok123");
        assert_eq!(data.settings.get("timeout"), Some(&json!(600)));
    }

    #[test]
    fn logout_redirect_requires_matching_kind_and_url() {
        let action: LogoutAction =
            serde_json::from_value(json!({"type": "redirect", "url": "https://idp/logout"}))
                .unwrap();
        assert_eq!(action.redirect_url(), Some("https://idp/logout"));

        let plain: LogoutAction = serde_json::from_value(json!({"type": "local"})).unwrap();
        assert_eq!(plain.redirect_url(), None);
        assert_eq!(LogoutAction::default().redirect_url(), None);
    }
}
