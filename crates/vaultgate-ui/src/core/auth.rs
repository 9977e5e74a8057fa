//! Authentication-stage resolution: turn a settled request outcome into the
//! next client action.
//!
//! # Design
//! - Factors are checked in a fixed order: user credential, then backend
//!   handoff, then vault unlock. The first unmet factor decides the route.
//! - An external redirect is terminal; nothing may run after issuing one, or
//!   an SSO loop follows.
//! - Resolution is synchronous over the settled outcome; the only side
//!   effects are session updates on success and session clearing on an
//!   unrecoverable 401.

use serde::{Deserialize, Serialize};
use vaultgate_api_models::{TemplateFactor, UserFactor};

use crate::core::request::Outcome;
use crate::core::session::{SessionStore, StorageBackend};

/// Login stages a 401 can route the client to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginStage {
    /// Username/password (or SSO) user login.
    User,
    /// Backend credential login for the vault source.
    Backend,
    /// Vault-file unlock.
    Db,
}

/// Navigation state carried to the destination view, e.g. a prior
/// "session expired" notice the login screen should render.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavState {
    /// Contextual message to show on the destination screen.
    pub info: Option<String>,
    /// Submit the login form immediately (credential-less user factor).
    pub auto_submit: bool,
    /// Replace the current history entry instead of pushing.
    pub replace: bool,
}

impl NavState {
    /// State carrying only an informational message.
    #[must_use]
    pub fn with_info(info: impl Into<String>) -> Self {
        Self {
            info: Some(info.into()),
            ..Self::default()
        }
    }
}

/// Next client action decided from a request outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NextAction {
    /// Intentional cancellation; do nothing, surface nothing.
    Noop,
    /// The request is fully authorized; continue with the caller's intent.
    Proceed,
    /// Show the named login stage.
    NavigateTo {
        /// Stage whose view must be shown.
        stage: LoginStage,
        /// Caller state, propagated unchanged apart from stage flags.
        state: NavState,
    },
    /// Leave the client for an external identity provider. Terminal: the
    /// caller must not run any further orchestration after issuing this.
    RedirectExternal(String),
    /// Surface a user-visible error on the initiating view.
    Alert(String),
}

/// Resolve a settled request outcome into the next client action.
///
/// `state` is the caller-supplied navigation state; it travels unchanged
/// into every navigation so the destination can render contextual messages.
pub fn resolve<B: StorageBackend>(
    outcome: Outcome,
    session: &mut SessionStore<B>,
    state: NavState,
) -> NextAction {
    match outcome {
        Outcome::Aborted => NextAction::Noop,
        Outcome::Success(data) => {
            if let Some(data) = data {
                session.set_token(Some(&data.csrf_token));
                session.merge_settings(data.settings);
            }
            NextAction::Proceed
        }
        Outcome::OtherError { message, .. } => NextAction::Alert(message),
        Outcome::Unauthorized { status: None, .. } => {
            // session unknown or expired; restart the flow from scratch
            session.clear();
            NextAction::NavigateTo {
                stage: LoginStage::User,
                state: NavState {
                    replace: true,
                    ..state
                },
            }
        }
        Outcome::Unauthorized {
            status: Some(status),
            ..
        } => {
            if let Some(user) = status.user {
                return match user {
                    UserFactor::Redirect { url } => NextAction::RedirectExternal(url),
                    UserFactor::Mask => NextAction::NavigateTo {
                        stage: LoginStage::User,
                        state,
                    },
                    UserFactor::None => NextAction::NavigateTo {
                        stage: LoginStage::User,
                        state: NavState {
                            auto_submit: true,
                            ..state
                        },
                    },
                    UserFactor::Unknown => NextAction::Alert("unknown login type".to_string()),
                };
            }
            if !status.backend.unwrap_or(false) {
                return match session.backend_template() {
                    TemplateFactor::Redirect { url } => NextAction::RedirectExternal(url),
                    TemplateFactor::Mask => NextAction::NavigateTo {
                        stage: LoginStage::Backend,
                        state,
                    },
                };
            }
            if !status.db.unwrap_or(false) {
                return NextAction::NavigateTo {
                    stage: LoginStage::Db,
                    state,
                };
            }
            // every factor reports satisfied yet the response was 401; a
            // server/client contract violation, surfaced instead of ignored
            NextAction::Alert("inconsistent auth state".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LoginStage, NavState, NextAction, resolve};
    use crate::core::request::Outcome;
    use crate::core::session::{MemoryStorage, SessionStore};
    use serde_json::json;
    use vaultgate_api_models::{AuthStatus, SessionData, UserFactor};

    fn store() -> SessionStore<MemoryStorage> {
        SessionStore::new(MemoryStorage::default())
    }

    fn unauthorized(status: AuthStatus) -> Outcome {
        Outcome::Unauthorized {
            message: None,
            status: Some(status),
        }
    }

    #[test]
    fn aborted_outcomes_resolve_to_noop() {
        let mut session = store();
        session.set_token(Some("tok123"));
        assert_eq!(
            resolve(Outcome::Aborted, &mut session, NavState::default()),
            NextAction::Noop
        );
        // cancellation never mutates the session
        assert_eq!(session.token().as_deref(), Some("tok123"));
    }

    #[test]
    fn success_persists_token_and_merges_settings() {
        let mut session = store();
        let data = SessionData {
            csrf_token: "tok123".to_string(),
            settings: json!({"timeout": 600}).as_object().cloned().unwrap(),
        };
        let action = resolve(
            Outcome::Success(Some(data)),
            &mut session,
            NavState::default(),
        );
        assert_eq!(action, NextAction::Proceed);
        assert_eq!(session.token().as_deref(), Some("tok123"));
        assert_eq!(session.idle_timeout(), Some(600));
    }

    #[test]
    fn other_errors_alert_without_touching_the_session() {
        let mut session = store();
        session.set_token(Some("tok123"));
        let action = resolve(
            Outcome::OtherError {
                status: 500,
                message: "backend exploded".to_string(),
            },
            &mut session,
            NavState::default(),
        );
        assert_eq!(action, NextAction::Alert("backend exploded".to_string()));
        assert_eq!(session.token().as_deref(), Some("tok123"));
    }

    #[test]
    fn missing_payload_clears_session_and_restarts_login() {
        let mut session = store();
        session.set_token(Some("tok123"));
        session.merge_settings(json!({"cn": "Jo"}).as_object().cloned().unwrap());

        let action = resolve(
            Outcome::Unauthorized {
                message: Some("unauthorized".to_string()),
                status: None,
            },
            &mut session,
            NavState::with_info("Session expired"),
        );
        assert_eq!(
            action,
            NextAction::NavigateTo {
                stage: LoginStage::User,
                state: NavState {
                    info: Some("Session expired".to_string()),
                    auto_submit: false,
                    replace: true,
                },
            }
        );
        assert_eq!(session.token(), None);
        assert!(session.settings().is_empty());
    }

    #[test]
    fn user_redirect_wins_regardless_of_other_factors() {
        let mut session = store();
        let action = resolve(
            unauthorized(AuthStatus {
                user: Some(UserFactor::Redirect {
                    url: "https://sso.example/x".to_string(),
                }),
                backend: Some(true),
                db: Some(true),
            }),
            &mut session,
            NavState::default(),
        );
        assert_eq!(
            action,
            NextAction::RedirectExternal("https://sso.example/x".to_string())
        );
    }

    #[test]
    fn user_mask_routes_to_the_login_form() {
        let mut session = store();
        let state = NavState::with_info("wrong password");
        let action = resolve(
            unauthorized(AuthStatus {
                user: Some(UserFactor::Mask),
                ..AuthStatus::default()
            }),
            &mut session,
            state.clone(),
        );
        assert_eq!(
            action,
            NextAction::NavigateTo {
                stage: LoginStage::User,
                state,
            }
        );
    }

    #[test]
    fn credentialless_user_factor_auto_submits() {
        let mut session = store();
        let action = resolve(
            unauthorized(AuthStatus {
                user: Some(UserFactor::None),
                ..AuthStatus::default()
            }),
            &mut session,
            NavState::default(),
        );
        match action {
            NextAction::NavigateTo {
                stage: LoginStage::User,
                state,
            } => assert!(state.auto_submit),
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn unknown_user_factor_is_an_error() {
        let mut session = store();
        let action = resolve(
            unauthorized(AuthStatus {
                user: Some(UserFactor::Unknown),
                ..AuthStatus::default()
            }),
            &mut session,
            NavState::default(),
        );
        assert_eq!(action, NextAction::Alert("unknown login type".to_string()));
    }

    #[test]
    fn unmet_backend_factor_uses_the_cached_template() {
        let mut session = store();
        let action = resolve(
            unauthorized(AuthStatus {
                backend: Some(false),
                ..AuthStatus::default()
            }),
            &mut session,
            NavState::default(),
        );
        assert_eq!(
            action,
            NextAction::NavigateTo {
                stage: LoginStage::Backend,
                state: NavState::default(),
            }
        );

        session.merge_settings(
            json!({"template": {"type": "redirect", "url": "https://idp.example"}})
                .as_object()
                .cloned()
                .unwrap(),
        );
        let action = resolve(
            unauthorized(AuthStatus {
                backend: None,
                ..AuthStatus::default()
            }),
            &mut session,
            NavState::default(),
        );
        assert_eq!(
            action,
            NextAction::RedirectExternal("https://idp.example".to_string())
        );
    }

    #[test]
    fn unmet_db_factor_routes_to_vault_unlock() {
        let mut session = store();
        let action = resolve(
            unauthorized(AuthStatus {
                backend: Some(true),
                db: Some(false),
                ..AuthStatus::default()
            }),
            &mut session,
            NavState::with_info("Vault session expired"),
        );
        assert_eq!(
            action,
            NextAction::NavigateTo {
                stage: LoginStage::Db,
                state: NavState::with_info("Vault session expired"),
            }
        );
    }

    #[test]
    fn all_factors_met_yet_unauthorized_is_surfaced() {
        let mut session = store();
        let action = resolve(
            unauthorized(AuthStatus {
                backend: Some(true),
                db: Some(true),
                ..AuthStatus::default()
            }),
            &mut session,
            NavState::default(),
        );
        assert_eq!(
            action,
            NextAction::Alert("inconsistent auth state".to_string())
        );
    }
}
