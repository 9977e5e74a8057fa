//! Request channels, supersession bookkeeping, and outcome classification.
//!
//! # Design
//! - At most one live request per channel; a newer dispatch supersedes the
//!   older one and the superseded outcome must never be observed.
//! - Supersession is decided by generation tickets here, independent of
//!   whether the transport honors the abort signal in time.
//! - Classification is a pure function over the HTTP status and body text so
//!   the fallback chain (envelope JSON → raw text → generic failure) tests
//!   on the host target.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use vaultgate_api_models::{AuthStatus, Envelope, SessionData};

/// Fallback message when the response body could not be read or decoded.
pub const DECODE_FAILURE: &str = "failed to read response";

/// Logical request slots; at most one live request per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Credential submissions of any login stage.
    Login,
    /// Background and mount-time `authenticated` probes.
    AuthCheck,
    /// Vault tree/group/entry/search fetches.
    Data,
    /// Protected-field reveals.
    Protected,
    /// Logout and close-vault calls.
    Session,
}

impl Channel {
    /// Stable name for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::AuthCheck => "auth-check",
            Self::Data => "data-fetch",
            Self::Protected => "protected",
            Self::Session => "session",
        }
    }
}

/// One dispatched request on a channel, identified by generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    channel: Channel,
    generation: u64,
}

impl Ticket {
    /// Channel this ticket was issued on.
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }
}

/// Generation bookkeeping enforcing strict last-writer-wins per channel.
///
/// The transport also aborts the superseded fetch, but cancellation is
/// cooperative; the ledger is what authoritatively suppresses a stale
/// callback even when the network layer still delivers it.
#[derive(Debug, Default)]
pub struct ChannelLedger {
    live: HashMap<Channel, u64>,
    next_generation: u64,
}

impl ChannelLedger {
    /// Open a new request on `channel`, superseding any live one.
    pub fn begin(&mut self, channel: Channel) -> Ticket {
        self.next_generation += 1;
        self.live.insert(channel, self.next_generation);
        Ticket {
            channel,
            generation: self.next_generation,
        }
    }

    /// Whether `ticket` is still the live request on its channel.
    #[must_use]
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.live.get(&ticket.channel) == Some(&ticket.generation)
    }

    /// Record a settled request; returns whether its outcome may be
    /// observed. A superseded ticket settles to `false` and must be dropped
    /// without side effects.
    pub fn settle(&mut self, ticket: &Ticket) -> bool {
        if self.is_current(ticket) {
            self.live.remove(&ticket.channel);
            true
        } else {
            false
        }
    }
}

/// Classified outcome of a settled request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx; carries session credentials when the payload contained them.
    Success(Option<SessionData>),
    /// 401 with the server's message and whatever auth status it attached.
    Unauthorized {
        /// Server-supplied failure message, when decodable.
        message: Option<String>,
        /// Which factors remain unmet; `None` restarts auth from scratch.
        status: Option<AuthStatus>,
    },
    /// Any other non-2xx outcome; terminal at the point of classification.
    OtherError {
        /// HTTP status code (0 when the request never reached the server).
        status: u16,
        /// Displayable failure message.
        message: String,
    },
    /// Superseded or intentionally canceled; never surfaced.
    Aborted,
}

/// Error type for typed payload fetches outside the auth flow.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx, non-401 response.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Displayable failure message.
        message: String,
    },
    /// 401; carries the attached auth status for stage resolution.
    #[error("unauthorized")]
    Unauthorized {
        /// Server-supplied failure message, when decodable.
        message: Option<String>,
        /// Which factors remain unmet.
        status: Option<AuthStatus>,
    },
    /// 2xx whose payload did not decode as the expected type.
    #[error("{0}")]
    Decode(String),
    /// Superseded or intentionally canceled.
    #[error("request aborted")]
    Aborted,
}

impl From<ApiError> for Outcome {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, message } => Self::OtherError { status, message },
            ApiError::Unauthorized { message, status } => Self::Unauthorized { message, status },
            ApiError::Decode(message) => Self::OtherError {
                status: 200,
                message,
            },
            ApiError::Aborted => Self::Aborted,
        }
    }
}

// message fallback chain: envelope message -> raw body text -> generic
fn parse_envelope(body: Option<&str>) -> (String, Option<Value>) {
    let envelope: Option<Envelope<Value>> =
        body.and_then(|text| serde_json::from_str(text).ok());
    match envelope {
        Some(envelope) => {
            let message = envelope
                .message
                .or_else(|| body.map(ToString::to_string))
                .unwrap_or_else(|| DECODE_FAILURE.to_string());
            (message, envelope.data)
        }
        None => (
            body.map_or_else(|| DECODE_FAILURE.to_string(), ToString::to_string),
            None,
        ),
    }
}

/// Classify a settled HTTP response for the auth flow.
///
/// `body` is the response text, `None` when it could not be read at all.
#[must_use]
pub fn classify(status: u16, body: Option<&str>) -> Outcome {
    let (message, data) = parse_envelope(body);
    if (200..300).contains(&status) {
        let session = data.and_then(|value| serde_json::from_value::<SessionData>(value).ok());
        return Outcome::Success(session);
    }
    if status == 401 {
        let auth = data.and_then(|value| serde_json::from_value::<AuthStatus>(value).ok());
        return Outcome::Unauthorized {
            message: Some(message),
            status: auth,
        };
    }
    Outcome::OtherError { status, message }
}

/// Decode a settled response's `data` payload as `T`.
///
/// # Errors
/// [`ApiError::Unauthorized`] on 401, [`ApiError::Status`] on any other
/// non-2xx, and [`ApiError::Decode`] when the payload does not fit `T`.
pub fn decode_data<T: DeserializeOwned>(status: u16, body: Option<&str>) -> Result<T, ApiError> {
    let (message, data) = parse_envelope(body);
    if status == 401 {
        let auth = data.and_then(|value| serde_json::from_value::<AuthStatus>(value).ok());
        return Err(ApiError::Unauthorized {
            message: Some(message),
            status: auth,
        });
    }
    if !(200..300).contains(&status) {
        return Err(ApiError::Status { status, message });
    }
    serde_json::from_value(data.unwrap_or(Value::Null))
        .map_err(|err| ApiError::Decode(err.to_string()))
}

/// Encode form fields as `application/x-www-form-urlencoded`.
#[must_use]
pub fn encode_form(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(name, value)| {
            format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Append query parameters to a path.
#[must_use]
pub fn build_query(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    format!("{path}?{}", encode_form(params))
}

/// Extract the attachment filename from a `Content-Disposition` header.
#[must_use]
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let (_, rest) = header.split_once("filename=")?;
    let raw = rest.split(';').next().unwrap_or(rest).trim();
    let name = raw.trim_matches(|c| c == '"' || c == '\'');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ApiError, Channel, ChannelLedger, DECODE_FAILURE, Outcome, build_query, classify,
        decode_data, encode_form, filename_from_disposition,
    };
    use vaultgate_api_models::{AuthStatus, GroupTree};

    #[test]
    fn newer_dispatch_supersedes_older_on_same_channel() {
        let mut ledger = ChannelLedger::default();
        let first = ledger.begin(Channel::Data);
        let second = ledger.begin(Channel::Data);
        assert!(!ledger.is_current(&first));
        // the stale outcome must never be observed, even settling late
        assert!(!ledger.settle(&first));
        assert!(ledger.settle(&second));
    }

    #[test]
    fn channels_are_independent_slots() {
        let mut ledger = ChannelLedger::default();
        let login = ledger.begin(Channel::Login);
        let probe = ledger.begin(Channel::AuthCheck);
        assert!(ledger.settle(&login));
        assert!(ledger.settle(&probe));
    }

    #[test]
    fn settled_ticket_cannot_settle_twice() {
        let mut ledger = ChannelLedger::default();
        let ticket = ledger.begin(Channel::Data);
        assert!(ledger.settle(&ticket));
        assert!(!ledger.settle(&ticket));
    }

    #[test]
    fn success_with_session_payload_is_extracted() {
        let body = r#"{"message":null,"data":{"csrf_token":"tok123","settings":{"timeout":600}}}"#;
        match classify(200, Some(body)) {
            Outcome::Success(Some(session)) => {
                assert_eq!(session.csrf_token, "tok123");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn success_without_session_payload_still_proceeds() {
        assert_eq!(classify(200, Some("{}")), Outcome::Success(None));
        assert_eq!(classify(204, None), Outcome::Success(None));
    }

    #[test]
    fn unauthorized_carries_auth_status_and_message() {
        let body = r#"{"message":"unauthorized","data":{"backend":true,"db":false}}"#;
        match classify(401, Some(body)) {
            Outcome::Unauthorized {
                message,
                status: Some(status),
            } => {
                assert_eq!(message.as_deref(), Some("unauthorized"));
                assert_eq!(status.backend, Some(true));
                assert_eq!(status.db, Some(false));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn unauthorized_without_payload_has_no_status() {
        match classify(401, Some(r#"{"message":"unauthorized"}"#)) {
            Outcome::Unauthorized { status, .. } => assert!(status.is_none()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn error_message_falls_back_to_raw_text_then_generic() {
        assert_eq!(
            classify(500, Some(r#"{"message":"backend exploded"}"#)),
            Outcome::OtherError {
                status: 500,
                message: "backend exploded".to_string(),
            }
        );
        assert_eq!(
            classify(502, Some("Bad Gateway")),
            Outcome::OtherError {
                status: 502,
                message: "Bad Gateway".to_string(),
            }
        );
        assert_eq!(
            classify(500, None),
            Outcome::OtherError {
                status: 500,
                message: DECODE_FAILURE.to_string(),
            }
        );
    }

    #[test]
    fn decode_data_maps_the_error_taxonomy() {
        let err = decode_data::<GroupTree>(401, Some(r#"{"message":"unauthorized"}"#));
        assert!(matches!(err, Err(ApiError::Unauthorized { .. })));

        let err = decode_data::<GroupTree>(500, Some(r#"{"message":"boom"}"#));
        assert!(matches!(err, Err(ApiError::Status { status: 500, .. })));

        let err = decode_data::<GroupTree>(200, Some("{}"));
        assert!(matches!(err, Err(ApiError::Decode(_))));
    }

    #[test]
    fn api_errors_convert_to_outcomes_for_the_engine() {
        let outcome: Outcome = ApiError::Unauthorized {
            message: None,
            status: Some(AuthStatus::default()),
        }
        .into();
        assert!(matches!(outcome, Outcome::Unauthorized { .. }));
        assert_eq!(Outcome::from(ApiError::Aborted), Outcome::Aborted);
    }

    #[test]
    fn form_encoding_escapes_reserved_characters() {
        let encoded = encode_form(&[
            ("username", "jo user".to_string()),
            ("password", "p&ss=w".to_string()),
        ]);
        assert_eq!(encoded, "username=jo%20user&password=p%26ss%3Dw");
        assert_eq!(
            build_query("search_entries", &[("term", "a b".to_string())]),
            "search_entries?term=a%20b"
        );
        assert_eq!(build_query("get_groups", &[]), "get_groups");
    }

    #[test]
    fn disposition_filenames_are_unquoted() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="notes.txt""#).as_deref(),
            Some("notes.txt")
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=plain.bin; size=3").as_deref(),
            Some("plain.bin")
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }
}
