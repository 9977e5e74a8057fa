//! Governed HTTP transport for the vault API.
//!
//! # Design
//! - Each dispatch supersedes the live request on its channel: the older
//!   fetch is aborted and its outcome suppressed through the channel ledger,
//!   so a stale response can never mutate state even if the transport still
//!   delivers it.
//! - Every outgoing request restarts the idle timer and carries the current
//!   anti-forgery token.
//! - Binary downloads are one-shot, user-initiated transfers outside channel
//!   governance; they still carry the token.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Context, anyhow};
use gloo::console;
use serde::de::DeserializeOwned;
use vaultgate_api_models::SessionData;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Headers, Request, RequestInit, Response};

use crate::core::auth::{NavState, NextAction, resolve};
use crate::core::request::{
    ApiError, Channel, ChannelLedger, Outcome, classify, decode_data, encode_form,
    filename_from_disposition,
};
use crate::core::session::SessionStore;
use crate::core::timer::ActivityTimer;
use crate::services::storage::BrowserStorage;

const API_BASE: &str = "api/v1";
const CSRF_HEADER: &str = "X-CSRF-Token";

/// HTTP method of a dispatched request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Side-effect-free read.
    Get,
    /// Mutating call; form-encoded body.
    Post,
}

enum Settled {
    Response { status: u16, body: Option<String> },
    NetworkError(String),
    Aborted,
}

/// Singleton HTTP client owning the session store, the idle timer, and the
/// per-channel request bookkeeping.
pub struct ApiClient {
    session: RefCell<SessionStore<BrowserStorage>>,
    timer: Rc<RefCell<ActivityTimer>>,
    ledger: RefCell<ChannelLedger>,
    inflight: RefCell<HashMap<Channel, AbortController>>,
}

impl ApiClient {
    /// Build a client over browser storage; the idle timer stays disabled
    /// until the authenticated view configures it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: RefCell::new(SessionStore::new(BrowserStorage)),
            timer: Rc::new(RefCell::new(ActivityTimer::new(None))),
            ledger: RefCell::new(ChannelLedger::default()),
            inflight: RefCell::new(HashMap::new()),
        }
    }

    /// Shared handle to the idle timer for the view that drives its ticks.
    #[must_use]
    pub fn timer(&self) -> Rc<RefCell<ActivityTimer>> {
        Rc::clone(&self.timer)
    }

    /// Resolve a settled outcome against the persisted session.
    pub fn resolve(&self, outcome: Outcome, state: NavState) -> NextAction {
        resolve(outcome, &mut self.session.borrow_mut(), state)
    }

    /// Display name of the logged-in user, when known.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        self.session.borrow().display_name()
    }

    /// Configured idle timeout in seconds, when auto-logout is enabled.
    #[must_use]
    pub fn idle_timeout(&self) -> Option<u64> {
        self.session.borrow().idle_timeout()
    }

    /// Seconds between background auth probes on login views.
    #[must_use]
    pub fn probe_interval(&self) -> u64 {
        // default ten minutes, as the server does
        self.session.borrow().probe_interval().unwrap_or(600)
    }

    /// Persist freshly issued session credentials (SSO callback path).
    pub fn store_session(&self, data: SessionData) {
        let mut session = self.session.borrow_mut();
        session.set_token(Some(&data.csrf_token));
        session.merge_settings(data.settings);
    }

    /// Drop the persisted token and settings.
    pub fn clear_session(&self) {
        self.session.borrow_mut().clear();
    }

    /// Cancel the live request on `channel`, if any. The eventual resolution
    /// of the canceled request is fully suppressed.
    pub fn cancel(&self, channel: Channel) {
        if let Some(controller) = self.inflight.borrow_mut().remove(&channel) {
            controller.abort();
        }
        // invalidate the live generation so a still-running future settles
        // to nothing even if the transport ignores the abort
        let _ = self.ledger.borrow_mut().begin(channel);
    }

    /// Dispatch a request for the auth flow and classify its outcome.
    pub async fn dispatch(
        &self,
        channel: Channel,
        method: Method,
        path: &str,
        form: Option<&[(&str, String)]>,
    ) -> Outcome {
        match self.perform(channel, method, path, form).await {
            Settled::Response { status, body } => classify(status, body.as_deref()),
            Settled::Aborted => Outcome::Aborted,
            Settled::NetworkError(message) => Outcome::OtherError { status: 0, message },
        }
    }

    /// Dispatch a request and decode its `data` payload as `T`.
    ///
    /// # Errors
    /// See [`decode_data`]; additionally [`ApiError::Aborted`] when the
    /// request was superseded and [`ApiError::Status`] with status `0` when
    /// it never reached the server.
    pub async fn fetch_data<T: DeserializeOwned>(
        &self,
        channel: Channel,
        method: Method,
        path: &str,
        form: Option<&[(&str, String)]>,
    ) -> Result<T, ApiError> {
        match self.perform(channel, method, path, form).await {
            Settled::Response { status, body } => decode_data(status, body.as_deref()),
            Settled::Aborted => Err(ApiError::Aborted),
            Settled::NetworkError(message) => Err(ApiError::Status { status: 0, message }),
        }
    }

    async fn perform(
        &self,
        channel: Channel,
        method: Method,
        path: &str,
        form: Option<&[(&str, String)]>,
    ) -> Settled {
        let ticket = {
            if let Some(previous) = self.inflight.borrow_mut().remove(&channel) {
                previous.abort();
            }
            self.ledger.borrow_mut().begin(channel)
        };
        let Ok(controller) = AbortController::new() else {
            return Settled::NetworkError("abort controller unavailable".to_string());
        };
        self.inflight
            .borrow_mut()
            .insert(channel, controller.clone());

        // any outgoing request counts as activity
        self.timer.borrow_mut().restart(true);

        let settled = match self.build_request(&controller, method, path, form) {
            Ok(request) => fetch(&request).await,
            Err(message) => Settled::NetworkError(message),
        };

        let observable = {
            let current = self.ledger.borrow_mut().settle(&ticket);
            if current {
                self.inflight.borrow_mut().remove(&channel);
            }
            current
        };
        if observable {
            settled
        } else {
            Settled::Aborted
        }
    }

    fn build_request(
        &self,
        controller: &AbortController,
        method: Method,
        path: &str,
        form: Option<&[(&str, String)]>,
    ) -> Result<Request, String> {
        let init = RequestInit::new();
        init.set_signal(Some(&controller.signal()));

        let headers = Headers::new().map_err(|_| "request headers unavailable".to_string())?;
        set_header(&headers, "Accept", "application/json");
        if let Some(token) = self.session.borrow().token() {
            set_header(&headers, CSRF_HEADER, &token);
        }
        match method {
            Method::Get => init.set_method("GET"),
            Method::Post => {
                init.set_method("POST");
                if let Some(fields) = form {
                    set_header(&headers, "Content-Type", "application/x-www-form-urlencoded");
                    init.set_body(&JsValue::from_str(&encode_form(fields)));
                }
            }
        }
        init.set_headers(&headers);

        Request::new_with_str_and_init(&format!("{API_BASE}/{path}"), &init)
            .map_err(|_| "request construction failed".to_string())
    }

    /// Download a binary attachment and hand it to the browser as a file.
    ///
    /// One-shot transfer: no channel, no cancellation, but the token header
    /// and the activity restart still apply.
    ///
    /// # Errors
    /// Returns a displayable error when the transfer or the save fails.
    pub async fn download(&self, path: &str, fallback_name: &str) -> anyhow::Result<()> {
        self.timer.borrow_mut().restart(true);

        let mut request = gloo_net::http::Request::get(&format!("{API_BASE}/{path}"));
        if let Some(token) = self.session.borrow().token() {
            request = request.header(CSRF_HEADER, &token);
        }
        let response = request.send().await.context("download request failed")?;
        if !response.ok() {
            return Err(anyhow!("download failed with status {}", response.status()));
        }
        let filename = response
            .headers()
            .get("Content-Disposition")
            .and_then(|value| filename_from_disposition(&value))
            .unwrap_or_else(|| fallback_name.to_string());
        let bytes = response.binary().await.context("download body unreadable")?;
        save_as_file(&bytes, &filename)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn fetch(request: &Request) -> Settled {
    let Some(window) = web_sys::window() else {
        return Settled::NetworkError("window unavailable".to_string());
    };
    match JsFuture::from(window.fetch_with_request(request)).await {
        Ok(value) => match value.dyn_into::<Response>() {
            Ok(response) => {
                let status = response.status();
                let body = read_text(&response).await;
                Settled::Response { status, body }
            }
            Err(_) => Settled::NetworkError("malformed fetch response".to_string()),
        },
        Err(err) if is_abort_error(&err) => Settled::Aborted,
        Err(err) => Settled::NetworkError(js_error_message(&err)),
    }
}

async fn read_text(response: &Response) -> Option<String> {
    let promise = response.text().ok()?;
    JsFuture::from(promise).await.ok()?.as_string()
}

fn is_abort_error(err: &JsValue) -> bool {
    err.dyn_ref::<js_sys::Error>()
        .is_some_and(|error| error.name() == "AbortError")
}

fn js_error_message(err: &JsValue) -> String {
    err.dyn_ref::<js_sys::Error>()
        .map_or_else(|| "network request failed".to_string(), |error| {
            String::from(error.message())
        })
}

fn set_header(headers: &Headers, name: &'static str, value: &str) {
    if let Err(err) = headers.set(name, value) {
        console::error!("request header set failed", name, err);
    }
}

fn save_as_file(bytes: &[u8], filename: &str) -> anyhow::Result<()> {
    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(bytes).buffer());
    let blob = web_sys::Blob::new_with_u8_array_sequence(&parts)
        .map_err(|_| anyhow!("file blob construction failed"))?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|_| anyhow!("object url construction failed"))?;

    let anchor: web_sys::HtmlAnchorElement = gloo::utils::document()
        .create_element("a")
        .map_err(|_| anyhow!("anchor construction failed"))?
        .dyn_into()
        .map_err(|_| anyhow!("anchor construction failed"))?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();
    let _ = web_sys::Url::revoke_object_url(&url);
    Ok(())
}
