//! Shared service context handed to views.
//!
//! # Design
//! - Create exactly one API client per app boot.
//! - Views receive the context through yew's context provider instead of a
//!   process-wide global, so the engine stays independently testable.

use std::rc::Rc;

use crate::services::api::ApiClient;

/// Shared service handle for all views.
#[derive(Clone)]
pub struct ServicesCtx {
    /// Singleton API client instance.
    pub client: Rc<ApiClient>,
}

impl ServicesCtx {
    /// Build the app-wide service object.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Rc::new(ApiClient::new()),
        }
    }
}

impl Default for ServicesCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ServicesCtx {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.client, &other.client)
    }
}
