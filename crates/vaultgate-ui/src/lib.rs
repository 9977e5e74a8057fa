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
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]
//! Vaultgate web client.
//!
//! A browser front-end for a password-vault service that requires up to three
//! sequential login factors (user credential, optional backend handoff, vault
//! unlock) and enforces an idle timeout on the open vault. The decision logic
//! lives in DOM-free [`core`] modules so it tests on the host target; the
//! wasm-only `app`/`components`/`services` modules wire it to the browser.

pub mod core;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod components;
#[cfg(target_arch = "wasm32")]
pub mod services;

#[cfg(target_arch = "wasm32")]
pub use app::run_app;
