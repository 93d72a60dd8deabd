//! Video player controls: a label mirror, an input coordinator, focus rules
//! and a shared metadata cache, bound to a page through small host traits.

pub mod api;
#[cfg(not(target_arch = "wasm32"))]
pub mod bridge;
pub mod cache;
#[cfg(not(target_arch = "wasm32"))]
pub mod diagnostics;
pub mod headless;
pub mod host;
pub mod player;
pub mod settings;
pub mod utils;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub(crate) mod testing;
