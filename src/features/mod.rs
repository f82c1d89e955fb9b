//! Demo features built on the store.
//!
//! Each feature follows the same layout: `action.rs` (what can happen),
//! `state.rs` (what is remembered), `reducer.rs` (how one becomes the other).
//! [`app`] composes the others; [`dashboard`] shows slice composition.

pub mod app;
pub mod counter;
pub mod dashboard;
pub mod detail;
mod env;
pub mod search;

pub use env::Env;
