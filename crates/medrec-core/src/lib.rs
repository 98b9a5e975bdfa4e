//! Core types and trait definitions for the medical-record store.
//!
//! This crate has no HTTP or database dependencies. Every entity is
//! versioned: updates append, hides flag, and any past state can be
//! reconstructed.

// Native `async fn` in traits; the futures are bounded `Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod patch;
pub mod record;
pub mod store;
pub mod user;
pub mod view;

pub use error::{EntityKind, Error, ErrorKind, Result, StoreError};
pub use patch::Patch;
