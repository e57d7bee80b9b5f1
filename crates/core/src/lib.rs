//! Banyan Core - Shared types library.
//!
//! This crate provides common types used across all Banyan components:
//! - `storefront` - Headless storefront checkout service
//! - `integration-tests` - End-to-end tests against the storefront router
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, and variant identity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
