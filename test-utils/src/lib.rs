//! Shared test utilities for the SPFE client.
//!
//! This crate provides:
//! - Proptest generators for parameters, auth types and tickets
//! - A blocking-friendly wrapper around a wiremock server
//! - Pickled response envelopes and throwaway client identities
//! - A local mutual-TLS server signed by a throwaway CA

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;
pub mod tls;

pub use generators::*;
