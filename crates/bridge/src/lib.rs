// Copyright (C) Microsoft Corporation. All rights reserved.

//! OpenSSL bridge for the TLS pseudo-random function and secure random bytes.
//!
//! This crate exposes a small, correctness-preserving surface over the OpenSSL
//! library linked into the process:
//!
//! - **TLS1-PRF**: the TLS 1.0/1.1 (MD5 ⊕ SHA-1) and TLS 1.2 (single hash)
//!   pseudo-random functions, computed by the provider's `TLS1-PRF` KDF
//! - **Hash registry**: maps [`HashId`] values to provider digest handles and
//!   reports which of them the provider can actually use
//! - **Capability probe**: a process-wide, memoized view of what the linked
//!   provider supports, including FIPS mode
//! - **RNG**: a streaming reader over the provider's CSPRNG
//!
//! # Provider injection
//!
//! Every operation goes through the [`Provider`] trait. [`OsslProvider`] binds
//! the linked OpenSSL; tests and embedders can construct a [`Bridge`] over any
//! other implementation. The free functions in this crate act on the
//! process-wide [`Bridge::global`] instance.
//!
//! # Example
//!
//! ```no_run
//! use ossl_bridge::HashId;
//!
//! if ossl_bridge::supports_tls1_prf() && ossl_bridge::supports_hash(HashId::Sha256) {
//!     let out = ossl_bridge::tls1_prf(b"secret", b"master secret", b"seed", 48, HashId::Sha256)
//!         .unwrap();
//!     assert_eq!(out.len(), 48);
//! }
//! ```

mod bridge;
mod caps;
mod config;
mod error;
mod hash;
mod prf;
mod provider;
mod rand;

pub use bridge::*;
pub use caps::*;
pub use config::*;
use error::*;
pub use hash::*;
pub use prf::*;
pub use provider::*;
pub use rand::*;
use thiserror::Error;

/// Error taxonomy for every operation of the bridge.
///
/// Provider-signalled failures carry the oldest entry of the provider error
/// queue at the time of the failure; the rest of the queue is discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The linked provider does not supply the feature.
    #[error("{0} is not supported by the linked provider")]
    Unsupported(Feature),

    /// A precondition on the caller's arguments was violated.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The provider returned a non-success status.
    #[error("provider failure (code {code:#x}): {reason}")]
    ProviderFailure {
        /// Packed provider error code, `0` when the provider queued nothing.
        code: u64,
        /// Human-readable reason reported by the provider, possibly empty.
        reason: String,
    },

    /// A source produced fewer bytes than requested.
    ///
    /// The bridge itself never returns this; it exists for callers that wrap
    /// partial-read sources behind the same error type.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Number of bytes requested.
        expected: usize,
        /// Number of bytes actually produced.
        actual: usize,
    },

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl From<BridgeError> for std::io::Error {
    fn from(err: BridgeError) -> Self {
        let kind = match err {
            BridgeError::Unsupported(_) => std::io::ErrorKind::Unsupported,
            BridgeError::InvalidArgument(_) => std::io::ErrorKind::InvalidInput,
            BridgeError::ShortRead { .. } => std::io::ErrorKind::UnexpectedEof,
            BridgeError::ProviderFailure { .. } | BridgeError::Internal(_) => {
                std::io::ErrorKind::Other
            }
        };
        std::io::Error::new(kind, err)
    }
}
