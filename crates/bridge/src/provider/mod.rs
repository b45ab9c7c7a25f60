// Copyright (C) Microsoft Corporation. All rights reserved.

//! Binding to the cryptographic provider.
//!
//! The [`Provider`] trait is the fixed menu of provider entry points the bridge
//! needs. Every entry point is either callable or reported absent; absence only
//! becomes an error when an operation actually requires the missing handle.
//!
//! Handles returned by the provider (`Digest`, `Kdf`) are immutable and shared
//! across threads. Contexts (`KdfCtx`) are owned by a single call.

use std::ffi::c_int;

mod ossl;

#[cfg(test)]
pub(crate) mod fake;

pub use ossl::*;

/// Raw non-success status returned by a provider entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderStatus(pub c_int);

/// One entry popped from the provider error queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    /// Packed provider error code.
    pub code: u64,
    /// Human-readable reason, if the provider has one for this code.
    pub reason: Option<String>,
}

/// Parameters programmed into a `TLS1-PRF` context in a single batch.
pub struct KdfParams<'a, D> {
    /// Digest used by `P_hash`.
    pub digest: &'a D,
    /// PRF secret.
    pub secret: &'a [u8],
    /// Combined seed, `label || seed`.
    pub seed: &'a [u8],
}

/// Entry points the bridge requires from a cryptographic provider.
pub trait Provider: Send + Sync {
    /// Provider-owned digest descriptor, valid for the provider's lifetime.
    type Digest: Send + Sync;

    /// Provider-owned key-derivation algorithm descriptor.
    type Kdf: Send + Sync;

    /// Per-call key-derivation context.
    type KdfCtx;

    /// Human-readable provider version.
    fn version_text(&self) -> String;

    /// Whether the secure random source is present.
    fn has_rand(&self) -> bool;

    /// Fills `buf` from the secure random source in one call.
    fn rand_bytes(&self, buf: &mut [u8]) -> Result<(), ProviderStatus>;

    /// Looks up a digest by provider name.
    fn fetch_hash(&self, name: &str) -> Option<Self::Digest>;

    /// Looks up a key-derivation algorithm by provider name.
    fn kdf_fetch(&self, name: &str) -> Option<Self::Kdf>;

    /// Allocates a derivation context for `kdf`.
    fn kdf_ctx_new(&self, kdf: &Self::Kdf) -> Option<Self::KdfCtx>;

    /// Releases a derivation context.
    fn kdf_ctx_free(&self, ctx: Self::KdfCtx) {
        drop(ctx);
    }

    /// Prepares `ctx` for derivation and programs `params` into it.
    fn kdf_program(
        &self,
        ctx: &mut Self::KdfCtx,
        params: &KdfParams<'_, Self::Digest>,
    ) -> Result<(), ProviderStatus>;

    /// Derives exactly `out.len()` bytes from a programmed `ctx`.
    fn kdf_derive(&self, ctx: &mut Self::KdfCtx, out: &mut [u8]) -> Result<(), ProviderStatus>;

    /// Computes `HMAC(key, data)` over `digest` into `out`.
    ///
    /// `out` must be exactly one digest long.
    fn hmac(
        &self,
        digest: &Self::Digest,
        key: &[u8],
        data: &[&[u8]],
        out: &mut [u8],
    ) -> Result<(), ProviderStatus>;

    /// Pops the oldest entry of the calling thread's error queue.
    fn error_pop(&self) -> Option<ErrorEntry>;

    /// Whether FIPS-only algorithm selection is active.
    fn fips_enabled(&self) -> bool;

    /// Requests FIPS-only algorithm selection on or off.
    fn set_fips(&self, enabled: bool) -> Result<(), ProviderStatus>;
}
