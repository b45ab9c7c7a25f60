// Copyright (C) Microsoft Corporation. All rights reserved.

//! TLS pseudo-random function.
//!
//! Computes `PRF(secret, label, seed)` as defined for TLS 1.2 (RFC 5246 §5,
//! a single `P_hash` stream) and TLS 1.0/1.1 (RFC 2246 §5, `P_MD5 ⊕ P_SHA1`
//! over the two halves of the secret) on the provider's `TLS1-PRF` KDF.
//!
//! # Call flow
//!
//! Each request is checked before the provider is touched:
//!
//! 1. the provider must supply `TLS1-PRF`
//! 2. the requested hash must be usable
//! 3. the output must fit in [`MAX_PRF_OUT`] and the inputs in an `int`
//!
//! A derivation context is then allocated, programmed with the digest, the
//! secret and the combined seed `label || seed`, asked for exactly the output
//! length and released. A failed request never leaves output behind: the
//! caller's buffer is zeroed before the error is returned.
//!
//! # TLS 1.0/1.1
//!
//! [`HashId::Md5Sha1`] runs as one derivation when the provider fetches the
//! composite `MD5-SHA1` digest. Otherwise two derivations, MD5 over the first
//! half of the secret and SHA1 over the last half, are XORed together. Both
//! paths produce identical bytes.
//!
//! # Empty seed
//!
//! The `TLS1-PRF` KDF refuses an empty combined seed, which is what an empty
//! label with an empty seed gives. Such requests expand `P_hash` directly over
//! the provider's HMAC instead, with the same MD5/SHA1 split for
//! [`HashId::Md5Sha1`]. No derivation context is allocated for them.

use std::ffi::c_int;

use zeroize::Zeroizing;

use super::*;
use crate::caps::ProbeState;

mod ctx;
mod phash;

pub(crate) use ctx::*;
use phash::p_hash;


/// Largest output, in bytes, a single PRF request may ask for.
pub const MAX_PRF_OUT: usize = 1 << 20;

/// Provider name of the TLS PRF key-derivation algorithm.
pub const TLS1_PRF_NAME: &str = "TLS1-PRF";

/// Progress of a single PRF request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrfState {
    Validated,
    CtxAllocated,
    Programmed,
    Derived,
    Freed,
}

impl PrfState {
    fn trace(self) {
        tracing::trace!(state = ?self, "tls1 prf");
    }
}

/// PRF engine over a probed provider.
pub(crate) struct Tls1Prf<'a, P: Provider + ?Sized> {
    provider: &'a P,
    probe: &'a ProbeState<P>,
}

impl<'a, P: Provider + ?Sized> Tls1Prf<'a, P> {
    pub(crate) fn new(provider: &'a P, probe: &'a ProbeState<P>) -> Self {
        Self { provider, probe }
    }

    /// Fills `out` with PRF output.
    ///
    /// On error `out` is all zeroes.
    pub(crate) fn derive_into(
        &self,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        hash: HashId,
        out: &mut [u8],
    ) -> Result<(), BridgeError> {
        let kdf = match self.validate(secret, label, seed, hash, out.len()) {
            Ok(kdf) => kdf,
            Err(err) => {
                out.fill(0);
                return Err(err);
            }
        };
        self.run(kdf, secret, label, seed, hash, out)
    }

    /// Returns `out_len` bytes of PRF output.
    pub(crate) fn derive(
        &self,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        hash: HashId,
        out_len: usize,
    ) -> Result<Vec<u8>, BridgeError> {
        let kdf = self.validate(secret, label, seed, hash, out_len)?;
        let mut out = vec![0u8; out_len];
        self.run(kdf, secret, label, seed, hash, &mut out)?;
        Ok(out)
    }

    /// Fail-fast checks; none of them calls the provider.
    fn validate(
        &self,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        hash: HashId,
        out_len: usize,
    ) -> Result<&'a P::Kdf, BridgeError> {
        let kdf = self
            .probe
            .prf
            .as_ref()
            .ok_or(BridgeError::Unsupported(Feature::Tls1Prf))?;
        if !self.probe.hashes.supports(hash) {
            return Err(BridgeError::Unsupported(Feature::Hash(hash)));
        }
        if out_len > MAX_PRF_OUT {
            return Err(BridgeError::InvalidArgument(
                "output length exceeds MAX_PRF_OUT",
            ));
        }
        if c_int::try_from(secret.len()).is_err() {
            return Err(BridgeError::InvalidArgument("secret is too long"));
        }
        let seed_len = label
            .len()
            .checked_add(seed.len())
            .ok_or(BridgeError::InvalidArgument("label and seed are too long"))?;
        if c_int::try_from(seed_len).is_err() {
            return Err(BridgeError::InvalidArgument("label and seed are too long"));
        }
        Ok(kdf)
    }

    fn run(
        &self,
        kdf: &P::Kdf,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        hash: HashId,
        out: &mut [u8],
    ) -> Result<(), BridgeError> {
        out.fill(0);
        if out.is_empty() {
            return Ok(());
        }

        let mut combined_seed = Vec::with_capacity(label.len() + seed.len());
        combined_seed.extend_from_slice(label);
        combined_seed.extend_from_slice(seed);

        let result = match (hash, self.probe.caps.md5_sha1_strategy()) {
            _ if combined_seed.is_empty() => self.derive_hmac(secret, hash, out),
            (HashId::Md5Sha1, Md5Sha1Strategy::Split) => {
                self.derive_split(kdf, secret, &combined_seed, out)
            }
            _ => {
                let digest = self.digest(hash)?;
                self.derive_one(kdf, digest, secret, &combined_seed, out)
            }
        };

        if result.is_err() {
            out.fill(0);
        }
        result
    }

    /// One `TLS1-PRF` derivation with a single context.
    fn derive_one(
        &self,
        kdf: &P::Kdf,
        digest: &P::Digest,
        secret: &[u8],
        seed: &[u8],
        out: &mut [u8],
    ) -> Result<(), BridgeError> {
        let mut ctx = KdfContext::new(self.provider, kdf)?;
        let params = KdfParams {
            digest,
            secret,
            seed,
        };
        ctx.derive(&params, out)
    }

    /// `P_MD5(S1, seed) ⊕ P_SHA1(S2, seed)`.
    fn derive_split(
        &self,
        kdf: &P::Kdf,
        secret: &[u8],
        seed: &[u8],
        out: &mut [u8],
    ) -> Result<(), BridgeError> {
        let md5 = self.digest(HashId::Md5)?;
        let sha1 = self.digest(HashId::Sha1)?;
        let (s1, s2) = split_secret(secret);

        let mut md5_stream = Zeroizing::new(vec![0u8; out.len()]);
        self.derive_one(kdf, md5, s1, seed, &mut md5_stream)?;
        self.derive_one(kdf, sha1, s2, seed, out)?;

        xor_into(out, &md5_stream);
        Ok(())
    }

    /// PRF with an empty combined seed, expanded over HMAC.
    fn derive_hmac(
        &self,
        secret: &[u8],
        hash: HashId,
        out: &mut [u8],
    ) -> Result<(), BridgeError> {
        tracing::trace!(%hash, "tls1 prf over hmac");
        if hash != HashId::Md5Sha1 {
            return p_hash(self.provider, self.digest(hash)?, hash.size(), secret, &[], out);
        }

        let md5 = self.digest(HashId::Md5)?;
        let sha1 = self.digest(HashId::Sha1)?;
        let (s1, s2) = split_secret(secret);

        let mut md5_stream = Zeroizing::new(vec![0u8; out.len()]);
        p_hash(self.provider, md5, HashId::Md5.size(), s1, &[], &mut md5_stream)?;
        p_hash(self.provider, sha1, HashId::Sha1.size(), s2, &[], out)?;

        xor_into(out, &md5_stream);
        Ok(())
    }

    fn digest(&self, hash: HashId) -> Result<&'a P::Digest, BridgeError> {
        self.probe
            .hashes
            .get(hash)
            .ok_or(BridgeError::Internal("supported hash has no digest handle"))
    }
}

fn xor_into(out: &mut [u8], mask: &[u8]) {
    out.iter_mut()
        .zip(mask.iter())
        .for_each(|(byte, mask)| *byte ^= mask);
}

/// Splits a TLS 1.0/1.1 secret into `S1` and `S2`.
///
/// Both halves are `ceil(len / 2)` bytes long and share the middle byte when
/// the length is odd.
pub(crate) fn split_secret(secret: &[u8]) -> (&[u8], &[u8]) {
    let half = secret.len().div_ceil(2);
    (&secret[..half], &secret[secret.len() - half..])
}
