// Copyright (C) Microsoft Corporation. All rights reserved.

//! Scriptable in-memory provider for exercising bridge error paths.
//!
//! Derivation output is a cheap deterministic mix of the digest tag, secret
//! and seed; it is not a PRF, only enough for tests to tell inputs apart.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FakeDigest {
    pub(crate) name: &'static str,
    pub(crate) tag: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FakeKdf;

#[derive(Debug)]
pub(crate) struct FakeKdfCtx {
    pub(crate) id: usize,
    programmed: Option<(FakeDigest, Vec<u8>, Vec<u8>)>,
}

/// Digest names the fake knows, with their tags.
const DIGESTS: [FakeDigest; 10] = [
    FakeDigest { name: "MD5", tag: 0x01 },
    FakeDigest { name: "SHA1", tag: 0x02 },
    FakeDigest { name: "MD5-SHA1", tag: 0x03 },
    FakeDigest { name: "SHA2-224", tag: 0x04 },
    FakeDigest { name: "SHA2-256", tag: 0x05 },
    FakeDigest { name: "SHA2-384", tag: 0x06 },
    FakeDigest { name: "SHA2-512", tag: 0x07 },
    FakeDigest { name: "SHA3-256", tag: 0x08 },
    FakeDigest { name: "SHA3-384", tag: 0x09 },
    FakeDigest { name: "SHA3-512", tag: 0x0a },
];

pub(crate) struct FakeProvider {
    digests: Mutex<Vec<&'static str>>,
    has_kdf: AtomicBool,
    has_rand: AtomicBool,
    fips_mode: AtomicBool,
    fips_settable: AtomicBool,
    fail_ctx_new: AtomicBool,
    fail_program: AtomicBool,
    fail_derive_on_call: AtomicUsize,
    fail_rand_on_call: AtomicUsize,
    errors: Mutex<VecDeque<ErrorEntry>>,
    pub(crate) ctx_new_calls: AtomicUsize,
    pub(crate) ctx_free_calls: AtomicUsize,
    pub(crate) derive_calls: AtomicUsize,
    pub(crate) hmac_calls: AtomicUsize,
    pub(crate) rand_calls: AtomicUsize,
    pub(crate) hash_fetches: AtomicUsize,
    pub(crate) kdf_fetches: AtomicUsize,
}

impl FakeProvider {
    /// A provider that supplies every feature, including `MD5-SHA1`.
    pub(crate) fn full() -> Self {
        Self {
            digests: Mutex::new(DIGESTS.iter().map(|d| d.name).collect()),
            has_kdf: AtomicBool::new(true),
            has_rand: AtomicBool::new(true),
            fips_mode: AtomicBool::new(false),
            fips_settable: AtomicBool::new(true),
            fail_ctx_new: AtomicBool::new(false),
            fail_program: AtomicBool::new(false),
            fail_derive_on_call: AtomicUsize::new(0),
            fail_rand_on_call: AtomicUsize::new(0),
            errors: Mutex::new(VecDeque::new()),
            ctx_new_calls: AtomicUsize::new(0),
            ctx_free_calls: AtomicUsize::new(0),
            derive_calls: AtomicUsize::new(0),
            hmac_calls: AtomicUsize::new(0),
            rand_calls: AtomicUsize::new(0),
            hash_fetches: AtomicUsize::new(0),
            kdf_fetches: AtomicUsize::new(0),
        }
    }

    pub(crate) fn without_digest(self, name: &str) -> Self {
        self.digests.lock().retain(|d| *d != name);
        self
    }

    pub(crate) fn without_kdf(self) -> Self {
        self.has_kdf.store(false, Ordering::SeqCst);
        self
    }

    pub(crate) fn without_rand(self) -> Self {
        self.has_rand.store(false, Ordering::SeqCst);
        self
    }

    pub(crate) fn with_fips_locked(self) -> Self {
        self.fips_settable.store(false, Ordering::SeqCst);
        self
    }

    pub(crate) fn fail_ctx_new(&self) {
        self.fail_ctx_new.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_program(&self) {
        self.fail_program.store(true, Ordering::SeqCst);
    }

    /// Fails the `n`-th derive call from now (1-based).
    pub(crate) fn fail_derive_on(&self, n: usize) {
        let done = self.derive_calls.load(Ordering::SeqCst);
        self.fail_derive_on_call.store(done + n, Ordering::SeqCst);
    }

    /// Fails the `n`-th rand call from now (1-based).
    pub(crate) fn fail_rand_on(&self, n: usize) {
        let done = self.rand_calls.load(Ordering::SeqCst);
        self.fail_rand_on_call.store(done + n, Ordering::SeqCst);
    }

    pub(crate) fn push_error(&self, code: u64, reason: Option<&str>) {
        self.errors.lock().push_back(ErrorEntry {
            code,
            reason: reason.map(str::to_string),
        });
    }

    pub(crate) fn queued_errors(&self) -> usize {
        self.errors.lock().len()
    }

    pub(crate) fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    /// Output the fake writes for one derivation.
    pub(crate) fn expected_output(
        digest: &FakeDigest,
        secret: &[u8],
        seed: &[u8],
        len: usize,
    ) -> Vec<u8> {
        let secret_mix = secret.iter().fold(0u8, |acc, b| acc.rotate_left(1) ^ b);
        let seed_mix = seed.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        (0..len)
            .map(|i| digest.tag ^ secret_mix ^ seed_mix ^ (i as u8))
            .collect()
    }

    /// MAC the fake writes for one HMAC call.
    pub(crate) fn expected_mac(
        digest: &FakeDigest,
        key: &[u8],
        data: &[&[u8]],
        len: usize,
    ) -> Vec<u8> {
        let seed: Vec<u8> = data.concat();
        let mut mac = Self::expected_output(digest, key, &seed, len);
        mac.iter_mut()
            .zip(seed.iter().cycle())
            .for_each(|(byte, s)| *byte = byte.rotate_left(3) ^ s);
        mac
    }

    pub(crate) fn digest(name: &str) -> FakeDigest {
        *DIGESTS.iter().find(|d| d.name == name).unwrap()
    }
}

impl Provider for FakeProvider {
    type Digest = FakeDigest;
    type Kdf = FakeKdf;
    type KdfCtx = FakeKdfCtx;

    fn version_text(&self) -> String {
        "FakeSSL 0.0.0".to_string()
    }

    fn has_rand(&self) -> bool {
        self.has_rand.load(Ordering::SeqCst)
    }

    fn rand_bytes(&self, buf: &mut [u8]) -> Result<(), ProviderStatus> {
        let call = self.rand_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_rand_on_call.load(Ordering::SeqCst) {
            // Leave partial garbage behind, as a real source might.
            buf.fill(0xee);
            self.push_error(0x2400_0064, Some("entropy source failure"));
            return Err(ProviderStatus(0));
        }
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(31).wrapping_add(call as u8) | 1;
        }
        Ok(())
    }

    fn fetch_hash(&self, name: &str) -> Option<FakeDigest> {
        self.hash_fetches.fetch_add(1, Ordering::SeqCst);
        let digests = self.digests.lock();
        if !digests.contains(&name) {
            self.push_error(0x0300_0080, Some("unsupported"));
            return None;
        }
        DIGESTS.iter().find(|d| d.name == name).copied()
    }

    fn kdf_fetch(&self, name: &str) -> Option<FakeKdf> {
        self.kdf_fetches.fetch_add(1, Ordering::SeqCst);
        (name == "TLS1-PRF" && self.has_kdf.load(Ordering::SeqCst)).then_some(FakeKdf)
    }

    fn kdf_ctx_new(&self, _kdf: &FakeKdf) -> Option<FakeKdfCtx> {
        let id = self.ctx_new_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_ctx_new.load(Ordering::SeqCst) {
            self.push_error(0x0600_0041, Some("malloc failure"));
            return None;
        }
        Some(FakeKdfCtx {
            id,
            programmed: None,
        })
    }

    fn kdf_ctx_free(&self, _ctx: FakeKdfCtx) {
        self.ctx_free_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn kdf_program(
        &self,
        ctx: &mut FakeKdfCtx,
        params: &KdfParams<'_, FakeDigest>,
    ) -> Result<(), ProviderStatus> {
        if self.fail_program.load(Ordering::SeqCst) {
            self.push_error(0x1c00_0065, Some("missing seed"));
            return Err(ProviderStatus(0));
        }
        ctx.programmed = Some((
            *params.digest,
            params.secret.to_vec(),
            params.seed.to_vec(),
        ));
        Ok(())
    }

    fn kdf_derive(&self, ctx: &mut FakeKdfCtx, out: &mut [u8]) -> Result<(), ProviderStatus> {
        let call = self.derive_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_derive_on_call.load(Ordering::SeqCst) {
            out.fill(0xee);
            self.push_error(0x1c00_0066, Some("derivation failed"));
            self.push_error(0x1c00_0067, Some("follow-up entry"));
            return Err(ProviderStatus(0));
        }
        let Some((digest, secret, seed)) = ctx.programmed.as_ref() else {
            self.push_error(0x1c00_0068, Some("context not programmed"));
            return Err(ProviderStatus(0));
        };
        out.copy_from_slice(&Self::expected_output(digest, secret, seed, out.len()));
        Ok(())
    }

    fn hmac(
        &self,
        digest: &FakeDigest,
        key: &[u8],
        data: &[&[u8]],
        out: &mut [u8],
    ) -> Result<(), ProviderStatus> {
        self.hmac_calls.fetch_add(1, Ordering::SeqCst);
        out.copy_from_slice(&Self::expected_mac(digest, key, data, out.len()));
        Ok(())
    }

    fn error_pop(&self) -> Option<ErrorEntry> {
        self.errors.lock().pop_front()
    }

    fn fips_enabled(&self) -> bool {
        self.fips_mode.load(Ordering::SeqCst)
    }

    fn set_fips(&self, enabled: bool) -> Result<(), ProviderStatus> {
        if !self.fips_settable.load(Ordering::SeqCst) {
            self.push_error(0x0f00_0001, Some("fips module not installed"));
            return Err(ProviderStatus(0));
        }
        self.fips_mode.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}
