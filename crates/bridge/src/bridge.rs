// Copyright (C) Microsoft Corporation. All rights reserved.

//! Bridge facade and the process-wide OpenSSL instance.

use std::sync::OnceLock;

use super::*;
use crate::caps::ProbeState;

/// A provider together with its lazily probed capabilities.
///
/// The first operation that needs capability data probes the provider under a
/// single-init barrier; every later query reads the published result without
/// locking. The probe is never repeated.
pub struct Bridge<P: Provider> {
    provider: P,
    config: BridgeConfig,
    probe: OnceLock<ProbeState<P>>,
}

impl<P: Provider> Bridge<P> {
    /// Wraps `provider`. Nothing is probed until first use.
    pub fn new(provider: P, config: BridgeConfig) -> Self {
        Self {
            provider,
            config,
            probe: OnceLock::new(),
        }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Configuration the bridge was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn state(&self) -> &ProbeState<P> {
        self.probe
            .get_or_init(|| ProbeState::new(&self.provider, &self.config))
    }

    /// Capability report of the provider.
    pub fn capabilities(&self) -> &Capabilities {
        &self.state().caps
    }

    /// Whether the `TLS1-PRF` key derivation is available.
    pub fn supports_tls1_prf(&self) -> bool {
        self.capabilities().supports(Feature::Tls1Prf)
    }

    /// Whether the TLS PRF can run over `hash`.
    pub fn supports_hash(&self, hash: HashId) -> bool {
        self.capabilities().supports(Feature::Hash(hash))
    }

    /// Whether FIPS-only algorithm selection is active.
    pub fn fips_enabled(&self) -> bool {
        self.capabilities().fips().enabled()
    }

    /// Computes `out_len` bytes of `PRF(secret, label, seed)` over `hash`.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Unsupported`] if the provider lacks `TLS1-PRF` or `hash`
    /// - [`BridgeError::InvalidArgument`] if `out_len` exceeds [`MAX_PRF_OUT`]
    /// - [`BridgeError::ProviderFailure`] if the derivation fails
    pub fn tls1_prf(
        &self,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        out_len: usize,
        hash: HashId,
    ) -> Result<Vec<u8>, BridgeError> {
        let state = self.state();
        Tls1Prf::new(&self.provider, state).derive(secret, label, seed, hash, out_len)
    }

    /// Fills `out` with `PRF(secret, label, seed)` over `hash`.
    ///
    /// Fails like [`Self::tls1_prf`]; `out` is zeroed on any error.
    pub fn tls1_prf_into(
        &self,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        hash: HashId,
        out: &mut [u8],
    ) -> Result<(), BridgeError> {
        let state = self.state();
        Tls1Prf::new(&self.provider, state).derive_into(secret, label, seed, hash, out)
    }

    /// New reader over the provider's secure random source.
    pub fn rand_reader(&self) -> RandReader<'_, P> {
        RandReader::new(&self.provider, self.capabilities())
    }
}

static GLOBAL: OnceLock<Bridge<OsslProvider>> = OnceLock::new();

impl Bridge<OsslProvider> {
    /// Process-wide bridge over the linked OpenSSL.
    ///
    /// Created on first call with [`BridgeConfig::from_env`].
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| Bridge::new(OsslProvider::new(), BridgeConfig::from_env()))
    }
}

/// Whether the linked OpenSSL supplies `TLS1-PRF`.
pub fn supports_tls1_prf() -> bool {
    Bridge::global().supports_tls1_prf()
}

/// Whether the TLS PRF can run over `hash` on the linked OpenSSL.
pub fn supports_hash(hash: HashId) -> bool {
    Bridge::global().supports_hash(hash)
}

/// Computes `out_len` bytes of TLS PRF output on the linked OpenSSL.
///
/// See [`Bridge::tls1_prf`].
pub fn tls1_prf(
    secret: &[u8],
    label: &[u8],
    seed: &[u8],
    out_len: usize,
    hash: HashId,
) -> Result<Vec<u8>, BridgeError> {
    Bridge::global().tls1_prf(secret, label, seed, out_len, hash)
}

/// Fills `out` with TLS PRF output on the linked OpenSSL.
pub fn tls1_prf_into(
    secret: &[u8],
    label: &[u8],
    seed: &[u8],
    hash: HashId,
    out: &mut [u8],
) -> Result<(), BridgeError> {
    Bridge::global().tls1_prf_into(secret, label, seed, hash, out)
}

/// New reader over the linked OpenSSL CSPRNG.
pub fn new_rand_reader() -> RandReader<'static, OsslProvider> {
    Bridge::global().rand_reader()
}

/// Capability report of the linked OpenSSL.
pub fn capabilities() -> &'static Capabilities {
    Bridge::global().capabilities()
}

/// Version text of the linked OpenSSL.
pub fn version_text() -> &'static str {
    capabilities().version_text()
}

/// Whether the linked OpenSSL runs with FIPS-only algorithm selection.
pub fn fips_enabled() -> bool {
    Bridge::global().fips_enabled()
}
