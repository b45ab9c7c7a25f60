// Copyright (C) Microsoft Corporation. All rights reserved.

use super::*;

/// Everything learned about a provider at first use.
///
/// Holds the provider handles the PRF engine needs next to the public report,
/// so the report and the handles can never disagree.
pub(crate) struct ProbeState<P: Provider + ?Sized> {
    pub(crate) caps: Capabilities,
    pub(crate) hashes: HashRegistry<P::Digest>,
    pub(crate) prf: Option<P::Kdf>,
}

impl<P: Provider + ?Sized> ProbeState<P> {
    /// Applies the configured FIPS mode, then probes every feature.
    ///
    /// Lookup misses leave entries on the provider error queue; the queue is
    /// cleared before returning so probing never leaks into the first real call.
    pub(crate) fn new(provider: &P, config: &BridgeConfig) -> Self {
        let fips = apply_fips(provider, config.fips());

        let hashes = HashRegistry::resolve(provider);
        let prf = provider.kdf_fetch(TLS1_PRF_NAME);
        let has_rand = provider.has_rand();

        ErrorTranslator::clear(provider);

        let tls1_prf = if prf.is_some() {
            Support::available()
        } else {
            Support::missing(format!("provider has no {TLS1_PRF_NAME} key derivation"))
        };
        let rand = if has_rand {
            Support::available()
        } else {
            Support::missing("provider has no secure random source")
        };
        let hash_support = std::array::from_fn(|index| {
            let id = HashId::ALL[index];
            if hashes.supports(id) {
                Support::available()
            } else if id == HashId::Md5Sha1 {
                Support::missing("requires both MD5 and SHA1")
            } else {
                Support::missing(format!("provider cannot fetch {}", id.canonical_name()))
            }
        });

        let caps = Capabilities {
            tls1_prf,
            rand,
            hashes: hash_support,
            md5_sha1: hashes.md5_sha1_strategy(),
            version: provider.version_text(),
            fips,
        };

        tracing::debug!(
            version = %caps.version,
            tls1_prf = caps.tls1_prf.is_supported(),
            rand = caps.rand.is_supported(),
            fips = caps.fips.enabled,
            "probed provider"
        );
        tracing::debug!(strategy = ?caps.md5_sha1, hashes = ?hashes, "resolved hash registry");

        Self { caps, hashes, prf }
    }
}

fn apply_fips<P: Provider + ?Sized>(provider: &P, requested: Option<bool>) -> FipsStatus {
    let error = match requested {
        Some(enabled) => match provider.set_fips(enabled) {
            Ok(()) => None,
            Err(status) => {
                let err = ErrorTranslator::provider_failure(provider);
                tracing::warn!(
                    requested = enabled,
                    status = status.0,
                    error = %err,
                    "could not apply FIPS mode"
                );
                Some(err)
            }
        },
        None => None,
    };

    FipsStatus {
        requested,
        enabled: provider.fips_enabled(),
        error,
    }
}
