// Copyright (C) Microsoft Corporation. All rights reserved.

//! Capability report of the linked provider.
//!
//! The report is computed once per [`Bridge`] the first time any operation
//! needs it and never changes afterwards, so repeated support queries always
//! agree with each other.

use std::fmt;

use super::*;

mod probe;

pub(crate) use probe::*;


/// A provider feature the bridge can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// The `TLS1-PRF` key-derivation algorithm.
    Tls1Prf,
    /// The secure random source.
    Rand,
    /// A digest usable as the PRF hash.
    Hash(HashId),
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Tls1Prf => f.write_str("TLS1PRF"),
            Feature::Rand => f.write_str("RAND"),
            Feature::Hash(id) => write!(f, "HASH:{id}"),
        }
    }
}

/// Whether a feature is available and, if not, why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Support {
    supported: bool,
    reason: String,
}

impl Support {
    pub(crate) fn available() -> Self {
        Self {
            supported: true,
            reason: String::new(),
        }
    }

    pub(crate) fn missing(reason: impl Into<String>) -> Self {
        Self {
            supported: false,
            reason: reason.into(),
        }
    }

    /// Whether the feature can be used.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Why the feature is unavailable; `None` when it is supported.
    pub fn reason(&self) -> Option<&str> {
        (!self.supported).then_some(self.reason.as_str())
    }
}

/// How a TLS 1.0/1.1 (`MD5SHA1`) PRF request is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Md5Sha1Strategy {
    /// One derivation with the provider's composite `MD5-SHA1` digest.
    Composite,
    /// `P_MD5` and `P_SHA1` derived separately and XORed.
    Split,
    /// MD5 or SHA1 is missing; `MD5SHA1` is unsupported.
    None,
}

/// Outcome of the FIPS mode request applied before probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FipsStatus {
    requested: Option<bool>,
    enabled: bool,
    error: Option<BridgeError>,
}

impl FipsStatus {
    /// Mode requested through [`BridgeConfig`], if any.
    pub fn requested(&self) -> Option<bool> {
        self.requested
    }

    /// Whether FIPS-only algorithm selection is active.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Provider failure reported when the request could not be applied.
    pub fn error(&self) -> Option<&BridgeError> {
        self.error.as_ref()
    }
}

/// Immutable capability report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    tls1_prf: Support,
    rand: Support,
    hashes: [Support; HashId::COUNT],
    md5_sha1: Md5Sha1Strategy,
    version: String,
    fips: FipsStatus,
}

impl Capabilities {
    /// Support entry of `feature`.
    pub fn support(&self, feature: Feature) -> &Support {
        match feature {
            Feature::Tls1Prf => &self.tls1_prf,
            Feature::Rand => &self.rand,
            Feature::Hash(id) => &self.hashes[id.index()],
        }
    }

    /// Whether `feature` is supported.
    pub fn supports(&self, feature: Feature) -> bool {
        self.support(feature).is_supported()
    }

    /// Every feature with its support entry.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, &Support)> + '_ {
        [Feature::Tls1Prf, Feature::Rand]
            .into_iter()
            .chain(HashId::ALL.into_iter().map(Feature::Hash))
            .map(move |feature| (feature, self.support(feature)))
    }

    /// Strategy chosen for `MD5SHA1` requests.
    pub fn md5_sha1_strategy(&self) -> Md5Sha1Strategy {
        self.md5_sha1
    }

    /// Version text of the provider the report describes.
    pub fn version_text(&self) -> &str {
        &self.version
    }

    /// FIPS mode outcome.
    pub fn fips(&self) -> &FipsStatus {
        &self.fips
    }
}
