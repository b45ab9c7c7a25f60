// Copyright (C) Microsoft Corporation. All rights reserved.

use super::*;

/// Fixed table mapping every [`HashId`] to an optional provider digest handle.
///
/// Built once per bridge and read-only afterwards. Lookups are a single array
/// index.
pub struct HashRegistry<D> {
    handles: [Option<D>; HashId::COUNT],
}

impl<D> HashRegistry<D> {
    /// Resolves every identifier against `provider`.
    ///
    /// The canonical name is tried first and the legacy alias second. For
    /// `MD5SHA1` only the composite `MD5-SHA1` digest is looked up; its absence
    /// is not fatal since the split construction only needs MD5 and SHA1.
    pub fn resolve<P>(provider: &P) -> Self
    where
        P: Provider<Digest = D> + ?Sized,
    {
        let handles = std::array::from_fn(|index| {
            let id = HashId::ALL[index];
            provider.fetch_hash(id.canonical_name()).or_else(|| {
                id.legacy_alias()
                    .and_then(|alias| provider.fetch_hash(alias))
            })
        });
        Self { handles }
    }

    /// Digest handle for `id`, if the provider supplied one.
    ///
    /// For [`HashId::Md5Sha1`] this is the composite digest, which may be
    /// absent even when [`Self::supports`] is true.
    pub fn get(&self, id: HashId) -> Option<&D> {
        self.handles[id.index()].as_ref()
    }

    /// Whether a TLS PRF over `id` can run on this provider.
    pub fn supports(&self, id: HashId) -> bool {
        match id {
            HashId::Md5Sha1 => self.get(HashId::Md5).is_some() && self.get(HashId::Sha1).is_some(),
            _ => self.get(id).is_some(),
        }
    }

    /// How a `MD5SHA1` PRF request is computed.
    pub fn md5_sha1_strategy(&self) -> Md5Sha1Strategy {
        if !self.supports(HashId::Md5Sha1) {
            Md5Sha1Strategy::None
        } else if self.get(HashId::Md5Sha1).is_some() {
            Md5Sha1Strategy::Composite
        } else {
            Md5Sha1Strategy::Split
        }
    }
}

impl<D> fmt::Debug for HashRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                HashId::ALL
                    .iter()
                    .map(|id| (id.name(), self.get(*id).is_some())),
            )
            .finish()
    }
}
