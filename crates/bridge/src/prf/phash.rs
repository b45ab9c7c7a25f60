// Copyright (C) Microsoft Corporation. All rights reserved.

use zeroize::Zeroizing;

use super::*;

/// RFC 5246 `P_hash(secret, seed)` over the provider's HMAC.
///
/// `block` is the digest output size. Fills all of `out`.
pub(crate) fn p_hash<P: Provider + ?Sized>(
    provider: &P,
    digest: &P::Digest,
    block: usize,
    secret: &[u8],
    seed: &[u8],
    out: &mut [u8],
) -> Result<(), BridgeError> {
    let mac = |data: &[&[u8]], dst: &mut [u8]| {
        provider
            .hmac(digest, secret, data, dst)
            .map_err(|_| ErrorTranslator::report(provider, "hmac"))
    };

    // A(1) = HMAC(secret, seed)
    let mut a = Zeroizing::new(vec![0u8; block]);
    mac(&[seed], &mut a[..])?;

    let mut chunk = Zeroizing::new(vec![0u8; block]);
    let mut next = Zeroizing::new(vec![0u8; block]);
    for dst in out.chunks_mut(block) {
        mac(&[&a[..], seed], &mut chunk[..])?;
        dst.copy_from_slice(&chunk[..dst.len()]);

        mac(&[&a[..]], &mut next[..])?;
        std::mem::swap(&mut a, &mut next);
    }
    Ok(())
}
