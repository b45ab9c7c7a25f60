// Copyright (C) Microsoft Corporation. All rights reserved.

//! Hash identifiers and their provider-side names.
//!
//! [`HashId`] is the closed set of digests the TLS PRF can run over. The
//! [`HashRegistry`] resolves each identifier to a provider digest handle once
//! and answers support queries from that table afterwards.
//!
//! # Naming
//!
//! OpenSSL 3 prefers the `SHA2-*` spellings while 1.1.x only knows the legacy
//! `SHA*` aliases, so every SHA-2 member carries both. `MD5SHA1` is the TLS
//! 1.0/1.1 pseudo-hash; its composite provider name is `MD5-SHA1`.

use std::fmt;

use super::*;

mod registry;

pub use registry::*;


/// Standard hash algorithms accepted by the TLS PRF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashId {
    /// MD5.
    Md5,
    /// SHA-1.
    Sha1,
    /// MD5 ⊕ SHA-1 pseudo-hash of the TLS 1.0/1.1 PRF.
    Md5Sha1,
    /// SHA-224.
    Sha224,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
    /// SHA3-256.
    Sha3_256,
    /// SHA3-384.
    Sha3_384,
    /// SHA3-512.
    Sha3_512,
}

impl HashId {
    /// Number of identifiers.
    pub const COUNT: usize = 10;

    /// Every identifier, in declaration order.
    pub const ALL: [HashId; HashId::COUNT] = [
        HashId::Md5,
        HashId::Sha1,
        HashId::Md5Sha1,
        HashId::Sha224,
        HashId::Sha256,
        HashId::Sha384,
        HashId::Sha512,
        HashId::Sha3_256,
        HashId::Sha3_384,
        HashId::Sha3_512,
    ];

    /// Display name, as used in `HASH:<name>` capability keys.
    pub const fn name(self) -> &'static str {
        match self {
            HashId::Md5 => "MD5",
            HashId::Sha1 => "SHA1",
            HashId::Md5Sha1 => "MD5SHA1",
            HashId::Sha224 => "SHA224",
            HashId::Sha256 => "SHA256",
            HashId::Sha384 => "SHA384",
            HashId::Sha512 => "SHA512",
            HashId::Sha3_256 => "SHA3-256",
            HashId::Sha3_384 => "SHA3-384",
            HashId::Sha3_512 => "SHA3-512",
        }
    }

    /// Name the provider fetches the digest by.
    pub const fn canonical_name(self) -> &'static str {
        match self {
            HashId::Md5 => "MD5",
            HashId::Sha1 => "SHA1",
            HashId::Md5Sha1 => "MD5-SHA1",
            HashId::Sha224 => "SHA2-224",
            HashId::Sha256 => "SHA2-256",
            HashId::Sha384 => "SHA2-384",
            HashId::Sha512 => "SHA2-512",
            HashId::Sha3_256 => "SHA3-256",
            HashId::Sha3_384 => "SHA3-384",
            HashId::Sha3_512 => "SHA3-512",
        }
    }

    /// Pre-3.0 alias, for members whose canonical name older providers reject.
    pub const fn legacy_alias(self) -> Option<&'static str> {
        match self {
            HashId::Sha224 => Some("SHA224"),
            HashId::Sha256 => Some("SHA256"),
            HashId::Sha384 => Some("SHA384"),
            HashId::Sha512 => Some("SHA512"),
            _ => None,
        }
    }

    /// Digest length in bytes.
    pub const fn size(self) -> usize {
        match self {
            HashId::Md5 => 16,
            HashId::Sha1 => 20,
            HashId::Md5Sha1 => 36,
            HashId::Sha224 => 28,
            HashId::Sha256 | HashId::Sha3_256 => 32,
            HashId::Sha384 | HashId::Sha3_384 => 48,
            HashId::Sha512 | HashId::Sha3_512 => 64,
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for HashId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
