// Copyright (C) Microsoft Corporation. All rights reserved.

//! OpenSSL-backed provider binding.
//!
//! Binds the OpenSSL library linked through `openssl-sys`. The TLS PRF runs on
//! the `EVP_PKEY_TLS1_PRF` derivation context, which OpenSSL 1.1.x implements
//! natively and OpenSSL 3.x routes to the provider `TLS1-PRF` KDF. Entry points
//! that differ between major versions are selected at build time from the
//! version reported by `openssl-sys`. HMAC, used for PRF requests the KDF
//! refuses, goes through the `openssl` crate's `Signer`.
//!
//! Raw entry points leave failures on the OpenSSL error queue; the caller
//! drains it through [`Provider::error_pop`].

use std::ffi::c_int;

use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use openssl_sys as ffi;

use super::*;

/// `NID_tls1_prf`, also the `EVP_PKEY_TLS1_PRF` key type.
const NID_TLS1_PRF: c_int = 1021;

/// OpenSSL provider binding.
///
/// This is a zero-sized handle; all state lives in the linked library.
#[derive(Debug, Clone)]
pub struct OsslProvider {
    _priv: (),
}

impl OsslProvider {
    /// Initializes the linked OpenSSL library and returns its binding.
    pub fn new() -> Self {
        ffi::init();
        Self { _priv: () }
    }
}

impl Default for OsslProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Key-derivation algorithm handle, identified by its `EVP_PKEY` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsslKdf {
    nid: c_int,
}

/// Owned `EVP_PKEY_CTX` used for a single derivation.
///
/// The context is freed when the wrapper is dropped.
pub struct OsslKdfCtx {
    inner: *mut ffi::EVP_PKEY_CTX,
}

impl OsslKdfCtx {
    #[allow(unsafe_code)]
    fn new(nid: c_int) -> Option<Self> {
        // SAFETY: a null engine selects the default implementation; the returned
        // pointer is checked before use.
        let inner = unsafe { ffi::EVP_PKEY_CTX_new_id(nid, std::ptr::null_mut()) };
        if inner.is_null() {
            return None;
        }
        Some(Self { inner })
    }
}

impl Drop for OsslKdfCtx {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        // SAFETY: `inner` was allocated by EVP_PKEY_CTX_new_id and is owned
        // exclusively by this wrapper.
        unsafe { ffi::EVP_PKEY_CTX_free(self.inner) }
    }
}

/// Maps a raw OpenSSL return value to a status error.
fn cvt(status: c_int) -> Result<c_int, ProviderStatus> {
    if status <= 0 {
        Err(ProviderStatus(status))
    } else {
        Ok(status)
    }
}

/// Converts a buffer length to the `int` length OpenSSL expects.
fn c_len(len: usize) -> Result<c_int, ProviderStatus> {
    c_int::try_from(len).map_err(|_| ProviderStatus(-1))
}

cfg_if::cfg_if! {
    if #[cfg(ossl300)] {
        #[allow(unsafe_code)]
        extern "C" {
            fn EVP_PKEY_CTX_set_tls1_prf_md(
                ctx: *mut ffi::EVP_PKEY_CTX,
                md: *const ffi::EVP_MD,
            ) -> c_int;
            fn EVP_PKEY_CTX_set1_tls1_prf_secret(
                ctx: *mut ffi::EVP_PKEY_CTX,
                sec: *const u8,
                seclen: c_int,
            ) -> c_int;
            fn EVP_PKEY_CTX_add1_tls1_prf_seed(
                ctx: *mut ffi::EVP_PKEY_CTX,
                seed: *const u8,
                seedlen: c_int,
            ) -> c_int;
            fn EVP_default_properties_is_fips_enabled(libctx: *mut ffi::OSSL_LIB_CTX) -> c_int;
            fn EVP_default_properties_enable_fips(
                libctx: *mut ffi::OSSL_LIB_CTX,
                enable: c_int,
            ) -> c_int;
        }

        #[allow(unsafe_code)]
        fn set_prf_params(
            ctx: *mut ffi::EVP_PKEY_CTX,
            md: &MessageDigest,
            secret: &[u8],
            seed: &[u8],
        ) -> Result<(), ProviderStatus> {
            let secret_len = c_len(secret.len())?;
            let seed_len = c_len(seed.len())?;
            // SAFETY: `ctx` is a live derive-initialized context; OpenSSL copies
            // the secret and seed buffers before returning.
            unsafe {
                cvt(EVP_PKEY_CTX_set_tls1_prf_md(ctx, md.as_ptr()))?;
                cvt(EVP_PKEY_CTX_set1_tls1_prf_secret(ctx, secret.as_ptr(), secret_len))?;
                cvt(EVP_PKEY_CTX_add1_tls1_prf_seed(ctx, seed.as_ptr(), seed_len))?;
            }
            Ok(())
        }

        /// Digest lookups must also succeed under the current default properties,
        /// otherwise a FIPS-restricted library would report legacy digests it
        /// refuses to run.
        fn digest_fetchable(name: &str) -> bool {
            openssl::md::Md::fetch(None, name, None).is_ok()
        }

        #[allow(unsafe_code)]
        fn fips_mode() -> bool {
            // SAFETY: a null library context selects the default context.
            unsafe { EVP_default_properties_is_fips_enabled(std::ptr::null_mut()) == 1 }
        }

        #[allow(unsafe_code)]
        fn set_fips_mode(enabled: bool) -> Result<(), ProviderStatus> {
            // SAFETY: a null library context selects the default context.
            let status = unsafe {
                EVP_default_properties_enable_fips(std::ptr::null_mut(), c_int::from(enabled))
            };
            cvt(status).map(|_| ())
        }
    } else if #[cfg(libressl)] {
        fn set_prf_params(
            ctx: *mut ffi::EVP_PKEY_CTX,
            md: &MessageDigest,
            secret: &[u8],
            seed: &[u8],
        ) -> Result<(), ProviderStatus> {
            legacy_set_prf_params(ctx, md, secret, seed)
        }

        fn digest_fetchable(_name: &str) -> bool {
            true
        }

        fn fips_mode() -> bool {
            false
        }

        fn set_fips_mode(enabled: bool) -> Result<(), ProviderStatus> {
            if enabled {
                Err(ProviderStatus(0))
            } else {
                Ok(())
            }
        }
    } else {
        #[allow(unsafe_code)]
        extern "C" {
            fn FIPS_mode() -> c_int;
            fn FIPS_mode_set(onoff: c_int) -> c_int;
        }

        fn set_prf_params(
            ctx: *mut ffi::EVP_PKEY_CTX,
            md: &MessageDigest,
            secret: &[u8],
            seed: &[u8],
        ) -> Result<(), ProviderStatus> {
            legacy_set_prf_params(ctx, md, secret, seed)
        }

        fn digest_fetchable(_name: &str) -> bool {
            true
        }

        #[allow(unsafe_code)]
        fn fips_mode() -> bool {
            // SAFETY: no arguments; reads library-global state.
            unsafe { FIPS_mode() == 1 }
        }

        #[allow(unsafe_code)]
        fn set_fips_mode(enabled: bool) -> Result<(), ProviderStatus> {
            // SAFETY: no pointers involved; failures are queued by OpenSSL.
            let status = unsafe { FIPS_mode_set(c_int::from(enabled)) };
            cvt(status).map(|_| ())
        }
    }
}

/// Control codes of the pre-3.0 `EVP_PKEY_TLS1_PRF` method.
#[cfg(not(ossl300))]
mod tls_ctrl {
    use std::ffi::c_int;

    const EVP_PKEY_ALG_CTRL: c_int = 0x1000;
    pub(super) const EVP_PKEY_CTRL_TLS_MD: c_int = EVP_PKEY_ALG_CTRL;
    pub(super) const EVP_PKEY_CTRL_TLS_SECRET: c_int = EVP_PKEY_ALG_CTRL + 1;
    pub(super) const EVP_PKEY_CTRL_TLS_SEED: c_int = EVP_PKEY_ALG_CTRL + 2;
}

/// Programs the PRF through `EVP_PKEY_CTX_ctrl`, which is what the
/// `EVP_PKEY_CTX_set_tls1_prf_*` macros expand to before OpenSSL 3.0.
#[cfg(not(ossl300))]
#[allow(unsafe_code)]
fn legacy_set_prf_params(
    ctx: *mut ffi::EVP_PKEY_CTX,
    md: &MessageDigest,
    secret: &[u8],
    seed: &[u8],
) -> Result<(), ProviderStatus> {
    use std::ffi::c_void;

    let secret_len = c_len(secret.len())?;
    let seed_len = c_len(seed.len())?;
    let ctrl = |cmd: c_int, p1: c_int, p2: *const c_void| {
        // SAFETY: `ctx` is a live derive-initialized context; the pointed-to
        // data is copied by OpenSSL before the call returns.
        let status = unsafe {
            ffi::EVP_PKEY_CTX_ctrl(ctx, -1, ffi::EVP_PKEY_OP_DERIVE, cmd, p1, p2 as *mut c_void)
        };
        cvt(status)
    };
    ctrl(tls_ctrl::EVP_PKEY_CTRL_TLS_MD, 0, md.as_ptr() as *const c_void)?;
    ctrl(tls_ctrl::EVP_PKEY_CTRL_TLS_SECRET, secret_len, secret.as_ptr() as *const c_void)?;
    ctrl(tls_ctrl::EVP_PKEY_CTRL_TLS_SEED, seed_len, seed.as_ptr() as *const c_void)?;
    Ok(())
}

/// One-shot HMAC; returns the MAC length, or 0 if `out` is the wrong size.
fn hmac_into(
    md: MessageDigest,
    key: &[u8],
    data: &[&[u8]],
    out: &mut [u8],
) -> Result<usize, ErrorStack> {
    let pkey = PKey::hmac(key)?;
    let mut signer = Signer::new(md, &pkey)?;
    for part in data {
        signer.update(part)?;
    }
    if signer.len()? != out.len() {
        return Ok(0);
    }
    signer.sign(out)
}

impl Provider for OsslProvider {
    type Digest = MessageDigest;
    type Kdf = OsslKdf;
    type KdfCtx = OsslKdfCtx;

    fn version_text(&self) -> String {
        openssl::version::version().to_string()
    }

    fn has_rand(&self) -> bool {
        // RAND_bytes is part of every supported libcrypto.
        true
    }

    #[allow(unsafe_code)]
    fn rand_bytes(&self, buf: &mut [u8]) -> Result<(), ProviderStatus> {
        let len = c_len(buf.len())?;
        // SAFETY: `buf` is valid for writes of `len` bytes.
        let status = unsafe { ffi::RAND_bytes(buf.as_mut_ptr(), len) };
        cvt(status).map(|_| ())
    }

    fn fetch_hash(&self, name: &str) -> Option<MessageDigest> {
        let md = MessageDigest::from_name(name)?;
        digest_fetchable(name).then_some(md)
    }

    fn kdf_fetch(&self, name: &str) -> Option<OsslKdf> {
        let nid = match name {
            crate::TLS1_PRF_NAME => NID_TLS1_PRF,
            _ => return None,
        };

        // The algorithm exists iff a context can be created for it.
        OsslKdfCtx::new(nid).map(|_ctx| OsslKdf { nid })
    }

    fn kdf_ctx_new(&self, kdf: &OsslKdf) -> Option<OsslKdfCtx> {
        OsslKdfCtx::new(kdf.nid)
    }

    #[allow(unsafe_code)]
    fn kdf_program(
        &self,
        ctx: &mut OsslKdfCtx,
        params: &KdfParams<'_, MessageDigest>,
    ) -> Result<(), ProviderStatus> {
        // SAFETY: `ctx.inner` is a live context owned by `ctx`.
        cvt(unsafe { ffi::EVP_PKEY_derive_init(ctx.inner) })?;
        set_prf_params(ctx.inner, params.digest, params.secret, params.seed)
    }

    #[allow(unsafe_code)]
    fn kdf_derive(&self, ctx: &mut OsslKdfCtx, out: &mut [u8]) -> Result<(), ProviderStatus> {
        let mut out_len = out.len();
        // SAFETY: `out` is valid for writes of `out_len` bytes and `out_len`
        // outlives the call.
        cvt(unsafe { ffi::EVP_PKEY_derive(ctx.inner, out.as_mut_ptr(), &mut out_len) })?;

        if out_len != out.len() {
            return Err(ProviderStatus(0));
        }
        Ok(())
    }

    fn hmac(
        &self,
        digest: &MessageDigest,
        key: &[u8],
        data: &[&[u8]],
        out: &mut [u8],
    ) -> Result<(), ProviderStatus> {
        // HMAC zero-pads keys to the block size, so one zero byte is the
        // same key as an empty one.
        let key = if key.is_empty() { &[0u8][..] } else { key };

        match hmac_into(*digest, key, data, out) {
            Ok(len) if len == out.len() => Ok(()),
            Ok(_) => Err(ProviderStatus(-1)),
            Err(stack) => {
                // Hand the entries back to the queue the translator drains.
                stack.put();
                Err(ProviderStatus(0))
            }
        }
    }

    fn error_pop(&self) -> Option<ErrorEntry> {
        openssl::error::Error::get().map(|err| ErrorEntry {
            code: u64::from(err.code()),
            reason: err.reason().map(str::to_string),
        })
    }

    fn fips_enabled(&self) -> bool {
        fips_mode()
    }

    fn set_fips(&self, enabled: bool) -> Result<(), ProviderStatus> {
        set_fips_mode(enabled)
    }
}
