// Copyright (C) Microsoft Corporation. All rights reserved.

//! Streaming reader over the provider's CSPRNG.
//!
//! A [`RandReader`] fills caller buffers from the provider's secure random
//! source. Large requests are split into back-to-back provider calls of at
//! most [`RAND_CHUNK_CAP`] bytes each; a request either fills the whole buffer
//! or fails, in which case the buffer is zeroed and nothing is retried.
//!
//! The reader also implements [`std::io::Read`] and the `rand_core`
//! [`TryRngCore`]/[`TryCryptoRng`] traits, so it can drive ecosystem
//! consumers directly.

use std::ffi::c_int;

use rand_core::TryCryptoRng;
use rand_core::TryRngCore;

use super::*;


/// Most bytes requested from the provider in a single call.
pub const RAND_CHUNK_CAP: usize = 1 << 20;

// The provider takes an `int` length.
const _: () = assert!(RAND_CHUNK_CAP <= c_int::MAX as usize);

/// Byte reader backed by the provider's secure random source.
///
/// Readers are cheap; distinct readers may be used from different threads
/// at the same time.
pub struct RandReader<'a, P: Provider + ?Sized> {
    provider: &'a P,
    available: bool,
}

impl<'a, P: Provider + ?Sized> RandReader<'a, P> {
    pub(crate) fn new(provider: &'a P, caps: &Capabilities) -> Self {
        Self {
            provider,
            available: caps.supports(Feature::Rand),
        }
    }

    /// Fills `buf` with random bytes and returns `buf.len()`.
    ///
    /// An empty buffer returns `0` without calling the provider. If any
    /// provider call fails, `buf` is zeroed and the provider error is
    /// returned.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, BridgeError> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.available {
            return Err(BridgeError::Unsupported(Feature::Rand));
        }

        let mut offset = 0;
        while offset < buf.len() {
            let end = buf.len().min(offset + RAND_CHUNK_CAP);
            if self.provider.rand_bytes(&mut buf[offset..end]).is_err() {
                buf.fill(0);
                return Err(ErrorTranslator::report(self.provider, "rand_bytes"));
            }
            offset = end;
        }
        Ok(buf.len())
    }

    /// Returns `len` fresh random bytes.
    pub fn rand_vec(&mut self, len: usize) -> Result<Vec<u8>, BridgeError> {
        let mut buf = vec![0u8; len];
        self.read(&mut buf)?;
        Ok(buf)
    }
}

impl<P: Provider + ?Sized> std::io::Read for RandReader<'_, P> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        RandReader::read(self, buf).map_err(std::io::Error::from)
    }
}

impl<P: Provider + ?Sized> TryRngCore for RandReader<'_, P> {
    type Error = BridgeError;

    fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
        let mut bytes = [0u8; 4];
        RandReader::read(self, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
        let mut bytes = [0u8; 8];
        RandReader::read(self, &mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }

    fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), Self::Error> {
        RandReader::read(self, dst).map(|_| ())
    }
}

impl<P: Provider + ?Sized> TryCryptoRng for RandReader<'_, P> {}
