// Copyright (C) Microsoft Corporation. All rights reserved.

//! Translation of provider error-queue state into [`BridgeError`] values.
//!
//! The provider reports failures through a status code plus a per-thread FIFO
//! queue of error entries. Every failure path drains that queue completely so
//! that no entry survives into a later, unrelated call.

use super::*;

/// Code reported when the provider signalled failure without queueing an entry.
pub(crate) const UNKNOWN_ERROR_CODE: u64 = 0;

/// Converts provider failures into the crate error taxonomy.
pub(crate) struct ErrorTranslator;

impl ErrorTranslator {
    /// Builds a [`BridgeError::ProviderFailure`] from the provider error queue.
    ///
    /// The oldest queued entry is reported; all other entries are discarded.
    /// An empty queue yields the unknown code with an empty reason.
    pub(crate) fn provider_failure<P: Provider + ?Sized>(provider: &P) -> BridgeError {
        match Self::drain(provider) {
            Some(entry) => BridgeError::ProviderFailure {
                code: entry.code,
                reason: entry.reason.unwrap_or_default(),
            },
            None => BridgeError::ProviderFailure {
                code: UNKNOWN_ERROR_CODE,
                reason: String::new(),
            },
        }
    }

    /// Same as [`Self::provider_failure`], logging the failed entry point.
    pub(crate) fn report<P: Provider + ?Sized>(provider: &P, op: &'static str) -> BridgeError {
        let err = Self::provider_failure(provider);
        if let BridgeError::ProviderFailure { code, reason } = &err {
            tracing::error!(op, code, reason = %reason, "provider call failed");
        }
        err
    }

    /// Discards every queued entry without building an error.
    pub(crate) fn clear<P: Provider + ?Sized>(provider: &P) {
        let _ = Self::drain(provider);
    }

    /// Pops the whole queue and returns its oldest entry.
    fn drain<P: Provider + ?Sized>(provider: &P) -> Option<ErrorEntry> {
        let oldest = provider.error_pop()?;
        let mut discarded = 0usize;
        while provider.error_pop().is_some() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::trace!(discarded, "dropped newer provider error entries");
        }
        Some(oldest)
    }
}
