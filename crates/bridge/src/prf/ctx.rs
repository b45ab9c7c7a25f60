// Copyright (C) Microsoft Corporation. All rights reserved.

use super::*;

/// Scoped owner of one provider derivation context.
///
/// Tracks the [`PrfState`] of the call it serves. The provider context is
/// released exactly once, when the guard is dropped, whichever way the call
/// leaves: success, error return or unwinding.
pub(crate) struct KdfContext<'a, P: Provider + ?Sized> {
    provider: &'a P,
    ctx: Option<P::KdfCtx>,
    state: PrfState,
}

impl<'a, P: Provider + ?Sized> KdfContext<'a, P> {
    /// Allocates a context for `kdf`.
    pub(crate) fn new(provider: &'a P, kdf: &P::Kdf) -> Result<Self, BridgeError> {
        PrfState::Validated.trace();
        match provider.kdf_ctx_new(kdf) {
            Some(ctx) => {
                let mut guard = Self {
                    provider,
                    ctx: Some(ctx),
                    state: PrfState::Validated,
                };
                guard.advance(PrfState::CtxAllocated);
                Ok(guard)
            }
            None => {
                PrfState::Freed.trace();
                Err(ErrorTranslator::report(provider, "kdf_ctx_new"))
            }
        }
    }

    /// Programs `params`, then fills `out`.
    ///
    /// The state only reaches [`PrfState::Programmed`] once the provider has
    /// accepted the parameters.
    pub(crate) fn derive(
        &mut self,
        params: &KdfParams<'_, P::Digest>,
        out: &mut [u8],
    ) -> Result<(), BridgeError> {
        if self.state != PrfState::CtxAllocated {
            return Err(BridgeError::Internal("derivation context reused"));
        }

        let ctx = self
            .ctx
            .as_mut()
            .ok_or(BridgeError::Internal("derivation context already released"))?;
        if self.provider.kdf_program(ctx, params).is_err() {
            return Err(ErrorTranslator::report(self.provider, "kdf_program"));
        }
        self.advance(PrfState::Programmed);

        let ctx = self
            .ctx
            .as_mut()
            .ok_or(BridgeError::Internal("derivation context already released"))?;
        if self.provider.kdf_derive(ctx, out).is_err() {
            return Err(ErrorTranslator::report(self.provider, "kdf_derive"));
        }
        self.advance(PrfState::Derived);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> PrfState {
        self.state
    }

    fn advance(&mut self, next: PrfState) {
        self.state = next;
        next.trace();
    }
}

impl<P: Provider + ?Sized> Drop for KdfContext<'_, P> {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.provider.kdf_ctx_free(ctx);
        }
        self.advance(PrfState::Freed);
    }
}
