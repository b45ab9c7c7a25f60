// Copyright (C) Microsoft Corporation. All rights reserved.

//! Process-level bridge configuration.

/// Environment variable requesting FIPS-only algorithm selection.
///
/// Accepts `1`, `true` or `on` to request FIPS mode and `0`, `false` or `off`
/// to request it disabled. Any other value is ignored.
pub const FIPS_ENV_VAR: &str = "OSSL_BRIDGE_FIPS";

/// Settings applied once, before the provider is probed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    fips: Option<bool>,
}

impl BridgeConfig {
    /// Configuration that leaves the provider's defaults untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        let value = std::env::var(FIPS_ENV_VAR).ok();
        Self::from_var(value.as_deref())
    }

    /// Builds the configuration from the raw value of [`FIPS_ENV_VAR`].
    pub fn from_var(value: Option<&str>) -> Self {
        let fips = value.and_then(|raw| {
            let parsed = parse_flag(raw);
            if parsed.is_none() {
                tracing::warn!(var = FIPS_ENV_VAR, value = raw, "ignoring unrecognized value");
            }
            parsed
        });
        Self { fips }
    }

    /// Requests FIPS mode on or off.
    pub fn with_fips(mut self, enabled: bool) -> Self {
        self.fips = Some(enabled);
        self
    }

    /// Requested FIPS mode, `None` when the provider default is kept.
    pub fn fips(&self) -> Option<bool> {
        self.fips
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}
