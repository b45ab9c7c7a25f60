// Copyright (C) Microsoft Corporation. All rights reserved.

use std::env;

/// First OpenSSL release that ships the provider architecture.
const OPENSSL_3_0_0: u64 = 0x3000_0000;

fn openssl_version_number() -> Option<u64> {
    // Exported by openssl-sys through its `links = "openssl"` manifest key.
    let version = env::var("DEP_OPENSSL_VERSION_NUMBER").ok()?;
    match u64::from_str_radix(version.trim(), 16) {
        Ok(number) => Some(number),
        Err(_) => {
            println!("cargo:warning=unparseable OpenSSL version number {version}");
            None
        }
    }
}

fn main() {
    println!("cargo:rustc-check-cfg=cfg(ossl300)");
    println!("cargo:rustc-check-cfg=cfg(libressl)");
    println!("cargo:rerun-if-env-changed=DEP_OPENSSL_VERSION_NUMBER");

    // LibreSSL reports its own version separately and never has providers.
    if env::var("DEP_OPENSSL_LIBRESSL_VERSION_NUMBER").is_ok() {
        println!("cargo:rustc-cfg=libressl");
        return;
    }

    if let Some(version) = openssl_version_number() {
        if version >= OPENSSL_3_0_0 {
            println!("cargo:rustc-cfg=ossl300");
        }
    }
}
