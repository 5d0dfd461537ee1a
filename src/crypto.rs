/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The cryptography provider seam: SHA-256 and HMAC-SHA256, consumed as a capability object
//! rather than reimplemented here.

use crate::error::KmsRequestError;
use hmac::{digest::FixedOutput, Hmac, Mac};
use sha2::{Digest, Sha256};

/// SHA-256 / HMAC-SHA256, as a thin capability object.
///
/// Implementations should only fail on resource exhaustion in the underlying library; the
/// default implementation backed by `sha2`/`hmac` never does.
pub trait CryptoProvider {
    /// Computes the SHA-256 digest of `input`.
    fn sha256(&self, input: &[u8]) -> Result<[u8; 32], KmsRequestError>;

    /// Computes HMAC-SHA256 over `msg` keyed by `key`.
    fn hmac_sha256(&self, key: &[u8], msg: &[u8]) -> Result<[u8; 32], KmsRequestError>;
}

/// The default [`CryptoProvider`], backed by the `sha2` and `hmac` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCryptoProvider;

impl CryptoProvider for DefaultCryptoProvider {
    fn sha256(&self, input: &[u8]) -> Result<[u8; 32], KmsRequestError> {
        let mut hasher = Sha256::new();
        hasher.update(input);
        Ok(hasher.finalize_fixed().into())
    }

    fn hmac_sha256(&self, key: &[u8], msg: &[u8]) -> Result<[u8; 32], KmsRequestError> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(key).map_err(|_| KmsRequestError::crypto())?;
        mac.update(msg);
        Ok(mac.finalize_fixed().into())
    }
}

/// Lowercase-hex encoding of `bytes`.
pub(crate) fn hex_lower(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
