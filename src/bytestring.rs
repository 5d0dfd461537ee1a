/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! A byte buffer with the escape/lowercase/strip/hex operations the canonicalizer needs.
//!
//! Bytes with the high bit set are never touched by the ASCII-only transforms here: UTF-8
//! continuation and lead bytes pass through verbatim, so non-ASCII text round-trips exactly.

use crate::crypto::CryptoProvider;
use crate::error::KmsRequestError;

/// RFC 3986 `unreserved` set: `A-Z a-z 0-9 - _ . ~`.
///
/// A `const` lookup table, computed once at compile time rather than lazily initialized at
/// runtime -- avoids any one-time-init primitive or synchronization for read-only global state.
const UNRESERVED: [bool; 256] = {
    let mut table = [false; 256];
    let mut i = 0u8;
    loop {
        table[i as usize] = i.is_ascii_alphanumeric() || matches!(i, b'-' | b'_' | b'.' | b'~');
        if i == 255 {
            break;
        }
        i += 1;
    }
    table
};

fn is_ascii_whitespace_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0B /* VT */ | 0x0C /* FF */)
}

/// A growable buffer of bytes, preserved verbatim except where an operation explicitly says
/// otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteString(Vec<u8>);

impl ByteString {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a buffer from raw bytes, copying them verbatim.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(bytes.as_ref().to_vec())
    }

    /// Returns the buffer contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes currently stored.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interprets the buffer as UTF-8, lossily replacing any invalid sequences.
    pub fn to_string_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// Appends another buffer's bytes verbatim.
    pub fn append(&mut self, other: impl AsRef<[u8]>) {
        self.0.extend_from_slice(other.as_ref());
    }

    /// Appends a single byte.
    pub fn append_byte(&mut self, byte: u8) {
        self.0.push(byte);
    }

    /// Appends a `\n`.
    pub fn append_newline(&mut self) {
        self.0.push(b'\n');
    }

    /// Appends `other`, lowercasing ASCII `A-Z` only; high-bit-set bytes are copied untouched.
    pub fn append_lowercase(&mut self, other: impl AsRef<[u8]>) {
        self.0
            .extend(other.as_ref().iter().map(|b| b.to_ascii_lowercase()));
    }

    /// Appends `other` after trimming leading/trailing ASCII whitespace and collapsing internal
    /// runs of ASCII whitespace to a single space.
    pub fn append_stripped(&mut self, other: impl AsRef<[u8]>) {
        let bytes = other.as_ref();
        let start = bytes
            .iter()
            .position(|&b| !is_ascii_whitespace_byte(b))
            .unwrap_or(bytes.len());
        let end = bytes
            .iter()
            .rposition(|&b| !is_ascii_whitespace_byte(b))
            .map(|i| i + 1)
            .unwrap_or(start);

        let mut pending_space = false;
        for &b in &bytes[start..end] {
            if is_ascii_whitespace_byte(b) {
                pending_space = true;
            } else {
                if pending_space {
                    self.0.push(b' ');
                    pending_space = false;
                }
                self.0.push(b);
            }
        }
    }

    /// RFC 3986 percent-encoding of `other`, byte-wise. Unreserved bytes (and `/` when
    /// `escape_slash` is false) are copied as-is; everything else becomes `%HH` with uppercase
    /// hex digits.
    pub fn append_escaped(&mut self, other: impl AsRef<[u8]>, escape_slash: bool) {
        for &b in other.as_ref() {
            if UNRESERVED[b as usize] || (b == b'/' && !escape_slash) {
                self.0.push(b);
            } else {
                self.0.extend_from_slice(format!("%{b:02X}").as_bytes());
            }
        }
    }

    /// Appends the lowercase hex encoding of `bytes`.
    pub fn append_hex(&mut self, bytes: impl AsRef<[u8]>) {
        self.0.extend_from_slice(hex::encode(bytes).as_bytes());
    }

    /// Appends the lowercase-hex SHA-256 digest of `other`, computed via `crypto`.
    pub fn append_hashed(
        &mut self,
        other: impl AsRef<[u8]>,
        crypto: &dyn CryptoProvider,
    ) -> Result<(), KmsRequestError> {
        let digest = crypto.sha256(other.as_ref())?;
        self.append_hex(digest);
        Ok(())
    }
}

impl From<&str> for ByteString {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for ByteString {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every unreserved byte round-trips through `append_escaped` unchanged, and escaping
        /// an already-unreserved-only string twice is the same as escaping it once.
        #[test]
        fn escape_is_idempotent_on_unreserved_only_input(s in "[A-Za-z0-9._~-]{0,64}") {
            let mut once = ByteString::new();
            once.append_escaped(s.as_bytes(), true);
            let mut twice = ByteString::new();
            twice.append_escaped(once.as_bytes(), true);
            prop_assert_eq!(once.as_bytes(), s.as_bytes());
            prop_assert_eq!(twice.as_bytes(), once.as_bytes());
        }

        /// `append_lowercase` only ever changes ASCII `A-Z` bytes; every other byte, including
        /// high-bit-set UTF-8 continuation/lead bytes, passes through unchanged.
        #[test]
        fn lowercase_never_touches_non_ascii_alpha_bytes(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let mut out = ByteString::new();
            out.append_lowercase(&bytes);
            for (input, output) in bytes.iter().zip(out.as_bytes().iter()) {
                if input.is_ascii_uppercase() {
                    prop_assert_eq!(*output, input.to_ascii_lowercase());
                } else {
                    prop_assert_eq!(*output, *input);
                }
            }
        }

        /// Stripping leading/trailing/internal whitespace twice is the same as stripping once.
        #[test]
        fn strip_is_idempotent(s in "[a-zA-Z0-9 \t]{0,64}") {
            let mut once = ByteString::new();
            once.append_stripped(s.as_bytes());
            let mut twice = ByteString::new();
            twice.append_stripped(once.as_bytes());
            prop_assert_eq!(once.as_bytes(), twice.as_bytes());
        }
    }
}
