/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The sticky failure type every fallible operation on a [`crate::request::Request`] returns.

use std::error::Error;
use std::fmt;

/// Maximum length, in bytes, of the message retained on a failed [`crate::request::Request`].
///
/// A fixed cap keeps the sticky error message bounded rather than growing without limit on a
/// request that stays alive after failing.
pub(crate) const ERROR_MESSAGE_CAP: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
enum KmsRequestErrorKind {
    Parse { message: String },
    ProtocolPrecondition { message: String },
    Crypto,
    AlreadyFailed,
}

/// An error produced while building or signing a [`crate::request::Request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmsRequestError {
    kind: KmsRequestErrorKind,
}

impl KmsRequestError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: KmsRequestErrorKind::Parse {
                message: message.into(),
            },
        }
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self {
            kind: KmsRequestErrorKind::ProtocolPrecondition {
                message: message.into(),
            },
        }
    }

    pub(crate) fn crypto() -> Self {
        Self {
            kind: KmsRequestErrorKind::Crypto,
        }
    }

    pub(crate) fn already_failed() -> Self {
        Self {
            kind: KmsRequestErrorKind::AlreadyFailed,
        }
    }

    /// The one-line message stored on a failed `Request`, truncated to
    /// [`ERROR_MESSAGE_CAP`] bytes the way the original fixed-size error buffer was.
    pub(crate) fn sticky_message(&self) -> String {
        let mut message = self.to_string();
        if message.len() > ERROR_MESSAGE_CAP {
            // Floor to a char boundary so we never split a multi-byte UTF-8 sequence.
            let mut cut = ERROR_MESSAGE_CAP;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        message
    }
}

impl fmt::Display for KmsRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use KmsRequestErrorKind::*;
        match &self.kind {
            Parse { message } => write!(f, "{message}"),
            ProtocolPrecondition { message } => write!(f, "{message}"),
            Crypto => write!(f, "the cryptography provider failed"),
            AlreadyFailed => write!(f, "request is already in a failed state"),
        }
    }
}

impl Error for KmsRequestError {}
