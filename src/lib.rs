/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Builds and signs AWS Signature Version 4 HTTP requests for a KMS-style endpoint: query
//! parsing and re-encoding, header normalization, URI path normalization, canonical-string
//! construction, the HMAC-SHA256 key-derivation chain, and signed-request serialization.
//!
//! The crate is split leaf-first: [`bytestring`] and [`kv_list`] are the data structures,
//! [`crypto`] is the hashing/HMAC seam, [`path_normalize`] and [`query`] are the two parsers,
//! [`request`] is the mutable builder, and [`canonical`] holds the pure derivation functions
//! that turn a built [`request::Request`] into a canonical request, string-to-sign, signing key,
//! `Authorization` value, and fully signed HTTP/1.1 text.

#![warn(
    missing_docs,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod bytestring;
pub mod canonical;
pub mod conformance;
pub mod crypto;
pub mod error;
pub mod kv_list;
pub mod path_normalize;
pub mod query;
pub mod request;
