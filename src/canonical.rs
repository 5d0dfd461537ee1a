/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Pure functions over a [`Request`] that derive the canonical request, string-to-sign,
//! signing key, `Authorization` value, and fully signed HTTP/1.1 text.
//!
//! Every function here is read-only with respect to the `Request`: deriving an artifact never
//! mutates the request it is computed from.

use crate::bytestring::ByteString;
use crate::crypto::hex_lower;
use crate::error::KmsRequestError;
use crate::kv_list::KvList;
use crate::request::Request;

const CONTENT_LENGTH: &[u8] = b"Content-Length";
const AWS4_REQUEST: &[u8] = b"aws4_request";
const ALGORITHM: &[u8] = b"AWS4-HMAC-SHA256";

/// Builds the header block used for canonicalization: `request`'s headers, plus a synthesized
/// `Content-Length` when `auto_content_length` is set, the payload is non-empty, and no
/// case-insensitive `Content-Length` header is already present. Returned already lower-cased
/// and stable-sorted by name.
fn canonical_header_list(request: &Request) -> KvList {
    let mut headers = request.header_fields().dup();

    if request.auto_content_length()
        && !request.payload().is_empty()
        && headers.find(CONTENT_LENGTH).is_none()
    {
        headers.add(CONTENT_LENGTH, request.payload().len().to_string());
    }

    let mut lowered = KvList::new();
    for kv in headers.iter() {
        let mut name = ByteString::new();
        name.append_lowercase(kv.key.as_bytes());
        lowered.add(name, kv.value.clone());
    }
    lowered.sorted()
}

/// Builds the canonical request string:
/// ```text
/// METHOD\n
/// CANONICAL_URI\n
/// CANONICAL_QUERY\n
/// CANONICAL_HEADERS\n
/// SIGNED_HEADERS\n
/// HEX(SHA256(PAYLOAD))
/// ```
/// Fails with [`KmsRequestError::precondition`] if the request carries no headers at all (the
/// `Host` header is mandatory) or if the request is already in the failed state.
pub fn get_canonical(request: &Request) -> Result<ByteString, KmsRequestError> {
    if request.failed() {
        return Err(KmsRequestError::already_failed());
    }
    if request.header_fields().is_empty() {
        return Err(KmsRequestError::precondition(
            "Cannot canonicalize a request with no headers",
        ));
    }

    let headers = canonical_header_list(request);

    let mut out = ByteString::new();
    out.append(request.method());
    out.append_newline();

    let normalized_path = crate::path_normalize::normalize_path(request.path().as_bytes());
    out.append_escaped(&normalized_path, false);
    out.append_newline();

    let sorted_query = request.query_params().sorted();
    let mut first = true;
    for kv in sorted_query.iter() {
        if !first {
            out.append_byte(b'&');
        }
        first = false;
        out.append_escaped(kv.key.as_bytes(), true);
        out.append_byte(b'=');
        out.append_escaped(kv.value.as_bytes(), true);
    }
    out.append_newline();

    for kv in headers.iter() {
        out.append(kv.key.as_bytes());
        out.append_byte(b':');
        out.append_stripped(kv.value.as_bytes());
        out.append_newline();
    }
    out.append_newline();

    let signed_headers = signed_headers_line(&headers);
    out.append(signed_headers.as_bytes());
    out.append_newline();

    out.append_hashed(request.payload().as_bytes(), request.crypto())?;

    tracing::trace!(canonical_request = %out.to_string_lossy());

    Ok(out)
}

fn signed_headers_line(sorted_lowered_headers: &KvList) -> ByteString {
    let mut out = ByteString::new();
    for (i, kv) in sorted_lowered_headers.iter().enumerate() {
        if i > 0 {
            out.append_byte(b';');
        }
        out.append(kv.key.as_bytes());
    }
    out
}

/// Builds the five-line string-to-sign from the canonical request.
pub fn get_string_to_sign(request: &Request) -> Result<ByteString, KmsRequestError> {
    let canonical = get_canonical(request)?;

    let mut out = ByteString::new();
    out.append(ALGORITHM);
    out.append_newline();
    out.append(request.datetime().as_bytes());
    out.append_newline();
    out.append(scope(request).as_bytes());
    out.append_newline();
    out.append_hashed(canonical.as_bytes(), request.crypto())?;

    tracing::trace!(
        canonical_request = %canonical.to_string_lossy(),
        string_to_sign = %out.to_string_lossy(),
        "calculated signing parameters"
    );

    Ok(out)
}

fn scope(request: &Request) -> ByteString {
    let mut out = ByteString::new();
    out.append(request.date().as_bytes());
    out.append_byte(b'/');
    out.append(request.region().as_bytes());
    out.append_byte(b'/');
    out.append(request.service().as_bytes());
    out.append_byte(b'/');
    out.append(AWS4_REQUEST);
    out
}

/// Derives the SigV4 signing key via the `AWS4<secret> -> date -> region -> service ->
/// "aws4_request"` HMAC-SHA256 chain.
pub fn get_signing_key(request: &Request) -> Result<[u8; 32], KmsRequestError> {
    if request.failed() {
        return Err(KmsRequestError::already_failed());
    }

    let mut k_secret = Vec::with_capacity(4 + request.secret_key().len());
    k_secret.extend_from_slice(b"AWS4");
    k_secret.extend_from_slice(request.secret_key().as_bytes());

    let crypto = request.crypto();
    let k_date = crypto.hmac_sha256(&k_secret, request.date().as_bytes())?;
    let k_region = crypto.hmac_sha256(&k_date, request.region().as_bytes())?;
    let k_service = crypto.hmac_sha256(&k_region, request.service().as_bytes())?;
    let k_signing = crypto.hmac_sha256(&k_service, AWS4_REQUEST)?;

    Ok(k_signing)
}

/// Computes the full `Authorization` header value:
/// `AWS4-HMAC-SHA256 Credential={akid}/{scope}, SignedHeaders={names}, Signature={hex}`.
pub fn get_signature(request: &Request) -> Result<ByteString, KmsRequestError> {
    let string_to_sign = get_string_to_sign(request)?;
    let signing_key = get_signing_key(request)?;
    let signature = request
        .crypto()
        .hmac_sha256(&signing_key, string_to_sign.as_bytes())?;

    let headers = canonical_header_list(request);
    let signed_headers = signed_headers_line(&headers);

    let mut out = ByteString::new();
    out.append(ALGORITHM);
    out.append(b" Credential=");
    out.append(request.access_key_id().as_bytes());
    out.append_byte(b'/');
    out.append(scope(request).as_bytes());
    out.append(b", SignedHeaders=");
    out.append(signed_headers.as_bytes());
    out.append(b", Signature=");
    out.append(hex_lower(&signature).as_bytes());

    tracing::trace!(authorization = %out.to_string_lossy(), "signed request");

    Ok(out)
}

/// Serializes the full signed HTTP/1.1 request: the request line, every header in insertion
/// order (including a synthesized `Content-Length`, if any), the `Authorization` header, and --
/// if the payload is non-empty -- a blank line followed by the payload bytes. LF-terminated
/// throughout, matching the bundled conformance fixtures; no trailing newline after the payload.
pub fn get_signed(request: &Request) -> Result<ByteString, KmsRequestError> {
    let signature = get_signature(request)?;

    let mut headers = request.header_fields().dup();
    if request.auto_content_length()
        && !request.payload().is_empty()
        && headers.find(CONTENT_LENGTH).is_none()
    {
        headers.add(CONTENT_LENGTH, request.payload().len().to_string());
    }

    let mut out = ByteString::new();
    out.append(request.method().as_bytes());
    out.append_byte(b' ');
    out.append(request.path().as_bytes());
    if !request.query().is_empty() {
        out.append_byte(b'?');
        out.append(request.query().as_bytes());
    }
    out.append(b" HTTP/1.1");
    out.append_newline();

    for kv in headers.iter() {
        out.append(kv.key.as_bytes());
        out.append_byte(b':');
        out.append(kv.value.as_bytes());
        out.append_newline();
    }

    out.append(b"Authorization:");
    out.append(signature.as_bytes());
    out.append_newline();

    if !request.payload().is_empty() {
        out.append_newline();
        out.append(request.payload().as_bytes());
    }

    Ok(out)
}
