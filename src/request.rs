/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The mutable request builder: owns method, path, query, headers, payload, credentials,
//! region/service, and timestamp, plus a sticky failure flag -- once set, every later mutator
//! and derivation short-circuits rather than operating on partially-built state.

use crate::bytestring::ByteString;
use crate::crypto::{CryptoProvider, DefaultCryptoProvider};
use crate::error::KmsRequestError;
use crate::kv_list::KvList;
use crate::query::parse_query;

const X_AMZ_DATE: &[u8] = b"X-Amz-Date";

/// A broken-down timestamp, mirroring a C `struct tm`: `mon` is zero-based (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokenDownTime {
    /// Seconds, 0-60 (60 permits a leap second).
    pub sec: u32,
    /// Minutes, 0-59.
    pub min: u32,
    /// Hours, 0-23.
    pub hour: u32,
    /// Day of month, 1-31.
    pub mday: u32,
    /// Month, 0-11 (0 = January).
    pub mon: u32,
    /// Full year, e.g. 2015. Must be non-negative.
    pub year: i32,
}

impl BrokenDownTime {
    fn is_valid(&self) -> bool {
        self.sec <= 60
            && self.min <= 59
            && self.hour <= 23
            && (1..=31).contains(&self.mday)
            && self.mon <= 11
            && self.year >= 0
    }
}

/// Builds up a SigV4-signable HTTP request and derives its canonical artifacts.
///
/// Every mutator and derivation is sticky on failure: once an operation fails, `failed()`
/// returns `true` forever, every later mutator/derivation short-circuits with
/// [`KmsRequestError::already_failed`], and `get_error()` keeps returning the first failure's
/// message.
pub struct Request {
    method: ByteString,
    path: ByteString,
    query: ByteString,
    query_params: KvList,
    header_fields: KvList,
    payload: ByteString,
    region: ByteString,
    service: ByteString,
    access_key_id: ByteString,
    secret_key: ByteString,
    date: ByteString,
    datetime: ByteString,
    auto_content_length: bool,
    failed: bool,
    error: Option<String>,
    crypto: Box<dyn CryptoProvider>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("header_fields", &self.header_fields)
            .field("region", &self.region)
            .field("service", &self.service)
            .field("date", &self.date)
            .field("datetime", &self.datetime)
            .field("failed", &self.failed)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl Request {
    /// Creates a new request, splitting `path_and_query` on the first `?`.
    ///
    /// Always succeeds in constructing an object, even if the query string fails to parse --
    /// in that case the returned `Request` is already in the failed state, and `get_error()`
    /// reports why.
    pub fn new(method: impl AsRef<[u8]>, path_and_query: impl AsRef<[u8]>) -> Self {
        let path_and_query = path_and_query.as_ref();
        let question_mark = path_and_query.iter().position(|&b| b == b'?');

        let (path, query) = match question_mark {
            Some(idx) => (&path_and_query[..idx], &path_and_query[idx + 1..]),
            None => (path_and_query, &path_and_query[0..0]),
        };

        let mut request = Self {
            method: ByteString::from_bytes(method.as_ref()),
            path: ByteString::from_bytes(path),
            query: ByteString::from_bytes(query),
            query_params: KvList::new(),
            header_fields: KvList::new(),
            payload: ByteString::new(),
            region: ByteString::new(),
            service: ByteString::new(),
            access_key_id: ByteString::new(),
            secret_key: ByteString::new(),
            date: ByteString::new(),
            datetime: ByteString::new(),
            auto_content_length: true,
            failed: false,
            error: None,
            crypto: Box::new(DefaultCryptoProvider),
        };

        if !query.is_empty() {
            match parse_query(query) {
                Ok(params) => request.query_params = params,
                Err(err) => {
                    request.fail(err);
                }
            }
        }

        request
    }

    /// Replaces the cryptography provider used for hashing and HMAC.
    pub fn with_crypto_provider(mut self, crypto: Box<dyn CryptoProvider>) -> Self {
        self.crypto = crypto;
        self
    }

    /// Sets whether a `Content-Length` header should be synthesized at canonicalization time
    /// for a non-empty payload. Defaults to `true`.
    pub fn set_auto_content_length(&mut self, enabled: bool) {
        self.auto_content_length = enabled;
    }

    fn check_not_failed(&self) -> Result<(), KmsRequestError> {
        if self.failed {
            Err(KmsRequestError::already_failed())
        } else {
            Ok(())
        }
    }

    fn fail(&mut self, err: KmsRequestError) -> KmsRequestError {
        self.failed = true;
        self.error = Some(err.sticky_message());
        err
    }

    /// Sets the region used for the signing scope.
    pub fn set_region(&mut self, region: impl AsRef<[u8]>) -> Result<(), KmsRequestError> {
        self.check_not_failed()?;
        self.region = ByteString::from_bytes(region.as_ref());
        Ok(())
    }

    /// Sets the service name used for the signing scope.
    pub fn set_service(&mut self, service: impl AsRef<[u8]>) -> Result<(), KmsRequestError> {
        self.check_not_failed()?;
        self.service = ByteString::from_bytes(service.as_ref());
        Ok(())
    }

    /// Sets the access key id used in the `Authorization` header's `Credential`.
    pub fn set_access_key_id(&mut self, akid: impl AsRef<[u8]>) -> Result<(), KmsRequestError> {
        self.check_not_failed()?;
        self.access_key_id = ByteString::from_bytes(akid.as_ref());
        Ok(())
    }

    /// Sets the secret key used to derive the signing key.
    pub fn set_secret_key(&mut self, secret: impl AsRef<[u8]>) -> Result<(), KmsRequestError> {
        self.check_not_failed()?;
        self.secret_key = ByteString::from_bytes(secret.as_ref());
        Ok(())
    }

    /// Sets the request timestamp from a broken-down time, formatting `date` ("YYYYMMDD") and
    /// `datetime` ("YYYYMMDDTHHMMSSZ"). Fails with "Invalid tm struct" if any field is out of
    /// range.
    pub fn set_date(&mut self, tm: &BrokenDownTime) -> Result<(), KmsRequestError> {
        self.check_not_failed()?;
        if !tm.is_valid() {
            return Err(self.fail(KmsRequestError::parse("Invalid tm struct")));
        }

        let date = format!("{:04}{:02}{:02}", tm.year, tm.mon + 1, tm.mday);
        let datetime = format!(
            "{date}T{:02}{:02}{:02}Z",
            tm.hour, tm.min, tm.sec
        );
        self.date = ByteString::from(date);
        self.datetime = ByteString::from(datetime);
        Ok(())
    }

    /// Appends a header field. Adding a header named `X-Amz-Date` (case-insensitive) also sets
    /// `datetime` to the header value and `date` to the substring before the first `T` (or the
    /// whole value, if there is no `T`).
    pub fn add_header_field(
        &mut self,
        name: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<(), KmsRequestError> {
        self.check_not_failed()?;
        let name = name.as_ref();
        let value = value.as_ref();
        self.header_fields.add(name, value);

        if name.eq_ignore_ascii_case(X_AMZ_DATE) {
            self.datetime = ByteString::from_bytes(value);
            let date_part = match value.iter().position(|&b| b == b'T') {
                Some(t_idx) => &value[..t_idx],
                None => value,
            };
            self.date = ByteString::from_bytes(date_part);
        }

        Ok(())
    }

    /// Appends bytes to the value of the most recently added header field. Fails with
    /// "No header field to append to" if no header has been added yet.
    pub fn append_header_field_value(
        &mut self,
        value: impl AsRef<[u8]>,
    ) -> Result<(), KmsRequestError> {
        self.check_not_failed()?;
        let value = value.as_ref();
        match self.header_fields.last_mut() {
            Some(kv) => {
                kv.value.append(value);
                Ok(())
            }
            None => Err(self.fail(KmsRequestError::precondition(
                "No header field to append to",
            ))),
        }
    }

    /// Appends bytes to the request payload.
    pub fn append_payload(&mut self, bytes: impl AsRef<[u8]>) -> Result<(), KmsRequestError> {
        self.check_not_failed()?;
        self.payload.append(bytes.as_ref());
        Ok(())
    }

    /// Returns the last failure's message, if the request has failed.
    pub fn get_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether this request is in the sticky-failed state.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub(crate) fn method(&self) -> &ByteString {
        &self.method
    }

    pub(crate) fn path(&self) -> &ByteString {
        &self.path
    }

    pub(crate) fn query(&self) -> &ByteString {
        &self.query
    }

    pub(crate) fn query_params(&self) -> &KvList {
        &self.query_params
    }

    pub(crate) fn header_fields(&self) -> &KvList {
        &self.header_fields
    }

    pub(crate) fn payload(&self) -> &ByteString {
        &self.payload
    }

    pub(crate) fn region(&self) -> &ByteString {
        &self.region
    }

    pub(crate) fn service(&self) -> &ByteString {
        &self.service
    }

    pub(crate) fn access_key_id(&self) -> &ByteString {
        &self.access_key_id
    }

    pub(crate) fn secret_key(&self) -> &ByteString {
        &self.secret_key
    }

    pub(crate) fn date(&self) -> &ByteString {
        &self.date
    }

    pub(crate) fn datetime(&self) -> &ByteString {
        &self.datetime
    }

    pub(crate) fn auto_content_length(&self) -> bool {
        self.auto_content_length
    }

    pub(crate) fn crypto(&self) -> &dyn CryptoProvider {
        self.crypto.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aws_example_date() -> BrokenDownTime {
        BrokenDownTime {
            sec: 0,
            min: 36,
            hour: 12,
            mday: 30,
            mon: 7, // August, zero-based
            year: 2015,
        }
    }

    #[test]
    fn new_splits_path_and_query() {
        let req = Request::new("GET", "/foo/bar?a=1&b=2");
        assert_eq!(req.path().as_bytes(), b"/foo/bar");
        assert_eq!(req.query().as_bytes(), b"a=1&b=2");
        assert_eq!(req.query_params().len(), 2);
        assert!(!req.failed());
    }

    #[test]
    fn new_without_query_leaves_query_params_empty() {
        let req = Request::new("GET", "/");
        assert!(req.query().is_empty());
        assert!(req.query_params().is_empty());
    }

    #[test]
    fn bad_query_sets_failed_state() {
        let req = Request::new("GET", "/?asdf");
        assert!(req.failed());
        assert!(req
            .get_error()
            .unwrap()
            .to_lowercase()
            .contains("cannot parse"));
    }

    #[test]
    fn set_date_formats_date_and_datetime() {
        let mut req = Request::new("GET", "/");
        req.set_date(&aws_example_date()).unwrap();
        assert_eq!(req.date().as_bytes(), b"20150830");
        assert_eq!(req.datetime().as_bytes(), b"20150830T123600Z");
    }

    #[test]
    fn set_date_rejects_invalid_fields() {
        let mut req = Request::new("GET", "/");
        let mut bad = aws_example_date();
        bad.hour = 24;
        let err = req.set_date(&bad).unwrap_err();
        assert!(err.to_string().contains("Invalid tm struct"));
        assert!(req.failed());
    }

    #[test]
    fn x_amz_date_header_sets_date_and_datetime() {
        let mut req = Request::new("GET", "/");
        req.add_header_field("X-Amz-Date", "20150830T123600Z")
            .unwrap();
        assert_eq!(req.date().as_bytes(), b"20150830");
        assert_eq!(req.datetime().as_bytes(), b"20150830T123600Z");
    }

    #[test]
    fn x_amz_date_without_t_copies_whole_value() {
        let mut req = Request::new("GET", "/");
        req.add_header_field("x-amz-date", "20150830").unwrap();
        assert_eq!(req.date().as_bytes(), b"20150830");
        assert_eq!(req.datetime().as_bytes(), b"20150830");
    }

    #[test]
    fn append_header_field_value_extends_last_header() {
        let mut req = Request::new("GET", "/");
        req.add_header_field("X-Custom", "a").unwrap();
        req.append_header_field_value("b").unwrap();
        let value = req.header_fields().find(b"x-custom").unwrap().value.clone();
        assert_eq!(value.as_bytes(), b"ab");
    }

    #[test]
    fn append_header_field_value_without_header_fails() {
        let mut req = Request::new("GET", "/");
        let err = req.append_header_field_value("x").unwrap_err();
        assert!(err.to_string().contains("No header field to append to"));
    }

    #[test]
    fn sticky_failure_blocks_every_later_mutator() {
        let mut req = Request::new("GET", "/?asdf");
        assert!(req.failed());
        assert!(req.set_region("us-east-1").is_err());
        assert!(req.add_header_field("Host", "example.com").is_err());
        assert!(req.append_payload("x").is_err());
        // header was never actually added because the mutator short-circuited.
        assert!(req.header_fields().is_empty());
    }
}
