/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Loads the on-disk conformance test corpus: directories of `{name}.req`, `{name}.creq`,
//! `{name}.sts`, `{name}.authz`, `{name}.sreq` fixture files. This is test infrastructure, not
//! part of the SigV4 core -- it exists so `test_kms_request` and the integration tests can drive
//! [`crate::request::Request`] from the same fixed AWS SigV4 test suite corpus layout.

use crate::request::{BrokenDownTime, Request};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed test credentials shared by every conformance fixture, per
/// <https://docs.aws.amazon.com/general/latest/gr/signature-v4-test-suite.html>.
pub const TEST_REGION: &str = "us-east-1";
/// Fixed test service name shared by every conformance fixture.
pub const TEST_SERVICE: &str = "service";
/// Fixed test access key id shared by every conformance fixture.
pub const TEST_ACCESS_KEY_ID: &str = "AKIDEXAMPLE";
/// Fixed test secret key shared by every conformance fixture.
pub const TEST_SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

/// Test directories whose fixtures this crate does not vendor: the AWS corpus's
/// `post-sts-token` case requires session-token support, an explicit non-goal.
pub const SKIPPED_TESTS: &[&str] = &["post-sts-token"];

/// An error loading or parsing a conformance fixture.
#[derive(Debug)]
pub struct ConformanceError(String);

impl fmt::Display for ConformanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for ConformanceError {}

fn err(message: impl Into<String>) -> ConformanceError {
    ConformanceError(message.into())
}

/// One discovered test case: a directory containing `{name}.req` plus the four expected
/// artifact files.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// The test's name (the fixture directory's final path segment).
    pub name: String,
    dir: PathBuf,
}

impl TestCase {
    fn read(&self, ext: &str) -> Result<String, ConformanceError> {
        let path = self.dir.join(format!("{}.{}", self.name, ext));
        fs::read_to_string(&path)
            .map_err(|e| err(format!("{}: {e}", path.display())))
    }

    /// Builds a [`Request`] from this case's `.req` file: request line, headers until a blank
    /// line, then the remaining bytes as payload. Applies the fixed test credentials and the
    /// AWS test suite's shared timestamp (`20150830T123600Z`).
    pub fn build_request(&self) -> Result<Request, ConformanceError> {
        let raw = fs::read(self.dir.join(format!("{}.req", self.name)))
            .map_err(|e| err(e.to_string()))?;

        let mut headers_buf = [httparse::EMPTY_HEADER; 64];
        let mut with_trailing_blank = raw.clone();
        with_trailing_blank.extend_from_slice(b"\n\n");
        let mut parsed = httparse::Request::new(&mut headers_buf);
        let status = parsed
            .parse(&with_trailing_blank)
            .map_err(|e| err(format!("parsing {}.req: {e}", self.name)))?;

        let body_offset = match status {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => {
                return Err(err(format!("incomplete request header in {}.req", self.name)))
            }
        };

        let method = parsed
            .method
            .ok_or_else(|| err("missing method"))?
            .to_string();
        let path_and_query = parsed
            .path
            .ok_or_else(|| err("missing path"))?
            .to_string();

        let mut request = Request::new(method, path_and_query);
        // The AWS test suite's expected artifacts never include a synthesized Content-Length.
        request.set_auto_content_length(false);
        request
            .set_region(TEST_REGION)
            .map_err(|e| err(e.to_string()))?;
        request
            .set_service(TEST_SERVICE)
            .map_err(|e| err(e.to_string()))?;
        request
            .set_access_key_id(TEST_ACCESS_KEY_ID)
            .map_err(|e| err(e.to_string()))?;
        request
            .set_secret_key(TEST_SECRET_KEY)
            .map_err(|e| err(e.to_string()))?;

        for header in parsed.headers.iter() {
            request
                .add_header_field(header.name, header.value)
                .map_err(|e| err(e.to_string()))?;
        }

        // The shared fixed timestamp for every fixture in this corpus; redundant with the
        // X-Amz-Date header already present on each `.req` file.
        request
            .set_date(&BrokenDownTime {
                sec: 0,
                min: 36,
                hour: 12,
                mday: 30,
                mon: 7,
                year: 2015,
            })
            .map_err(|e| err(e.to_string()))?;

        if body_offset < raw.len() {
            request
                .append_payload(&raw[body_offset..])
                .map_err(|e| err(e.to_string()))?;
        }

        Ok(request)
    }

    /// The expected canonical request text.
    pub fn expected_canonical(&self) -> Result<String, ConformanceError> {
        self.read("creq")
    }

    /// The expected string-to-sign text.
    pub fn expected_sts(&self) -> Result<String, ConformanceError> {
        self.read("sts")
    }

    /// The expected `Authorization` header value.
    pub fn expected_authz(&self) -> Result<String, ConformanceError> {
        self.read("authz")
    }

    /// The expected fully signed request text.
    pub fn expected_signed(&self) -> Result<String, ConformanceError> {
        self.read("sreq")
    }
}

/// Recursively discovers every test case under `root`: any directory containing a
/// `{dirname}.req` file. Cases named in [`SKIPPED_TESTS`] are omitted unless `selected` names
/// them explicitly.
pub fn discover(root: &Path, selected: Option<&str>) -> Result<Vec<TestCase>, ConformanceError> {
    let mut cases = Vec::new();
    discover_into(root, selected, &mut cases)?;
    cases.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(cases)
}

fn discover_into(
    dir: &Path,
    selected: Option<&str>,
    out: &mut Vec<TestCase>,
) -> Result<(), ConformanceError> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    if SKIPPED_TESTS.contains(&name.as_str()) && selected != Some(name.as_str()) {
        return Ok(());
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(()),
    };

    let mut has_req = false;
    for entry in entries {
        let entry = entry.map_err(|e| err(e.to_string()))?;
        let path = entry.path();
        if path.is_dir() {
            discover_into(&path, selected, out)?;
        } else if path.file_name().and_then(|n| n.to_str()) == Some(&format!("{name}.req")) {
            has_req = true;
        }
    }

    if has_req && (selected.is_none() || selected == Some(name.as_str())) {
        out.push(TestCase {
            name,
            dir: dir.to_path_buf(),
        });
    }

    Ok(())
}

/// First byte offset at which `a` and `b` differ, or `None` if they're equal.
pub fn first_mismatch(a: &str, b: &str) -> Option<usize> {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let len = a.len().max(b.len());
    (0..len).find(|&i| a.get(i) != b.get(i))
}
