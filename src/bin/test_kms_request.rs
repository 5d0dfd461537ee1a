/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Runs the on-disk conformance corpus under `conformance/` against the SigV4 implementation,
//! comparing every derived artifact byte-for-byte against its expected fixture.

use clap::Parser;
use kms_sigv4_signer::canonical;
use kms_sigv4_signer::conformance::{self, TestCase};
use std::path::PathBuf;
use std::process::ExitCode;

/// Compares the SigV4 canonicalizer's output against the bundled conformance corpus.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Run only the named test case; without this, every discovered case runs.
    test_name: Option<String>,

    /// Root directory to search for `{name}.req` fixtures.
    #[arg(long, default_value = "conformance")]
    corpus: PathBuf,
}

fn compare(test_name: &str, artifact: &str, expected: &str, actual: &str) -> bool {
    if expected == actual {
        return true;
    }
    let offset = conformance::first_mismatch(expected, actual).unwrap_or(0);
    eprintln!(
        "{test_name} ({artifact}) failed, mismatch starting at byte {offset}\n\
         --- expected ({} bytes) ---\n{expected}\n\
         --- actual ({} bytes) ---\n{actual}",
        expected.len(),
        actual.len()
    );
    false
}

fn run_case(case: &TestCase) -> Result<bool, Box<dyn std::error::Error>> {
    println!("{}", case.name);
    let request = case.build_request()?;

    let canonical = canonical::get_canonical(&request)?;
    let ok_creq = compare(
        &case.name,
        "creq",
        case.expected_canonical()?.trim_end(),
        canonical.to_string_lossy().trim_end(),
    );

    let sts = canonical::get_string_to_sign(&request)?;
    let ok_sts = compare(
        &case.name,
        "sts",
        case.expected_sts()?.trim_end(),
        sts.to_string_lossy().trim_end(),
    );

    let signature = canonical::get_signature(&request)?;
    let ok_authz = compare(
        &case.name,
        "authz",
        case.expected_authz()?.trim_end(),
        signature.to_string_lossy().trim_end(),
    );

    let signed = canonical::get_signed(&request)?;
    let ok_sreq = compare(
        &case.name,
        "sreq",
        case.expected_signed()?.trim_end(),
        signed.to_string_lossy().trim_end(),
    );

    Ok(ok_creq && ok_sts && ok_authz && ok_sreq)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let cases = match conformance::discover(&args.corpus, args.test_name.as_deref()) {
        Ok(cases) => cases,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if cases.is_empty() {
        if let Some(name) = &args.test_name {
            eprintln!("No such test: \"{name}\"");
        } else {
            eprintln!("No tests found under {}", args.corpus.display());
        }
        return ExitCode::FAILURE;
    }

    let mut all_passed = true;
    for case in &cases {
        match run_case(case) {
            Ok(passed) => all_passed &= passed,
            Err(e) => {
                eprintln!("{} errored: {e}", case.name);
                all_passed = false;
            }
        }
    }

    if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
