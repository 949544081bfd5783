//! Shared helpers for integration tests
//!
//! Each test builds its stubs under its own temp dir; all of them share the
//! process-wide coordinator.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use binmock::{BinmockConfig, CollectingReporter, Mock};
use tempfile::TempDir;

/// Configuration from the environment, building into `scratch`
pub fn scratch_config(scratch: &TempDir) -> BinmockConfig {
    BinmockConfig::load()
        .expect("binmock config")
        .with_scratch_dir(scratch.path())
}

/// A mock whose failures land in `reporter`
pub fn new_mock(scratch: &TempDir, reporter: &CollectingReporter) -> Mock {
    Mock::builder()
        .config(scratch_config(scratch))
        .build(reporter.clone())
        .expect("mock build")
}

/// Run `program` to completion with empty stdin
pub fn run(program: &Path, args: &[&str]) -> Output {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("failed to run stub")
}

/// Run `program` feeding it `input` on stdin
pub fn run_with_stdin(program: &Path, args: &[&str], input: &str) -> Output {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn stub");
    child
        .stdin
        .take()
        .expect("piped stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("failed to wait for stub")
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
