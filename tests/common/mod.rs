//! Shared integration-test harness for running the `ld2415h-codegen`
//! binary against fixture files.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Runs the compiled binary.
pub struct CodegenProcess;

impl CodegenProcess {
    /// Runs the binary with `args` and waits for it to exit.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_command(args: &[&str]) -> Output {
        let bin = env!("CARGO_BIN_EXE_ld2415h-codegen");
        Command::new(bin)
            .args(args)
            .env_remove("LD2415H_LOG_LEVEL")
            .env_remove("LD2415H_CONFIG")
            .env("NO_COLOR", "1")
            .output()
            .expect("failed to spawn ld2415h-codegen")
    }

    /// Returns the path to a test fixture.
    #[must_use]
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Returns the path to a test fixture as a string.
    #[must_use]
    pub fn fixture(name: &str) -> String {
        Self::fixture_path(name)
            .to_str()
            .expect("non-UTF-8 fixture path")
            .to_string()
    }
}

/// Exit code of a finished process.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn exit_code(output: &Output) -> i32 {
    output.status.code().expect("process terminated by signal")
}
