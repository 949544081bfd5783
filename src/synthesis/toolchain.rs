//! Compiler invocation for stub programs

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::BuildError;
use crate::config::BinmockConfig;

/// Crate name given to every stub; the output path decides the file name.
const STUB_CRATE_NAME: &str = "binmock_stub";

/// Turns a rendered stub source file into an executable
pub trait Toolchain {
    fn compile(&self, source: &Path, output: &Path) -> Result<(), BuildError>;
}

/// Plain `rustc` without cargo; the stub only needs std.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rustc {
    program: PathBuf,
    flags: Vec<String>,
}

impl Rustc {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            flags: Vec::new(),
        }
    }

    pub fn from_config(config: &BinmockConfig) -> Self {
        Self {
            program: config.rustc.clone(),
            flags: config.rustc_flags.clone(),
        }
    }

    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, source: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(["--edition", "2021", "--crate-type", "bin", "--crate-name", STUB_CRATE_NAME])
            .args(&self.flags)
            .arg("-o")
            .arg(output)
            .arg(source);
        command
    }
}

impl Toolchain for Rustc {
    fn compile(&self, source: &Path, output: &Path) -> Result<(), BuildError> {
        debug!(
            rustc = %self.program.display(),
            source = %source.display(),
            output = %output.display(),
            "compiling stub"
        );

        let result = self
            .command(source, output)
            .output()
            .map_err(|source| BuildError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(BuildError::Compile {
                status: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }
        Ok(())
    }
}
