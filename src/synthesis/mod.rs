//! Stub synthesis
//!
//! Produces the executable behind each mock. The stub program ships with the
//! crate as source; its identifier and coordinator address are written into
//! the source as literals and the result is compiled with `rustc`, so every
//! mock gets its own binary that needs no environment to find its way home.
//!
//! Layout under the scratch directory:
//!
//! ```text
//! <scratch_dir>/<identifier>/
//! ├── binmock_stub.rs    (removed after a successful build)
//! └── <binary name>
//! ```

mod toolchain;

pub use toolchain::{Rustc, Toolchain};

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// Source of the stub program
pub const TEMPLATE_SOURCE: &str = include_str!("../../stub/binmock_stub.rs");

pub const IDENTIFIER_PLACEHOLDER: &str = "\"__BINMOCK_IDENTIFIER__\"";
pub const ADDR_PLACEHOLDER: &str = "\"__BINMOCK_COORDINATOR_ADDR__\"";

/// File name used when the caller does not pick one
pub const DEFAULT_BINARY_NAME: &str = "binmock-stub";

const SOURCE_FILE_NAME: &str = "binmock_stub.rs";

/// Build errors
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid stub template: {0}")]
    Template(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to run {program}: {source}", program = .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compiler exited with status {status:?}: {stderr}")]
    Compile { status: Option<i32>, stderr: String },

    #[error("Failed to remove stub source {path}: {source}", path = .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Stub source with its substitution points
#[derive(Debug, Clone)]
pub struct StubTemplate {
    source: String,
}

impl StubTemplate {
    /// The stub program bundled with this crate
    pub fn embedded() -> Self {
        Self {
            source: TEMPLATE_SOURCE.to_string(),
        }
    }

    /// A custom template; it must contain each placeholder exactly once.
    pub fn from_source(source: impl Into<String>) -> Result<Self, BuildError> {
        let source = source.into();
        for placeholder in [IDENTIFIER_PLACEHOLDER, ADDR_PLACEHOLDER] {
            let count = source.matches(placeholder).count();
            if count != 1 {
                return Err(BuildError::Template(format!(
                    "expected {} exactly once, found {} occurrences",
                    placeholder, count
                )));
            }
        }
        Ok(Self { source })
    }

    /// Source for a stub bound to `identifier` that reports to `addr`
    pub fn render(&self, identifier: &str, addr: SocketAddr) -> Result<String, BuildError> {
        if identifier.is_empty() {
            return Err(BuildError::Template("identifier must not be empty".to_string()));
        }
        Ok(self
            .source
            .replacen(IDENTIFIER_PLACEHOLDER, &string_literal(identifier), 1)
            .replacen(ADDR_PLACEHOLDER, &string_literal(&addr.to_string()), 1))
    }
}

impl Default for StubTemplate {
    fn default() -> Self {
        Self::embedded()
    }
}

fn string_literal(value: &str) -> String {
    format!("\"{}\"", value.escape_default())
}

/// Render, write and compile a stub, returning the executable's path.
///
/// Each identifier gets its own directory under `scratch_dir`, so stubs with
/// the same `binary_name` never collide.
pub fn build_stub_binary(
    toolchain: &dyn Toolchain,
    scratch_dir: &Path,
    binary_name: &str,
    identifier: &str,
    addr: SocketAddr,
) -> Result<PathBuf, BuildError> {
    if binary_name.is_empty() || binary_name.contains(['/', '\\']) {
        return Err(BuildError::Template(format!(
            "invalid binary name '{}'",
            binary_name
        )));
    }
    let source = StubTemplate::embedded().render(identifier, addr)?;

    let dir = scratch_dir.join(identifier);
    fs::create_dir_all(&dir)?;
    let source_path = dir.join(SOURCE_FILE_NAME);
    fs::write(&source_path, source)?;

    let binary_path = dir.join(format!("{}{}", binary_name, std::env::consts::EXE_SUFFIX));
    toolchain.compile(&source_path, &binary_path)?;
    debug!(path = %binary_path.display(), "stub compiled");

    fs::remove_file(&source_path).map_err(|source| BuildError::Cleanup {
        path: source_path.clone(),
        source,
    })?;

    info!(mock = %identifier, path = %binary_path.display(), "stub binary built");
    Ok(binary_path)
}

// Compiled into the test build so the stub's own unit tests run with the
// crate's.
#[cfg(test)]
#[allow(dead_code)]
#[path = "../../stub/binmock_stub.rs"]
mod stub_source;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn addr() -> SocketAddr {
        "127.0.0.1:40123".parse().unwrap()
    }

    #[test]
    fn test_embedded_template_has_each_placeholder_once() {
        assert!(StubTemplate::from_source(TEMPLATE_SOURCE).is_ok());
    }

    #[test]
    fn test_render_substitutes_literals() {
        let source = StubTemplate::embedded().render("01abc", addr()).unwrap();
        assert!(source.contains(r#"const IDENTIFIER: &str = "01abc";"#));
        assert!(source.contains(r#"const COORDINATOR_ADDR: &str = "127.0.0.1:40123";"#));
        assert!(!source.contains("__BINMOCK_"));
    }

    #[test]
    fn test_render_escapes_identifier() {
        let template = StubTemplate::from_source(format!(
            "const A: &str = {};\nconst B: &str = {};\n",
            IDENTIFIER_PLACEHOLDER, ADDR_PLACEHOLDER
        ))
        .unwrap();
        let source = template.render("a\"b\\c", addr()).unwrap();
        assert!(source.contains(r#"const A: &str = "a\"b\\c";"#), "{}", source);
    }

    #[test]
    fn test_render_rejects_empty_identifier() {
        let result = StubTemplate::embedded().render("", addr());
        assert!(matches!(result, Err(BuildError::Template(_))));
    }

    #[test]
    fn test_template_without_placeholders() {
        let result = StubTemplate::from_source("fn main() {}");
        assert!(matches!(result, Err(BuildError::Template(_))));
    }

    /// Records what it was asked to compile and writes a fake binary.
    #[derive(Default)]
    struct FakeToolchain {
        seen: RefCell<Option<String>>,
        fail: bool,
        /// Swap the source file for a non-empty directory so it cannot be
        /// removed with `remove_file`.
        pin_source: bool,
    }

    impl Toolchain for FakeToolchain {
        fn compile(&self, source: &Path, output: &Path) -> Result<(), BuildError> {
            *self.seen.borrow_mut() = Some(fs::read_to_string(source)?);
            if self.fail {
                return Err(BuildError::Compile {
                    status: Some(1),
                    stderr: "error[E0425]".to_string(),
                });
            }
            fs::write(output, b"binary")?;
            if self.pin_source {
                fs::remove_file(source)?;
                fs::create_dir(source)?;
                fs::write(source.join("keep"), b"")?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_build_writes_binary_and_removes_source() {
        let scratch = tempfile::tempdir().unwrap();
        let toolchain = FakeToolchain::default();

        let path = build_stub_binary(&toolchain, scratch.path(), "git", "id1", addr()).unwrap();

        let dir = scratch.path().join("id1");
        assert_eq!(path, dir.join(format!("git{}", std::env::consts::EXE_SUFFIX)));
        assert!(path.exists());
        assert!(!dir.join(SOURCE_FILE_NAME).exists());
        assert!(toolchain.seen.borrow().as_deref().unwrap().contains("\"id1\""));
    }

    #[test]
    fn test_same_name_different_identifiers_do_not_collide() {
        let scratch = tempfile::tempdir().unwrap();
        let toolchain = FakeToolchain::default();

        let a = build_stub_binary(&toolchain, scratch.path(), "tool", "a", addr()).unwrap();
        let b = build_stub_binary(&toolchain, scratch.path(), "tool", "b", addr()).unwrap();

        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn test_failed_compile_keeps_source() {
        let scratch = tempfile::tempdir().unwrap();
        let toolchain = FakeToolchain {
            fail: true,
            ..FakeToolchain::default()
        };

        let result = build_stub_binary(&toolchain, scratch.path(), "tool", "id2", addr());

        assert!(matches!(result, Err(BuildError::Compile { status: Some(1), .. })));
        assert!(scratch.path().join("id2").join(SOURCE_FILE_NAME).exists());
    }

    #[test]
    fn test_source_cleanup_failure() {
        let scratch = tempfile::tempdir().unwrap();
        let toolchain = FakeToolchain {
            pin_source: true,
            ..FakeToolchain::default()
        };

        let result = build_stub_binary(&toolchain, scratch.path(), "tool", "id4", addr());

        match result {
            Err(BuildError::Cleanup { path, .. }) => {
                assert_eq!(path, scratch.path().join("id4").join(SOURCE_FILE_NAME));
            }
            other => panic!("expected cleanup error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_path_in_binary_name() {
        let scratch = tempfile::tempdir().unwrap();
        let result = build_stub_binary(
            &FakeToolchain::default(),
            scratch.path(),
            "../escape",
            "id3",
            addr(),
        );
        assert!(matches!(result, Err(BuildError::Template(_))));
    }
}
