//! Test utilities for the frequencia crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

pub mod cap_fs {
    //! Capability-safe filesystem helpers for tests.

    use std::ffi::OsString;
    use std::io;
    use std::path::{Path, PathBuf};

    use cap_std::{ambient_authority, fs::Dir};

    /// Write bytes to a file through `cap_std`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use frequencia::test_support::cap_fs::write_file;
    ///
    /// let path = std::env::temp_dir().join("cap-fs-write-example.txt");
    /// write_file(&path, b"snapshot\n")?;
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
        let (parent, file_name) = parent_and_file_name(path)?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        directory.write(Path::new(&file_name), contents)
    }

    /// Write `yaml` to `frequencia.yaml` inside a fresh temporary directory.
    ///
    /// The directory lives as long as the returned guard.
    pub fn write_settings(yaml: &str) -> io::Result<(tempfile::TempDir, PathBuf)> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("frequencia.yaml");
        write_file(&path, yaml.as_bytes())?;
        Ok((directory, path))
    }

    fn parent_and_file_name(path: &Path) -> io::Result<(&Path, OsString)> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "path must include a file or directory name",
            )
        })?;
        Ok((parent, file_name.to_os_string()))
    }
}

pub mod fixtures {
    //! Paths to checked-in fixture assets.

    use std::path::PathBuf;

    /// TrueType face used by rendering tests.
    pub fn font_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/fonts/DejaVuSansMono-Bold.ttf")
    }
}

mod clock;
mod memory;
mod tokens;

pub use clock::MutableClock;
pub use memory::{AuditRecord, InMemoryAttendanceRepository, TransactionRecord};
pub use tokens::CountingTokenSource;
