//! Capability-scoped file reads for configuration and rendering assets.

use std::io;
use std::path::Path;

use cap_std::{ambient_authority, fs::Dir};

/// Read the whole file at `path` through a directory capability.
pub fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} does not name a file", path.display()),
        )
    })?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.read(file_name)
}
