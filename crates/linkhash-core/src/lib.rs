//! API fingerprinting for ELF shared objects.
//!
//! This crate provides:
//! - [`mapped`]: read-only mapping of the input with ELF identification checks
//! - [`elf`]: bounds-checked ELF32/ELF64 parsing (header, sections, symbols)
//! - [`api`]: extraction of `GLOBAL`/`WEAK` symbols and their canonical
//!   listing / SHA-1 digest
//! - [`fixture`]: synthetic shared objects for tests, benches and fuzz seeds

pub mod api;
pub mod elf;
pub mod fixture;
pub mod mapped;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use api::{ApiBinding, ApiFingerprint, ApiRecord, ExtractedApi, OutputMode};
pub use elf::{ElfError, ElfResult};
pub use mapped::MappedFile;

/// Failure to fingerprint one input file.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open {} for reading: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to stat {} for size: {source}", path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("can't map the file {}: {source}", path.display())]
    Map {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Elf { path: PathBuf, source: ElfError },
}

impl Error {
    pub(crate) fn elf(path: &Path, source: ElfError) -> Self {
        Self::Elf {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The format error, if this is one.
    pub fn elf_error(&self) -> Option<&ElfError> {
        match self {
            Self::Elf { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Input path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::FileOpen { path, .. }
            | Self::Stat { path, .. }
            | Self::Map { path, .. }
            | Self::Elf { path, .. } => path,
        }
    }
}

/// Result type for file-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Map `path` and compute the output for `mode` in memory.
///
/// The mapping is released before this returns, whether it succeeds or not.
pub fn fingerprint_file(path: impl AsRef<Path>, mode: OutputMode) -> Result<Vec<u8>> {
    let mapped = MappedFile::open(path)?;
    let api = mapped.extract_api()?;
    Ok(api.into_fingerprint().render(mode))
}
