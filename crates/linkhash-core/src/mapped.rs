//! Read-only memory mapping of an input object.
//!
//! [`MappedFile`] owns the file handle and the mapping; both are released
//! when it is dropped, on success and on every error path alike. Everything
//! parsed from the file borrows from it.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::api::{ExtractedApi, extract_api};
use crate::elf::{ELF_MAGIC, ElfClass, ElfError, identify};
use crate::{Error, Result};

/// An input file mapped read-only, with its ELF identification validated.
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    map: Mmap,
    class: ElfClass,
    // Held for the lifetime of the mapping.
    _file: File,
}

impl MappedFile {
    /// Open `path`, map it and validate the magic and class bytes.
    ///
    /// # Errors
    ///
    /// - [`Error::FileOpen`] if the path cannot be opened for reading
    /// - [`Error::Stat`] if its size cannot be determined
    /// - [`Error::Map`] if the mapping fails
    /// - [`Error::Elf`] with [`ElfError::BadMagic`] or
    ///   [`ElfError::UnsupportedClass`] (or another identification error)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let size = file
            .metadata()
            .map_err(|source| Error::Stat {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        // Too short to carry the magic; not worth a mapping.
        if size < ELF_MAGIC.len() as u64 {
            return Err(Error::elf(path, ElfError::BadMagic));
        }

        let map = map_read_only(&file).map_err(|source| Error::Map {
            path: path.to_path_buf(),
            source,
        })?;
        let class = identify(&map).map_err(|err| Error::elf(path, err))?.class;

        Ok(Self {
            path: path.to_path_buf(),
            map,
            class,
            _file: file,
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The mapped bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.map
    }

    /// Word-size class of the object.
    pub fn class(&self) -> ElfClass {
        self.class
    }

    /// Extract the exported API, attributing any format error to this file.
    pub fn extract_api(&self) -> Result<ExtractedApi<'_>> {
        extract_api(self.bytes()).map_err(|err| Error::elf(&self.path, err))
    }
}

#[allow(unsafe_code)]
fn map_read_only(file: &File) -> std::io::Result<Mmap> {
    // SAFETY: the mapping is read-only and never outlives `MappedFile`,
    // which also owns `file`. Concurrent truncation by another process is
    // outside what any mmap-based reader can defend against.
    unsafe { Mmap::map(file) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::SymbolBinding;
    use crate::fixture::SharedObjectBuilder;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_open_shared_object() {
        let image = SharedObjectBuilder::new(ElfClass::Elf32)
            .symbol("foo", SymbolBinding::Global)
            .build();
        let tmp = write_temp(&image);

        let mapped = MappedFile::open(tmp.path()).unwrap();
        assert_eq!(mapped.class(), ElfClass::Elf32);
        assert_eq!(mapped.bytes(), &image[..]);
        assert_eq!(mapped.path(), tmp.path());

        let api = mapped.extract_api().unwrap();
        assert_eq!(api.records.len(), 1);
        assert_eq!(api.records[0].name, b"foo");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.so");
        let err = MappedFile::open(&path).unwrap_err();
        assert!(matches!(err, Error::FileOpen { .. }));
        assert!(err.to_string().starts_with("failed to open "));
        assert!(err.to_string().contains("nope.so"));
    }

    #[test]
    fn test_text_file_is_bad_magic() {
        let tmp = write_temp(b"just some text\n");
        let err = MappedFile::open(tmp.path()).unwrap_err();
        assert_eq!(err.elf_error(), Some(&ElfError::BadMagic));
        assert!(err.to_string().ends_with(": wrong ELF magic"));
    }

    #[test]
    fn test_empty_file_is_bad_magic() {
        let tmp = write_temp(b"");
        let err = MappedFile::open(tmp.path()).unwrap_err();
        assert_eq!(err.elf_error(), Some(&ElfError::BadMagic));
    }

    #[test]
    fn test_unsupported_class() {
        let mut image = SharedObjectBuilder::new(ElfClass::Elf64).build();
        image[4] = 9;
        let tmp = write_temp(&image);
        let err = MappedFile::open(tmp.path()).unwrap_err();
        assert_eq!(err.elf_error(), Some(&ElfError::UnsupportedClass(9)));
    }

    #[test]
    fn test_directory_is_not_mappable() {
        let dir = tempfile::tempdir().unwrap();
        // Opening a directory read-only succeeds on Linux; reading it does not.
        assert!(MappedFile::open(dir.path()).is_err());
    }
}
