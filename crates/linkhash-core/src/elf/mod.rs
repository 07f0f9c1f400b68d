//! ELF (Executable and Linkable Format) parsing.
//!
//! This module reads just enough of an ELF object to recover its symbol
//! tables: the file header, the section header table, symbol entries and
//! string tables. Both ELF32 and ELF64 objects in either byte order are
//! supported through a single algorithm parameterized by [`ElfLayout`].
//!
//! # Design Principles
//!
//! 1. **Untrusted input**: every offset and size declared by the file is
//!    checked against the mapped region before it is dereferenced
//! 2. **No pointer casts**: records are decoded field by field from
//!    validated byte slices
//! 3. **Class generic**: [`ElfView`] is instantiated once per word size;
//!    the class byte is read once and dispatched at the entry point
//!
//! # Not Supported
//!
//! - Relocations, program headers, dynamic linking metadata
//! - Symbol demangling

pub mod header;
pub mod layout;
pub mod section;
pub mod symbol;
pub mod view;

pub use header::{ElfClass, ElfData, ElfHeader, ElfMachine, ElfType, Ident, identify};
pub use layout::{Elf32, Elf64, ElfLayout};
pub use section::{SectionFlags, SectionHeader, SectionType};
pub use symbol::{SymbolBinding, SymbolEntry, SymbolType, get_string};
pub use view::{ElfView, SectionHeaders};

use thiserror::Error;

/// ELF magic bytes: "\x7fELF"
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Size of ELF identification array
pub const EI_NIDENT: usize = 16;

/// Error type for ELF parsing operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElfError {
    /// The first bytes are not the ELF magic sequence
    #[error("wrong ELF magic")]
    BadMagic,
    /// Class byte is neither ELFCLASS32 nor ELFCLASS64
    #[error("unsupported ELF class: {0}")]
    UnsupportedClass(u8),
    /// A supported class was handed to the layout of the other class
    #[error("ELF class mismatch: expected {expected}, found {found}")]
    ClassMismatch { expected: u8, found: u8 },
    /// Data encoding byte is neither little- nor big-endian
    #[error("unsupported data encoding: {0}")]
    UnsupportedEncoding(u8),
    /// Object type is not `ET_DYN`
    #[error("not a shared object (3), e_type={e_type}")]
    NotSharedObject { e_type: u16 },
    /// Neither `SHT_SYMTAB` nor `SHT_DYNSYM` present
    #[error("shared object contains no symbol table section")]
    NoSymbolTable,
    /// A record or slice lies (partly) outside its container
    #[error("{kind} out of bounds: offset {offset:#x} + {size} exceeds {limit:#x}")]
    OutOfBounds {
        kind: &'static str,
        offset: u64,
        size: u64,
        limit: u64,
    },
    /// A table declared by the file extends past the mapped region
    #[error("truncated {kind}: need {needed} bytes, have {available}")]
    TruncatedTable {
        kind: &'static str,
        needed: u64,
        available: u64,
    },
    /// A table stride is zero or smaller than the record it holds
    #[error("invalid {kind} entry size: {entsize}")]
    InvalidEntrySize { kind: &'static str, entsize: u64 },
}

impl ElfError {
    pub(crate) fn out_of_bounds(kind: &'static str, offset: u64, size: u64, limit: usize) -> Self {
        Self::OutOfBounds {
            kind,
            offset,
            size,
            limit: limit as u64,
        }
    }
}

/// Result type for ELF operations.
pub type ElfResult<T> = Result<T, ElfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elf_magic() {
        assert_eq!(ELF_MAGIC, [0x7f, 0x45, 0x4c, 0x46]);
    }

    #[test]
    fn test_error_display() {
        let err = ElfError::BadMagic;
        assert_eq!(format!("{err}"), "wrong ELF magic");

        let err = ElfError::ClassMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(format!("{err}"), "ELF class mismatch: expected 2, found 1");

        let err = ElfError::NotSharedObject { e_type: 2 };
        assert_eq!(format!("{err}"), "not a shared object (3), e_type=2");

        let err = ElfError::TruncatedTable {
            kind: "section header table",
            needed: 256,
            available: 200,
        };
        assert_eq!(
            format!("{err}"),
            "truncated section header table: need 256 bytes, have 200"
        );

        let err = ElfError::out_of_bounds("symbol name", 0x40, 1, 0x10);
        assert_eq!(
            format!("{err}"),
            "symbol name out of bounds: offset 0x40 + 1 exceeds 0x10"
        );
    }
}
