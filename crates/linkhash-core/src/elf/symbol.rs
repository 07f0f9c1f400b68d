//! Symbol table entries and string table lookup.
//!
//! Symbols represent named entities (functions, variables) in an ELF file.

use super::{ElfError, ElfResult};

/// Symbol binding (scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolBinding {
    /// Local (not visible outside object file)
    Local,
    /// Global (visible everywhere)
    Global,
    /// Weak (like global, but may be overridden)
    Weak,
    /// Anything else (`STB_GNU_UNIQUE`, OS/processor specific)
    Unknown(u8),
}

impl From<u8> for SymbolBinding {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Local,
            1 => Self::Global,
            2 => Self::Weak,
            other => Self::Unknown(other),
        }
    }
}

impl From<SymbolBinding> for u8 {
    fn from(value: SymbolBinding) -> Self {
        match value {
            SymbolBinding::Local => 0,
            SymbolBinding::Global => 1,
            SymbolBinding::Weak => 2,
            SymbolBinding::Unknown(v) => v,
        }
    }
}

/// Symbol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolType {
    /// Unspecified type
    NoType,
    /// Data object (variable)
    Object,
    /// Function
    Func,
    /// Section
    Section,
    /// Source file name
    File,
    /// Common symbol
    Common,
    /// TLS data object
    Tls,
    /// Indirect function (GNU extension)
    IFunc,
    /// Unknown type
    Unknown(u8),
}

impl From<u8> for SymbolType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::NoType,
            1 => Self::Object,
            2 => Self::Func,
            3 => Self::Section,
            4 => Self::File,
            5 => Self::Common,
            6 => Self::Tls,
            10 => Self::IFunc,
            other => Self::Unknown(other),
        }
    }
}

impl From<SymbolType> for u8 {
    fn from(value: SymbolType) -> Self {
        match value {
            SymbolType::NoType => 0,
            SymbolType::Object => 1,
            SymbolType::Func => 2,
            SymbolType::Section => 3,
            SymbolType::File => 4,
            SymbolType::Common => 5,
            SymbolType::Tls => 6,
            SymbolType::IFunc => 10,
            SymbolType::Unknown(v) => v,
        }
    }
}

/// Symbol table entry, widened to 64-bit fields for either class.
///
/// `binding` is decoded by the layout that parsed the entry, so callers
/// never apply a class-specific `ST_BIND` rule themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolEntry {
    /// Symbol name (index into string table)
    pub st_name: u32,
    /// Symbol info (type and binding)
    pub st_info: u8,
    /// Symbol visibility
    pub st_other: u8,
    /// Section index
    pub st_shndx: u16,
    /// Symbol value (address)
    pub st_value: u64,
    /// Symbol size
    pub st_size: u64,
    /// Binding extracted from `st_info`
    pub binding: SymbolBinding,
}

impl SymbolEntry {
    /// Get the symbol type.
    pub fn symbol_type(&self) -> SymbolType {
        SymbolType::from(self.st_info & 0xf)
    }

    /// Check if this is a global symbol.
    pub fn is_global(&self) -> bool {
        matches!(self.binding, SymbolBinding::Global)
    }

    /// Check if this is a weak symbol.
    pub fn is_weak(&self) -> bool {
        matches!(self.binding, SymbolBinding::Weak)
    }
}

/// Get a NUL-terminated string from a string table.
///
/// The returned slice excludes the terminator. Names are raw bytes; ELF
/// does not promise any particular encoding.
///
/// # Errors
///
/// [`ElfError::OutOfBounds`] if `index` is outside `strtab` or the string
/// runs off the end of the table without a terminator.
pub fn get_string(strtab: &[u8], index: u32) -> ElfResult<&[u8]> {
    let start = index as usize;
    if start >= strtab.len() {
        return Err(ElfError::out_of_bounds(
            "symbol name",
            u64::from(index),
            1,
            strtab.len(),
        ));
    }

    let tail = &strtab[start..];
    let end = tail.iter().position(|&b| b == 0).ok_or_else(|| {
        ElfError::out_of_bounds(
            "unterminated symbol name",
            u64::from(index),
            tail.len() as u64 + 1,
            strtab.len(),
        )
    })?;

    Ok(&tail[..end])
}
