//! ELF identification and file header.
//!
//! The ELF header is the first structure in any ELF file and contains
//! essential metadata for parsing the rest of the file. The identification
//! bytes (`e_ident`) are layout independent and are decoded first to decide
//! which [`ElfLayout`](super::ElfLayout) reads the remainder.

use super::{EI_NIDENT, ELF_MAGIC, ElfError, ElfResult};

/// Indices into the e_ident array.
pub(crate) mod ident {
    pub const EI_CLASS: usize = 4;
    pub const EI_DATA: usize = 5;
    pub const EI_VERSION: usize = 6;
    pub const EI_OSABI: usize = 7;
}

/// ELF class (32-bit or 64-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ElfClass {
    /// 32-bit objects
    Elf32 = 1,
    /// 64-bit objects
    Elf64 = 2,
}

impl TryFrom<u8> for ElfClass {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Elf32),
            2 => Ok(Self::Elf64),
            _ => Err(value),
        }
    }
}

impl ElfClass {
    /// Short name used in logs ("ELF32" / "ELF64").
    pub fn name(self) -> &'static str {
        match self {
            Self::Elf32 => "ELF32",
            Self::Elf64 => "ELF64",
        }
    }
}

/// ELF data encoding (endianness).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ElfData {
    /// Little-endian (2's complement)
    Lsb = 1,
    /// Big-endian (2's complement)
    Msb = 2,
}

impl TryFrom<u8> for ElfData {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Lsb),
            2 => Ok(Self::Msb),
            _ => Err(value),
        }
    }
}

impl ElfData {
    // Callers guarantee `data[at..at + N]` is in bounds.

    pub(crate) fn read_u16(self, data: &[u8], at: usize) -> u16 {
        let bytes = [data[at], data[at + 1]];
        match self {
            Self::Lsb => u16::from_le_bytes(bytes),
            Self::Msb => u16::from_be_bytes(bytes),
        }
    }

    pub(crate) fn read_u32(self, data: &[u8], at: usize) -> u32 {
        let bytes = [data[at], data[at + 1], data[at + 2], data[at + 3]];
        match self {
            Self::Lsb => u32::from_le_bytes(bytes),
            Self::Msb => u32::from_be_bytes(bytes),
        }
    }

    pub(crate) fn read_u64(self, data: &[u8], at: usize) -> u64 {
        let bytes = [
            data[at],
            data[at + 1],
            data[at + 2],
            data[at + 3],
            data[at + 4],
            data[at + 5],
            data[at + 6],
            data[at + 7],
        ];
        match self {
            Self::Lsb => u64::from_le_bytes(bytes),
            Self::Msb => u64::from_be_bytes(bytes),
        }
    }
}

/// ELF object file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfType {
    /// No file type
    None,
    /// Relocatable file
    Rel,
    /// Executable file
    Exec,
    /// Shared object file
    Dyn,
    /// Core file
    Core,
    /// Unknown type
    Unknown(u16),
}

impl From<u16> for ElfType {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Rel,
            2 => Self::Exec,
            3 => Self::Dyn,
            4 => Self::Core,
            other => Self::Unknown(other),
        }
    }
}

impl From<ElfType> for u16 {
    fn from(value: ElfType) -> Self {
        match value {
            ElfType::None => 0,
            ElfType::Rel => 1,
            ElfType::Exec => 2,
            ElfType::Dyn => 3,
            ElfType::Core => 4,
            ElfType::Unknown(v) => v,
        }
    }
}

/// ELF machine architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfMachine {
    /// No machine
    None,
    /// Intel 80386
    I386,
    /// ARM
    Arm,
    /// AMD x86-64
    X86_64,
    /// ARM AARCH64
    Aarch64,
    /// RISC-V
    RiscV,
    /// Unknown machine
    Unknown(u16),
}

impl From<u16> for ElfMachine {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::None,
            3 => Self::I386,
            40 => Self::Arm,
            62 => Self::X86_64,
            183 => Self::Aarch64,
            243 => Self::RiscV,
            other => Self::Unknown(other),
        }
    }
}

impl From<ElfMachine> for u16 {
    fn from(value: ElfMachine) -> Self {
        match value {
            ElfMachine::None => 0,
            ElfMachine::I386 => 3,
            ElfMachine::Arm => 40,
            ElfMachine::X86_64 => 62,
            ElfMachine::Aarch64 => 183,
            ElfMachine::RiscV => 243,
            ElfMachine::Unknown(v) => v,
        }
    }
}

/// Decoded identification bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
    pub class: ElfClass,
    pub data: ElfData,
    pub version: u8,
    pub osabi: u8,
}

/// Validate the magic and decode `e_ident`.
///
/// # Errors
///
/// - [`ElfError::BadMagic`] if fewer than four bytes are present or they are
///   not `\x7fELF`
/// - [`ElfError::UnsupportedClass`] / [`ElfError::UnsupportedEncoding`] for
///   unknown class or data bytes, checked as soon as each byte is present
/// - [`ElfError::OutOfBounds`] if the identification array is cut short
pub fn identify(data: &[u8]) -> ElfResult<Ident> {
    if data.len() < ELF_MAGIC.len() || data[..ELF_MAGIC.len()] != ELF_MAGIC {
        return Err(ElfError::BadMagic);
    }
    let truncated = || {
        ElfError::out_of_bounds("ELF identification", 0, EI_NIDENT as u64, data.len())
    };

    // Class and encoding are judged before the rest of e_ident is required.
    let class = data
        .get(ident::EI_CLASS)
        .ok_or_else(truncated)
        .and_then(|&b| ElfClass::try_from(b).map_err(ElfError::UnsupportedClass))?;
    let encoding = data
        .get(ident::EI_DATA)
        .ok_or_else(truncated)
        .and_then(|&b| ElfData::try_from(b).map_err(ElfError::UnsupportedEncoding))?;
    if data.len() < EI_NIDENT {
        return Err(truncated());
    }

    Ok(Ident {
        class,
        data: encoding,
        version: data[ident::EI_VERSION],
        osabi: data[ident::EI_OSABI],
    })
}

/// ELF file header, widened to 64-bit fields for either class.
#[derive(Debug, Clone, Copy)]
pub struct ElfHeader {
    /// ELF identification bytes
    pub e_ident: [u8; EI_NIDENT],
    /// Object file type
    pub e_type: ElfType,
    /// Machine architecture
    pub e_machine: ElfMachine,
    /// Object file version
    pub e_version: u32,
    /// Entry point virtual address
    pub e_entry: u64,
    /// Program header table file offset
    pub e_phoff: u64,
    /// Section header table file offset
    pub e_shoff: u64,
    /// Processor-specific flags
    pub e_flags: u32,
    /// ELF header size in bytes
    pub e_ehsize: u16,
    /// Program header table entry size
    pub e_phentsize: u16,
    /// Program header table entry count
    pub e_phnum: u16,
    /// Section header table entry size
    pub e_shentsize: u16,
    /// Section header table entry count
    pub e_shnum: u16,
    /// Section header string table index
    pub e_shstrndx: u16,
}

impl ElfHeader {
    /// Get the ELF class from the identification bytes.
    pub fn class(&self) -> Option<ElfClass> {
        ElfClass::try_from(self.e_ident[ident::EI_CLASS]).ok()
    }

    /// Get the data encoding from the identification bytes.
    pub fn data(&self) -> Option<ElfData> {
        ElfData::try_from(self.e_ident[ident::EI_DATA]).ok()
    }

    /// Check if this is a shared object (library).
    pub fn is_shared_object(&self) -> bool {
        matches!(self.e_type, ElfType::Dyn)
    }

    /// Require `ET_DYN`.
    pub fn ensure_shared_object(&self) -> ElfResult<()> {
        if !self.is_shared_object() {
            return Err(ElfError::NotSharedObject {
                e_type: self.e_type.into(),
            });
        }
        Ok(())
    }
}
