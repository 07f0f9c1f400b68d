//! Section header records.
//!
//! Section headers describe the file's sections for linking and debugging.
//! Only the fields needed to locate symbol and string tables are
//! interpreted; the rest are carried for diagnostics.

/// Section header type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionType {
    /// Inactive section
    Null,
    /// Program data
    Progbits,
    /// Symbol table
    Symtab,
    /// String table
    Strtab,
    /// Relocation with addends
    Rela,
    /// Symbol hash table
    Hash,
    /// Dynamic linking information
    Dynamic,
    /// Notes
    Note,
    /// Uninitialized data (BSS)
    Nobits,
    /// Relocation without addends
    Rel,
    /// Dynamic linker symbol table
    Dynsym,
    /// GNU hash table
    GnuHash,
    /// GNU version symbol table
    GnuVersym,
    /// Unknown type
    Unknown(u32),
}

impl From<u32> for SectionType {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Null,
            1 => Self::Progbits,
            2 => Self::Symtab,
            3 => Self::Strtab,
            4 => Self::Rela,
            5 => Self::Hash,
            6 => Self::Dynamic,
            7 => Self::Note,
            8 => Self::Nobits,
            9 => Self::Rel,
            11 => Self::Dynsym,
            0x6fff_fff6 => Self::GnuHash,
            0x6fff_ffff => Self::GnuVersym,
            other => Self::Unknown(other),
        }
    }
}

impl From<SectionType> for u32 {
    fn from(value: SectionType) -> Self {
        match value {
            SectionType::Null => 0,
            SectionType::Progbits => 1,
            SectionType::Symtab => 2,
            SectionType::Strtab => 3,
            SectionType::Rela => 4,
            SectionType::Hash => 5,
            SectionType::Dynamic => 6,
            SectionType::Note => 7,
            SectionType::Nobits => 8,
            SectionType::Rel => 9,
            SectionType::Dynsym => 11,
            SectionType::GnuHash => 0x6fff_fff6,
            SectionType::GnuVersym => 0x6fff_ffff,
            SectionType::Unknown(v) => v,
        }
    }
}

impl SectionType {
    /// Conventional `SHT_*` name, as printed by binutils.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Progbits => "PROGBITS",
            Self::Symtab => "SYMTAB",
            Self::Strtab => "STRTAB",
            Self::Rela => "RELA",
            Self::Hash => "HASH",
            Self::Dynamic => "DYNAMIC",
            Self::Note => "NOTE",
            Self::Nobits => "NOBITS",
            Self::Rel => "REL",
            Self::Dynsym => "DYNSYM",
            Self::GnuHash => "GNU_HASH",
            Self::GnuVersym => "VERSYM",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Section header flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionFlags(pub u64);

impl SectionFlags {
    /// Occupies memory during execution
    pub const SHF_ALLOC: u64 = 0x2;
}

/// Section header, widened to 64-bit fields for either class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Section name (index into string table)
    pub sh_name: u32,
    /// Section type
    pub sh_type: SectionType,
    /// Section flags
    pub sh_flags: SectionFlags,
    /// Virtual address in memory
    pub sh_addr: u64,
    /// Offset in file
    pub sh_offset: u64,
    /// Size in bytes
    pub sh_size: u64,
    /// Link to another section
    pub sh_link: u32,
    /// Additional section information
    pub sh_info: u32,
    /// Section alignment
    pub sh_addralign: u64,
    /// Entry size if section holds table
    pub sh_entsize: u64,
}

impl SectionHeader {
    /// Check if this is a symbol table section (static or dynamic).
    pub fn is_symtab(&self) -> bool {
        matches!(self.sh_type, SectionType::Symtab | SectionType::Dynsym)
    }

    /// `SHT_NOBITS` sections occupy no bytes in the file.
    pub fn has_file_data(&self) -> bool {
        !matches!(self.sh_type, SectionType::Nobits | SectionType::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_type_conversion() {
        assert!(matches!(SectionType::from(0), SectionType::Null));
        assert!(matches!(SectionType::from(2), SectionType::Symtab));
        assert!(matches!(SectionType::from(3), SectionType::Strtab));
        assert!(matches!(SectionType::from(11), SectionType::Dynsym));
        assert!(matches!(
            SectionType::from(0x6fff_fff6),
            SectionType::GnuHash
        ));
        assert!(matches!(
            SectionType::from(99999),
            SectionType::Unknown(99999)
        ));
        assert_eq!(u32::from(SectionType::Dynsym), 11);
        assert_eq!(u32::from(SectionType::Unknown(77)), 77);
    }

    #[test]
    fn test_section_type_names() {
        assert_eq!(SectionType::Symtab.name(), "SYMTAB");
        assert_eq!(SectionType::Dynsym.name(), "DYNSYM");
    }

    #[test]
    fn test_symtab_predicates() {
        let mut shdr = SectionHeader {
            sh_name: 0,
            sh_type: SectionType::Dynsym,
            sh_flags: SectionFlags(0),
            sh_addr: 0,
            sh_offset: 0,
            sh_size: 0,
            sh_link: 0,
            sh_info: 0,
            sh_addralign: 0,
            sh_entsize: 0,
        };
        assert!(shdr.is_symtab());
        shdr.sh_type = SectionType::Symtab;
        assert!(shdr.is_symtab());
        shdr.sh_type = SectionType::Strtab;
        assert!(!shdr.is_symtab());
        assert!(shdr.has_file_data());
        shdr.sh_type = SectionType::Nobits;
        assert!(!shdr.has_file_data());
    }
}
