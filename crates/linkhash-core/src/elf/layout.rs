//! Word-size layouts for ELF32 and ELF64 records.
//!
//! The two classes differ only in field widths and offsets. Everything
//! above this module is written once against [`ElfLayout`] and instantiated
//! for [`Elf32`] and [`Elf64`].

use super::header::{ElfClass, ElfData, ElfHeader, ElfMachine, ElfType};
use super::section::{SectionFlags, SectionHeader, SectionType};
use super::symbol::{SymbolBinding, SymbolEntry};
use super::{EI_NIDENT, ElfError, ElfResult};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Elf32 {}
    impl Sealed for super::Elf64 {}
}

/// Field layout of one ELF class.
///
/// Record parsers take a slice that starts at the record; they check the
/// slice length themselves, so a short slice is an error and never a panic.
pub trait ElfLayout: sealed::Sealed + Copy + core::fmt::Debug + 'static {
    /// Class byte this layout decodes.
    const CLASS: ElfClass;
    /// Size of the file header.
    const EHDR_SIZE: usize;
    /// Size of one section header.
    const SHDR_SIZE: usize;
    /// Size of one symbol table entry.
    const SYM_SIZE: usize;

    /// Parse the file header at the start of `data`.
    fn parse_header(data: &[u8], encoding: ElfData) -> ElfResult<ElfHeader>;

    /// Parse one section header.
    fn parse_section_header(data: &[u8], encoding: ElfData) -> ElfResult<SectionHeader>;

    /// Parse one symbol table entry.
    fn parse_symbol(data: &[u8], encoding: ElfData) -> ElfResult<SymbolEntry>;

    /// Extract the binding nibble from `st_info` (`ELFxx_ST_BIND`).
    fn st_bind(st_info: u8) -> u8;
}

/// 32-bit objects (`ELFCLASS32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf32;

/// 64-bit objects (`ELFCLASS64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elf64;

fn ensure_len(data: &[u8], needed: usize, kind: &'static str) -> ElfResult<()> {
    if data.len() < needed {
        return Err(ElfError::out_of_bounds(kind, 0, needed as u64, data.len()));
    }
    Ok(())
}

fn copy_ident(data: &[u8]) -> [u8; EI_NIDENT] {
    let mut e_ident = [0u8; EI_NIDENT];
    e_ident.copy_from_slice(&data[..EI_NIDENT]);
    e_ident
}

impl ElfLayout for Elf64 {
    const CLASS: ElfClass = ElfClass::Elf64;
    const EHDR_SIZE: usize = 64;
    const SHDR_SIZE: usize = 64;
    const SYM_SIZE: usize = 24;

    fn parse_header(data: &[u8], e: ElfData) -> ElfResult<ElfHeader> {
        ensure_len(data, Self::EHDR_SIZE, "file header")?;

        Ok(ElfHeader {
            e_ident: copy_ident(data),
            e_type: ElfType::from(e.read_u16(data, 16)),
            e_machine: ElfMachine::from(e.read_u16(data, 18)),
            e_version: e.read_u32(data, 20),
            e_entry: e.read_u64(data, 24),
            e_phoff: e.read_u64(data, 32),
            e_shoff: e.read_u64(data, 40),
            e_flags: e.read_u32(data, 48),
            e_ehsize: e.read_u16(data, 52),
            e_phentsize: e.read_u16(data, 54),
            e_phnum: e.read_u16(data, 56),
            e_shentsize: e.read_u16(data, 58),
            e_shnum: e.read_u16(data, 60),
            e_shstrndx: e.read_u16(data, 62),
        })
    }

    fn parse_section_header(data: &[u8], e: ElfData) -> ElfResult<SectionHeader> {
        ensure_len(data, Self::SHDR_SIZE, "section header")?;

        Ok(SectionHeader {
            sh_name: e.read_u32(data, 0),
            sh_type: SectionType::from(e.read_u32(data, 4)),
            sh_flags: SectionFlags(e.read_u64(data, 8)),
            sh_addr: e.read_u64(data, 16),
            sh_offset: e.read_u64(data, 24),
            sh_size: e.read_u64(data, 32),
            sh_link: e.read_u32(data, 40),
            sh_info: e.read_u32(data, 44),
            sh_addralign: e.read_u64(data, 48),
            sh_entsize: e.read_u64(data, 56),
        })
    }

    fn parse_symbol(data: &[u8], e: ElfData) -> ElfResult<SymbolEntry> {
        ensure_len(data, Self::SYM_SIZE, "symbol entry")?;

        let st_info = data[4];
        Ok(SymbolEntry {
            st_name: e.read_u32(data, 0),
            st_info,
            st_other: data[5],
            st_shndx: e.read_u16(data, 6),
            st_value: e.read_u64(data, 8),
            st_size: e.read_u64(data, 16),
            binding: SymbolBinding::from(Self::st_bind(st_info)),
        })
    }

    fn st_bind(st_info: u8) -> u8 {
        st_info >> 4
    }
}

impl ElfLayout for Elf32 {
    const CLASS: ElfClass = ElfClass::Elf32;
    const EHDR_SIZE: usize = 52;
    const SHDR_SIZE: usize = 40;
    const SYM_SIZE: usize = 16;

    fn parse_header(data: &[u8], e: ElfData) -> ElfResult<ElfHeader> {
        ensure_len(data, Self::EHDR_SIZE, "file header")?;

        Ok(ElfHeader {
            e_ident: copy_ident(data),
            e_type: ElfType::from(e.read_u16(data, 16)),
            e_machine: ElfMachine::from(e.read_u16(data, 18)),
            e_version: e.read_u32(data, 20),
            e_entry: u64::from(e.read_u32(data, 24)),
            e_phoff: u64::from(e.read_u32(data, 28)),
            e_shoff: u64::from(e.read_u32(data, 32)),
            e_flags: e.read_u32(data, 36),
            e_ehsize: e.read_u16(data, 40),
            e_phentsize: e.read_u16(data, 42),
            e_phnum: e.read_u16(data, 44),
            e_shentsize: e.read_u16(data, 46),
            e_shnum: e.read_u16(data, 48),
            e_shstrndx: e.read_u16(data, 50),
        })
    }

    fn parse_section_header(data: &[u8], e: ElfData) -> ElfResult<SectionHeader> {
        ensure_len(data, Self::SHDR_SIZE, "section header")?;

        Ok(SectionHeader {
            sh_name: e.read_u32(data, 0),
            sh_type: SectionType::from(e.read_u32(data, 4)),
            sh_flags: SectionFlags(u64::from(e.read_u32(data, 8))),
            sh_addr: u64::from(e.read_u32(data, 12)),
            sh_offset: u64::from(e.read_u32(data, 16)),
            sh_size: u64::from(e.read_u32(data, 20)),
            sh_link: e.read_u32(data, 24),
            sh_info: e.read_u32(data, 28),
            sh_addralign: u64::from(e.read_u32(data, 32)),
            sh_entsize: u64::from(e.read_u32(data, 36)),
        })
    }

    fn parse_symbol(data: &[u8], e: ElfData) -> ElfResult<SymbolEntry> {
        ensure_len(data, Self::SYM_SIZE, "symbol entry")?;

        // ELF32 puts value/size ahead of info/other.
        let st_info = data[12];
        Ok(SymbolEntry {
            st_name: e.read_u32(data, 0),
            st_value: u64::from(e.read_u32(data, 4)),
            st_size: u64::from(e.read_u32(data, 8)),
            st_info,
            st_other: data[13],
            st_shndx: e.read_u16(data, 14),
            binding: SymbolBinding::from(Self::st_bind(st_info)),
        })
    }

    fn st_bind(st_info: u8) -> u8 {
        st_info >> 4
    }
}
