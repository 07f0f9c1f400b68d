//! Synthetic shared objects.
//!
//! [`SharedObjectBuilder`] writes the smallest ELF image the extractor
//! accepts: a file header, one string table, one symbol table and a section
//! header table, in either class and byte order. Tests use it instead of
//! checked-in binaries so that every fixture is visible in the source.
//!
//! Image layout:
//!
//! ```text
//! [ file header | .strtab | pad | symbols | pad | section headers ]
//!                                             [NULL, STRTAB, SYMTAB/DYNSYM]
//! ```

use core::ops::Range;

use crate::elf::layout::{Elf32, Elf64, ElfLayout};
use crate::elf::{
    ELF_MAGIC, EI_NIDENT, ElfClass, ElfData, ElfMachine, ElfType, SectionFlags, SectionType,
    SymbolBinding, SymbolType,
};

const SHN_ABS: u16 = 0xfff1;

/// One symbol to emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSymbol {
    pub name: Vec<u8>,
    pub binding: SymbolBinding,
    pub symbol_type: SymbolType,
}

/// Where the builder placed each part of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureLayout {
    /// Byte range of the string table.
    pub strtab: Range<usize>,
    /// Byte range of the symbol table (empty without one).
    pub symtab: Range<usize>,
    /// Offset of the section header table (`e_shoff`).
    pub section_headers: usize,
}

/// Builder for minimal ELF shared objects.
#[derive(Debug, Clone)]
pub struct SharedObjectBuilder {
    class: ElfClass,
    encoding: ElfData,
    e_type: ElfType,
    machine: ElfMachine,
    symbol_section: Option<SectionType>,
    symbol_entsize: Option<usize>,
    symbols: Vec<FixtureSymbol>,
}

impl SharedObjectBuilder {
    /// Little-endian `ET_DYN` object with an empty `.dynsym`.
    pub fn new(class: ElfClass) -> Self {
        let machine = match class {
            ElfClass::Elf32 => ElfMachine::I386,
            ElfClass::Elf64 => ElfMachine::X86_64,
        };
        Self {
            class,
            encoding: ElfData::Lsb,
            e_type: ElfType::Dyn,
            machine,
            symbol_section: Some(SectionType::Dynsym),
            symbol_entsize: None,
            symbols: Vec::new(),
        }
    }

    #[must_use]
    pub fn encoding(mut self, encoding: ElfData) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn object_type(mut self, e_type: ElfType) -> Self {
        self.e_type = e_type;
        self
    }

    #[must_use]
    pub fn machine(mut self, machine: ElfMachine) -> Self {
        self.machine = machine;
        self
    }

    /// Kind of the symbol table section (`Symtab` or `Dynsym`).
    #[must_use]
    pub fn symbol_section(mut self, kind: SectionType) -> Self {
        self.symbol_section = Some(kind);
        self
    }

    /// Emit no symbol table at all, as in a fully stripped object.
    #[must_use]
    pub fn without_symbol_table(mut self) -> Self {
        self.symbol_section = None;
        self
    }

    /// Stride of the symbol table; defaults to the class's entry size.
    #[must_use]
    pub fn symbol_entsize(mut self, entsize: usize) -> Self {
        self.symbol_entsize = Some(entsize);
        self
    }

    /// Add a function symbol.
    #[must_use]
    pub fn symbol(self, name: &str, binding: SymbolBinding) -> Self {
        self.symbol_bytes(name.as_bytes(), binding)
    }

    /// Add a function symbol with a raw byte name.
    #[must_use]
    pub fn symbol_bytes(mut self, name: &[u8], binding: SymbolBinding) -> Self {
        self.symbols.push(FixtureSymbol {
            name: name.to_vec(),
            binding,
            symbol_type: SymbolType::Func,
        });
        self
    }

    /// Write the image.
    pub fn build(&self) -> Vec<u8> {
        self.build_with_layout().0
    }

    /// Write the image and report where its parts landed.
    pub fn build_with_layout(&self) -> (Vec<u8>, FixtureLayout) {
        let (ehdr_size, shdr_size, sym_size) = match self.class {
            ElfClass::Elf32 => (Elf32::EHDR_SIZE, Elf32::SHDR_SIZE, Elf32::SYM_SIZE),
            ElfClass::Elf64 => (Elf64::EHDR_SIZE, Elf64::SHDR_SIZE, Elf64::SYM_SIZE),
        };

        let mut strtab = vec![0u8];
        let mut name_offsets = Vec::with_capacity(self.symbols.len());
        for sym in &self.symbols {
            name_offsets.push(strtab.len() as u32);
            strtab.extend_from_slice(&sym.name);
            strtab.push(0);
        }

        let entsize = self.symbol_entsize.unwrap_or(sym_size);
        let strtab_range = ehdr_size..ehdr_size + strtab.len();
        let symtab_start = align8(strtab_range.end);
        let symtab_range = match self.symbol_section {
            Some(_) => symtab_start..symtab_start + (self.symbols.len() + 1) * entsize,
            None => symtab_start..symtab_start,
        };
        let shoff = align8(symtab_range.end);
        let shnum: u16 = if self.symbol_section.is_some() { 3 } else { 2 };

        let mut w = Writer {
            buf: Vec::with_capacity(shoff + usize::from(shnum) * shdr_size),
            class: self.class,
            encoding: self.encoding,
        };

        // File header
        w.bytes(&ELF_MAGIC);
        w.u8(self.class as u8);
        w.u8(self.encoding as u8);
        w.u8(1);
        w.pad_to(EI_NIDENT);
        w.u16(self.e_type.into());
        w.u16(self.machine.into());
        w.u32(1);
        w.word(0);
        w.word(0);
        w.word(shoff as u64);
        w.u32(0);
        w.u16(ehdr_size as u16);
        w.u16(0);
        w.u16(0);
        w.u16(shdr_size as u16);
        w.u16(shnum);
        w.u16(0);
        debug_assert_eq!(w.buf.len(), ehdr_size);

        w.bytes(&strtab);

        if self.symbol_section.is_some() {
            w.pad_to(symtab_range.start);
            w.zeros(entsize);
            for (i, (sym, &name)) in self.symbols.iter().zip(&name_offsets).enumerate() {
                let entry_start = w.buf.len();
                let info = (u8::from(sym.binding) << 4) | (u8::from(sym.symbol_type) & 0xf);
                let value = 0x1000 + 0x10 * i as u64;
                match self.class {
                    ElfClass::Elf32 => {
                        w.u32(name);
                        w.u32(value as u32);
                        w.u32(0x10);
                        w.u8(info);
                        w.u8(0);
                        w.u16(SHN_ABS);
                    }
                    ElfClass::Elf64 => {
                        w.u32(name);
                        w.u8(info);
                        w.u8(0);
                        w.u16(SHN_ABS);
                        w.u64(value);
                        w.u64(0x10);
                    }
                }
                w.pad_to(entry_start + entsize);
            }
        }

        // Section headers
        w.pad_to(shoff);
        w.zeros(shdr_size);
        w.section_header(SectionHeaderFields {
            sh_type: SectionType::Strtab,
            offset: strtab_range.start,
            size: strtab.len(),
            link: 0,
            info: 0,
            align: 1,
            entsize: 0,
        });
        if let Some(kind) = self.symbol_section {
            w.section_header(SectionHeaderFields {
                sh_type: kind,
                offset: symtab_range.start,
                size: symtab_range.len(),
                link: 1,
                info: 1,
                align: 8,
                entsize,
            });
        }

        let layout = FixtureLayout {
            strtab: strtab_range,
            symtab: symtab_range,
            section_headers: shoff,
        };
        (w.buf, layout)
    }
}

fn align8(offset: usize) -> usize {
    offset.next_multiple_of(8)
}

struct SectionHeaderFields {
    sh_type: SectionType,
    offset: usize,
    size: usize,
    link: u32,
    info: u32,
    align: u64,
    entsize: usize,
}

struct Writer {
    buf: Vec<u8>,
    class: ElfClass,
    encoding: ElfData,
}

impl Writer {
    fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn zeros(&mut self, count: usize) {
        self.buf.resize(self.buf.len() + count, 0);
    }

    fn pad_to(&mut self, len: usize) {
        if self.buf.len() < len {
            self.buf.resize(len, 0);
        }
    }

    fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn u16(&mut self, value: u16) {
        match self.encoding {
            ElfData::Lsb => self.bytes(&value.to_le_bytes()),
            ElfData::Msb => self.bytes(&value.to_be_bytes()),
        }
    }

    fn u32(&mut self, value: u32) {
        match self.encoding {
            ElfData::Lsb => self.bytes(&value.to_le_bytes()),
            ElfData::Msb => self.bytes(&value.to_be_bytes()),
        }
    }

    fn u64(&mut self, value: u64) {
        match self.encoding {
            ElfData::Lsb => self.bytes(&value.to_le_bytes()),
            ElfData::Msb => self.bytes(&value.to_be_bytes()),
        }
    }

    /// Address-sized field.
    fn word(&mut self, value: u64) {
        match self.class {
            ElfClass::Elf32 => self.u32(value as u32),
            ElfClass::Elf64 => self.u64(value),
        }
    }

    fn section_header(&mut self, fields: SectionHeaderFields) {
        self.u32(0);
        self.u32(fields.sh_type.into());
        self.word(SectionFlags::SHF_ALLOC);
        self.word(0);
        self.word(fields.offset as u64);
        self.word(fields.size as u64);
        self.u32(fields.link);
        self.u32(fields.info);
        self.word(fields.align);
        self.word(fields.entsize as u64);
    }
}
