//! Symbol extraction: from an ELF image to the set of exported records.

use crate::elf::{
    Elf32, Elf64, ElfClass, ElfError, ElfLayout, ElfMachine, ElfResult, ElfView, SectionHeader,
    SectionType, get_string, identify,
};

use super::fingerprint::ApiFingerprint;
use super::record::{ApiBinding, ApiRecord};

/// Exported records of one object, plus where they came from.
#[derive(Debug, Clone)]
pub struct ExtractedApi<'data> {
    /// Class of the object.
    pub class: ElfClass,
    /// Target machine of the object.
    pub machine: ElfMachine,
    /// Kind of the symbol table that was read (`Symtab` or `Dynsym`).
    pub symbol_section: SectionType,
    /// Entries walked in the symbol table, including discarded ones.
    pub symbols_scanned: usize,
    /// Retained `GLOBAL`/`WEAK` records, in table order.
    pub records: Vec<ApiRecord<'data>>,
}

impl<'data> ExtractedApi<'data> {
    /// Canonicalize into a fingerprint.
    pub fn into_fingerprint(self) -> ApiFingerprint<'data> {
        ApiFingerprint::new(self.records)
    }
}

/// Extract the API of an ELF image of either class.
///
/// Reads the class byte once and runs [`extract_from_view`] with the
/// matching layout.
pub fn extract_api(data: &[u8]) -> ElfResult<ExtractedApi<'_>> {
    match identify(data)?.class {
        ElfClass::Elf32 => extract_from_view(&ElfView::<Elf32>::parse(data)?),
        ElfClass::Elf64 => extract_from_view(&ElfView::<Elf64>::parse(data)?),
    }
}

/// Extract the API from a parsed view.
///
/// # Errors
///
/// - [`ElfError::NotSharedObject`] unless `e_type` is `ET_DYN`
/// - [`ElfError::NoSymbolTable`] if no `SHT_SYMTAB`/`SHT_DYNSYM` section exists
/// - [`ElfError::InvalidEntrySize`] / [`ElfError::TruncatedTable`] for a
///   malformed symbol table
/// - [`ElfError::OutOfBounds`] for any section, link or name that lies
///   outside its container
pub fn extract_from_view<'data, L: ElfLayout>(
    view: &ElfView<'data, L>,
) -> ElfResult<ExtractedApi<'data>> {
    let header = view.header();
    header.ensure_shared_object()?;

    let symtab = find_symbol_table(view)?;
    let strtab_header = view.section(symtab.sh_link)?;
    let strtab = view.section_bytes(&strtab_header)?;
    let symbols = view.section_bytes(&symtab)?;

    let entsize = symbol_stride::<L>(&symtab)?;
    if symbols.len() % entsize != 0 {
        return Err(ElfError::TruncatedTable {
            kind: "symbol table",
            needed: symbols.len().div_ceil(entsize) as u64 * entsize as u64,
            available: symbols.len() as u64,
        });
    }

    let mut records = Vec::new();
    let mut scanned = 0usize;
    for raw in symbols.chunks_exact(entsize) {
        scanned += 1;
        let sym = L::parse_symbol(raw, view.encoding())?;
        let Some(binding) = ApiBinding::from_symbol(sym.binding) else {
            continue;
        };
        let name = get_string(strtab, sym.st_name)?;
        records.push(ApiRecord::new(binding, name));
    }

    Ok(ExtractedApi {
        class: L::CLASS,
        machine: header.e_machine,
        symbol_section: symtab.sh_type,
        symbols_scanned: scanned,
        records,
    })
}

/// First `SHT_SYMTAB` or `SHT_DYNSYM` section in table order.
fn find_symbol_table<L: ElfLayout>(view: &ElfView<'_, L>) -> ElfResult<SectionHeader> {
    for shdr in view.section_headers()? {
        let shdr = shdr?;
        if shdr.is_symtab() {
            return Ok(shdr);
        }
    }
    Err(ElfError::NoSymbolTable)
}

fn symbol_stride<L: ElfLayout>(symtab: &SectionHeader) -> ElfResult<usize> {
    let invalid = || ElfError::InvalidEntrySize {
        kind: "symbol table",
        entsize: symtab.sh_entsize,
    };
    let entsize = usize::try_from(symtab.sh_entsize).map_err(|_| invalid())?;
    if entsize < L::SYM_SIZE {
        return Err(invalid());
    }
    Ok(entsize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::{ElfData, ElfType, SymbolBinding};
    use crate::fixture::SharedObjectBuilder;

    fn lines(api: &ExtractedApi<'_>) -> Vec<String> {
        api.records.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_binding_filter() {
        let image = SharedObjectBuilder::new(ElfClass::Elf64)
            .symbol("hidden_helper", SymbolBinding::Local)
            .symbol("api_call", SymbolBinding::Global)
            .symbol("api_hook", SymbolBinding::Weak)
            .symbol("unique_thing", SymbolBinding::Unknown(10))
            .build();
        let api = extract_api(&image).unwrap();

        assert_eq!(api.class, ElfClass::Elf64);
        assert_eq!(api.symbol_section, SectionType::Dynsym);
        // Null entry plus four symbols.
        assert_eq!(api.symbols_scanned, 5);
        assert_eq!(lines(&api), vec!["GLOBAL,api_call", "WEAK,api_hook"]);
    }

    #[test]
    fn test_static_symtab() {
        let image = SharedObjectBuilder::new(ElfClass::Elf32)
            .symbol_section(SectionType::Symtab)
            .symbol("f", SymbolBinding::Global)
            .build();
        let api = extract_api(&image).unwrap();
        assert_eq!(api.class, ElfClass::Elf32);
        assert_eq!(api.symbol_section, SectionType::Symtab);
        assert_eq!(lines(&api), vec!["GLOBAL,f"]);
    }

    #[test]
    fn test_same_result_for_every_layout() {
        let build = |class, encoding| {
            SharedObjectBuilder::new(class)
                .encoding(encoding)
                .symbol("foo", SymbolBinding::Global)
                .symbol("local", SymbolBinding::Local)
                .symbol("bar", SymbolBinding::Weak)
                .build()
        };
        let reference = build(ElfClass::Elf64, ElfData::Lsb);
        let expected = lines(&extract_api(&reference).unwrap());

        for class in [ElfClass::Elf32, ElfClass::Elf64] {
            for encoding in [ElfData::Lsb, ElfData::Msb] {
                let image = build(class, encoding);
                let api = extract_api(&image).unwrap();
                assert_eq!(api.class, class);
                assert_eq!(lines(&api), expected, "{class:?}/{encoding:?}");
            }
        }
    }

    #[test]
    fn test_not_shared_object() {
        let image = SharedObjectBuilder::new(ElfClass::Elf64)
            .object_type(ElfType::Exec)
            .symbol("main", SymbolBinding::Global)
            .build();
        assert_eq!(
            extract_api(&image).unwrap_err(),
            ElfError::NotSharedObject { e_type: 2 }
        );
    }

    #[test]
    fn test_no_symbol_table() {
        let image = SharedObjectBuilder::new(ElfClass::Elf64)
            .without_symbol_table()
            .build();
        assert_eq!(extract_api(&image).unwrap_err(), ElfError::NoSymbolTable);
    }

    #[test]
    fn test_empty_symbol_table() {
        let image = SharedObjectBuilder::new(ElfClass::Elf32).build();
        let api = extract_api(&image).unwrap();
        assert_eq!(api.symbols_scanned, 1);
        assert!(api.records.is_empty());
    }

    #[test]
    fn test_bad_magic() {
        assert_eq!(
            extract_api(b"#!/bin/sh\necho hi\n").unwrap_err(),
            ElfError::BadMagic
        );
    }

    #[test]
    fn test_name_offset_outside_strtab() {
        let (mut image, layout) = SharedObjectBuilder::new(ElfClass::Elf64)
            .symbol("foo", SymbolBinding::Global)
            .build_with_layout();
        // st_name of entry 1
        let at = layout.symtab.start + 24;
        image[at..at + 4].copy_from_slice(&0x1000u32.to_le_bytes());
        assert!(matches!(
            extract_api(&image),
            Err(ElfError::OutOfBounds {
                kind: "symbol name",
                offset: 0x1000,
                ..
            })
        ));
    }

    #[test]
    fn test_local_symbol_name_is_not_resolved() {
        let (mut image, layout) = SharedObjectBuilder::new(ElfClass::Elf64)
            .symbol("hidden", SymbolBinding::Local)
            .symbol("foo", SymbolBinding::Global)
            .build_with_layout();
        let at = layout.symtab.start + 24;
        image[at..at + 4].copy_from_slice(&0xffffu32.to_le_bytes());
        let api = extract_api(&image).unwrap();
        assert_eq!(lines(&api), vec!["GLOBAL,foo"]);
    }

    #[test]
    fn test_bad_strtab_link() {
        let (mut image, layout) = SharedObjectBuilder::new(ElfClass::Elf64).build_with_layout();
        // sh_link of section 2
        let at = layout.section_headers + 2 * 64 + 40;
        image[at..at + 4].copy_from_slice(&9u32.to_le_bytes());
        assert!(matches!(
            extract_api(&image),
            Err(ElfError::OutOfBounds {
                kind: "section header index",
                offset: 9,
                ..
            })
        ));
    }

    #[test]
    fn test_symbol_section_past_eof() {
        let (mut image, layout) = SharedObjectBuilder::new(ElfClass::Elf64).build_with_layout();
        // sh_size of section 2
        let at = layout.section_headers + 2 * 64 + 32;
        image[at..at + 8].copy_from_slice(&0x10_0000u64.to_le_bytes());
        assert!(matches!(
            extract_api(&image),
            Err(ElfError::OutOfBounds {
                kind: "section data",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_entsize() {
        let (mut image, layout) = SharedObjectBuilder::new(ElfClass::Elf64).build_with_layout();
        // sh_entsize of section 2
        let at = layout.section_headers + 2 * 64 + 56;
        image[at..at + 8].copy_from_slice(&0u64.to_le_bytes());
        assert_eq!(
            extract_api(&image).unwrap_err(),
            ElfError::InvalidEntrySize {
                kind: "symbol table",
                entsize: 0
            }
        );
    }

    #[test]
    fn test_partial_trailing_entry() {
        let (mut image, layout) = SharedObjectBuilder::new(ElfClass::Elf64)
            .symbol("foo", SymbolBinding::Global)
            .build_with_layout();
        let at = layout.section_headers + 2 * 64 + 32;
        image[at..at + 8].copy_from_slice(&(2 * 24 - 4u64).to_le_bytes());
        assert!(matches!(
            extract_api(&image),
            Err(ElfError::TruncatedTable {
                kind: "symbol table",
                ..
            })
        ));
    }

    #[test]
    fn test_wide_entsize_stride() {
        let image = SharedObjectBuilder::new(ElfClass::Elf32)
            .symbol_entsize(24)
            .symbol("a", SymbolBinding::Global)
            .symbol("b", SymbolBinding::Weak)
            .build();
        let api = extract_api(&image).unwrap();
        assert_eq!(api.symbols_scanned, 3);
        assert_eq!(lines(&api), vec!["GLOBAL,a", "WEAK,b"]);
    }
}
