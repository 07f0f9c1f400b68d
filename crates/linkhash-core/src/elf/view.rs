//! Bounds-checked view over an ELF image.
//!
//! [`ElfView`] borrows the raw bytes of an object and hands out parsed
//! records and sub-slices. It never trusts an offset or size taken from the
//! file: every access is validated against the length of the borrowed
//! region first, with checked arithmetic so hostile values cannot wrap.

use core::marker::PhantomData;

use super::header::{ElfData, ElfHeader, identify};
use super::layout::ElfLayout;
use super::section::SectionHeader;
use super::{ElfError, ElfResult};

/// Non-owning view of an ELF object of layout `L`.
#[derive(Debug, Clone, Copy)]
pub struct ElfView<'data, L: ElfLayout> {
    data: &'data [u8],
    encoding: ElfData,
    header: ElfHeader,
    _layout: PhantomData<L>,
}

impl<'data, L: ElfLayout> ElfView<'data, L> {
    /// Build a view, reading the identification bytes and file header.
    ///
    /// # Errors
    ///
    /// Identification errors from [`identify`], [`ElfError::ClassMismatch`]
    /// if the class byte names the other supported class than `L`, and
    /// [`ElfError::OutOfBounds`] if the header does not fit in `data`.
    pub fn parse(data: &'data [u8]) -> ElfResult<Self> {
        let ident = identify(data)?;
        if ident.class != L::CLASS {
            return Err(ElfError::ClassMismatch {
                expected: L::CLASS as u8,
                found: ident.class as u8,
            });
        }
        let header = L::parse_header(data, ident.data)?;
        Ok(Self {
            data,
            encoding: ident.data,
            header,
            _layout: PhantomData,
        })
    }

    /// The file header.
    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// Byte order of the object.
    pub fn encoding(&self) -> ElfData {
        self.encoding
    }

    /// Length of the underlying region.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying region is empty (never true for a parsed view).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of section headers.
    ///
    /// Honors the extended numbering escape: with `e_shnum == 0` and a
    /// non-zero `e_shoff`, the count lives in `sh_size` of section 0.
    pub fn section_count(&self) -> ElfResult<usize> {
        if self.header.e_shnum != 0 {
            return Ok(usize::from(self.header.e_shnum));
        }
        if self.header.e_shoff == 0 {
            return Ok(0);
        }

        let table = self.table(1)?;
        let first = L::parse_section_header(table, self.encoding)?;
        usize::try_from(first.sh_size).map_err(|_| ElfError::TruncatedTable {
            kind: "section header table",
            needed: u64::MAX,
            available: self.data.len() as u64,
        })
    }

    /// Lazily iterate the section header table.
    ///
    /// The whole table extent (`e_shoff + e_shnum * e_shentsize`) is checked
    /// before any header is returned. The iterator is `Clone`, so it can be
    /// restarted cheaply.
    ///
    /// # Errors
    ///
    /// - [`ElfError::InvalidEntrySize`] if `e_shentsize` is smaller than a
    ///   section header of this class
    /// - [`ElfError::TruncatedTable`] if the table extends past the region
    pub fn section_headers(&self) -> ElfResult<SectionHeaders<'data, L>> {
        let count = self.section_count()?;
        let table = if count == 0 { &[][..] } else { self.table(count)? };
        Ok(SectionHeaders {
            table,
            stride: usize::from(self.header.e_shentsize),
            count,
            next: 0,
            encoding: self.encoding,
            _layout: PhantomData,
        })
    }

    /// Look up one section header by index (as used by `sh_link`).
    ///
    /// # Errors
    ///
    /// [`ElfError::OutOfBounds`] if `index` is not inside the table, plus
    /// the errors of [`section_headers`](Self::section_headers).
    pub fn section(&self, index: u32) -> ElfResult<SectionHeader> {
        let mut headers = self.section_headers()?;
        let count = headers.len();
        headers.nth(index as usize).ok_or_else(|| {
            ElfError::out_of_bounds("section header index", u64::from(index), 1, count)
        })?
    }

    /// Bounds-checked slice of `size` bytes starting at file offset `offset`.
    ///
    /// # Errors
    ///
    /// [`ElfError::OutOfBounds`] if the offset or the extent lies outside
    /// the region.
    pub fn section_data(&self, offset: u64, size: u64) -> ElfResult<&'data [u8]> {
        let oob = || ElfError::out_of_bounds("section data", offset, size, self.data.len());
        let start = usize::try_from(offset).map_err(|_| oob())?;
        let len = usize::try_from(size).map_err(|_| oob())?;
        let end = start.checked_add(len).ok_or_else(oob)?;
        self.data.get(start..end).ok_or_else(oob)
    }

    /// File contents of a section. `SHT_NOBITS` sections yield an empty slice.
    pub fn section_bytes(&self, shdr: &SectionHeader) -> ElfResult<&'data [u8]> {
        if !shdr.has_file_data() {
            return Ok(&[]);
        }
        self.section_data(shdr.sh_offset, shdr.sh_size)
    }

    /// Slice covering the first `count` entries of the section header table.
    fn table(&self, count: usize) -> ElfResult<&'data [u8]> {
        let stride = usize::from(self.header.e_shentsize);
        if stride < L::SHDR_SIZE {
            return Err(ElfError::InvalidEntrySize {
                kind: "section header",
                entsize: stride as u64,
            });
        }

        let available = self.data.len() as u64;
        let truncated = |needed: u64| ElfError::TruncatedTable {
            kind: "section header table",
            needed,
            available,
        };
        let shoff = usize::try_from(self.header.e_shoff).map_err(|_| truncated(u64::MAX))?;
        let end = stride
            .checked_mul(count)
            .and_then(|extent| extent.checked_add(shoff))
            .ok_or_else(|| truncated(u64::MAX))?;
        self.data.get(shoff..end).ok_or_else(|| truncated(end as u64))
    }
}

/// Iterator over section headers, yielded in table order.
#[derive(Debug, Clone)]
pub struct SectionHeaders<'data, L: ElfLayout> {
    table: &'data [u8],
    stride: usize,
    count: usize,
    next: usize,
    encoding: ElfData,
    _layout: PhantomData<L>,
}

impl<L: ElfLayout> Iterator for SectionHeaders<'_, L> {
    type Item = ElfResult<SectionHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let start = self.next * self.stride;
        self.next += 1;
        Some(L::parse_section_header(&self.table[start..], self.encoding))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl<L: ElfLayout> ExactSizeIterator for SectionHeaders<'_, L> {}

impl<L: ElfLayout> core::iter::FusedIterator for SectionHeaders<'_, L> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::{Elf32, Elf64, ElfClass, SectionType};
    use crate::fixture::SharedObjectBuilder;

    fn set_u16_le(data: &mut [u8], at: usize, value: u16) {
        data[at..at + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn set_u64_le(data: &mut [u8], at: usize, value: u64) {
        data[at..at + 8].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn test_header_and_sections64() {
        let image = SharedObjectBuilder::new(ElfClass::Elf64)
            .symbol("foo", crate::elf::SymbolBinding::Global)
            .build();
        let view = ElfView::<Elf64>::parse(&image).unwrap();
        assert!(view.header().is_shared_object());
        assert_eq!(view.section_count().unwrap(), 3);

        let types: Vec<SectionType> = view
            .section_headers()
            .unwrap()
            .map(|shdr| shdr.unwrap().sh_type)
            .collect();
        assert_eq!(
            types,
            vec![SectionType::Null, SectionType::Strtab, SectionType::Dynsym]
        );
    }

    #[test]
    fn test_section_headers_restartable() {
        let image = SharedObjectBuilder::new(ElfClass::Elf32).build();
        let view = ElfView::<Elf32>::parse(&image).unwrap();
        let headers = view.section_headers().unwrap();
        assert_eq!(headers.len(), 3);
        let first: Vec<_> = headers.clone().collect();
        let second: Vec<_> = headers.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_class_mismatch() {
        let image = SharedObjectBuilder::new(ElfClass::Elf32).build();
        assert_eq!(
            ElfView::<Elf64>::parse(&image).unwrap_err(),
            ElfError::ClassMismatch {
                expected: 2,
                found: 1
            }
        );
        let image = SharedObjectBuilder::new(ElfClass::Elf64).build();
        assert_eq!(
            ElfView::<Elf32>::parse(&image).unwrap_err(),
            ElfError::ClassMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_truncated_section_table() {
        let mut image = SharedObjectBuilder::new(ElfClass::Elf64).build();
        image.truncate(image.len() - 1);
        let view = ElfView::<Elf64>::parse(&image).unwrap();
        assert!(matches!(
            view.section_headers(),
            Err(ElfError::TruncatedTable {
                kind: "section header table",
                ..
            })
        ));
    }

    #[test]
    fn test_huge_shoff_does_not_wrap() {
        let mut image = SharedObjectBuilder::new(ElfClass::Elf64).build();
        set_u64_le(&mut image, 40, u64::MAX - 8);
        let view = ElfView::<Elf64>::parse(&image).unwrap();
        assert!(matches!(
            view.section_headers(),
            Err(ElfError::TruncatedTable { .. })
        ));
    }

    #[test]
    fn test_small_shentsize_rejected() {
        let mut image = SharedObjectBuilder::new(ElfClass::Elf64).build();
        set_u16_le(&mut image, 58, 16);
        let view = ElfView::<Elf64>::parse(&image).unwrap();
        assert!(matches!(
            view.section_headers(),
            Err(ElfError::InvalidEntrySize {
                kind: "section header",
                entsize: 16
            })
        ));
    }

    #[test]
    fn test_no_section_table() {
        let mut image = SharedObjectBuilder::new(ElfClass::Elf64).build();
        set_u64_le(&mut image, 40, 0);
        set_u16_le(&mut image, 60, 0);
        let view = ElfView::<Elf64>::parse(&image).unwrap();
        assert_eq!(view.section_count().unwrap(), 0);
        assert_eq!(view.section_headers().unwrap().count(), 0);
    }

    #[test]
    fn test_extended_section_count() {
        let (mut image, layout) = SharedObjectBuilder::new(ElfClass::Elf64).build_with_layout();
        // e_shnum = 0, section 0 sh_size = 3
        set_u16_le(&mut image, 60, 0);
        set_u64_le(&mut image, layout.section_headers + 32, 3);
        let view = ElfView::<Elf64>::parse(&image).unwrap();
        assert_eq!(view.section_count().unwrap(), 3);
        assert_eq!(view.section_headers().unwrap().count(), 3);
    }

    #[test]
    fn test_section_lookup() {
        let image = SharedObjectBuilder::new(ElfClass::Elf64).build();
        let view = ElfView::<Elf64>::parse(&image).unwrap();
        assert_eq!(view.section(1).unwrap().sh_type, SectionType::Strtab);
        assert!(matches!(
            view.section(3),
            Err(ElfError::OutOfBounds {
                kind: "section header index",
                offset: 3,
                ..
            })
        ));
        assert!(view.section(u32::MAX).is_err());
    }

    #[test]
    fn test_section_data_bounds() {
        let image = SharedObjectBuilder::new(ElfClass::Elf64).build();
        let view = ElfView::<Elf64>::parse(&image).unwrap();
        let len = view.len() as u64;

        assert_eq!(view.section_data(0, 4).unwrap(), b"\x7fELF");
        assert_eq!(view.section_data(len, 0).unwrap(), b"");
        assert!(view.section_data(len - 2, 4).is_err());
        assert!(view.section_data(len + 1, 0).is_err());
        assert!(matches!(
            view.section_data(u64::MAX, 2),
            Err(ElfError::OutOfBounds {
                kind: "section data",
                ..
            })
        ));
    }
}
