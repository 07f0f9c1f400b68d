//! The unit of an API surface: one exported binding and name.

use core::cmp::Ordering;
use core::fmt;

use crate::elf::SymbolBinding;

/// Bindings that are part of the externally visible API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiBinding {
    Global,
    Weak,
}

impl ApiBinding {
    /// Keep `GLOBAL` and `WEAK`; everything else is not API.
    pub fn from_symbol(binding: SymbolBinding) -> Option<Self> {
        match binding {
            SymbolBinding::Global => Some(Self::Global),
            SymbolBinding::Weak => Some(Self::Weak),
            SymbolBinding::Local | SymbolBinding::Unknown(_) => None,
        }
    }

    /// Label used in the canonical text form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "GLOBAL",
            Self::Weak => "WEAK",
        }
    }
}

impl fmt::Display for ApiBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An exported symbol: `(binding, name)`.
///
/// The name borrows the string table of the mapped object. Equality and
/// ordering are those of the canonical line `"<BINDING>,<name>"` compared
/// byte by byte.
#[derive(Debug, Clone, Copy, Hash)]
pub struct ApiRecord<'data> {
    pub binding: ApiBinding,
    pub name: &'data [u8],
}

impl<'data> ApiRecord<'data> {
    pub fn new(binding: ApiBinding, name: &'data [u8]) -> Self {
        Self { binding, name }
    }

    /// Bytes of the canonical line, without the trailing newline.
    pub fn line_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.binding
            .label()
            .bytes()
            .chain(core::iter::once(b','))
            .chain(self.name.iter().copied())
    }

    /// Canonical line as an owned byte string.
    pub fn to_line(&self) -> Vec<u8> {
        self.line_bytes().collect()
    }
}

impl PartialEq for ApiRecord<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.binding == other.binding && self.name == other.name
    }
}

impl Eq for ApiRecord<'_> {}

impl Ord for ApiRecord<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line_bytes().cmp(other.line_bytes())
    }
}

impl PartialOrd for ApiRecord<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lossy text form for diagnostics; dump and digest output use the raw bytes.
impl fmt::Display for ApiRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.binding, String::from_utf8_lossy(self.name))
    }
}
