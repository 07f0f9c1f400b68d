//! Canonical ordering of an API surface and its SHA-1 digest.
//!
//! Dump and digest output are produced from the same byte stream: every
//! record as `"<BINDING>,<name>\n"`, in ascending byte order. Hashing the
//! dump output therefore reproduces the digest.

use std::convert::Infallible;
use std::io::{self, Write};

use sha1::{Digest, Sha1};

use super::record::ApiRecord;

/// Length of a SHA-1 digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// What to emit for a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One line with the lowercase hex SHA-1 of the canonical stream.
    #[default]
    Digest,
    /// The canonical stream itself.
    Dump,
}

impl OutputMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Digest => "digest",
            Self::Dump => "dump",
        }
    }
}

/// Sorted API surface of one object.
#[derive(Debug, Clone)]
pub struct ApiFingerprint<'data> {
    records: Vec<ApiRecord<'data>>,
}

impl<'data> ApiFingerprint<'data> {
    /// Sort `records` into canonical order.
    ///
    /// Duplicates are kept: a name exported twice contributes two lines.
    pub fn new(mut records: Vec<ApiRecord<'data>>) -> Self {
        records.sort_unstable();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Push the canonical stream through `sink`, chunk by chunk.
    fn feed<E>(&self, mut sink: impl FnMut(&[u8]) -> Result<(), E>) -> Result<(), E> {
        for record in &self.records {
            sink(record.binding.label().as_bytes())?;
            sink(b",")?;
            sink(record.name)?;
            sink(b"\n")?;
        }
        Ok(())
    }

    /// [`Self::feed`] into a sink that cannot fail.
    fn feed_all(&self, mut sink: impl FnMut(&[u8])) {
        let Ok(()) = self.feed(|chunk| {
            sink(chunk);
            Ok::<(), Infallible>(())
        });
    }

    /// Write the canonical stream (dump mode).
    pub fn write_dump<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        self.feed(|chunk| out.write_all(chunk))
    }

    /// SHA-1 of the canonical stream.
    pub fn digest(&self) -> [u8; DIGEST_LEN] {
        let mut hasher = Sha1::new();
        self.feed_all(|chunk| hasher.update(chunk));

        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&hasher.finalize());
        digest
    }

    /// Lowercase hex digest, two digits per byte.
    pub fn hex_digest(&self) -> String {
        hex_lower(&self.digest())
    }

    /// Write the hex digest and a newline (digest mode).
    pub fn write_digest<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self.hex_digest())
    }

    /// Write the output for `mode`.
    pub fn write_to<W: Write + ?Sized>(&self, mode: OutputMode, out: &mut W) -> io::Result<()> {
        match mode {
            OutputMode::Digest => self.write_digest(out),
            OutputMode::Dump => self.write_dump(out),
        }
    }

    /// Render the output for `mode` into memory.
    pub fn render(&self, mode: OutputMode) -> Vec<u8> {
        match mode {
            OutputMode::Digest => {
                let mut line = self.hex_digest().into_bytes();
                line.push(b'\n');
                line
            }
            OutputMode::Dump => {
                let mut out = Vec::new();
                self.feed_all(|chunk| out.extend_from_slice(chunk));
                out
            }
        }
    }
}

/// Lowercase hex, zero padded to two digits per byte.
pub fn hex_lower(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(&mut out, "{b:02x}").expect("writing to String should not fail");
    }
    out
}
