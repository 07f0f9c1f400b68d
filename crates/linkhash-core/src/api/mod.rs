//! API surface of a shared object.
//!
//! [`extract_api`] walks the first symbol table of an `ET_DYN` object and
//! keeps `GLOBAL`/`WEAK` entries as [`ApiRecord`]s; [`ApiFingerprint`]
//! sorts them and renders either the listing or its SHA-1.

pub mod extract;
pub mod fingerprint;
pub mod record;

pub use extract::{ExtractedApi, extract_api, extract_from_view};
pub use fingerprint::{ApiFingerprint, DIGEST_LEN, OutputMode, hex_lower};
pub use record::{ApiBinding, ApiRecord};
