//! Benchmark inputs for linkhash.
//!
//! Benches live under `benches/`; this crate only builds the synthetic
//! objects they measure.

use linkhash_core::elf::{ElfClass, SymbolBinding};
use linkhash_core::fixture::SharedObjectBuilder;

/// A shared object with `count` symbols cycling through LOCAL, GLOBAL and
/// WEAK bindings, named in reverse order so sorting has work to do.
pub fn synthetic_object(class: ElfClass, count: usize) -> Vec<u8> {
    let bindings = [
        SymbolBinding::Local,
        SymbolBinding::Global,
        SymbolBinding::Weak,
    ];
    (0..count)
        .fold(SharedObjectBuilder::new(class), |builder, i| {
            let name = format!("api_symbol_{:08}", count - i);
            builder.symbol(&name, bindings[i % bindings.len()])
        })
        .build()
}
