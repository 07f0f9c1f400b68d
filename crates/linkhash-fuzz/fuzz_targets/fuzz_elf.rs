#![no_main]
use libfuzzer_sys::fuzz_target;
use linkhash_core::OutputMode;
use linkhash_core::api::extract_api;

fuzz_target!(|data: &[u8]| {
    // Any input must either fail cleanly or render both outputs consistently.
    let Ok(api) = extract_api(data) else {
        return;
    };
    let scanned = api.symbols_scanned;
    let fingerprint = api.into_fingerprint();
    assert!(fingerprint.len() <= scanned);

    let dump = fingerprint.render(OutputMode::Dump);
    let digest = fingerprint.render(OutputMode::Digest);
    assert_eq!(digest.len(), 41);
    assert!(dump.len() >= fingerprint.len() * b"WEAK,\n".len());
});
