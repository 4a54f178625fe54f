// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Home of extension traits over serde_json used to read loosely-typed raw items
// role: extension/namespace
// outputs: serde_json::JsonFetch
// invariants: Read-only helpers over borrowed values
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod serde_json;
