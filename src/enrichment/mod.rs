// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Lookups the Topicbox mapper consults per message: thread placement, author identity, project membership
// role: enrichment/namespace
// outputs: threads::ThreadIndex, identity::IdentityService, projects::Projects
// invariants: Identity and project data are optional inputs; a missing source degrades fields to null, never fails an item
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

pub mod identity;
pub mod projects;
pub mod threads;
