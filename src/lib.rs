//! Enrichment of raw Topicbox mailing-list items into indexable documents.
//!
//! The mapper lives in [`enrich`]; [`pipeline`] drives a whole run
//! (load, raw stage, batch enrichment, output).

pub mod cli;
pub mod config;
pub mod enrich;
pub mod enrichment;
pub mod errors;
pub mod ext;
pub mod model;
pub mod pipeline;
pub mod raw;
pub mod render;
pub mod util;

pub use enrich::{RawFieldsCopy, TopicboxEnrich, RAW_FIELDS_COPY, REPO_LABELS};
pub use errors::MappingError;
pub use model::{AuthorFields, Identity, IdentityProfile, RichItem, RunSummary};
