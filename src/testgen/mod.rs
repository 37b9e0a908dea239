pub mod cache;
pub mod merge;
pub mod pipeline;
pub mod preview;
pub mod render;
pub mod suite;

pub use cache::{FileFingerprint, FingerprintStore, DEFAULT_CACHE_DIR};
pub use merge::{merge, merge_suites, merge_with};
pub use pipeline::{accepted_units, combine, plan_new_units, synchronize, SyncOutcome, SyncRequest};
pub use suite::{parse_suite, MergeOptions, Suite};
