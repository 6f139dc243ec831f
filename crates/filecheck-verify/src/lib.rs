mod context;
mod duplicates;
mod metadata;
mod verifier;

pub use context::RunContext;
pub use duplicates::{DuplicateTracker, mark_duplicates, record_key};
pub use verifier::Verifier;
