//! Stream utilities for replay events

mod until_archived;

pub use until_archived::{ArchiveExt, UntilArchived};
