//! History sanitization for merges between branches.
//!
//! Every merge is scoped to one source branch, one target branch and the
//! commit range between them. Only the target branch ref (and its promotion
//! ref) ever moves; nothing in this module rewrites other branches.
//!
//! - [`MergeRules`] decide preserve vs squash from the source branch name.
//! - [`Redactor`] strips sensitive lines from generated messages.
//! - [`HistorySanitizer`] plans and applies [`MergeOp`]s, alone or as a
//!   cascade along the strategy's forward edges.

mod cascade;
mod merge;
mod redact;
mod rules;
mod summary;

#[cfg(test)]
mod tests;

pub use cascade::{AppliedStep, CascadeReport, FailedStep};
pub use merge::{HistorySanitizer, MergeOp, MergeOutcome, PROMOTED_REF_PREFIX, promoted_ref};
pub use redact::Redactor;
pub use rules::{MergeMode, MergeRule, MergeRules};
pub use summary::SquashSummary;
