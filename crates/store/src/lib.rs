//! # Codeloom Store
//!
//! The Attachment Store: typed, per-kind collections of context items plus
//! the pure merge operations over them.
//!
//! Three operations cover the whole lifecycle of a turn's attachments:
//!
//! 1. [`add_items`]: append + per-kind key dedup with source priority
//! 2. [`remove_items`]: removal by identity key
//! 3. [`override_by_source`]: "the live editor selection changed", so replace
//!    everything that source produced and keep everything else
//!
//! All three are pure (new value out, inputs untouched) and idempotent, so
//! repeated merges and retried tool calls never corrupt state.

pub mod merge;

pub use merge::{MergePriority, add_items, override_by_source, remove_items};
