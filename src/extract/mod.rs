//! Tolerant readers for the loosely shaped JSON produced by upstream
//! collectors. Every extractor returns an empty result for input it cannot
//! recognise instead of failing.

pub mod attendance;
pub mod code;
pub mod docs;

/// Metrics keyed by the source's own author/student string, in source order.
pub type Extracted<T> = Vec<(String, T)>;
