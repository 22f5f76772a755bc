//! Manifest discovery: candidate planning and ordered fallback probing.
//!
//! Discovery walks an ordered list of (domain, probe-kind) candidates built
//! from an organization's domain identifier and website link, trying a
//! DNS-TXT pointer lookup or the well-known paths per candidate, stopping at
//! the first success. Every candidate's outcome is recorded, producing the
//! audit trace of "how we looked" that is persisted whether or not a
//! manifest was found.

/// DNS-TXT manifest pointer resolution.
pub mod dns;
/// Candidate sequence construction.
pub mod planner;
/// Ordered fallback probing over the candidate sequence.
pub mod probe;

pub use dns::{HickoryTxtResolver, MANIFEST_MARKER, TxtResolver, manifest_pointer};
pub use planner::plan_candidates;
pub use probe::{Discovery, Prober};
