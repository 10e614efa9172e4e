//! Search and resolution pipeline.
//!
//! - [`scoring`]: relevance scoring and ranking against a query
//! - [`dedup`]: collapse same-title results, keeping the most complete
//! - [`normalize`]: title normalisation shared by dedup and matching
//! - [`search`]: concurrent fan-out across providers
//! - [`resolve`]: per-provider source resolution for a known work

pub mod dedup;
pub mod normalize;
pub mod resolve;
pub mod scoring;
pub mod search;
