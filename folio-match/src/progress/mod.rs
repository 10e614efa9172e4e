//! Reading progress: geometry, tracking, persistence and flush scheduling.

pub mod geometry;
pub mod scheduler;
pub mod store;
pub mod tracker;

pub use geometry::{compute_position, Layout, PagePosition, Span};
pub use scheduler::{FlushScheduler, TrackerSignal};
pub use store::{MemoryProgressStore, ProgressStore};
pub use tracker::{ProgressEvent, ProgressTracker, ProgressUpdate};
