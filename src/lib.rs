//! # folio
//!
//! Reading sessions on top of [`folio_match`]: open a work on whichever
//! provider has it, resume where the reader left off, move between
//! chapters, and persist progress to a JSON file.
//!
//! - [`session`]: [`SessionLoader`] and the [`ReadingSession`] value
//! - [`store`]: [`JsonProgressStore`], atomic file-backed progress
//! - [`config`]: TOML configuration
//! - [`bridge`]: newline-delimited JSON protocol used by `folio-host`

pub mod bridge;
pub mod config;
pub mod error;
pub mod folio_dirs;
pub mod session;
pub mod store;

pub use config::{FolioConfig, StoreConfig};
pub use error::{FolioError, Result};
pub use session::{ReadingSession, SessionLoader};
pub use store::JsonProgressStore;
