//! SQLite backend for the polref identity engine.
//!
//! Every query runs on the [`tokio_rusqlite`] connection thread, off the
//! async runtime. A single [`SqliteStore`] implements
//! every storage trait in [`polref_core::store`].

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
