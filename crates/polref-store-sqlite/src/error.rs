//! Error type for `polref-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] polref_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A row holds a value the domain types cannot represent.
  #[error("corrupt row: {0}")]
  Corrupt(String),
}

impl From<Error> for polref_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => polref_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
