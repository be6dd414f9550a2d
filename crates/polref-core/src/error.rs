//! Error types for `polref-core`.
//!
//! This is the one taxonomy every layer reports through. Backends keep their
//! own error enums and convert into this one at the trait boundary.

use thiserror::Error;

use crate::{
  politician::PoliticianId,
  xref::{XrefKey, XrefSchema},
};

#[derive(Debug, Error)]
pub enum Error {
  /// Nothing matched. Callers may retry with more context or treat the
  /// subject as new.
  #[error("not found: {0}")]
  NotFound(String),

  /// Several candidates remain and the supplied context cannot pick one.
  #[error("{name:?} is ambiguous between {} politicians", candidates.len())]
  Ambiguous {
    name:       String,
    candidates: Vec<PoliticianId>,
  },

  /// A write would bind one key to two different targets.
  #[error("{schema} key {key} already points to {existing}, refusing to bind it to {attempted}")]
  Conflict {
    schema:    XrefSchema,
    key:       XrefKey,
    existing:  i64,
    attempted: i64,
  },

  /// A politician holds at most one person id.
  #[error("politician {politician} already has person id {existing}, refusing to add {attempted}")]
  PersonIdTaken {
    politician: PoliticianId,
    existing:   i64,
    attempted:  i64,
  },

  /// An external collaborator answered in a shape we no longer understand.
  #[error("protocol error: {0}")]
  Protocol(String),

  /// The stored data contradicts itself (e.g. two legislators with the same
  /// family name in one riding and session).
  #[error("data inconsistency: {0}")]
  Inconsistent(String),

  #[error("info key {key:?} is already set on politician {politician}")]
  InfoExists {
    politician: PoliticianId,
    key:        String,
  },

  #[error("invalid session identifier: {0:?}")]
  InvalidSession(String),

  #[error("unknown cross-reference schema: {0:?}")]
  UnknownSchema(String),

  #[error("unknown province code: {0:?}")]
  UnknownProvince(String),

  #[error("transport error: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
