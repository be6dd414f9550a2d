//! Cross-reference types — the schema-tagged `(schema, key) → target` table.
//!
//! One table backs party aliases, politician alternate names and external
//! directory IDs. Rows are append-only: created on first discovery, never
//! updated in place, removed only when the owning entity is deleted.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, normalize::NormalizedName};

/// The kind of mapping a cross-reference row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XrefSchema {
  /// Normalized spelling of a politician's name. Several politicians may
  /// share one.
  AlternateName,
  /// The directory's person-level ID. One per politician.
  ExternalPersonId,
  /// The directory's person-in-role ID. Many per politician.
  ExternalAffiliationId,
  /// Lower-cased display name of a party.
  PartyAlias,
}

impl XrefSchema {
  pub const ALL: [XrefSchema; 4] = [
    Self::AlternateName,
    Self::ExternalPersonId,
    Self::ExternalAffiliationId,
    Self::PartyAlias,
  ];

  /// The discriminant stored in the `schema` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::AlternateName => "alternate_name",
      Self::ExternalPersonId => "external_person_id",
      Self::ExternalAffiliationId => "external_affiliation_id",
      Self::PartyAlias => "party_alias",
    }
  }

  /// Whether a key in this schema may point at exactly one target.
  pub fn is_exclusive(self) -> bool { !matches!(self, Self::AlternateName) }
}

impl fmt::Display for XrefSchema {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for XrefSchema {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|schema| schema.as_str() == s)
      .ok_or_else(|| Error::UnknownSchema(s.to_string()))
  }
}

/// A cross-reference key: text for names, integers for external IDs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum XrefKey {
  Text(String),
  Int(i64),
}

impl XrefKey {
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      Self::Int(_) => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Self::Int(i) => Some(*i),
      Self::Text(_) => None,
    }
  }
}

impl fmt::Display for XrefKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Text(s) => write!(f, "{s:?}"),
      Self::Int(i) => write!(f, "{i}"),
    }
  }
}

impl From<NormalizedName> for XrefKey {
  fn from(name: NormalizedName) -> Self { Self::Text(name.into_string()) }
}

impl From<i64> for XrefKey {
  fn from(id: i64) -> Self { Self::Int(id) }
}

/// A persisted cross-reference row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossReference {
  pub schema:     XrefSchema,
  pub key:        XrefKey,
  pub target_id:  i64,
  pub created_at: DateTime<Utc>,
}

/// The successful outcomes of [`crate::store::XrefStore::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
  Created,
  /// The exact mapping already existed; no row was written.
  AlreadyPresent,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn schema_round_trips_through_str() {
    for schema in XrefSchema::ALL {
      assert_eq!(schema.as_str().parse::<XrefSchema>().unwrap(), schema);
    }
    assert!(matches!("party_names".parse::<XrefSchema>(), Err(Error::UnknownSchema(_))));
  }

  #[test]
  fn only_alternate_names_are_shared() {
    assert!(!XrefSchema::AlternateName.is_exclusive());
    assert!(XrefSchema::ExternalPersonId.is_exclusive());
    assert!(XrefSchema::ExternalAffiliationId.is_exclusive());
    assert!(XrefSchema::PartyAlias.is_exclusive());
  }
}
