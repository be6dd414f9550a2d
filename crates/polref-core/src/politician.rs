//! Politician — the canonical identity every lookup resolves to.
//!
//! Only identity and name fields live here. Everything else the engine
//! knows about a politician is either a cross-reference row (alternate
//! names, external IDs) or an info row.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoliticianId(pub i64);

impl fmt::Display for PoliticianId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Someone who has stood for or held office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Politician {
  pub id:          PoliticianId,
  /// Display name, e.g. "Thomas Mulcair".
  pub name:        String,
  pub name_given:  String,
  pub name_family: String,
  pub slug:        Option<String>,
}

impl Politician {
  /// The slug if one is assigned, otherwise the numeric id.
  pub fn identifier(&self) -> String {
    self
      .slug
      .clone()
      .unwrap_or_else(|| self.id.0.to_string())
  }
}

/// Input to [`crate::store::PoliticianStore::add_politician`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPolitician {
  pub name:        String,
  #[serde(default)]
  pub name_given:  String,
  #[serde(default)]
  pub name_family: String,
}

impl NewPolitician {
  /// Build from a display name, splitting off the last word as the family
  /// name.
  pub fn from_name(name: &str) -> Self {
    let name = name.trim();
    let (given, family) = match name.rsplit_once(char::is_whitespace) {
      Some((given, family)) => (given.trim(), family),
      None => ("", name),
    };
    Self {
      name:        name.to_string(),
      name_given:  given.to_string(),
      name_family: family.to_string(),
    }
  }
}

/// One key/value attribute row owned by a politician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoEntry {
  pub key:        String,
  pub value:      String,
  pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_name_splits_family_name() {
    let p = NewPolitician::from_name("Thomas J. Mulcair");
    assert_eq!(p.name_given, "Thomas J.");
    assert_eq!(p.name_family, "Mulcair");

    let single = NewPolitician::from_name("Cher");
    assert_eq!(single.name_given, "");
    assert_eq!(single.name_family, "Cher");
  }
}
