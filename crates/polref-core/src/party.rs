//! Political parties.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(pub i64);

impl fmt::Display for PartyId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
  pub id:            PartyId,
  pub name_en:       String,
  pub name_fr:       String,
  pub short_name_en: String,
  pub short_name_fr: String,
  pub slug:          String,
}

/// Input to [`crate::store::PartyStore::add_party`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewParty {
  pub name_en:       String,
  #[serde(default)]
  pub name_fr:       String,
  #[serde(default)]
  pub short_name_en: String,
  #[serde(default)]
  pub short_name_fr: String,
  #[serde(default)]
  pub slug:          String,
}

impl NewParty {
  /// French names fall back to English; short names fall back to full names.
  pub fn with_defaults(mut self) -> Self {
    if self.name_fr.is_empty() {
      self.name_fr = self.name_en.clone();
    }
    if self.short_name_en.is_empty() {
      self.short_name_en = self.name_en.clone();
    }
    if self.short_name_fr.is_empty() {
      self.short_name_fr = self.name_fr.clone();
    }
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_cascade_from_english_name() {
    let p = NewParty {
      name_en: "Green Party".into(),
      ..Default::default()
    }
    .with_defaults();
    assert_eq!(p.name_fr, "Green Party");
    assert_eq!(p.short_name_en, "Green Party");
    assert_eq!(p.short_name_fr, "Green Party");
  }

  #[test]
  fn short_french_name_follows_french_name() {
    let p = NewParty {
      name_en: "Liberal".into(),
      name_fr: "Libéral".into(),
      short_name_en: "Lib.".into(),
      ..Default::default()
    }
    .with_defaults();
    assert_eq!(p.short_name_en, "Lib.");
    assert_eq!(p.short_name_fr, "Libéral");
  }
}
