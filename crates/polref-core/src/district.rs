//! Electoral districts ("ridings").
//!
//! Districts are effectively static reference data keyed by a unique slug
//! derived from the English name.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, normalize::slugify};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistrictId(pub i64);

impl fmt::Display for DistrictId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Province {
  Ab,
  Bc,
  Sk,
  Mb,
  On,
  Qc,
  Nb,
  Ns,
  Pe,
  Nl,
  Yt,
  Nt,
  Nu,
}

impl Province {
  pub fn code(self) -> &'static str {
    match self {
      Self::Ab => "AB",
      Self::Bc => "BC",
      Self::Sk => "SK",
      Self::Mb => "MB",
      Self::On => "ON",
      Self::Qc => "QC",
      Self::Nb => "NB",
      Self::Ns => "NS",
      Self::Pe => "PE",
      Self::Nl => "NL",
      Self::Yt => "YT",
      Self::Nt => "NT",
      Self::Nu => "NU",
    }
  }

  pub fn name_en(self) -> &'static str {
    match self {
      Self::Ab => "Alberta",
      Self::Bc => "B.C.",
      Self::Sk => "Saskatchewan",
      Self::Mb => "Manitoba",
      Self::On => "Ontario",
      Self::Qc => "Québec",
      Self::Nb => "New Brunswick",
      Self::Ns => "Nova Scotia",
      Self::Pe => "P.E.I.",
      Self::Nl => "Newfoundland & Labrador",
      Self::Yt => "Yukon",
      Self::Nt => "Northwest Territories",
      Self::Nu => "Nunavut",
    }
  }
}

impl FromStr for Province {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let code = s.trim().to_ascii_uppercase();
    Ok(match code.as_str() {
      "AB" => Self::Ab,
      "BC" => Self::Bc,
      "SK" => Self::Sk,
      "MB" => Self::Mb,
      "ON" => Self::On,
      "QC" => Self::Qc,
      "NB" => Self::Nb,
      "NS" => Self::Ns,
      "PE" => Self::Pe,
      "NL" => Self::Nl,
      "YT" => Self::Yt,
      "NT" => Self::Nt,
      "NU" => Self::Nu,
      _ => return Err(Error::UnknownProvince(s.to_string())),
    })
  }
}

/// A canonical electoral district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
  pub id:       DistrictId,
  pub name_en:  String,
  pub name_fr:  String,
  pub province: Province,
  pub slug:     String,
  /// Identifier assigned by the elections agency, if known.
  pub edid:     Option<i64>,
  pub current:  bool,
}

impl District {
  /// The English name with ASCII double dashes rendered as em dashes.
  pub fn dashed_name(&self) -> String { self.name_en.replace("--", "\u{2014}") }
}

/// Input to [`crate::store::DistrictStore::add_district`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDistrict {
  pub name_en:  String,
  #[serde(default)]
  pub name_fr:  String,
  pub province: Province,
  /// Derived from `name_en` when empty.
  #[serde(default)]
  pub slug:     String,
  #[serde(default)]
  pub edid:     Option<i64>,
  #[serde(default)]
  pub current:  bool,
}

impl NewDistrict {
  /// Fill the derived fields: slug from the English name, French name from
  /// the English one.
  pub fn with_defaults(mut self) -> Self {
    if self.slug.is_empty() {
      self.slug = slugify(&self.name_en);
    }
    if self.name_fr.is_empty() {
      self.name_fr = self.name_en.clone();
    }
    self
  }
}
