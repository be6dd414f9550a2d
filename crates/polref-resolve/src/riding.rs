//! District name resolution.
//!
//! District names are a closed set, so historical misspellings are fixed by
//! an explicit slug-to-slug table rather than by fuzzy matching.

use std::{collections::BTreeMap, sync::Arc};

use polref_core::{
  Error, Result,
  district::District,
  normalize::slugify,
  store::DistrictStore,
};
use tracing::debug;

/// Misspelled or renamed slugs observed in source data, mapped to the
/// canonical slug.
const BUILTIN_CORRECTIONS: &[(&str, &str)] = &[
  ("richmond-arthabasca", "richmond-arthabaska"),
  ("richmond-arthabatca", "richmond-arthabaska"),
  ("richemond-arthabaska", "richmond-arthabaska"),
  ("battle-river", "westlock-st-paul"),
  ("vancouver-est", "vancouver-east"),
  ("calgary-ouest", "calgary-west"),
  ("kitchener-wilmot-wellesley-woolwich", "kitchener-conestoga"),
  ("carleton-orleans", "ottawa-orleans"),
  ("frazer-valley-west", "fraser-valley-west"),
  ("laval-ouest", "laval-west"),
  ("medecine-hat", "medicine-hat"),
  ("lac-st-jean", "lac-saint-jean"),
  ("vancouver-north", "north-vancouver"),
  ("laval-est", "laval-east"),
  ("ottawa-ouest-nepean", "ottawa-west-nepean"),
  ("cap-breton-highlands-canso", "cape-breton-highlands-canso"),
  ("winnipeg-centre-sud", "winnipeg-south-centre"),
  ("renfrew-nippissing-pembroke", "renfrew-nipissing-pembroke"),
  ("the-battleford-meadow-lake", "the-battlefords-meadow-lake"),
  ("esquimalt-de-fuca", "esquimalt-juan-de-fuca"),
  ("sint-hubert", "saint-hubert"),
];

// ─── CorrectionTable ─────────────────────────────────────────────────────────

/// Immutable `{misspelled slug → canonical slug}` map.
///
/// A single substitution is applied; corrections are not chained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionTable {
  entries: BTreeMap<String, String>,
}

impl CorrectionTable {
  /// An empty table.
  pub fn new() -> Self { Self::default() }

  /// The corrections observed in the legislature's historical data.
  pub fn builtin() -> Self {
    Self::new().extend(
      BUILTIN_CORRECTIONS
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string())),
    )
  }

  /// Add entries. Both sides are slugified, so configuration may spell them
  /// as district names.
  pub fn extend<I>(mut self, entries: I) -> Self
  where
    I: IntoIterator<Item = (String, String)>,
  {
    for (from, to) in entries {
      self.entries.insert(slugify(&from), slugify(&to));
    }
    self
  }

  /// The canonical form of `slug`.
  pub fn correct<'a>(&'a self, slug: &'a str) -> &'a str {
    self.entries.get(slug).map(String::as_str).unwrap_or(slug)
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

// ─── RidingResolver ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RidingResolver<S> {
  store:       S,
  corrections: Arc<CorrectionTable>,
}

impl<S: DistrictStore> RidingResolver<S> {
  pub fn new(store: S, corrections: CorrectionTable) -> Self {
    Self { store, corrections: Arc::new(corrections) }
  }

  pub fn corrections(&self) -> &CorrectionTable { &self.corrections }

  /// Resolve a raw district name to its canonical record.
  pub async fn resolve_district(&self, raw_name: &str) -> Result<District> {
    let slug = slugify(raw_name);
    let canonical = self.corrections.correct(&slug);
    if canonical != slug {
      debug!(from = %slug, to = %canonical, "corrected district slug");
    }

    self
      .store
      .get_district_by_slug(canonical.to_string())
      .await
      .map_err(Into::<Error>::into)?
      .ok_or_else(|| Error::NotFound(format!("no district named {:?}", raw_name.trim())))
  }
}

#[cfg(test)]
mod tests {
  use polref_core::district::Province;

  use super::*;
  use crate::fixtures::{district, store};

  #[test]
  fn builtin_table_is_loaded() {
    let table = CorrectionTable::builtin();
    assert_eq!(table.len(), BUILTIN_CORRECTIONS.len());
    assert_eq!(table.correct("medecine-hat"), "medicine-hat");
    assert_eq!(table.correct("medicine-hat"), "medicine-hat");
  }

  #[test]
  fn configured_entries_are_slugified() {
    let table = CorrectionTable::new()
      .extend([("Nouvelle Ville".to_string(), "New Town".to_string())]);
    assert_eq!(table.correct("nouvelle-ville"), "new-town");
  }

  #[tokio::test]
  async fn misspellings_resolve_to_canonical_district() {
    let s = store().await;
    let canonical = district(&s, "Richmond—Arthabaska", Province::Qc).await;
    let ridings = RidingResolver::new(s, CorrectionTable::builtin());

    let a = ridings.resolve_district("Richmond—Arthabaska").await.unwrap();
    let b = ridings.resolve_district("Richmond-Arthabatca").await.unwrap();
    let c = ridings.resolve_district("Richemond Arthabaska").await.unwrap();

    assert_eq!(a.id, canonical.id);
    assert_eq!(b.id, canonical.id);
    assert_eq!(c.id, canonical.id);
  }

  #[tokio::test]
  async fn unknown_district_is_not_found() {
    let ridings = RidingResolver::new(store().await, CorrectionTable::builtin());
    let err = ridings.resolve_district("Atlantis").await.unwrap_err();
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn without_corrections_misspelling_is_not_found() {
    let s = store().await;
    district(&s, "Medicine Hat", Province::Ab).await;
    let ridings = RidingResolver::new(s, CorrectionTable::new());

    assert!(ridings.resolve_district("Medicine Hat").await.is_ok());
    assert!(ridings.resolve_district("Medecine Hat").await.unwrap_err().is_not_found());
  }
}
