//! Typed views over the cross-reference store.
//!
//! Each view fixes a schema and the key shape that goes with it. None of
//! them checks for conflicts on its own: that happens once, inside
//! [`XrefStore::insert`].

use std::collections::BTreeSet;

use polref_core::{
  Error, Result,
  normalize::normalize_name,
  party::PartyId,
  politician::PoliticianId,
  store::XrefStore,
  xref::{Inserted, XrefKey, XrefSchema},
};

// ─── Alternate names ─────────────────────────────────────────────────────────

/// Normalized spellings of politicians' names. Several politicians may
/// share one.
#[derive(Debug, Clone)]
pub struct AlternateNames<S> {
  store: S,
}

impl<S: XrefStore> AlternateNames<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// Every politician known by `name`, after normalization.
  pub async fn politicians_named(&self, name: &str) -> Result<BTreeSet<PoliticianId>> {
    let key = normalize_name(name);
    if key.is_empty() {
      return Ok(BTreeSet::new());
    }
    let targets = self
      .store
      .lookup(XrefSchema::AlternateName, key.into())
      .await
      .map_err(Into::<Error>::into)?;
    Ok(targets.into_iter().map(PoliticianId).collect())
  }

  /// Record `name` as a way of writing this politician's name. Names that
  /// normalize to nothing are ignored.
  pub async fn add(&self, politician: PoliticianId, name: &str) -> Result<Inserted> {
    let key = normalize_name(name);
    if key.is_empty() {
      return Ok(Inserted::AlreadyPresent);
    }
    self
      .store
      .insert(XrefSchema::AlternateName, key.into(), politician.0)
      .await
      .map_err(Into::into)
  }

  pub async fn list(&self, politician: PoliticianId) -> Result<Vec<String>> {
    let refs = self
      .store
      .references(XrefSchema::AlternateName, politician.0)
      .await
      .map_err(Into::<Error>::into)?;
    Ok(
      refs
        .into_iter()
        .filter_map(|r| r.key.as_text().map(str::to_owned))
        .collect(),
    )
  }

  pub async fn purge(&self, politician: PoliticianId) -> Result<usize> {
    self
      .store
      .delete(XrefSchema::AlternateName, politician.0)
      .await
      .map_err(Into::into)
  }
}

// ─── Party aliases ───────────────────────────────────────────────────────────

/// Party aliases are matched after trimming and lower-casing only; accents
/// are significant ("libéral" and "liberal" are separate aliases).
fn alias_key(alias: &str) -> XrefKey { XrefKey::Text(alias.trim().to_lowercase()) }

#[derive(Debug, Clone)]
pub struct PartyAliases<S> {
  store: S,
}

impl<S: XrefStore> PartyAliases<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// The party known by `name`.
  pub async fn get_by_name(&self, name: &str) -> Result<PartyId> {
    let targets = self
      .store
      .lookup(XrefSchema::PartyAlias, alias_key(name))
      .await
      .map_err(Into::<Error>::into)?;

    let mut iter = targets.into_iter();
    match (iter.next(), iter.next()) {
      (Some(id), None) => Ok(PartyId(id)),
      (None, _) => Err(Error::NotFound(format!("no party named {:?}", name.trim()))),
      (Some(_), Some(_)) => Err(Error::Inconsistent(format!(
        "more than one party matched {:?}",
        name.trim()
      ))),
    }
  }

  /// Fails with [`Error::Conflict`] if the alias already names another
  /// party.
  pub async fn add(&self, party: PartyId, alias: &str) -> Result<Inserted> {
    self
      .store
      .insert(XrefSchema::PartyAlias, alias_key(alias), party.0)
      .await
      .map_err(Into::into)
  }

  pub async fn list(&self, party: PartyId) -> Result<Vec<String>> {
    let refs = self
      .store
      .references(XrefSchema::PartyAlias, party.0)
      .await
      .map_err(Into::<Error>::into)?;
    Ok(
      refs
        .into_iter()
        .filter_map(|r| r.key.as_text().map(str::to_owned))
        .collect(),
    )
  }

  pub async fn purge(&self, party: PartyId) -> Result<usize> {
    self
      .store
      .delete(XrefSchema::PartyAlias, party.0)
      .await
      .map_err(Into::into)
  }
}

// ─── External ids ────────────────────────────────────────────────────────────

/// The two namespaces the legislature's directory mints ids in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalIdKind {
  /// One per politician.
  Person,
  /// One per term or role; many may map to one politician.
  Affiliation,
}

impl ExternalIdKind {
  pub fn schema(self) -> XrefSchema {
    match self {
      Self::Person => XrefSchema::ExternalPersonId,
      Self::Affiliation => XrefSchema::ExternalAffiliationId,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Person => "person",
      Self::Affiliation => "affiliation",
    }
  }
}

#[derive(Debug, Clone)]
pub struct ExternalIds<S> {
  store: S,
}

impl<S: XrefStore> ExternalIds<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// The politician bound to `id`, if any.
  pub async fn politician(&self, kind: ExternalIdKind, id: i64) -> Result<Option<PoliticianId>> {
    let targets = self
      .store
      .lookup(kind.schema(), XrefKey::Int(id))
      .await
      .map_err(Into::<Error>::into)?;

    let mut iter = targets.into_iter();
    match (iter.next(), iter.next()) {
      (None, _) => Ok(None),
      (Some(target), None) => Ok(Some(PoliticianId(target))),
      (Some(_), Some(_)) => Err(Error::Inconsistent(format!(
        "{} id {id} is bound to more than one politician",
        kind.as_str()
      ))),
    }
  }

  /// Bind `id` to `politician`. Rebinding to the same politician is a
  /// no-op; binding to another is an [`Error::Conflict`]. A politician
  /// already holding a different person id gets
  /// [`Error::PersonIdTaken`]; affiliation ids accumulate.
  pub async fn bind(
    &self,
    kind: ExternalIdKind,
    id: i64,
    politician: PoliticianId,
  ) -> Result<Inserted> {
    if kind == ExternalIdKind::Person
      && let Some(&existing) = self.list(kind, politician).await?.iter().find(|&&held| held != id)
    {
      return Err(Error::PersonIdTaken { politician, existing, attempted: id });
    }
    self
      .store
      .insert(kind.schema(), XrefKey::Int(id), politician.0)
      .await
      .map_err(Into::into)
  }

  pub async fn list(&self, kind: ExternalIdKind, politician: PoliticianId) -> Result<Vec<i64>> {
    let refs = self
      .store
      .references(kind.schema(), politician.0)
      .await
      .map_err(Into::<Error>::into)?;
    Ok(refs.into_iter().filter_map(|r| r.key.as_int()).collect())
  }

  /// Drop every id of both kinds owned by `politician`.
  pub async fn purge(&self, politician: PoliticianId) -> Result<usize> {
    let mut removed = 0;
    for kind in [ExternalIdKind::Person, ExternalIdKind::Affiliation] {
      removed += self
        .store
        .delete(kind.schema(), politician.0)
        .await
        .map_err(Into::<Error>::into)?;
    }
    Ok(removed)
  }
}
