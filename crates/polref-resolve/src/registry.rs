//! Entity lifecycles.
//!
//! The stores know nothing about which cross-reference rows belong to which
//! entity. The registries do: creating a politician or a party records its
//! names as aliases, and deleting one purges the rows it owns before the
//! entity itself goes.

use std::collections::BTreeMap;

use polref_core::{
  Error, Result,
  normalize::slugify,
  party::{NewParty, Party, PartyId},
  politician::{NewPolitician, Politician, PoliticianId},
  store::{PartyStore, PoliticianStore, XrefStore},
  xref::Inserted,
};
use tracing::{error, info, warn};

use crate::xref::{AlternateNames, ExternalIds, PartyAliases};

// ─── Politicians ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PoliticianRegistry<S> {
  store: S,
}

impl<S> PoliticianRegistry<S>
where
  S: XrefStore + PoliticianStore + Clone,
{
  pub fn new(store: S) -> Self { Self { store } }

  fn alternates(&self) -> AlternateNames<S> { AlternateNames::new(self.store.clone()) }

  /// Insert a politician and record its display name as an alternate name.
  pub async fn create(&self, input: NewPolitician) -> Result<Politician> {
    let politician = self
      .store
      .add_politician(input)
      .await
      .map_err(Into::<Error>::into)?;
    self.alternates().add(politician.id, &politician.name).await?;
    info!(id = %politician.id, name = %politician.name, "created politician");
    Ok(politician)
  }

  pub async fn add_alternate_name(&self, id: PoliticianId, name: &str) -> Result<Inserted> {
    self.alternates().add(id, name).await
  }

  pub async fn alternate_names(&self, id: PoliticianId) -> Result<Vec<String>> {
    self.alternates().list(id).await
  }

  /// Give the politician a slug derived from its name. Returns the slug now
  /// in place, or `None` if someone else already holds it.
  pub async fn assign_slug(&self, politician: &Politician) -> Result<Option<String>> {
    if let Some(slug) = &politician.slug {
      return Ok(Some(slug.clone()));
    }
    let slug = slugify(&politician.name);
    if slug.is_empty() {
      return Ok(None);
    }

    let assigned = self
      .store
      .assign_slug(politician.id, slug.clone())
      .await
      .map_err(Into::<Error>::into)?;
    if !assigned {
      warn!(%slug, id = %politician.id, "slug already taken");
      return Ok(None);
    }
    Ok(Some(slug))
  }

  /// Delete a politician with its memberships, info rows, alternate names
  /// and external ids. Returns `false` if there was no such politician.
  pub async fn delete(&self, id: PoliticianId) -> Result<bool> {
    let removed = self
      .store
      .delete_politician(id)
      .await
      .map_err(Into::<Error>::into)?;
    self.alternates().purge(id).await?;
    ExternalIds::new(self.store.clone()).purge(id).await?;
    Ok(removed)
  }

  // ── Info rows ───────────────────────────────────────────────────────────

  /// One value per key. Where a key has several rows, the newest wins.
  pub async fn info(&self, id: PoliticianId) -> Result<BTreeMap<String, String>> {
    let rows = self.store.info(id).await.map_err(Into::<Error>::into)?;
    Ok(rows.into_iter().map(|e| (e.key, e.value)).collect())
  }

  /// Every value for every key, oldest first.
  pub async fn info_multivalued(&self, id: PoliticianId) -> Result<BTreeMap<String, Vec<String>>> {
    let rows = self.store.info(id).await.map_err(Into::<Error>::into)?;
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in rows {
      out.entry(entry.key).or_default().push(entry.value);
    }
    Ok(out)
  }

  /// Set a single-valued key.
  ///
  /// An existing different value is replaced only when `overwrite` is set;
  /// otherwise the call fails with [`Error::InfoExists`]. Setting the value
  /// already stored is a no-op. Duplicate rows under a single-valued key are
  /// reported and collapsed into one.
  pub async fn set_info(
    &self,
    id: PoliticianId,
    key: &str,
    value: &str,
    overwrite: bool,
  ) -> Result<()> {
    let existing: Vec<String> = self
      .store
      .info(id)
      .await
      .map_err(Into::<Error>::into)?
      .into_iter()
      .filter(|e| e.key == key)
      .map(|e| e.value)
      .collect();

    match existing.as_slice() {
      [] => {
        self
          .store
          .add_info(id, key.into(), value.into())
          .await
          .map_err(Into::<Error>::into)?;
      }
      [current] if current == value => {}
      [_] if !overwrite => {
        return Err(Error::InfoExists { politician: id, key: key.into() });
      }
      [_] => {
        self
          .store
          .replace_info(id, key.into(), value.into())
          .await
          .map_err(Into::<Error>::into)?;
      }
      values => {
        error!(%id, key, ?values, "multiple rows for single-valued info key");
        self
          .store
          .replace_info(id, key.into(), value.into())
          .await
          .map_err(Into::<Error>::into)?;
      }
    }
    Ok(())
  }

  /// Add a value under a multivalued key. Returns `false` if it was already
  /// present.
  pub async fn set_info_multivalued(&self, id: PoliticianId, key: &str, value: &str) -> Result<bool> {
    self
      .store
      .add_info(id, key.into(), value.into())
      .await
      .map_err(Into::into)
  }

  pub async fn del_info(&self, id: PoliticianId, key: &str) -> Result<usize> {
    self
      .store
      .delete_info(id, key.into())
      .await
      .map_err(Into::into)
  }
}

// ─── Parties ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PartyRegistry<S> {
  store: S,
}

impl<S> PartyRegistry<S>
where
  S: XrefStore + PartyStore + Clone,
{
  pub fn new(store: S) -> Self { Self { store } }

  fn aliases(&self) -> PartyAliases<S> { PartyAliases::new(self.store.clone()) }

  /// Insert a party and register its English and French names as aliases.
  ///
  /// If either name already belongs to another party the new party is
  /// removed again and the conflict is returned.
  pub async fn create(&self, input: NewParty) -> Result<Party> {
    let party = self.store.add_party(input).await.map_err(Into::<Error>::into)?;

    for name in [&party.name_en, &party.name_fr] {
      if let Err(e) = self.aliases().add(party.id, name).await {
        self.delete(party.id).await?;
        return Err(e);
      }
    }
    info!(id = %party.id, name = %party.name_en, "created party");
    Ok(party)
  }

  pub async fn add_alias(&self, party: PartyId, alias: &str) -> Result<Inserted> {
    self.aliases().add(party, alias).await
  }

  pub async fn aliases_of(&self, party: PartyId) -> Result<Vec<String>> {
    self.aliases().list(party).await
  }

  /// The party known by `name` (any registered alias).
  pub async fn get_by_name(&self, name: &str) -> Result<Party> {
    let id = self.aliases().get_by_name(name).await?;
    self
      .store
      .get_party(id)
      .await
      .map_err(Into::<Error>::into)?
      .ok_or_else(|| Error::Inconsistent(format!("alias {name:?} points at missing party {id}")))
  }

  /// Delete the party and its memberships, then purge its aliases.
  pub async fn delete(&self, id: PartyId) -> Result<bool> {
    let removed = self.store.delete_party(id).await.map_err(Into::<Error>::into)?;
    self.aliases().purge(id).await?;
    Ok(removed)
  }
}

#[cfg(test)]
mod tests {
  use polref_core::{district::Province, session::SessionId, store::MembershipStore};

  use super::*;
  use crate::{
    fixtures::{date, district, membership, party, politician, session, store},
    xref::ExternalIdKind,
  };

  #[tokio::test]
  async fn create_records_display_name() {
    let s = store().await;
    let registry = PoliticianRegistry::new(s.clone());

    let p = registry.create(NewPolitician::from_name("Jean-Pierre Blackburn")).await.unwrap();
    assert_eq!(registry.alternate_names(p.id).await.unwrap(), vec!["jean pierre blackburn"]);
  }

  #[tokio::test]
  async fn second_slug_holder_is_refused() {
    let s = store().await;
    let registry = PoliticianRegistry::new(s.clone());

    let a = registry.create(NewPolitician::from_name("John Smith")).await.unwrap();
    let b = registry.create(NewPolitician::from_name("John Smith")).await.unwrap();

    assert_eq!(registry.assign_slug(&a).await.unwrap().as_deref(), Some("john-smith"));
    assert_eq!(registry.assign_slug(&b).await.unwrap(), None);

    let a = s.get_politician(a.id).await.unwrap().unwrap();
    assert_eq!(a.identifier(), "john-smith");
    assert_eq!(registry.assign_slug(&a).await.unwrap().as_deref(), Some("john-smith"));
  }

  #[tokio::test]
  async fn single_valued_info_respects_overwrite() {
    let registry = PoliticianRegistry::new(store().await);
    let p = registry.create(NewPolitician::from_name("Elizabeth May")).await.unwrap();

    registry.set_info(p.id, "web_site", "https://a.example", false).await.unwrap();
    registry.set_info(p.id, "web_site", "https://a.example", false).await.unwrap();

    let err = registry
      .set_info(p.id, "web_site", "https://b.example", false)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InfoExists { ref key, .. } if key == "web_site"));

    registry.set_info(p.id, "web_site", "https://b.example", true).await.unwrap();
    assert_eq!(registry.info(p.id).await.unwrap()["web_site"], "https://b.example");
  }

  #[tokio::test]
  async fn duplicate_single_valued_rows_are_collapsed() {
    let registry = PoliticianRegistry::new(store().await);
    let p = registry.create(NewPolitician::from_name("Elizabeth May")).await.unwrap();

    registry.set_info_multivalued(p.id, "phone", "613-555-0100").await.unwrap();
    registry.set_info_multivalued(p.id, "phone", "613-555-0199").await.unwrap();
    assert_eq!(registry.info_multivalued(p.id).await.unwrap()["phone"].len(), 2);

    registry.set_info(p.id, "phone", "613-555-0111", false).await.unwrap();
    assert_eq!(
      registry.info_multivalued(p.id).await.unwrap()["phone"],
      vec!["613-555-0111"]
    );

    assert_eq!(registry.del_info(p.id, "phone").await.unwrap(), 1);
    assert!(registry.info(p.id).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn delete_politician_cascades_cross_references() {
    let s = store().await;
    let registry = PoliticianRegistry::new(s.clone());
    let ids = ExternalIds::new(s.clone());

    let p = registry.create(NewPolitician::from_name("Jack Layton")).await.unwrap();
    ids.bind(ExternalIdKind::Person, 1234, p.id).await.unwrap();

    assert!(registry.delete(p.id).await.unwrap());
    assert_eq!(ids.politician(ExternalIdKind::Person, 1234).await.unwrap(), None);
    assert!(
      AlternateNames::new(s)
        .politicians_named("Jack Layton")
        .await
        .unwrap()
        .is_empty()
    );
  }

  #[tokio::test]
  async fn party_names_become_aliases() {
    let registry = PartyRegistry::new(store().await);
    let lib = registry
      .create(NewParty {
        name_en: "Liberal".into(),
        name_fr: "Libéral".into(),
        ..Default::default()
      })
      .await
      .unwrap();

    assert_eq!(registry.get_by_name("liberal").await.unwrap().id, lib.id);
    assert_eq!(registry.get_by_name("LIBÉRAL ").await.unwrap().id, lib.id);
    assert_eq!(
      registry.add_alias(lib.id, "Grits").await.unwrap(),
      Inserted::Created
    );
    assert_eq!(registry.aliases_of(lib.id).await.unwrap().len(), 3);
  }

  #[tokio::test]
  async fn conflicting_party_name_is_rolled_back() {
    let s = store().await;
    let registry = PartyRegistry::new(s.clone());
    let ndp = registry
      .create(NewParty { name_en: "NDP".into(), ..Default::default() })
      .await
      .unwrap();

    let err = registry
      .create(NewParty { name_en: "ndp".into(), ..Default::default() })
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));
    assert_eq!(registry.get_by_name("NDP").await.unwrap().id, ndp.id);
  }

  #[tokio::test]
  async fn deleting_party_purges_aliases() {
    let registry = PartyRegistry::new(store().await);
    let bloc = registry
      .create(NewParty { name_en: "Bloc Québécois".into(), ..Default::default() })
      .await
      .unwrap();

    assert!(registry.delete(bloc.id).await.unwrap());
    assert!(registry.get_by_name("Bloc Québécois").await.unwrap_err().is_not_found());

    // The freed alias can name a new party.
    let again = registry
      .create(NewParty { name_en: "Bloc Québécois".into(), ..Default::default() })
      .await
      .unwrap();
    assert_ne!(again.id, bloc.id);
  }

  #[tokio::test]
  async fn deleting_a_sitting_politician_removes_memberships() {
    let s = store().await;
    let s41 = SessionId::new(41, 1);
    session(&s, s41, date(2011, 6, 2), None).await;
    let riding = district(&s, "Outremont", Province::Qc).await;
    let ndp = party(&s, "NDP").await;
    let p = politician(&s, "Thomas Mulcair").await;
    membership(&s, &p, &riding, &ndp, &[s41], date(2011, 5, 2), None).await;
    ExternalIds::new(s.clone()).bind(ExternalIdKind::Person, 1234, p.id).await.unwrap();

    let registry = PoliticianRegistry::new(s.clone());
    assert!(registry.delete(p.id).await.unwrap());
    assert!(s.get_politician(p.id).await.unwrap().is_none());
    assert!(s.memberships_for(p.id).await.unwrap().is_empty());
    assert!(registry.alternate_names(p.id).await.unwrap().is_empty());
    assert!(s.find_by_family_name("Mulcair".into(), s41, None).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn deleting_a_party_with_members_removes_memberships() {
    let s = store().await;
    let s41 = SessionId::new(41, 1);
    session(&s, s41, date(2011, 6, 2), None).await;
    let riding = district(&s, "Outremont", Province::Qc).await;
    let registry = PartyRegistry::new(s.clone());
    let ndp = registry
      .create(NewParty { name_en: "NDP".into(), ..Default::default() })
      .await
      .unwrap();
    let p = politician(&s, "Thomas Mulcair").await;
    membership(&s, &p, &riding, &ndp, &[s41], date(2011, 5, 2), None).await;

    assert!(registry.delete(ndp.id).await.unwrap());
    assert!(registry.get_by_name("NDP").await.unwrap_err().is_not_found());
    assert!(s.memberships_for(p.id).await.unwrap().is_empty());
    assert!(s.get_politician(p.id).await.unwrap().is_some());
  }
}
