//! Seed import: load reference data and politicians from a JSON file.
//!
//! ```json
//! {
//!   "sessions":  [{ "id": "41-1", "name": "41st Parliament, 1st Session",
//!                   "start": "2011-06-02", "end": null }],
//!   "districts": [{ "name_en": "Outremont", "province": "QC", "current": true }],
//!   "parties":   [{ "name_en": "NDP", "name_fr": "NPD", "aliases": ["New Democrats"] }],
//!   "politicians": [{
//!     "name": "Thomas Mulcair",
//!     "alternate_names": ["Tom Mulcair"],
//!     "info": { "web_site": "https://example.org", "email": ["a@example.org"] },
//!     "person_id": 1234,
//!     "memberships": [{ "district": "Outremont", "party": "NDP",
//!                       "sessions": ["41-1"], "start_date": "2011-05-02" }]
//!   }]
//! }
//! ```
//!
//! Memberships name their district and party; both are resolved through the
//! same riding and party-alias lookups the engine uses.

use std::collections::BTreeMap;

use anyhow::Context as _;
use chrono::NaiveDate;
use polref_core::{
  district::NewDistrict,
  membership::NewMembership,
  party::NewParty,
  politician::NewPolitician,
  session::{Session, SessionId},
  store::{DistrictStore, MembershipStore, SessionStore},
};
use polref_resolve::{
  CorrectionTable, ExternalIdKind, ExternalIds, PartyRegistry, PoliticianRegistry, RidingResolver,
};
use polref_store_sqlite::SqliteStore;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
  pub sessions:    Vec<Session>,
  pub districts:   Vec<NewDistrict>,
  pub parties:     Vec<SeedParty>,
  pub politicians: Vec<SeedPolitician>,
}

#[derive(Debug, Deserialize)]
pub struct SeedParty {
  #[serde(flatten)]
  pub party:   NewParty,
  #[serde(default)]
  pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedPolitician {
  pub name:            String,
  #[serde(default)]
  pub name_given:      String,
  #[serde(default)]
  pub name_family:     String,
  #[serde(default)]
  pub alternate_names: Vec<String>,
  #[serde(default)]
  pub info:            BTreeMap<String, InfoValue>,
  #[serde(default)]
  pub person_id:       Option<i64>,
  #[serde(default)]
  pub memberships:     Vec<SeedMembership>,
}

/// A single value is stored single-valued; a list is stored multivalued.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InfoValue {
  One(String),
  Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
pub struct SeedMembership {
  pub district:   String,
  pub party:      String,
  pub sessions:   Vec<SessionId>,
  pub start_date: NaiveDate,
  #[serde(default)]
  pub end_date:   Option<NaiveDate>,
}

/// Counts of what an import wrote.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
  pub sessions:    usize,
  pub districts:   usize,
  pub parties:     usize,
  pub politicians: usize,
  pub memberships: usize,
}

impl SeedPolitician {
  /// Explicit given and family names win over the ones split from `name`.
  fn new_politician(&self) -> NewPolitician {
    let mut input = NewPolitician::from_name(&self.name);
    if !self.name_given.is_empty() {
      input.name_given = self.name_given.clone();
    }
    if !self.name_family.is_empty() {
      input.name_family = self.name_family.clone();
    }
    input
  }
}

pub async fn import(
  store: &SqliteStore,
  corrections: CorrectionTable,
  seed: Seed,
) -> anyhow::Result<ImportReport> {
  let mut report = ImportReport::default();
  let ridings = RidingResolver::new(store.clone(), corrections);
  let parties = PartyRegistry::new(store.clone());
  let politicians = PoliticianRegistry::new(store.clone());
  let external = ExternalIds::new(store.clone());

  for session in seed.sessions {
    let id = session.id;
    store
      .add_session(session)
      .await
      .with_context(|| format!("adding session {id}"))?;
    report.sessions += 1;
  }

  for district in seed.districts {
    let name = district.name_en.clone();
    store
      .add_district(district)
      .await
      .with_context(|| format!("adding district {name:?}"))?;
    report.districts += 1;
  }

  for SeedParty { party, aliases } in seed.parties {
    let name = party.name_en.clone();
    let party = parties
      .create(party)
      .await
      .with_context(|| format!("adding party {name:?}"))?;
    for alias in &aliases {
      parties
        .add_alias(party.id, alias)
        .await
        .with_context(|| format!("adding alias {alias:?} to party {name:?}"))?;
    }
    report.parties += 1;
  }

  for seed_pol in seed.politicians {
    let pol = politicians
      .create(seed_pol.new_politician())
      .await
      .with_context(|| format!("adding politician {:?}", seed_pol.name))?;
    politicians.assign_slug(&pol).await?;

    for name in &seed_pol.alternate_names {
      politicians.add_alternate_name(pol.id, name).await?;
    }
    for (key, value) in &seed_pol.info {
      match value {
        InfoValue::One(v) => politicians.set_info(pol.id, key, v, true).await?,
        InfoValue::Many(vs) => {
          for v in vs {
            politicians.set_info_multivalued(pol.id, key, v).await?;
          }
        }
      }
    }
    if let Some(person_id) = seed_pol.person_id {
      external
        .bind(ExternalIdKind::Person, person_id, pol.id)
        .await
        .with_context(|| format!("binding person id {person_id} to {:?}", pol.name))?;
    }

    for m in seed_pol.memberships {
      let district = ridings
        .resolve_district(&m.district)
        .await
        .with_context(|| format!("membership of {:?}", pol.name))?;
      let party = parties
        .get_by_name(&m.party)
        .await
        .with_context(|| format!("membership of {:?}", pol.name))?;
      store
        .add_membership(NewMembership {
          politician: pol.id,
          district:   district.id,
          party:      party.id,
          sessions:   m.sessions,
          start_date: m.start_date,
          end_date:   m.end_date,
        })
        .await
        .with_context(|| format!("adding membership of {:?}", pol.name))?;
      report.memberships += 1;
    }
    report.politicians += 1;
  }

  info!(?report, "seed imported");
  Ok(report)
}

#[cfg(test)]
mod tests {
  use polref_core::membership::MembershipFilter;
  use polref_resolve::{IdentityResolver, ResolveOptions};

  use super::*;

  const SEED: &str = r#"{
    "sessions": [
      { "id": "41-1", "name": "41st Parliament, 1st Session", "start": "2011-06-02", "end": null }
    ],
    "districts": [
      { "name_en": "Outremont", "province": "QC", "current": true },
      { "name_en": "Medicine Hat", "province": "AB" }
    ],
    "parties": [
      { "name_en": "NDP", "name_fr": "NPD", "aliases": ["New Democratic Party"] }
    ],
    "politicians": [{
      "name": "Thomas Mulcair",
      "alternate_names": ["Tom Mulcair"],
      "info": { "web_site": "https://example.org", "email": ["a@example.org", "b@example.org"] },
      "person_id": 1234,
      "memberships": [
        { "district": "Outremont", "party": "New Democratic Party",
          "sessions": ["41-1"], "start_date": "2011-05-02" }
      ]
    }]
  }"#;

  #[tokio::test]
  async fn imported_seed_is_resolvable() {
    let store = SqliteStore::open_in_memory().await.expect("in-memory store");
    let seed: Seed = serde_json::from_str(SEED).unwrap();

    let report = import(&store, CorrectionTable::builtin(), seed).await.unwrap();
    assert_eq!(report, ImportReport {
      sessions:    1,
      districts:   2,
      parties:     1,
      politicians: 1,
      memberships: 1,
    });

    let resolver = IdentityResolver::new(store.clone());
    let pol = resolver
      .resolve("Tom Mulcair", &MembershipFilter::default(), ResolveOptions::default())
      .await
      .unwrap();
    assert_eq!(pol.slug.as_deref(), Some("thomas-mulcair"));

    let info = PoliticianRegistry::new(store.clone()).info_multivalued(pol.id).await.unwrap();
    assert_eq!(info["email"].len(), 2);
    assert_eq!(
      ExternalIds::new(store).politician(ExternalIdKind::Person, 1234).await.unwrap(),
      Some(pol.id)
    );
  }

  #[tokio::test]
  async fn membership_with_unknown_party_fails() {
    let store = SqliteStore::open_in_memory().await.expect("in-memory store");
    let seed: Seed = serde_json::from_str(
      r#"{
        "sessions": [{ "id": "41-1", "name": "41-1", "start": "2011-06-02", "end": null }],
        "districts": [{ "name_en": "Outremont", "province": "QC" }],
        "politicians": [{ "name": "Jack Layton", "memberships": [
          { "district": "Outremont", "party": "Whig", "sessions": ["41-1"], "start_date": "2011-05-02" }
        ]}]
      }"#,
    )
    .unwrap();

    assert!(import(&store, CorrectionTable::builtin(), seed).await.is_err());
  }
}
