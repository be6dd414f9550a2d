//! Shared test setup: an in-memory store and helpers that seed it.

use chrono::NaiveDate;
use polref_core::{
  district::{District, NewDistrict, Province},
  membership::{Membership, NewMembership},
  party::{NewParty, Party},
  politician::{NewPolitician, Politician},
  session::{Session, SessionId},
  store::{DistrictStore, MembershipStore, PartyStore, SessionStore},
};
use polref_store_sqlite::SqliteStore;

use crate::registry::PoliticianRegistry;

pub async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

pub async fn session(
  store: &SqliteStore,
  id: SessionId,
  start: NaiveDate,
  end: Option<NaiveDate>,
) -> Session {
  store
    .add_session(Session { id, name: format!("Session {id}"), start, end })
    .await
    .unwrap()
}

pub async fn district(store: &SqliteStore, name: &str, province: Province) -> District {
  store
    .add_district(NewDistrict {
      name_en: name.into(),
      name_fr: String::new(),
      province,
      slug: String::new(),
      edid: None,
      current: true,
    })
    .await
    .unwrap()
}

pub async fn party(store: &SqliteStore, name: &str) -> Party {
  store
    .add_party(NewParty { name_en: name.into(), ..Default::default() })
    .await
    .unwrap()
}

/// Create through the registry so the display name is recorded as an
/// alternate, as it is in production.
pub async fn politician(store: &SqliteStore, name: &str) -> Politician {
  PoliticianRegistry::new(store.clone())
    .create(NewPolitician::from_name(name))
    .await
    .unwrap()
}

pub async fn membership(
  store: &SqliteStore,
  politician: &Politician,
  district: &District,
  party: &Party,
  sessions: &[SessionId],
  start_date: NaiveDate,
  end_date: Option<NaiveDate>,
) -> Membership {
  store
    .add_membership(NewMembership {
      politician: politician.id,
      district: district.id,
      party: party.id,
      sessions: sessions.to_vec(),
      start_date,
      end_date,
    })
    .await
    .unwrap()
}
