//! Membership and session lookups used when interpreting source data.

use chrono::NaiveDate;
use polref_core::{
  Error, Result,
  membership::Membership,
  politician::PoliticianId,
  session::{Session, SessionId},
  store::{MembershipStore, SessionStore},
};

// ─── Memberships ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Memberships<S> {
  store: S,
}

impl<S: MembershipStore> Memberships<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// Every membership, most recent start first.
  pub async fn all(&self, politician: PoliticianId) -> Result<Vec<Membership>> {
    self
      .store
      .memberships_for(politician)
      .await
      .map_err(Into::into)
  }

  /// The open-ended membership, if the politician is sitting.
  pub async fn current(&self, politician: PoliticianId) -> Result<Option<Membership>> {
    Ok(self.all(politician).await?.into_iter().find(Membership::is_current))
  }

  /// The membership with the latest start date.
  pub async fn latest(&self, politician: PoliticianId) -> Result<Option<Membership>> {
    Ok(self.all(politician).await?.into_iter().next())
  }

  /// The membership covering `session`. A floor crosser holds several; the
  /// one that started last wins.
  pub async fn in_session(
    &self,
    politician: PoliticianId,
    session: SessionId,
  ) -> Result<Option<Membership>> {
    Ok(
      self
        .all(politician)
        .await?
        .into_iter()
        .filter(|m| m.sessions.contains(&session))
        .max_by_key(|m| m.start_date),
    )
  }

  pub async fn active_on(
    &self,
    politician: PoliticianId,
    date: NaiveDate,
  ) -> Result<Vec<Membership>> {
    Ok(
      self
        .all(politician)
        .await?
        .into_iter()
        .filter(|m| m.active_on(date))
        .collect(),
    )
  }
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Sessions<S> {
  store: S,
}

impl<S: SessionStore> Sessions<S> {
  pub fn new(store: S) -> Self { Self { store } }

  /// The session that started last.
  pub async fn current(&self) -> Result<Option<Session>> {
    let all = self.store.list_sessions().await.map_err(Into::<Error>::into)?;
    Ok(all.into_iter().next())
  }

  /// The session sitting on `date`.
  pub async fn on_date(&self, date: NaiveDate) -> Result<Option<Session>> {
    let all = self.store.list_sessions().await.map_err(Into::<Error>::into)?;
    Ok(all.into_iter().find(|s| s.contains(date)))
  }

  /// Accepts `"41-1"` or a description like `"41st Parliament, 1st
  /// Session"`. Returns `None` if the id parses but no such session exists.
  pub async fn get(&self, raw: &str) -> Result<Option<Session>> {
    let id = raw
      .parse::<SessionId>()
      .or_else(|_| SessionId::from_description(raw))?;
    self.store.get_session(id).await.map_err(Into::into)
  }
}
