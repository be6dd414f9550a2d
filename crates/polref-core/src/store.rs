//! Storage traits.
//!
//! The traits are implemented by storage backends (e.g. `polref-store-sqlite`).
//! The resolution and directory layers depend on these abstractions, never
//! on a concrete backend.
//!
//! All traits share one backend error type through [`Backend`], so a single
//! store can implement several of them and callers can name `S::Error`
//! unambiguously.

use std::{collections::BTreeSet, future::Future};

use crate::{
  district::{District, DistrictId, NewDistrict},
  membership::{Membership, NewMembership},
  party::{NewParty, Party, PartyId},
  politician::{InfoEntry, NewPolitician, Politician, PoliticianId},
  session::{Session, SessionId},
  xref::{CrossReference, Inserted, XrefKey, XrefSchema},
};

/// Common supertrait carrying the backend's error type.
///
/// The error must convert into [`crate::Error`] so that conditions such as
/// [`crate::Error::Conflict`] survive the trip through the backend intact.
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;
}

// ─── Cross-references ────────────────────────────────────────────────────────

/// The generic `(schema, key) → target` table.
///
/// `insert` must be atomic per `(schema, key)`: of two racing writers for an
/// exclusive schema, the loser sees either [`Inserted::AlreadyPresent`] (same
/// target) or [`crate::Error::Conflict`] (different target).
pub trait XrefStore: Backend {
  /// All targets registered under `key`; empty if none.
  fn lookup(
    &self,
    schema: XrefSchema,
    key: XrefKey,
  ) -> impl Future<Output = Result<BTreeSet<i64>, Self::Error>> + Send + '_;

  /// Bind `key` to `target_id`. Never overwrites.
  fn insert(
    &self,
    schema: XrefSchema,
    key: XrefKey,
    target_id: i64,
  ) -> impl Future<Output = Result<Inserted, Self::Error>> + Send + '_;

  /// Remove every row of `schema` owned by `target_id`. Returns the number of
  /// rows removed.
  fn delete(
    &self,
    schema: XrefSchema,
    target_id: i64,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Every row of `schema` owned by `target_id`, oldest first.
  fn references(
    &self,
    schema: XrefSchema,
    target_id: i64,
  ) -> impl Future<Output = Result<Vec<CrossReference>, Self::Error>> + Send + '_;
}

// ─── Politicians ─────────────────────────────────────────────────────────────

pub trait PoliticianStore: Backend {
  fn add_politician(
    &self,
    input: NewPolitician,
  ) -> impl Future<Output = Result<Politician, Self::Error>> + Send + '_;

  /// Retrieve a politician by id. Returns `None` if not found.
  fn get_politician(
    &self,
    id: PoliticianId,
  ) -> impl Future<Output = Result<Option<Politician>, Self::Error>> + Send + '_;

  fn get_politician_by_slug(
    &self,
    slug: String,
  ) -> impl Future<Output = Result<Option<Politician>, Self::Error>> + Send + '_;

  /// Set the slug unless another politician already holds it. Returns
  /// `false` when the slug is taken.
  fn assign_slug(
    &self,
    id: PoliticianId,
    slug: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Politicians whose family name is exactly `family_name` and who hold a
  /// membership in `session` (and in `district`, when given).
  fn find_by_family_name(
    &self,
    family_name: String,
    session: SessionId,
    district: Option<DistrictId>,
  ) -> impl Future<Output = Result<Vec<Politician>, Self::Error>> + Send + '_;

  /// Delete a politician and its info rows. Cross-references are the
  /// caller's responsibility. Returns `false` if no such politician.
  fn delete_politician(
    &self,
    id: PoliticianId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Info rows ─────────────────────────────────────────────────────────

  /// All info rows for a politician, oldest first.
  fn info(
    &self,
    id: PoliticianId,
  ) -> impl Future<Output = Result<Vec<InfoEntry>, Self::Error>> + Send + '_;

  /// Add `(key, value)` unless that exact row exists. Returns `true` if a row
  /// was written.
  fn add_info(
    &self,
    id: PoliticianId,
    key: String,
    value: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Replace every row under `key` with a single `(key, value)` row.
  fn replace_info(
    &self,
    id: PoliticianId,
    key: String,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove every row under `key`. Returns the number removed.
  fn delete_info(
    &self,
    id: PoliticianId,
    key: String,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}

// ─── Memberships ─────────────────────────────────────────────────────────────

pub trait MembershipStore: Backend {
  fn add_membership(
    &self,
    input: NewMembership,
  ) -> impl Future<Output = Result<Membership, Self::Error>> + Send + '_;

  /// All memberships of a politician, most recent start date first.
  fn memberships_for(
    &self,
    politician: PoliticianId,
  ) -> impl Future<Output = Result<Vec<Membership>, Self::Error>> + Send + '_;
}

// ─── Sessions ────────────────────────────────────────────────────────────────

pub trait SessionStore: Backend {
  fn add_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  fn get_session(
    &self,
    id: SessionId,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// All sessions, latest start first.
  fn list_sessions(
    &self,
  ) -> impl Future<Output = Result<Vec<Session>, Self::Error>> + Send + '_;
}

// ─── Districts ───────────────────────────────────────────────────────────────

pub trait DistrictStore: Backend {
  fn add_district(
    &self,
    input: NewDistrict,
  ) -> impl Future<Output = Result<District, Self::Error>> + Send + '_;

  fn get_district(
    &self,
    id: DistrictId,
  ) -> impl Future<Output = Result<Option<District>, Self::Error>> + Send + '_;

  fn get_district_by_slug(
    &self,
    slug: String,
  ) -> impl Future<Output = Result<Option<District>, Self::Error>> + Send + '_;
}

// ─── Parties ─────────────────────────────────────────────────────────────────

pub trait PartyStore: Backend {
  fn add_party(
    &self,
    input: NewParty,
  ) -> impl Future<Output = Result<Party, Self::Error>> + Send + '_;

  fn get_party(
    &self,
    id: PartyId,
  ) -> impl Future<Output = Result<Option<Party>, Self::Error>> + Send + '_;

  /// Delete a party row. Alias rows are the caller's responsibility.
  fn delete_party(
    &self,
    id: PartyId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
