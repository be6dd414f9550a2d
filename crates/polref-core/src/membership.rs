//! Memberships — who held which seat, for which party, in which sessions.
//!
//! Rows are written by ingestion. The resolution engine only reads them to
//! test candidates against caller-supplied context.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  district::DistrictId,
  party::PartyId,
  politician::PoliticianId,
  session::SessionId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipId(pub i64);

/// One politician holding one seat for one party across one or more
/// sessions. A floor crosser has several rows for the same session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
  pub id:         MembershipId,
  pub politician: PoliticianId,
  pub district:   DistrictId,
  pub party:      PartyId,
  pub sessions:   Vec<SessionId>,
  pub start_date: NaiveDate,
  /// `None` for a sitting member.
  pub end_date:   Option<NaiveDate>,
}

impl Membership {
  pub fn is_current(&self) -> bool { self.end_date.is_none() }

  pub fn active_on(&self, date: NaiveDate) -> bool {
    self.start_date <= date && self.end_date.is_none_or(|end| date <= end)
  }
}

/// Input to [`crate::store::MembershipStore::add_membership`].
#[derive(Debug, Clone)]
pub struct NewMembership {
  pub politician: PoliticianId,
  pub district:   DistrictId,
  pub party:      PartyId,
  pub sessions:   Vec<SessionId>,
  pub start_date: NaiveDate,
  pub end_date:   Option<NaiveDate>,
}

/// Optional constraints a membership must satisfy. An empty filter matches
/// everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipFilter {
  pub session:  Option<SessionId>,
  pub district: Option<DistrictId>,
  pub party:    Option<PartyId>,
}

impl MembershipFilter {
  pub fn session(mut self, session: SessionId) -> Self {
    self.session = Some(session);
    self
  }

  pub fn district(mut self, district: DistrictId) -> Self {
    self.district = Some(district);
    self
  }

  pub fn party(mut self, party: PartyId) -> Self {
    self.party = Some(party);
    self
  }

  pub fn is_empty(&self) -> bool {
    self.session.is_none() && self.district.is_none() && self.party.is_none()
  }

  /// Every supplied field must agree with the membership.
  pub fn matches(&self, m: &Membership) -> bool {
    self.district.is_none_or(|d| d == m.district)
      && self.session.is_none_or(|s| m.sessions.contains(&s))
      && self.party.is_none_or(|p| p == m.party)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn membership() -> Membership {
    Membership {
      id:         MembershipId(1),
      politician: PoliticianId(7),
      district:   DistrictId(3),
      party:      PartyId(2),
      sessions:   vec![SessionId::new(41, 1), SessionId::new(41, 2)],
      start_date: NaiveDate::from_ymd_opt(2011, 5, 2).unwrap(),
      end_date:   Some(NaiveDate::from_ymd_opt(2015, 8, 2).unwrap()),
    }
  }

  #[test]
  fn empty_filter_matches() {
    let f = MembershipFilter::default();
    assert!(f.is_empty());
    assert!(f.matches(&membership()));
  }

  #[test]
  fn every_supplied_field_must_agree() {
    let m = membership();
    let f = MembershipFilter::default()
      .session(SessionId::new(41, 2))
      .district(DistrictId(3));
    assert!(f.matches(&m));
    assert!(!f.party(PartyId(9)).matches(&m));
    assert!(!MembershipFilter::default().session(SessionId::new(40, 3)).matches(&m));
  }

  #[test]
  fn active_on_respects_end_date() {
    let m = membership();
    assert!(!m.is_current());
    assert!(m.active_on(NaiveDate::from_ymd_opt(2013, 1, 1).unwrap()));
    assert!(!m.active_on(NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()));
  }
}
