//! Column encodings: dates, timestamps, session ids, provinces and xref keys
//! as SQLite stores them.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as ISO 8601
//! (`YYYY-MM-DD`). Session ids use their `"41-1"` form.

use chrono::{DateTime, NaiveDate, Utc};
use polref_core::{
  district::{District, DistrictId},
  membership::{Membership, MembershipId},
  party::{Party, PartyId},
  politician::{InfoEntry, Politician, PoliticianId},
  session::{Session, SessionId},
  xref::{CrossReference, XrefKey, XrefSchema},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SessionId ───────────────────────────────────────────────────────────────

pub fn decode_session_id(s: &str) -> Result<SessionId> { Ok(s.parse()?) }

// ─── XrefKey ─────────────────────────────────────────────────────────────────

/// Split a key into its `(text_key, int_key)` column pair.
pub fn encode_key(key: &XrefKey) -> (Option<String>, Option<i64>) {
  match key {
    XrefKey::Text(s) => (Some(s.clone()), None),
    XrefKey::Int(i) => (None, Some(*i)),
  }
}

pub fn decode_key(text: Option<String>, int: Option<i64>) -> Result<XrefKey> {
  match (text, int) {
    (Some(s), None) => Ok(XrefKey::Text(s)),
    (None, Some(i)) => Ok(XrefKey::Int(i)),
    _ => Err(Error::Corrupt("xref row must carry exactly one key".into())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const POLITICIAN_COLUMNS: &str = "politician_id, name, name_given, name_family, slug";

pub fn politician_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Politician> {
  Ok(Politician {
    id:          PoliticianId(row.get(0)?),
    name:        row.get(1)?,
    name_given:  row.get(2)?,
    name_family: row.get(3)?,
    slug:        row.get(4)?,
  })
}

pub const PARTY_COLUMNS: &str =
  "party_id, name_en, name_fr, short_name_en, short_name_fr, slug";

pub fn party_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Party> {
  Ok(Party {
    id:            PartyId(row.get(0)?),
    name_en:       row.get(1)?,
    name_fr:       row.get(2)?,
    short_name_en: row.get(3)?,
    short_name_fr: row.get(4)?,
    slug:          row.get(5)?,
  })
}

/// Raw strings read directly from an `xrefs` row.
pub struct RawXref {
  pub schema:     String,
  pub text_key:   Option<String>,
  pub int_key:    Option<i64>,
  pub target_id:  i64,
  pub created_at: String,
}

impl RawXref {
  pub fn into_reference(self) -> Result<CrossReference> {
    Ok(CrossReference {
      schema:     self.schema.parse::<XrefSchema>()?,
      key:        decode_key(self.text_key, self.int_key)?,
      target_id:  self.target_id,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `politician_info` row.
pub struct RawInfo {
  pub key:        String,
  pub value:      String,
  pub created_at: String,
}

impl RawInfo {
  pub fn into_entry(self) -> Result<InfoEntry> {
    Ok(InfoEntry {
      key:        self.key,
      value:      self.value,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub session_id: String,
  pub name:       String,
  pub start_date: String,
  pub end_date:   Option<String>,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      id:    decode_session_id(&self.session_id)?,
      name:  self.name,
      start: decode_date(&self.start_date)?,
      end:   self.end_date.as_deref().map(decode_date).transpose()?,
    })
  }
}

/// Raw values read directly from a `districts` row.
pub struct RawDistrict {
  pub district_id: i64,
  pub name_en:     String,
  pub name_fr:     String,
  pub province:    String,
  pub slug:        String,
  pub edid:        Option<i64>,
  pub current:     bool,
}

impl RawDistrict {
  pub fn into_district(self) -> Result<District> {
    Ok(District {
      id:       DistrictId(self.district_id),
      name_en:  self.name_en,
      name_fr:  self.name_fr,
      province: self.province.parse()?,
      slug:     self.slug,
      edid:     self.edid,
      current:  self.current,
    })
  }
}

pub const DISTRICT_COLUMNS: &str =
  "district_id, name_en, name_fr, province, slug, edid, current";

pub fn raw_district_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDistrict> {
  Ok(RawDistrict {
    district_id: row.get(0)?,
    name_en:     row.get(1)?,
    name_fr:     row.get(2)?,
    province:    row.get(3)?,
    slug:        row.get(4)?,
    edid:        row.get(5)?,
    current:     row.get(6)?,
  })
}

/// Raw values read from a `memberships` row plus its session ids.
pub struct RawMembership {
  pub membership_id: i64,
  pub politician_id: i64,
  pub district_id:   i64,
  pub party_id:      i64,
  pub start_date:    String,
  pub end_date:      Option<String>,
  pub sessions:      Vec<String>,
}

impl RawMembership {
  pub fn into_membership(self) -> Result<Membership> {
    Ok(Membership {
      id:         MembershipId(self.membership_id),
      politician: PoliticianId(self.politician_id),
      district:   DistrictId(self.district_id),
      party:      PartyId(self.party_id),
      sessions:   self
        .sessions
        .iter()
        .map(|s| decode_session_id(s))
        .collect::<Result<_>>()?,
      start_date: decode_date(&self.start_date)?,
      end_date:   self.end_date.as_deref().map(decode_date).transpose()?,
    })
  }
}
