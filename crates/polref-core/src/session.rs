//! Legislative sessions.
//!
//! Sessions are created by ingestion and are read-only to the resolution
//! engine, which only needs them as disambiguation context.

use std::{fmt, str::FromStr, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Error;

static DESCRIPTION_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(\d\d)\D+(\d)\D").expect("valid regex"));

/// Composite key of a session: parliament number and session number.
///
/// Rendered and parsed as `"41-1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId {
  pub parliament: u32,
  pub session:    u32,
}

impl SessionId {
  pub fn new(parliament: u32, session: u32) -> Self { Self { parliament, session } }

  /// Parse a descriptive label such as `"41st Parliament, 1st Session"`.
  pub fn from_description(s: &str) -> Result<Self, Error> {
    let caps = DESCRIPTION_RE
      .captures(s)
      .ok_or_else(|| Error::InvalidSession(s.to_string()))?;
    let parliament = caps[1]
      .parse()
      .map_err(|_| Error::InvalidSession(s.to_string()))?;
    let session = caps[2]
      .parse()
      .map_err(|_| Error::InvalidSession(s.to_string()))?;
    Ok(Self { parliament, session })
  }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.parliament, self.session)
  }
}

impl FromStr for SessionId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || Error::InvalidSession(s.to_string());
    let (parliament, session) = s.trim().split_once('-').ok_or_else(invalid)?;
    Ok(Self {
      parliament: parliament.parse().map_err(|_| invalid())?,
      session:    session.parse().map_err(|_| invalid())?,
    })
  }
}

impl TryFrom<String> for SessionId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<SessionId> for String {
  fn from(id: SessionId) -> Self { id.to_string() }
}

/// A contiguous sitting period of the legislature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub id:    SessionId,
  pub name:  String,
  pub start: NaiveDate,
  /// `None` while the session is still sitting.
  pub end:   Option<NaiveDate>,
}

impl Session {
  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start <= date && self.end.is_none_or(|end| date <= end)
  }
}
