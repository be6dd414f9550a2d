//! Parsing the directory's member detail document.
//!
//! Only three fields are read, all children of the first
//! `MemberOfParliamentRole` under the document root:
//!
//! ```xml
//! <Profile>
//!   <MemberOfParliamentRole>
//!     <PersonOfficialFirstName>Thomas</PersonOfficialFirstName>
//!     <PersonOfficialLastName>Mulcair</PersonOfficialLastName>
//!     <ConstituencyName>Outremont</ConstituencyName>
//!   </MemberOfParliamentRole>
//! </Profile>
//! ```

use polref_core::{Error, Result};
use quick_xml::events::Event;

const ROLE: &[u8] = b"MemberOfParliamentRole";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDetail {
  pub first_name:   String,
  pub last_name:    String,
  pub constituency: String,
}

impl MemberDetail {
  pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  FirstName,
  LastName,
  Constituency,
}

impl Field {
  fn from_local(name: &[u8]) -> Option<Self> {
    match name {
      b"PersonOfficialFirstName" => Some(Self::FirstName),
      b"PersonOfficialLastName" => Some(Self::LastName),
      b"ConstituencyName" => Some(Self::Constituency),
      _ => None,
    }
  }

  fn tag(self) -> &'static str {
    match self {
      Self::FirstName => "PersonOfficialFirstName",
      Self::LastName => "PersonOfficialLastName",
      Self::Constituency => "ConstituencyName",
    }
  }
}

#[derive(Default)]
struct Found {
  first_name:   Option<String>,
  last_name:    Option<String>,
  constituency: Option<String>,
}

impl Found {
  fn slot(&mut self, field: Field) -> &mut Option<String> {
    match field {
      Field::FirstName => &mut self.first_name,
      Field::LastName => &mut self.last_name,
      Field::Constituency => &mut self.constituency,
    }
  }

  fn require(value: Option<String>, field: Field) -> Result<String> {
    value.ok_or_else(|| Error::Protocol(format!("member detail has no {}", field.tag())))
  }
}

/// Parse a detail document. A missing or empty field is a protocol error.
pub fn parse_detail(xml: &[u8]) -> Result<MemberDetail> {
  let mut reader = quick_xml::Reader::from_reader(xml);
  reader.config_mut().trim_text(true);

  // Local names of the open elements, root first.
  let mut path: Vec<Vec<u8>> = Vec::new();
  let mut found = Found::default();
  let mut current: Option<(Field, String)> = None;
  let mut buf = Vec::new();

  loop {
    match reader.read_event_into(&mut buf) {
      Ok(Event::Start(ref e)) => {
        let local = e.local_name().as_ref().to_vec();
        if path.len() == 2 && path[1] == ROLE {
          current = Field::from_local(&local)
            .filter(|f| found.slot(*f).is_none())
            .map(|f| (f, String::new()));
        }
        path.push(local);
      }
      Ok(Event::Text(ref e)) => {
        if let Some((_, text)) = current.as_mut() {
          let unescaped = e
            .unescape()
            .map_err(|e| Error::Protocol(format!("member detail: {e}")))?;
          text.push_str(&unescaped);
        }
      }
      Ok(Event::CData(ref e)) => {
        if let Some((_, text)) = current.as_mut() {
          text.push_str(&String::from_utf8_lossy(e));
        }
      }
      Ok(Event::End(_)) => {
        path.pop();
        if path.len() == 2 {
          if let Some((field, text)) = current.take() {
            let text = text.trim();
            if !text.is_empty() {
              *found.slot(field) = Some(text.to_string());
            }
          }
        }
      }
      Ok(Event::Eof) => break,
      Err(e) => return Err(Error::Protocol(format!("member detail is not XML: {e}"))),
      _ => {}
    }
    buf.clear();
  }

  Ok(MemberDetail {
    first_name:   Found::require(found.first_name, Field::FirstName)?,
    last_name:    Found::require(found.last_name, Field::LastName)?,
    constituency: Found::require(found.constituency, Field::Constituency)?,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_name_and_constituency() {
    let xml = br#"<?xml version="1.0" encoding="utf-8"?>
      <Profile>
        <MemberOfParliamentRole>
          <PersonOfficialFirstName>Thomas</PersonOfficialFirstName>
          <PersonOfficialLastName>Mulcair</PersonOfficialLastName>
          <ConstituencyName>Outremont</ConstituencyName>
          <CaucusShortName>NDP</CaucusShortName>
        </MemberOfParliamentRole>
      </Profile>"#;

    let detail = parse_detail(xml).unwrap();
    assert_eq!(detail.full_name(), "Thomas Mulcair");
    assert_eq!(detail.constituency, "Outremont");
  }

  #[test]
  fn entities_are_unescaped() {
    let xml = b"<Profile><MemberOfParliamentRole>\
      <PersonOfficialFirstName>Ren&#233;e</PersonOfficialFirstName>\
      <PersonOfficialLastName>O&apos;Brien</PersonOfficialLastName>\
      <ConstituencyName>Saint-Hubert</ConstituencyName>\
      </MemberOfParliamentRole></Profile>";

    let detail = parse_detail(xml).unwrap();
    assert_eq!(detail.first_name, "Renée");
    assert_eq!(detail.last_name, "O'Brien");
  }

  #[test]
  fn first_role_wins() {
    let xml = b"<Profile>\
      <MemberOfParliamentRole>\
        <PersonOfficialFirstName>Jack</PersonOfficialFirstName>\
        <PersonOfficialLastName>Layton</PersonOfficialLastName>\
        <ConstituencyName>Toronto--Danforth</ConstituencyName>\
      </MemberOfParliamentRole>\
      <MemberOfParliamentRole>\
        <ConstituencyName>Elsewhere</ConstituencyName>\
      </MemberOfParliamentRole>\
      </Profile>";

    assert_eq!(parse_detail(xml).unwrap().constituency, "Toronto--Danforth");
  }

  #[test]
  fn fields_outside_the_role_are_ignored() {
    let xml = b"<Profile>\
      <PersonOfficialFirstName>Stray</PersonOfficialFirstName>\
      <MemberOfParliamentRole>\
        <PersonOfficialLastName>Layton</PersonOfficialLastName>\
        <ConstituencyName>Toronto--Danforth</ConstituencyName>\
      </MemberOfParliamentRole>\
      </Profile>";

    let err = parse_detail(xml).unwrap_err();
    assert!(matches!(err, Error::Protocol(ref m) if m.contains("PersonOfficialFirstName")));
  }

  #[test]
  fn empty_field_is_a_protocol_error() {
    let xml = b"<Profile><MemberOfParliamentRole>\
      <PersonOfficialFirstName>Jack</PersonOfficialFirstName>\
      <PersonOfficialLastName>Layton</PersonOfficialLastName>\
      <ConstituencyName/>\
      </MemberOfParliamentRole></Profile>";

    assert!(matches!(parse_detail(xml), Err(Error::Protocol(_))));
  }

  #[test]
  fn html_is_a_protocol_error() {
    let err = parse_detail(b"<html><body>Page not found</body></html>").unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
  }
}
