//! Directory endpoint settings.

use polref_resolve::ExternalIdKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
  /// Redirects to the profile page of a person id. `{id}` is substituted.
  pub person_lookup_url:      String,
  /// Redirects to the profile page of the person holding an affiliation id.
  pub affiliation_lookup_url: String,
  pub timeout_secs:           u64,
  pub user_agent:             String,
}

impl Default for DirectoryConfig {
  fn default() -> Self {
    Self {
      person_lookup_url:      "https://www.ourcommons.ca/Members/en/openparliamentdotca-lookup({id})"
        .into(),
      affiliation_lookup_url:
        "https://www.ourcommons.ca/Parliamentarians/en/members/profileredirect?affiliationId={id}"
          .into(),
      timeout_secs:           30,
      user_agent:             concat!("polref/", env!("CARGO_PKG_VERSION")).into(),
    }
  }
}

impl DirectoryConfig {
  pub fn lookup_url(&self, kind: ExternalIdKind, id: i64) -> String {
    let template = match kind {
      ExternalIdKind::Person => &self.person_lookup_url,
      ExternalIdKind::Affiliation => &self.affiliation_lookup_url,
    };
    template.replace("{id}", &id.to_string())
  }
}
