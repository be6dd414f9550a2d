//! Name normalization and district slugs.
//!
//! Both functions are total: any input produces a (possibly empty) key.
//! Normalization is a projection, not an injection. Residual spelling
//! variation is absorbed by the alternate-name table, not here.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// A display name reduced to its lookup key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedName(String);

impl NormalizedName {
  pub fn as_str(&self) -> &str { &self.0 }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn into_string(self) -> String { self.0 }
}

impl fmt::Display for NormalizedName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Decompose, drop combining marks and lower-case.
fn fold(raw: &str) -> impl Iterator<Item = char> + '_ {
  raw
    .nfkd()
    .filter(|c| !is_combining_mark(*c))
    .flat_map(char::to_lowercase)
}

fn is_dash(c: char) -> bool {
  matches!(c, '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}')
}

/// Reduce a raw display name to the key used by every name lookup.
///
/// `"Thomas  Mulcair"`, `"thomas mulcair"` and `"Thomas Mulcair."` all map
/// to `thomas mulcair`. Hyphens separate words, so `"Jean-Pierre"` and
/// `"Jean Pierre"` agree.
pub fn normalize_name(raw: &str) -> NormalizedName {
  let mut out = String::with_capacity(raw.len());
  let mut pending_space = false;

  for c in fold(raw) {
    if c.is_alphanumeric() {
      if pending_space && !out.is_empty() {
        out.push(' ');
      }
      pending_space = false;
      out.push(c);
    } else if c.is_whitespace() || is_dash(c) {
      pending_space = true;
    }
    // Any other punctuation (periods, commas, apostrophes) is dropped.
  }

  NormalizedName(out)
}

/// Convert a district name to its canonical slug.
///
/// Example: `"Richmond—Arthabaska"` → `"richmond-arthabaska"`
pub fn slugify(raw: &str) -> String {
  let mut slug = String::with_capacity(raw.len());
  let mut last_dash = true;

  for c in fold(raw) {
    if c.is_alphanumeric() {
      slug.push(c);
      last_dash = false;
    } else if !last_dash {
      slug.push('-');
      last_dash = true;
    }
  }

  slug.trim_end_matches('-').to_string()
}
