//! `polref.toml`, layered with `POLREF_*` environment variables.

use std::{
  collections::BTreeMap,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use polref_directory::DirectoryConfig;
use polref_resolve::CorrectionTable;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path:         PathBuf,
  pub directory:          DirectoryConfig,
  /// Extra `{misspelling → canonical}` district corrections on top of the
  /// built-in table.
  pub riding_corrections: BTreeMap<String, String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:         PathBuf::from("~/.local/share/polref/polref.sqlite3"),
      directory:          DirectoryConfig::default(),
      riding_corrections: BTreeMap::new(),
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then apply the environment. Nested keys use a
  /// double underscore: `POLREF_DIRECTORY__TIMEOUT_SECS=5`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("POLREF")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn corrections(&self) -> CorrectionTable {
    CorrectionTable::builtin().extend(self.riding_corrections.clone())
  }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// `~/x` becomes `$HOME/x`; anything else is returned unchanged.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
