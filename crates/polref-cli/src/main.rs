//! `polref` — resolve legislators' names and directory ids.
//!
//! Reads `polref.toml` (or the path given with `--config`), opens the SQLite
//! store and runs one subcommand. Results are printed as JSON.
//!
//! # Usage
//!
//! ```text
//! polref import seed.json
//! polref resolve "Tom Mulcair" --session 41-1 --riding Outremont
//! polref lookup person 1234 --session 41-1
//! polref show thomas-mulcair
//! ```

mod seed;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use polref_core::{
  politician::Politician,
  session::SessionId,
  store::{DistrictStore, PartyStore},
};
use polref_directory::{DirectoryClient, DirectoryContext, ReqwestTransport};
use polref_resolve::{
  ExternalIdKind, ExternalIds, IdentityResolver, Memberships, PartyRegistry, PoliticianRegistry,
  ResolveContext, ResolveOptions, RidingResolver,
};
use polref_store_sqlite::SqliteStore;
use serde::Serialize;
use serde_json::json;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "polref", version, about = "Legislator identity resolution")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "polref.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Load sessions, districts, parties and politicians from a JSON seed.
  Import { seed: PathBuf },

  /// Resolve a name to one politician.
  Resolve {
    name:              String,
    /// `41-1` or `41st Parliament, 1st Session`.
    #[arg(long)]
    session:           Option<String>,
    #[arg(long)]
    riding:            Option<String>,
    #[arg(long)]
    party:             Option<String>,
    /// Never fall back to family-name matching.
    #[arg(long)]
    strict:            bool,
    /// Don't record the name as an alternate when it resolves.
    #[arg(long)]
    no_save_alternate: bool,
  },

  /// Resolve a directory id, asking the directory if it isn't known yet.
  Lookup {
    #[arg(value_enum)]
    kind:    KindArg,
    id:      i64,
    #[arg(long)]
    session: Option<String>,
    #[arg(long)]
    riding:  Option<String>,
  },

  /// Resolve a district name.
  Riding { name: String },

  /// Resolve a party name or alias.
  Party { name: String },

  /// Register an extra alias for a party.
  PartyAlias { party: String, alias: String },

  /// Show a politician by slug or numeric id.
  Show { slug_or_id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
  Person,
  Affiliation,
}

impl From<KindArg> for ExternalIdKind {
  fn from(kind: KindArg) -> Self {
    match kind {
      KindArg::Person => Self::Person,
      KindArg::Affiliation => Self::Affiliation,
    }
  }
}

fn parse_session(raw: &str) -> anyhow::Result<SessionId> {
  raw
    .parse::<SessionId>()
    .or_else(|_| SessionId::from_description(raw))
    .with_context(|| format!("invalid session {raw:?}"))
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store_path = settings.store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Import { seed } => {
      let raw = std::fs::read_to_string(&seed)
        .with_context(|| format!("reading seed file {}", seed.display()))?;
      let seed: seed::Seed = serde_json::from_str(&raw).context("parsing seed file")?;
      let report = seed::import(&store, settings.corrections(), seed).await?;
      print(&report)
    }

    Command::Resolve { name, session, riding, party, strict, no_save_alternate } => {
      let mut context = ResolveContext::default();
      if let Some(raw) = session {
        context = context.session(parse_session(&raw)?);
      }
      if let Some(raw) = riding {
        let ridings = RidingResolver::new(store.clone(), settings.corrections());
        context = context.district(ridings.resolve_district(&raw).await?.id);
      }
      if let Some(raw) = party {
        context = context.party(PartyRegistry::new(store.clone()).get_by_name(&raw).await?.id);
      }
      let options = ResolveOptions { save_alternate: !no_save_alternate, strict };

      let politician = IdentityResolver::new(store.clone())
        .resolve(&name, &context, options)
        .await?;
      print(&politician)
    }

    Command::Lookup { kind, id, session, riding } => {
      let context = DirectoryContext {
        session:     session.as_deref().map(parse_session).transpose()?,
        riding_name: riding,
      };
      let transport = ReqwestTransport::new(&settings.directory)?;
      let client =
        DirectoryClient::new(store.clone(), transport, settings.directory.clone(), settings.corrections());

      let politician = client
        .resolve_by_external_id(kind.into(), id, &context)
        .await?;
      print(&politician)
    }

    Command::Riding { name } => {
      let district = RidingResolver::new(store.clone(), settings.corrections())
        .resolve_district(&name)
        .await?;
      print(&json!({
        "district":    district,
        "dashed_name": district.dashed_name(),
        "province":    district.province.name_en(),
      }))
    }

    Command::Party { name } => {
      let registry = PartyRegistry::new(store.clone());
      let party = registry.get_by_name(&name).await?;
      let aliases = registry.aliases_of(party.id).await?;
      print(&json!({ "party": party, "aliases": aliases }))
    }

    Command::PartyAlias { party, alias } => {
      let registry = PartyRegistry::new(store.clone());
      let party = registry.get_by_name(&party).await?;
      let inserted = registry.add_alias(party.id, &alias).await?;
      print(&json!({ "party": party.id, "alias": alias, "result": format!("{inserted:?}") }))
    }

    Command::Show { slug_or_id } => {
      let politician = IdentityResolver::new(store.clone())
        .get_by_slug_or_id(&slug_or_id)
        .await?;
      print(&show(&store, politician).await?)
    }
  }
}

/// Everything known about one politician, with memberships spelled out.
async fn show(store: &SqliteStore, politician: Politician) -> anyhow::Result<serde_json::Value> {
  let id = politician.id;
  let registry = PoliticianRegistry::new(store.clone());
  let external = ExternalIds::new(store.clone());

  let mut memberships = Vec::new();
  for m in Memberships::new(store.clone()).all(id).await? {
    let district = store.get_district(m.district).await?;
    let party = store.get_party(m.party).await?;
    memberships.push(json!({
      "district":   district.map(|d| d.name_en),
      "party":      party.map(|p| p.short_name_en),
      "sessions":   m.sessions,
      "start_date": m.start_date,
      "end_date":   m.end_date,
    }));
  }

  Ok(json!({
    "politician":       politician,
    "alternate_names":  registry.alternate_names(id).await?,
    "person_ids":       external.list(ExternalIdKind::Person, id).await?,
    "affiliation_ids":  external.list(ExternalIdKind::Affiliation, id).await?,
    "info":             registry.info_multivalued(id).await?,
    "memberships":      memberships,
  }))
}
