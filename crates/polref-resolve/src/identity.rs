//! Name → politician resolution.
//!
//! [`IdentityResolver::resolve`] runs an ordered pipeline of stages. Each
//! stage either settles the query (a politician, or an ambiguity it cannot
//! break) or hands it on. Only "not found at this stage" advances; every
//! other failure returns to the caller immediately.
//!
//! 1. **Alternate names.** Politicians whose alternate names contain the
//!    normalized query. A single hit without context is returned as is.
//! 2. **Context.** Candidates from stage 1 are kept only if one of their
//!    memberships satisfies every supplied context field. This runs even for
//!    a single stage-1 hit when context is given, so a stale alias cannot
//!    override what the caller knows.
//! 3. **Family name.** With a session (and optionally a district), match the
//!    trailing capitalized word of the query against stored family names.
//!
//! A politician found in stage 2 or 3 gets the query recorded as an
//! alternate name, so the next lookup settles in stage 1.

use std::{collections::BTreeSet, sync::LazyLock};

use polref_core::{
  Error, Result,
  membership::MembershipFilter,
  normalize::normalize_name,
  politician::{Politician, PoliticianId},
  store::{MembershipStore, PoliticianStore, XrefStore},
  xref::Inserted,
};
use regex::Regex;
use tracing::{debug, info};

use crate::xref::AlternateNames;

/// The session, district and party a caller expects the politician to have
/// held together.
pub type ResolveContext = MembershipFilter;

/// A capitalized, possibly hyphenated word at the end of the name.
static FAMILY_NAME: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\s(\p{Lu}[\w-]+)$").expect("valid family name pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
  /// Record the query as an alternate name when it settles past stage 1.
  pub save_alternate: bool,
  /// Never fall back to family-name matching.
  pub strict:         bool,
}

impl Default for ResolveOptions {
  fn default() -> Self { Self { save_alternate: true, strict: false } }
}

impl ResolveOptions {
  pub fn strict(mut self) -> Self {
    self.strict = true;
    self
  }

  pub fn without_saving(mut self) -> Self {
    self.save_alternate = false;
    self
  }
}

/// What a stage decided.
#[derive(Debug)]
enum StageOutcome {
  Resolved(Politician),
  Ambiguous(Vec<PoliticianId>),
  Continue,
}

/// The trailing family-name token of `name`, if it has one.
fn family_name_token(name: &str) -> Option<&str> {
  FAMILY_NAME
    .captures(name.trim())
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str())
}

// ─── IdentityResolver ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct IdentityResolver<S> {
  store: S,
}

impl<S> IdentityResolver<S>
where
  S: XrefStore + PoliticianStore + MembershipStore + Clone,
{
  pub fn new(store: S) -> Self { Self { store } }

  fn alternates(&self) -> AlternateNames<S> { AlternateNames::new(self.store.clone()) }

  /// Resolve `name` to exactly one politician.
  ///
  /// Fails with [`Error::NotFound`] when no stage matches,
  /// [`Error::Ambiguous`] when the context cannot separate candidates, and
  /// [`Error::Inconsistent`] when two politicians with the same family name
  /// hold the same district in the same session.
  pub async fn resolve(
    &self,
    name: &str,
    context: &ResolveContext,
    options: ResolveOptions,
  ) -> Result<Politician> {
    let candidates = self.alternates().politicians_named(name).await?;
    debug!(name, candidates = candidates.len(), "alternate name lookup");

    match self.alternate_name_stage(&candidates, context).await? {
      StageOutcome::Resolved(politician) => {
        if !context.is_empty() {
          self.remember(&politician, name, options).await?;
        }
        return Ok(politician);
      }
      StageOutcome::Ambiguous(ids) => {
        return Err(Error::Ambiguous { name: name.to_string(), candidates: ids });
      }
      StageOutcome::Continue => {}
    }

    match self.family_name_stage(name, context, options).await? {
      StageOutcome::Resolved(politician) => {
        self.remember(&politician, name, options).await?;
        Ok(politician)
      }
      StageOutcome::Ambiguous(ids) => {
        Err(Error::Ambiguous { name: name.to_string(), candidates: ids })
      }
      StageOutcome::Continue => {
        Err(Error::NotFound(format!("could not find politician named {name:?}")))
      }
    }
  }

  /// Every politician known by `name`, without disambiguation.
  pub async fn filter_by_name(&self, name: &str) -> Result<Vec<Politician>> {
    let ids = self.alternates().politicians_named(name).await?;
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
      out.push(self.fetch(id).await?);
    }
    Ok(out)
  }

  /// Look up by numeric id when `slug_or_id` is all digits, by slug
  /// otherwise.
  pub async fn get_by_slug_or_id(&self, slug_or_id: &str) -> Result<Politician> {
    let found = if !slug_or_id.is_empty() && slug_or_id.bytes().all(|b| b.is_ascii_digit()) {
      let id = slug_or_id
        .parse()
        .map_err(|_| Error::NotFound(format!("no politician {slug_or_id}")))?;
      self
        .store
        .get_politician(PoliticianId(id))
        .await
        .map_err(Into::<Error>::into)?
    } else {
      self
        .store
        .get_politician_by_slug(slug_or_id.to_string())
        .await
        .map_err(Into::<Error>::into)?
    };
    found.ok_or_else(|| Error::NotFound(format!("no politician {slug_or_id:?}")))
  }

  // ── Stages ──────────────────────────────────────────────────────────────

  async fn alternate_name_stage(
    &self,
    candidates: &BTreeSet<PoliticianId>,
    context: &ResolveContext,
  ) -> Result<StageOutcome> {
    if candidates.is_empty() {
      return Ok(StageOutcome::Continue);
    }
    if context.is_empty() {
      return Ok(match candidates.len() {
        1 => match candidates.first() {
          Some(&id) => StageOutcome::Resolved(self.fetch(id).await?),
          None => StageOutcome::Continue,
        },
        _ => StageOutcome::Ambiguous(candidates.iter().copied().collect()),
      });
    }
    self.context_stage(candidates, context).await
  }

  async fn context_stage(
    &self,
    candidates: &BTreeSet<PoliticianId>,
    context: &ResolveContext,
  ) -> Result<StageOutcome> {
    let mut matched = Vec::new();
    for &id in candidates {
      let memberships = self
        .store
        .memberships_for(id)
        .await
        .map_err(Into::<Error>::into)?;
      if memberships.iter().any(|m| context.matches(m)) {
        matched.push(id);
      }
    }
    debug!(candidates = candidates.len(), matched = matched.len(), "context check");

    match matched.as_slice() {
      [] => Ok(StageOutcome::Continue),
      [id] => Ok(StageOutcome::Resolved(self.fetch(*id).await?)),
      _ => Ok(StageOutcome::Ambiguous(matched)),
    }
  }

  async fn family_name_stage(
    &self,
    name: &str,
    context: &ResolveContext,
    options: ResolveOptions,
  ) -> Result<StageOutcome> {
    if options.strict {
      return Ok(StageOutcome::Continue);
    }
    let Some(session) = context.session else {
      return Ok(StageOutcome::Continue);
    };
    let Some(family) = family_name_token(name) else {
      return Ok(StageOutcome::Continue);
    };

    let mut found = self
      .store
      .find_by_family_name(family.to_string(), session, context.district)
      .await
      .map_err(Into::<Error>::into)?;
    debug!(family, %session, found = found.len(), "family name lookup");

    match (found.len(), context.district) {
      (1, _) => Ok(found.pop().map_or(StageOutcome::Continue, StageOutcome::Resolved)),
      (0, _) | (_, None) => Ok(StageOutcome::Continue),
      (n, Some(district)) => Err(Error::Inconsistent(format!(
        "{n} politicians named {family} hold district {district} in session {session}"
      ))),
    }
  }

  // ── Helpers ─────────────────────────────────────────────────────────────

  async fn fetch(&self, id: PoliticianId) -> Result<Politician> {
    self
      .store
      .get_politician(id)
      .await
      .map_err(Into::<Error>::into)?
      .ok_or_else(|| Error::Inconsistent(format!("alternate name points at missing politician {id}")))
  }

  /// Record `name` as an alternate for `politician` unless the caller opted
  /// out.
  async fn remember(&self, politician: &Politician, name: &str, options: ResolveOptions) -> Result<()> {
    if !options.save_alternate {
      return Ok(());
    }
    if self.alternates().add(politician.id, name).await? == Inserted::Created {
      info!(id = %politician.id, alternate = %normalize_name(name), "saved alternate name");
    }
    Ok(())
  }
}
