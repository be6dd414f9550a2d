//! External id → politician, through the directory.

use std::sync::LazyLock;

use polref_core::{
  Error, Result,
  politician::{Politician, PoliticianId},
  session::SessionId,
  store::{DistrictStore, MembershipStore, PoliticianStore, XrefStore},
  xref::Inserted,
};
use polref_resolve::{
  CorrectionTable, ExternalIdKind, ExternalIds, IdentityResolver, ResolveContext,
  ResolveOptions, RidingResolver,
};
use regex::Regex;
use tracing::{debug, error, info};

use crate::{config::DirectoryConfig, detail::parse_detail, transport::Transport};

/// Profile URLs end in the person id, e.g. `.../Members/en/jack-layton(1234)`.
static PERSON_ID: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\((\d+)\)$").expect("valid person id pattern"));

/// Where the directory sends ids it does not recognise.
const NO_PROFILE_SUFFIX: &str = "Members/en";

/// What the caller already knows about the person behind the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryContext {
  pub session:     Option<SessionId>,
  /// Riding name from the caller's own source; checked against the
  /// directory's answer.
  pub riding_name: Option<String>,
}

/// A politician found through the directory, with the person id the
/// directory gave it.
struct Discovery {
  politician: Politician,
  person_id:  i64,
}

/// Extract the person id from the URL a lookup redirected to.
fn person_id_from_url(url: &str) -> Result<i64> {
  if let Some(caps) = PERSON_ID.captures(url) {
    return caps[1]
      .parse()
      .map_err(|_| Error::Protocol(format!("person id out of range in {url}")));
  }
  if url.ends_with(NO_PROFILE_SUFFIX) {
    return Err(Error::NotFound("the directory doesn't recognise that id".into()));
  }
  error!(url, "directory URL scheme appears to have changed");
  Err(Error::Protocol(format!("unrecognised profile URL {url}")))
}

// ─── DirectoryClient ─────────────────────────────────────────────────────────

pub struct DirectoryClient<S, T> {
  store:     S,
  transport: T,
  config:    DirectoryConfig,
  ridings:   RidingResolver<S>,
  resolver:  IdentityResolver<S>,
}

impl<S, T> DirectoryClient<S, T>
where
  S: XrefStore + PoliticianStore + MembershipStore + DistrictStore + Clone,
  T: Transport,
{
  pub fn new(store: S, transport: T, config: DirectoryConfig, corrections: CorrectionTable) -> Self {
    Self {
      ridings: RidingResolver::new(store.clone(), corrections),
      resolver: IdentityResolver::new(store.clone()),
      store,
      transport,
      config,
    }
  }

  pub fn transport(&self) -> &T { &self.transport }

  fn external_ids(&self) -> ExternalIds<S> { ExternalIds::new(self.store.clone()) }

  /// The politician the directory knows by `id`.
  ///
  /// A known id is answered locally. Otherwise the directory is asked, the
  /// answer is resolved by name and riding, and the id is bound to the
  /// politician found. For an affiliation id the underlying person id is
  /// bound as well. Repeating a lookup is harmless.
  pub async fn resolve_by_external_id(
    &self,
    kind: ExternalIdKind,
    id: i64,
    context: &DirectoryContext,
  ) -> Result<Politician> {
    let ids = self.external_ids();

    if let Some(known) = ids.politician(kind, id).await? {
      debug!(kind = kind.as_str(), id, politician = %known, "external id already bound");
      return self.fetch(known).await;
    }

    let url = self.config.lookup_url(kind, id);
    let Discovery { politician, person_id } = self.discover(&url, context).await?;

    match kind {
      ExternalIdKind::Person => {
        if person_id != id {
          return Err(Error::Inconsistent(format!(
            "lookup of person id {id} found person id {person_id} ({})",
            politician.name
          )));
        }
        self.bind(ExternalIdKind::Person, id, &politician).await?;
      }
      ExternalIdKind::Affiliation => {
        self.bind(ExternalIdKind::Person, person_id, &politician).await?;
        self.bind(ExternalIdKind::Affiliation, id, &politician).await?;
      }
    }
    Ok(politician)
  }

  async fn bind(&self, kind: ExternalIdKind, id: i64, politician: &Politician) -> Result<()> {
    if self.external_ids().bind(kind, id, politician.id).await? == Inserted::Created {
      info!(kind = kind.as_str(), id, politician = %politician.id, name = %politician.name,
        "bound external id");
    }
    Ok(())
  }

  async fn discover(&self, url: &str, context: &DirectoryContext) -> Result<Discovery> {
    let landing = self.transport.get(url).await?;
    if !landing.is_success() {
      return Err(Error::NotFound(format!("couldn't open {url} ({})", landing.status)));
    }
    let person_id = person_id_from_url(&landing.final_url)?;

    let xml_url = format!("{}/xml", landing.final_url);
    let doc = self.transport.get(&xml_url).await?;
    if !doc.is_success() {
      error!(url = %xml_url, status = doc.status, "member detail unavailable");
      return Err(Error::Protocol(format!("fetching {xml_url} returned {}", doc.status)));
    }
    let detail = parse_detail(&doc.body).inspect_err(|e| {
      error!(url = %xml_url, error = %e, "member detail has changed shape");
    })?;

    let riding = match self.ridings.resolve_district(&detail.constituency).await {
      Ok(riding) => riding,
      Err(e) if e.is_not_found() => {
        return Err(Error::NotFound(format!("couldn't find riding {:?}", detail.constituency)));
      }
      Err(e) => return Err(e),
    };
    if let Some(expected) = &context.riding_name {
      let expected = self.ridings.resolve_district(expected).await?;
      if expected.id != riding.id {
        return Err(Error::Inconsistent(format!(
          "directory riding {:?} doesn't match expected riding {:?}",
          detail.constituency, expected.name_en
        )));
      }
    }

    let mut filter = ResolveContext::default().district(riding.id);
    if let Some(session) = context.session {
      filter = filter.session(session);
    }
    let politician = self
      .resolver
      .resolve(&detail.full_name(), &filter, ResolveOptions::default())
      .await?;

    Ok(Discovery { politician, person_id })
  }

  async fn fetch(&self, id: PoliticianId) -> Result<Politician> {
    self
      .store
      .get_politician(id)
      .await
      .map_err(Into::<Error>::into)?
      .ok_or_else(|| Error::Inconsistent(format!("external id points at missing politician {id}")))
  }
}

#[cfg(test)]
mod tests {
  use std::{collections::HashMap, sync::Mutex};

  use chrono::NaiveDate;
  use polref_core::{
    district::{NewDistrict, Province},
    membership::NewMembership,
    party::NewParty,
    politician::NewPolitician,
    session::Session,
    store::{PartyStore, SessionStore},
  };
  use polref_resolve::PoliticianRegistry;
  use polref_store_sqlite::SqliteStore;

  use super::*;
  use crate::transport::Fetched;

  const BASE: &str = "https://directory.example";
  const S41: SessionId = SessionId { parliament: 41, session: 1 };

  /// Serves canned responses and records every URL requested. Unknown URLs
  /// get a 404.
  #[derive(Default)]
  struct FakeTransport {
    routes:   HashMap<String, Fetched>,
    requests: Mutex<Vec<String>>,
  }

  impl FakeTransport {
    fn redirect(mut self, from: &str, to: &str) -> Self {
      self.routes.insert(from.into(), Fetched {
        status:    200,
        final_url: to.into(),
        body:      b"<html/>".to_vec(),
      });
      self
    }

    fn page(mut self, url: &str, body: &str) -> Self {
      self.routes.insert(url.into(), Fetched {
        status:    200,
        final_url: url.into(),
        body:      body.as_bytes().to_vec(),
      });
      self
    }

    fn request_count(&self) -> usize { self.requests.lock().unwrap().len() }
  }

  impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<Fetched> {
      self.requests.lock().unwrap().push(url.to_string());
      Ok(self.routes.get(url).cloned().unwrap_or_else(|| Fetched {
        status:    404,
        final_url: url.to_string(),
        body:      Vec::new(),
      }))
    }
  }

  fn detail_xml(first: &str, last: &str, riding: &str) -> String {
    format!(
      "<Profile><MemberOfParliamentRole>\
       <PersonOfficialFirstName>{first}</PersonOfficialFirstName>\
       <PersonOfficialLastName>{last}</PersonOfficialLastName>\
       <ConstituencyName>{riding}</ConstituencyName>\
       </MemberOfParliamentRole></Profile>"
    )
  }

  fn profile(slug: &str, person_id: i64) -> String {
    format!("{BASE}/Members/en/{slug}({person_id})")
  }

  fn config() -> DirectoryConfig {
    DirectoryConfig {
      person_lookup_url: format!("{BASE}/lookup({{id}})"),
      affiliation_lookup_url: format!("{BASE}/profileredirect?affiliationId={{id}}"),
      ..Default::default()
    }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  /// Thomas Mulcair sitting for Outremont in 41-1; Papineau also exists.
  async fn seeded() -> (SqliteStore, Politician) {
    let s = SqliteStore::open_in_memory().await.expect("in-memory store");
    s.add_session(Session { id: S41, name: "41-1".into(), start: date(2011, 6, 2), end: None })
      .await
      .unwrap();
    let district = |name: &str| NewDistrict {
      name_en:  name.into(),
      name_fr:  String::new(),
      province: Province::Qc,
      slug:     String::new(),
      edid:     None,
      current:  true,
    };
    let outremont = s.add_district(district("Outremont")).await.unwrap();
    s.add_district(district("Papineau")).await.unwrap();
    let ndp = s.add_party(NewParty { name_en: "NDP".into(), ..Default::default() }).await.unwrap();

    let pol = PoliticianRegistry::new(s.clone())
      .create(NewPolitician::from_name("Thomas Mulcair"))
      .await
      .unwrap();
    s.add_membership(NewMembership {
      politician: pol.id,
      district:   outremont.id,
      party:      ndp.id,
      sessions:   vec![S41],
      start_date: date(2011, 5, 2),
      end_date:   None,
    })
    .await
    .unwrap();
    (s, pol)
  }

  fn mulcair_transport() -> FakeTransport {
    let profile = profile("thomas-mulcair", 1234);
    FakeTransport::default()
      .redirect(&format!("{BASE}/lookup(1234)"), &profile)
      .page(&format!("{profile}/xml"), &detail_xml("Thomas", "Mulcair", "Outremont"))
  }

  fn client(store: &SqliteStore, transport: FakeTransport) -> DirectoryClient<SqliteStore, FakeTransport> {
    DirectoryClient::new(store.clone(), transport, config(), CorrectionTable::builtin())
  }

  fn in_session() -> DirectoryContext {
    DirectoryContext { session: Some(S41), riding_name: None }
  }

  // ─── Person ids ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn discovered_person_id_takes_fast_path_afterwards() {
    let (s, pol) = seeded().await;
    let client = client(&s, mulcair_transport());

    let first = client
      .resolve_by_external_id(ExternalIdKind::Person, 1234, &in_session())
      .await
      .unwrap();
    assert_eq!(first.id, pol.id);
    assert_eq!(client.transport().request_count(), 2);

    let second = client
      .resolve_by_external_id(ExternalIdKind::Person, 1234, &DirectoryContext::default())
      .await
      .unwrap();
    assert_eq!(second.id, pol.id);
    assert_eq!(client.transport().request_count(), 2, "fast path must not touch the network");
  }

  #[tokio::test]
  async fn http_404_is_not_found_and_writes_nothing() {
    let (s, _) = seeded().await;
    let client = client(&s, mulcair_transport());

    let err = client
      .resolve_by_external_id(ExternalIdKind::Person, 9999, &in_session())
      .await
      .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(
      ExternalIds::new(s).politician(ExternalIdKind::Person, 9999).await.unwrap(),
      None
    );
  }

  #[tokio::test]
  async fn generic_landing_page_is_not_found() {
    let (s, _) = seeded().await;
    let transport =
      FakeTransport::default().redirect(&format!("{BASE}/lookup(55)"), &format!("{BASE}/Members/en"));
    let client = client(&s, transport);

    let err = client
      .resolve_by_external_id(ExternalIdKind::Person, 55, &in_session())
      .await
      .unwrap_err();
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn unrecognised_redirect_is_a_protocol_error() {
    let (s, _) = seeded().await;
    let transport = FakeTransport::default()
      .redirect(&format!("{BASE}/lookup(1234)"), &format!("{BASE}/people?id=1234"));
    let client = client(&s, transport);

    let err = client
      .resolve_by_external_id(ExternalIdKind::Person, 1234, &in_session())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
  }

  #[tokio::test]
  async fn missing_detail_document_is_a_protocol_error() {
    let (s, _) = seeded().await;
    let transport = FakeTransport::default()
      .redirect(&format!("{BASE}/lookup(1234)"), &profile("thomas-mulcair", 1234));
    let client = client(&s, transport);

    let err = client
      .resolve_by_external_id(ExternalIdKind::Person, 1234, &in_session())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
  }

  #[tokio::test]
  async fn redirect_to_another_person_is_inconsistent() {
    let (s, _) = seeded().await;
    let profile = profile("thomas-mulcair", 4321);
    let transport = FakeTransport::default()
      .redirect(&format!("{BASE}/lookup(1234)"), &profile)
      .page(&format!("{profile}/xml"), &detail_xml("Thomas", "Mulcair", "Outremont"));
    let client = client(&s, transport);

    let err = client
      .resolve_by_external_id(ExternalIdKind::Person, 1234, &in_session())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Inconsistent(_)));
  }

  #[tokio::test]
  async fn unknown_riding_is_not_found() {
    let (s, _) = seeded().await;
    let profile = profile("thomas-mulcair", 1234);
    let transport = FakeTransport::default()
      .redirect(&format!("{BASE}/lookup(1234)"), &profile)
      .page(&format!("{profile}/xml"), &detail_xml("Thomas", "Mulcair", "Atlantis"));
    let client = client(&s, transport);

    let err = client
      .resolve_by_external_id(ExternalIdKind::Person, 1234, &in_session())
      .await
      .unwrap_err();
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn riding_mismatch_is_inconsistent() {
    let (s, _) = seeded().await;
    let client = client(&s, mulcair_transport());

    let context = DirectoryContext { session: Some(S41), riding_name: Some("Papineau".into()) };
    let err = client
      .resolve_by_external_id(ExternalIdKind::Person, 1234, &context)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Inconsistent(_)));
    assert_eq!(
      ExternalIds::new(s).politician(ExternalIdKind::Person, 1234).await.unwrap(),
      None
    );
  }

  // ─── Affiliation ids ─────────────────────────────────────────────────────

  fn affiliation_transport(affiliations: &[i64]) -> FakeTransport {
    let profile = profile("thomas-mulcair", 1234);
    let mut transport = FakeTransport::default()
      .page(&format!("{profile}/xml"), &detail_xml("Thomas", "Mulcair", "Outremont"));
    for id in affiliations {
      transport = transport.redirect(&format!("{BASE}/profileredirect?affiliationId={id}"), &profile);
    }
    transport
  }

  #[tokio::test]
  async fn affiliation_ids_accumulate_and_bind_person_id() {
    let (s, pol) = seeded().await;
    let client = client(&s, affiliation_transport(&[100, 200]));

    for id in [100, 200] {
      let found = client
        .resolve_by_external_id(ExternalIdKind::Affiliation, id, &in_session())
        .await
        .unwrap();
      assert_eq!(found.id, pol.id);
    }

    let ids = ExternalIds::new(s);
    assert_eq!(ids.list(ExternalIdKind::Affiliation, pol.id).await.unwrap(), vec![100, 200]);
    assert_eq!(ids.politician(ExternalIdKind::Person, 1234).await.unwrap(), Some(pol.id));
  }

  #[tokio::test]
  async fn affiliation_whose_person_id_is_taken_conflicts() {
    let (s, _) = seeded().await;
    let other = PoliticianRegistry::new(s.clone())
      .create(NewPolitician::from_name("Someone Else"))
      .await
      .unwrap();
    let ids = ExternalIds::new(s.clone());
    ids.bind(ExternalIdKind::Person, 1234, other.id).await.unwrap();

    let client = client(&s, affiliation_transport(&[100]));
    let err = client
      .resolve_by_external_id(ExternalIdKind::Affiliation, 100, &in_session())
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Conflict { .. }));
    assert_eq!(ids.politician(ExternalIdKind::Affiliation, 100).await.unwrap(), None);
  }

  #[tokio::test]
  async fn politician_with_another_person_id_is_not_given_a_second() {
    let (s, pol) = seeded().await;
    let ids = ExternalIds::new(s.clone());
    ids.bind(ExternalIdKind::Person, 1111, pol.id).await.unwrap();

    let client = client(&s, mulcair_transport());
    let err = client
      .resolve_by_external_id(ExternalIdKind::Person, 1234, &in_session())
      .await
      .unwrap_err();

    assert!(matches!(err, Error::PersonIdTaken { existing: 1111, attempted: 1234, .. }));
    assert_eq!(ids.list(ExternalIdKind::Person, pol.id).await.unwrap(), vec![1111]);
    assert_eq!(ids.politician(ExternalIdKind::Person, 1234).await.unwrap(), None);
  }
}
