//! [`SqliteStore`] — the SQLite implementation of the polref storage traits.

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use polref_core::{
  district::{District, DistrictId, NewDistrict},
  membership::{Membership, MembershipId, NewMembership},
  party::{NewParty, Party, PartyId},
  politician::{InfoEntry, NewPolitician, Politician, PoliticianId},
  session::{Session, SessionId},
  store::{
    Backend, DistrictStore, MembershipStore, PartyStore, PoliticianStore, SessionStore,
    XrefStore,
  },
  xref::{CrossReference, Inserted, XrefKey, XrefSchema},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  Error, Result,
  encode::{
    DISTRICT_COLUMNS, PARTY_COLUMNS, POLITICIAN_COLUMNS, RawInfo, RawMembership, RawSession,
    RawXref, encode_date, encode_dt, encode_key, party_from_row, politician_from_row,
    raw_district_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A polref store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Every call
/// runs on the connection's own thread, so writes are serialized.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open the database at `path`, creating tables on first use.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// A fresh in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Cross-reference helpers ─────────────────────────────────────────────────

/// What an insert attempt found, decided inside the write transaction.
enum InsertOutcome {
  Created,
  AlreadyPresent,
  Conflict(i64),
}

fn targets_for(
  conn: &rusqlite::Connection,
  schema: &str,
  text_key: Option<&str>,
  int_key: Option<i64>,
) -> rusqlite::Result<Vec<i64>> {
  let mut stmt = conn.prepare(
    "SELECT target_id FROM xrefs
     WHERE schema = ?1 AND text_key IS ?2 AND int_key IS ?3
     ORDER BY xref_id",
  )?;
  stmt
    .query_map(rusqlite::params![schema, text_key, int_key], |r| r.get(0))?
    .collect()
}

/// Decide an insert against the targets already bound to the key. `None`
/// means a new row must be written.
fn classify(existing: &[i64], target_id: i64, exclusive: bool) -> Option<InsertOutcome> {
  if existing.contains(&target_id) {
    Some(InsertOutcome::AlreadyPresent)
  } else if exclusive {
    existing.first().map(|&other| InsertOutcome::Conflict(other))
  } else {
    None
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

impl Backend for SqliteStore {
  type Error = Error;
}

impl XrefStore for SqliteStore {
  async fn lookup(&self, schema: XrefSchema, key: XrefKey) -> Result<BTreeSet<i64>> {
    let (text_key, int_key) = encode_key(&key);

    let targets = self
      .conn
      .call(move |conn| Ok(targets_for(conn, schema.as_str(), text_key.as_deref(), int_key)?))
      .await?;

    Ok(targets.into_iter().collect())
  }

  async fn insert(&self, schema: XrefSchema, key: XrefKey, target_id: i64) -> Result<Inserted> {
    let (text_key, int_key) = encode_key(&key);
    let exclusive = schema.is_exclusive();
    let at_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing = targets_for(&tx, schema.as_str(), text_key.as_deref(), int_key)?;
        if let Some(outcome) = classify(&existing, target_id, exclusive) {
          return Ok(outcome);
        }

        let written = tx.execute(
          "INSERT INTO xrefs (schema, text_key, int_key, target_id, exclusive, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![schema.as_str(), text_key, int_key, target_id, exclusive, at_str],
        );

        match written {
          Ok(_) => {
            tx.commit()?;
            Ok(InsertOutcome::Created)
          }
          // Another writer got there first; report what it committed.
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            let winner = targets_for(&tx, schema.as_str(), text_key.as_deref(), int_key)?;
            Ok(classify(&winner, target_id, exclusive).unwrap_or(InsertOutcome::AlreadyPresent))
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match outcome {
      InsertOutcome::Created => Ok(Inserted::Created),
      InsertOutcome::AlreadyPresent => Ok(Inserted::AlreadyPresent),
      InsertOutcome::Conflict(existing) => Err(Error::Core(polref_core::Error::Conflict {
        schema,
        key,
        existing,
        attempted: target_id,
      })),
    }
  }

  async fn delete(&self, schema: XrefSchema, target_id: i64) -> Result<usize> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM xrefs WHERE schema = ?1 AND target_id = ?2",
          rusqlite::params![schema.as_str(), target_id],
        )?)
      })
      .await?;
    Ok(removed)
  }

  async fn references(&self, schema: XrefSchema, target_id: i64) -> Result<Vec<CrossReference>> {
    let raws: Vec<RawXref> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT schema, text_key, int_key, target_id, created_at FROM xrefs
           WHERE schema = ?1 AND target_id = ?2
           ORDER BY xref_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![schema.as_str(), target_id], |row| {
            Ok(RawXref {
              schema:     row.get(0)?,
              text_key:   row.get(1)?,
              int_key:    row.get(2)?,
              target_id:  row.get(3)?,
              created_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawXref::into_reference).collect()
  }
}

impl PoliticianStore for SqliteStore {
  async fn add_politician(&self, input: NewPolitician) -> Result<Politician> {
    let NewPolitician { name, name_given, name_family } = input;
    let (n, g, f) = (name.clone(), name_given.clone(), name_family.clone());

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO politicians (name, name_given, name_family) VALUES (?1, ?2, ?3)",
          rusqlite::params![n, g, f],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Politician {
      id: PoliticianId(id),
      name,
      name_given,
      name_family,
      slug: None,
    })
  }

  async fn get_politician(&self, id: PoliticianId) -> Result<Option<Politician>> {
    let politician = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {POLITICIAN_COLUMNS} FROM politicians WHERE politician_id = ?1"),
            rusqlite::params![id.0],
            politician_from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(politician)
  }

  async fn get_politician_by_slug(&self, slug: String) -> Result<Option<Politician>> {
    let politician = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {POLITICIAN_COLUMNS} FROM politicians WHERE slug = ?1"),
            rusqlite::params![slug],
            politician_from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(politician)
  }

  async fn assign_slug(&self, id: PoliticianId, slug: String) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE politicians SET slug = ?2
           WHERE politician_id = ?1
             AND NOT EXISTS (
               SELECT 1 FROM politicians WHERE slug = ?2 AND politician_id != ?1
             )",
          rusqlite::params![id.0, slug],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn find_by_family_name(
    &self,
    family_name: String,
    session:     SessionId,
    district:    Option<DistrictId>,
  ) -> Result<Vec<Politician>> {
    let session_str = session.to_string();
    let district_id = district.map(|d| d.0);

    let politicians = self
      .conn
      .call(move |conn| {
        // Session and district must hold on the same membership row.
        let mut stmt = conn.prepare(
          "SELECT DISTINCT p.politician_id, p.name, p.name_given, p.name_family, p.slug
           FROM politicians p
           JOIN memberships m          ON m.politician_id  = p.politician_id
           JOIN membership_sessions ms ON ms.membership_id = m.membership_id
           WHERE p.name_family = ?1
             AND ms.session_id = ?2
             AND (?3 IS NULL OR m.district_id = ?3)
           ORDER BY p.politician_id",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![family_name, session_str, district_id],
            politician_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(politicians)
  }

  async fn delete_politician(&self, id: PoliticianId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM politicians WHERE politician_id = ?1",
          rusqlite::params![id.0],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Info rows ─────────────────────────────────────────────────────────────

  async fn info(&self, id: PoliticianId) -> Result<Vec<InfoEntry>> {
    let raws: Vec<RawInfo> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT key, value, created_at FROM politician_info
           WHERE politician_id = ?1
           ORDER BY info_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id.0], |row| {
            Ok(RawInfo {
              key:        row.get(0)?,
              value:      row.get(1)?,
              created_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInfo::into_entry).collect()
  }

  async fn add_info(&self, id: PoliticianId, key: String, value: String) -> Result<bool> {
    let at_str = encode_dt(Utc::now());

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM politician_info
             WHERE politician_id = ?1 AND key = ?2 AND value = ?3",
            rusqlite::params![id.0, key, value],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if exists {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO politician_info (politician_id, key, value, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id.0, key, value, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;
    Ok(written)
  }

  async fn replace_info(&self, id: PoliticianId, key: String, value: String) -> Result<()> {
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
          "DELETE FROM politician_info WHERE politician_id = ?1 AND key = ?2",
          rusqlite::params![id.0, key],
        )?;
        tx.execute(
          "INSERT INTO politician_info (politician_id, key, value, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id.0, key, value, at_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_info(&self, id: PoliticianId, key: String) -> Result<usize> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM politician_info WHERE politician_id = ?1 AND key = ?2",
          rusqlite::params![id.0, key],
        )?)
      })
      .await?;
    Ok(removed)
  }
}

impl MembershipStore for SqliteStore {
  async fn add_membership(&self, input: NewMembership) -> Result<Membership> {
    let start_str = encode_date(input.start_date);
    let end_str = input.end_date.map(encode_date);
    let session_strs: Vec<String> = input.sessions.iter().map(ToString::to_string).collect();
    let (politician, district, party) = (input.politician, input.district, input.party);

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO memberships (politician_id, district_id, party_id, start_date, end_date)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![politician.0, district.0, party.0, start_str, end_str],
        )?;
        let id = tx.last_insert_rowid();
        for session in &session_strs {
          tx.execute(
            "INSERT OR IGNORE INTO membership_sessions (membership_id, session_id)
             VALUES (?1, ?2)",
            rusqlite::params![id, session],
          )?;
        }
        tx.commit()?;
        Ok(id)
      })
      .await?;

    Ok(Membership {
      id:         MembershipId(id),
      politician: input.politician,
      district:   input.district,
      party:      input.party,
      sessions:   input.sessions,
      start_date: input.start_date,
      end_date:   input.end_date,
    })
  }

  async fn memberships_for(&self, politician: PoliticianId) -> Result<Vec<Membership>> {
    let raws: Vec<RawMembership> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT membership_id, politician_id, district_id, party_id, start_date, end_date
           FROM memberships
           WHERE politician_id = ?1
           ORDER BY start_date DESC, membership_id DESC",
        )?;
        let mut rows = stmt
          .query_map(rusqlite::params![politician.0], |row| {
            Ok(RawMembership {
              membership_id: row.get(0)?,
              politician_id: row.get(1)?,
              district_id:   row.get(2)?,
              party_id:      row.get(3)?,
              start_date:    row.get(4)?,
              end_date:      row.get(5)?,
              sessions:      Vec::new(),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut sessions = conn.prepare(
          "SELECT ms.session_id FROM membership_sessions ms
           JOIN sessions s ON s.session_id = ms.session_id
           WHERE ms.membership_id = ?1
           ORDER BY s.start_date",
        )?;
        for raw in &mut rows {
          raw.sessions = sessions
            .query_map(rusqlite::params![raw.membership_id], |r| r.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMembership::into_membership).collect()
  }
}

impl SessionStore for SqliteStore {
  async fn add_session(&self, session: Session) -> Result<Session> {
    let id_str = session.id.to_string();
    let (parliament, number) = (session.id.parliament, session.id.session);
    let name = session.name.clone();
    let start_str = encode_date(session.start);
    let end_str = session.end.map(encode_date);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (session_id, parliament, number, name, start_date, end_date)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, parliament, number, name, start_str, end_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(session)
  }

  async fn get_session(&self, id: SessionId) -> Result<Option<Session>> {
    let id_str = id.to_string();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT session_id, name, start_date, end_date FROM sessions WHERE session_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawSession {
                session_id: row.get(0)?,
                name:       row.get(1)?,
                start_date: row.get(2)?,
                end_date:   row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn list_sessions(&self) -> Result<Vec<Session>> {
    let raws: Vec<RawSession> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT session_id, name, start_date, end_date FROM sessions
           ORDER BY start_date DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSession {
              session_id: row.get(0)?,
              name:       row.get(1)?,
              start_date: row.get(2)?,
              end_date:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSession::into_session).collect()
  }
}

impl DistrictStore for SqliteStore {
  async fn add_district(&self, input: NewDistrict) -> Result<District> {
    let input = input.with_defaults();
    let row = input.clone();
    let province = input.province.code();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO districts (name_en, name_fr, province, slug, edid, current)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![row.name_en, row.name_fr, province, row.slug, row.edid, row.current],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(District {
      id:       DistrictId(id),
      name_en:  input.name_en,
      name_fr:  input.name_fr,
      province: input.province,
      slug:     input.slug,
      edid:     input.edid,
      current:  input.current,
    })
  }

  async fn get_district(&self, id: DistrictId) -> Result<Option<District>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {DISTRICT_COLUMNS} FROM districts WHERE district_id = ?1"),
            rusqlite::params![id.0],
            raw_district_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(|r| r.into_district()).transpose()
  }

  async fn get_district_by_slug(&self, slug: String) -> Result<Option<District>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {DISTRICT_COLUMNS} FROM districts WHERE slug = ?1"),
            rusqlite::params![slug],
            raw_district_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(|r| r.into_district()).transpose()
  }
}

impl PartyStore for SqliteStore {
  async fn add_party(&self, input: NewParty) -> Result<Party> {
    let input = input.with_defaults();
    let row = input.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO parties (name_en, name_fr, short_name_en, short_name_fr, slug)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![row.name_en, row.name_fr, row.short_name_en, row.short_name_fr, row.slug],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Party {
      id:            PartyId(id),
      name_en:       input.name_en,
      name_fr:       input.name_fr,
      short_name_en: input.short_name_en,
      short_name_fr: input.short_name_fr,
      slug:          input.slug,
    })
  }

  async fn get_party(&self, id: PartyId) -> Result<Option<Party>> {
    let party = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PARTY_COLUMNS} FROM parties WHERE party_id = ?1"),
            rusqlite::params![id.0],
            party_from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(party)
  }

  async fn delete_party(&self, id: PartyId) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM parties WHERE party_id = ?1", rusqlite::params![id.0])?)
      })
      .await?;
    Ok(removed > 0)
  }
}
