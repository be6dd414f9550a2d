//! SQL schema for the polref SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS politicians (
    politician_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    name_given    TEXT NOT NULL DEFAULT '',
    name_family   TEXT NOT NULL DEFAULT '',
    slug          TEXT UNIQUE
);

-- Key/value attributes owned by a politician.
CREATE TABLE IF NOT EXISTS politician_info (
    info_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    politician_id INTEGER NOT NULL REFERENCES politicians(politician_id) ON DELETE CASCADE,
    key           TEXT NOT NULL,
    value         TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    session_id  TEXT PRIMARY KEY,     -- '41-1'
    parliament  INTEGER NOT NULL,
    number      INTEGER NOT NULL,
    name        TEXT NOT NULL,
    start_date  TEXT NOT NULL,
    end_date    TEXT
);

CREATE TABLE IF NOT EXISTS districts (
    district_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name_en     TEXT NOT NULL,
    name_fr     TEXT NOT NULL,
    province    TEXT NOT NULL,        -- two-letter code
    slug        TEXT NOT NULL UNIQUE,
    edid        INTEGER,
    current     INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS parties (
    party_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name_en       TEXT NOT NULL,
    name_fr       TEXT NOT NULL,
    short_name_en TEXT NOT NULL,
    short_name_fr TEXT NOT NULL,
    slug          TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS memberships (
    membership_id INTEGER PRIMARY KEY AUTOINCREMENT,
    politician_id INTEGER NOT NULL REFERENCES politicians(politician_id) ON DELETE CASCADE,
    district_id   INTEGER NOT NULL REFERENCES districts(district_id),
    party_id      INTEGER NOT NULL REFERENCES parties(party_id) ON DELETE CASCADE,
    start_date    TEXT NOT NULL,
    end_date      TEXT
);

CREATE TABLE IF NOT EXISTS membership_sessions (
    membership_id INTEGER NOT NULL REFERENCES memberships(membership_id) ON DELETE CASCADE,
    session_id    TEXT NOT NULL REFERENCES sessions(session_id),
    PRIMARY KEY (membership_id, session_id)
);

-- Cross-references are append-only. Rows are deleted only when their owner
-- is, and never updated.
CREATE TABLE IF NOT EXISTS xrefs (
    xref_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    schema     TEXT NOT NULL,
    text_key   TEXT,
    int_key    INTEGER,
    target_id  INTEGER NOT NULL,
    exclusive  INTEGER NOT NULL,      -- 1 if a key may point at one target only
    created_at TEXT NOT NULL,
    CHECK ((text_key IS NULL) != (int_key IS NULL))
);

-- One target per key in exclusive schemas.
CREATE UNIQUE INDEX IF NOT EXISTS xrefs_text_exclusive
    ON xrefs(schema, text_key) WHERE exclusive = 1 AND text_key IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS xrefs_int_exclusive
    ON xrefs(schema, int_key)  WHERE exclusive = 1 AND int_key IS NOT NULL;

-- No duplicate rows in any schema.
CREATE UNIQUE INDEX IF NOT EXISTS xrefs_text_row
    ON xrefs(schema, text_key, target_id) WHERE text_key IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS xrefs_int_row
    ON xrefs(schema, int_key, target_id)  WHERE int_key IS NOT NULL;

CREATE INDEX IF NOT EXISTS xrefs_target_idx        ON xrefs(schema, target_id);
CREATE INDEX IF NOT EXISTS politicians_family_idx  ON politicians(name_family);
CREATE INDEX IF NOT EXISTS info_politician_idx     ON politician_info(politician_id, key);
CREATE INDEX IF NOT EXISTS memberships_pol_idx     ON memberships(politician_id);
CREATE INDEX IF NOT EXISTS membership_sessions_idx ON membership_sessions(session_id);

PRAGMA user_version = 1;
";
