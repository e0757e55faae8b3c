//! SQL schema for the forum SQLite backend.
//!
//! Both [`SqliteStore`](crate::SqliteStore) and
//! [`SqliteDirectory`](crate::SqliteDirectory) run it on open; it is
//! idempotent thanks to `CREATE TABLE IF NOT EXISTS`.

pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;

-- Id-keyed JSON documents. `collection` is the rendered collection path,
-- e.g. 'posts' or 'posts/<uuid>/comments'.
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,
    doc_id      TEXT NOT NULL,
    fields_json TEXT NOT NULL,   -- JSON object of top-level fields
    PRIMARY KEY (collection, doc_id)
);

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    display_name  TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- At most one signed-in user per database.
CREATE TABLE IF NOT EXISTS session (
    slot       INTEGER PRIMARY KEY CHECK (slot = 0),
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    started_at TEXT NOT NULL
);

-- Password-reset requests; delivery is out of band.
CREATE TABLE IF NOT EXISTS password_resets (
    token        TEXT PRIMARY KEY,
    email        TEXT NOT NULL,
    requested_at TEXT NOT NULL
);

PRAGMA user_version = 1;
";
