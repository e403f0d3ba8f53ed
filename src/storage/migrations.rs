//! Schema migrations, tracked through `PRAGMA user_version`.

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[&str] = &[
    // v1: record metadata, lexical index, embedding cache
    "CREATE TABLE IF NOT EXISTS skills_meta (
        skill_id       TEXT PRIMARY KEY,
        kind           TEXT NOT NULL,
        domain_tags    TEXT NOT NULL,
        scope          TEXT NOT NULL,
        stack_context  TEXT NOT NULL DEFAULT '[]',
        created        TEXT NOT NULL,
        project_origin TEXT NOT NULL,
        verified_by    TEXT NOT NULL,
        status         TEXT NOT NULL DEFAULT 'active',
        last_used      TEXT,
        reuse_count    INTEGER NOT NULL DEFAULT 0,
        review_after   INTEGER,
        supersedes     TEXT,
        conflict_with  TEXT NOT NULL DEFAULT '[]',
        title          TEXT NOT NULL,
        content        TEXT NOT NULL,
        location       TEXT,
        indexed_at     TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_skills_meta_status ON skills_meta(status);

    CREATE VIRTUAL TABLE IF NOT EXISTS skills_fts USING fts5(
        skill_id, title, content, domain_tags, kind, status, stack_context
    );

    CREATE TABLE IF NOT EXISTS skill_embeddings (
        skill_id     TEXT PRIMARY KEY,
        embedding    BLOB NOT NULL,
        model        TEXT NOT NULL,
        content_hash TEXT NOT NULL,
        generated_at TEXT NOT NULL
    );",
];

/// Apply pending migrations and return the resulting schema version.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (idx, sql) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = idx + 1;
        tracing::debug!(version, "applying schema migration");
        conn.execute_batch(&format!(
            "BEGIN;\n{sql}\nPRAGMA user_version = {version};\nCOMMIT;"
        ))?;
    }

    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}
