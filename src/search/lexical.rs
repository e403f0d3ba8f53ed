//! Lexical index over SQLite FTS5
//!
//! Every record has one row in `skills_fts` built from its id, title,
//! content, domain tags, kind, status and stack context. Ranking uses the
//! FTS5 `bm25()` function; scores are reported as positive numbers where
//! higher means more relevant.

use rusqlite::{Connection, params};

use crate::core::SkillRecord;
use crate::error::Result;
use crate::utils::terms;

/// Build an FTS5 MATCH expression from free text.
///
/// Terms are quoted so nothing in user input is interpreted as query
/// syntax, and OR-ed so partial matches still rank. `None` when the query
/// holds no terms at all.
#[must_use]
pub fn match_expression(query: &str) -> Option<String> {
    let mut seen = std::collections::HashSet::new();
    let quoted: Vec<String> = terms(query)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .map(|term| format!("\"{term}\""))
        .collect();
    if quoted.is_empty() {
        None
    } else {
        Some(quoted.join(" OR "))
    }
}

/// Replace the index entry for a record.
pub fn write_entry(conn: &Connection, record: &SkillRecord) -> Result<()> {
    delete_entry(conn, &record.skill_id)?;
    conn.execute(
        "INSERT INTO skills_fts (skill_id, title, content, domain_tags, kind, status, stack_context)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            record.skill_id,
            record.title,
            record.content,
            record.domain_tags.join(" "),
            record.kind.as_str(),
            record.status.as_str(),
            record.stack_context.join(" "),
        ],
    )?;
    Ok(())
}

pub fn delete_entry(conn: &Connection, skill_id: &str) -> Result<()> {
    conn.execute("DELETE FROM skills_fts WHERE skill_id = ?", [skill_id])?;
    Ok(())
}

pub fn clear(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM skills_fts", [])?;
    Ok(())
}

/// Ranked lookup: up to `limit` `(skill_id, score)` pairs, best first.
pub fn search(conn: &Connection, query: &str, limit: usize) -> Result<Vec<(String, f32)>> {
    let Some(expression) = match_expression(query) else {
        return Ok(Vec::new());
    };
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare_cached(
        "SELECT skill_id, bm25(skills_fts) AS rank
         FROM skills_fts
         WHERE skills_fts MATCH ?
         ORDER BY rank, skill_id
         LIMIT ?",
    )?;
    let rows = stmt.query_map(
        params![expression, i64::try_from(limit).unwrap_or(i64::MAX)],
        |row| {
            let skill_id: String = row.get(0)?;
            let rank: f64 = row.get(1)?;
            Ok((skill_id, rank))
        },
    )?;

    let mut hits = Vec::new();
    for row in rows {
        let (skill_id, rank) = row?;
        #[allow(clippy::cast_possible_truncation)]
        hits.push((skill_id, (-rank) as f32));
    }
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::core::SkillKind;
    use crate::storage::migrations;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn record(id: &str, tags: &[&str], content: &str) -> SkillRecord {
        SkillRecord::new(
            id,
            SkillKind::Skill,
            tags.iter().map(|t| (*t).to_string()).collect(),
            "proj",
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            content,
        )
    }

    #[test]
    fn test_match_expression_quotes_terms() {
        assert_eq!(
            match_expression("jwt AND NOT rs256").as_deref(),
            Some("\"jwt\" OR \"and\" OR \"not\" OR \"rs256\"")
        );
        assert_eq!(match_expression("\"*)(-").as_deref(), None);
    }

    #[test]
    fn test_match_expression_dedupes() {
        assert_eq!(match_expression("go go Go").as_deref(), Some("\"go\""));
    }

    #[test]
    fn test_punctuation_query_returns_empty() {
        let conn = conn();
        write_entry(&conn, &record("a", &["x"], "# A\nsome text")).unwrap();
        assert!(search(&conn, "!!! ???", 10).unwrap().is_empty());
    }

    #[test]
    fn test_finds_by_domain_tag() {
        let conn = conn();
        write_entry(&conn, &record("test-skill", &["nodejs", "jest"], "# Test\nKey insight")).unwrap();
        let hits = search(&conn, "nodejs jest", 10).unwrap();
        assert_eq!(hits[0].0, "test-skill");
        assert!(hits[0].1 > 0.0);
    }

    #[test]
    fn test_no_match_is_empty() {
        let conn = conn();
        write_entry(&conn, &record("a", &["x"], "# A\nsome text")).unwrap();
        assert!(search(&conn, "xyznonexistentquery123", 10).unwrap().is_empty());
    }

    #[test]
    fn test_rewrite_replaces_entry() {
        let conn = conn();
        write_entry(&conn, &record("a", &["x"], "# A\nalpha")).unwrap();
        write_entry(&conn, &record("a", &["x"], "# A\nbravo")).unwrap();
        assert!(search(&conn, "alpha", 10).unwrap().is_empty());
        assert_eq!(search(&conn, "bravo", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_more_occurrences_rank_higher() {
        let conn = conn();
        write_entry(&conn, &record("once", &["x"], "# Notes\ncache once here")).unwrap();
        write_entry(&conn, &record("thrice", &["x"], "# Notes\ncache cache cache")).unwrap();
        write_entry(&conn, &record("other", &["x"], "# Notes\nunrelated words")).unwrap();
        let hits = search(&conn, "cache", 10).unwrap();
        assert_eq!(hits[0].0, "thrice");
        assert!(hits[0].1 > hits[1].1);
    }

    #[test]
    fn test_limit_respected() {
        let conn = conn();
        for i in 0..5 {
            write_entry(&conn, &record(&format!("s-{i}"), &["x"], "# S\nshared term")).unwrap();
        }
        assert_eq!(search(&conn, "shared", 3).unwrap().len(), 3);
    }
}
