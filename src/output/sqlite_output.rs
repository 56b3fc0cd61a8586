//! SQLite lead export
//!
//! Leads are written to a `leads` table in a standalone database file, one
//! row per lead, inside a single transaction.

use super::traits::{Exporter, OutputResult};
use crate::leads::Lead;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQL schema for exported leads
pub const LEADS_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS leads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    title TEXT,
    company TEXT,
    email TEXT,
    phone TEXT,
    address TEXT,
    rating REAL,
    review_count INTEGER,
    category TEXT,
    website TEXT,
    hours TEXT,
    source_url TEXT NOT NULL,
    exported_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_leads_email ON leads(email);
CREATE INDEX IF NOT EXISTS idx_leads_source ON leads(source_url);
"#;

/// Writes leads to a SQLite database
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteExporter;

impl SqliteExporter {
    /// Inserts `leads` into an open connection, creating the table if needed
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of rows inserted
    /// * `Err(OutputError::Database)` - A statement failed; nothing is committed
    pub fn insert_leads(conn: &mut Connection, leads: &[Lead]) -> OutputResult<usize> {
        conn.execute_batch(LEADS_SCHEMA_SQL)?;

        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO leads (name, title, company, email, phone, address, rating,
                                    review_count, category, website, hours, source_url, exported_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for lead in leads {
                stmt.execute(params![
                    lead.name,
                    lead.title,
                    lead.company,
                    lead.email,
                    lead.phone,
                    lead.address,
                    lead.rating.map(f64::from),
                    lead.review_count,
                    lead.category,
                    lead.website,
                    lead.hours,
                    lead.source_url,
                    now,
                ])?;
            }
        }
        tx.commit()?;

        Ok(leads.len())
    }
}

impl Exporter for SqliteExporter {
    fn extension(&self) -> &'static str {
        "db"
    }

    fn write_to(&self, leads: &[Lead], path: &Path) -> OutputResult<()> {
        let mut conn = Connection::open(path)?;
        Self::insert_leads(&mut conn, leads)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Vec<Lead> {
        vec![
            Lead {
                phone: Some("5551234567".to_string()),
                rating: Some(4.5),
                review_count: Some(12),
                source_url: "https://acme.com/".to_string(),
                ..Lead::with_email("Jane Doe", "jane@acme.com")
            },
            Lead {
                name: "Bob Smith".to_string(),
                phone: Some("5559876543".to_string()),
                source_url: "https://acme.com/team".to_string(),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_insert_leads_in_memory() {
        let mut conn = Connection::open_in_memory().unwrap();
        let inserted = SqliteExporter::insert_leads(&mut conn, &sample()).unwrap();
        assert_eq!(inserted, 2);

        let (email, rating): (Option<String>, Option<f64>) = conn
            .query_row(
                "SELECT email, rating FROM leads WHERE name = ?1",
                params!["Jane Doe"],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(email.as_deref(), Some("jane@acme.com"));
        assert_eq!(rating, Some(4.5));

        let bob_email: Option<String> = conn
            .query_row(
                "SELECT email FROM leads WHERE name = 'Bob Smith'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(bob_email, None);
    }

    #[test]
    fn test_export_file() {
        let dir = TempDir::new().unwrap();
        let path = SqliteExporter.export(&sample(), dir.path()).unwrap();

        let conn = Connection::open(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
