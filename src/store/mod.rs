pub mod schema;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use tracing::info;

use crate::loader::aggregate::Dataset;
use crate::store::schema::{CREATE_ALL, CREATE_INDEXES, DROP_ALL, INSERT_CANDIDATE, TABLES};

/// Table name and its row count.
pub type TableCount = (String, i64);

pub struct ElectionStore {
    conn: Connection,
}

impl ElectionStore {
    /// Opens (creating if needed) a writable store.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed creating store directory: {}", parent.display())
                })?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed opening store: {}", path.display()))?;
        Ok(Self { conn })
    }

    /// Opens an existing store for queries only.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!(
                "store not found at {}; run the load command first",
                path.display()
            ));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed opening store read-only: {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Replaces every table with the contents of `dataset` in one transaction.
    pub fn rebuild(&mut self, dataset: &Dataset) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(DROP_ALL)?;
        tx.execute_batch(CREATE_ALL)?;

        {
            let mut stmt = tx.prepare(INSERT_CANDIDATE)?;
            for r in &dataset.candidates {
                stmt.execute(params![
                    r.year,
                    r.state_name,
                    r.constituency_name,
                    r.candidate_name,
                    r.party,
                    r.gender,
                    r.position,
                    r.votes,
                    r.valid_votes,
                    r.electors,
                    r.turnout_pct,
                    r.vote_share_pct,
                    r.margin,
                    r.margin_pct,
                    r.assembly_no,
                    r.constituency_no,
                    r.month,
                    r.poll_no,
                    r.delim_id,
                    r.num_candidates,
                    r.num_terms,
                    r.enop,
                    r.candidate_type,
                    r.constituency_type,
                    r.sub_region,
                    r.candidate_id,
                    r.party_type,
                    r.party_id,
                    r.last_party,
                    r.last_party_id,
                    r.last_constituency_name,
                    r.education,
                    r.profession_main,
                    r.profession_main_desc,
                    r.profession_secondary,
                    r.profession_secondary_desc,
                    r.election_type,
                    r.deposit_lost,
                    r.last_poll,
                    r.contested,
                    r.same_constituency,
                    r.same_party,
                    r.turncoat,
                    r.incumbent,
                    r.recontest,
                    r.is_winner,
                    r.party_class,
                    r.party_category.as_str(),
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO party_seat_summary(year, party, state_name, seats) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in &dataset.seat_summary {
                stmt.execute(params![row.year, row.party, row.state_name, row.seats])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
INSERT INTO state_turnout(year, state_name, turnout_pct, electors, valid_votes)
VALUES (?1, ?2, ?3, ?4, ?5)
"#,
            )?;
            for row in &dataset.state_turnout {
                stmt.execute(params![
                    row.year,
                    row.state_name,
                    row.turnout_pct,
                    row.electors,
                    row.valid_votes
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
INSERT INTO gender_representation(year, gender, total_candidates, total_winners)
VALUES (?1, ?2, ?3, ?4)
"#,
            )?;
            for row in &dataset.gender_representation {
                stmt.execute(params![
                    row.year,
                    row.gender,
                    row.total_candidates,
                    row.total_winners
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO party_vote_share(year, party, total_votes) VALUES (?1, ?2, ?3)",
            )?;
            for row in &dataset.party_vote_share {
                stmt.execute(params![row.year, row.party, row.total_votes])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
INSERT INTO victory_margins(year, state_name, constituency_name, party, margin)
VALUES (?1, ?2, ?3, ?4, ?5)
"#,
            )?;
            for row in &dataset.victory_margins {
                stmt.execute(params![
                    row.year,
                    row.state_name,
                    row.constituency_name,
                    row.party,
                    row.margin
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
INSERT INTO candidate_lookup(
    year, state_name, constituency_name, candidate_name, party, gender, position, votes, margin
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#,
            )?;
            for row in &dataset.candidate_lookup {
                stmt.execute(params![
                    row.year,
                    row.state_name,
                    row.constituency_name,
                    row.candidate_name,
                    row.party,
                    row.gender,
                    row.position,
                    row.votes,
                    row.margin
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO party_year_delta(year, party, seats, seat_change) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in &dataset.seat_delta {
                stmt.execute(params![row.year, row.party, row.seats, row.seat_change])?;
            }
        }

        tx.execute_batch(CREATE_INDEXES)?;
        tx.commit()?;
        info!(
            candidates = dataset.candidates.len(),
            tables = TABLES.len(),
            "rebuilt election store"
        );
        Ok(())
    }

    pub fn table_counts(&self) -> Result<Vec<TableCount>> {
        let mut out = Vec::with_capacity(TABLES.len());
        for table in TABLES {
            let count: i64 =
                self.conn
                    .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                        row.get(0)
                    })?;
            out.push((table.to_string(), count));
        }
        Ok(out)
    }

    /// Rows of one table as JSON values, in insertion order.
    pub fn dump_table(&self, table: &str) -> Result<Vec<serde_json::Value>> {
        if !TABLES.contains(&table) {
            return Err(anyhow!("unknown table: {table}"));
        }
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {table} ORDER BY rowid"))?;
        let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();
        let rows = stmt
            .query_map([], |row| {
                let mut object = serde_json::Map::new();
                for (idx, name) in names.iter().enumerate() {
                    let value = match row.get_ref(idx)? {
                        rusqlite::types::ValueRef::Null => serde_json::Value::Null,
                        rusqlite::types::ValueRef::Integer(v) => v.into(),
                        rusqlite::types::ValueRef::Real(v) => v.into(),
                        rusqlite::types::ValueRef::Text(v) => {
                            String::from_utf8_lossy(v).to_string().into()
                        }
                        rusqlite::types::ValueRef::Blob(v) => v.len().into(),
                    };
                    object.insert(name.clone(), value);
                }
                Ok(serde_json::Value::Object(object))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::ElectionStore;
    use crate::loader::aggregate::Dataset;
    use crate::loader::CandidacyRecord;

    pub fn store_with(records: Vec<CandidacyRecord>) -> ElectionStore {
        let mut store = ElectionStore::in_memory().expect("in-memory store");
        store
            .rebuild(&Dataset::build(records))
            .expect("rebuild store");
        store
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::loader::fixtures::{record, SAMPLE_CSV};
    use crate::loader::{load_database, YearRange};

    #[test]
    fn rebuild_replaces_previous_contents() {
        let mut store = ElectionStore::in_memory().expect("store");
        store
            .rebuild(&Dataset::build(vec![
                record(1999, "Goa", "Panaji", "BJP", 1, 10),
                record(1999, "Goa", "Panaji", "INC", 2, 5),
            ]))
            .expect("first rebuild");
        store
            .rebuild(&Dataset::build(vec![record(2004, "Goa", "Panaji", "INC", 1, 8)]))
            .expect("second rebuild");
        let counts = store.table_counts().expect("counts");
        let candidates = counts
            .iter()
            .find(|(name, _)| name == "candidates")
            .map(|(_, n)| *n);
        assert_eq!(candidates, Some(1));
    }

    #[test]
    fn creates_filter_indexes() {
        let store = test_support::store_with(vec![record(1999, "Goa", "Panaji", "BJP", 1, 10)]);
        let mut stmt = store
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' ORDER BY name")
            .expect("prepare");
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .expect("query")
            .collect::<std::result::Result<Vec<_>, _>>()
            .expect("rows");
        assert_eq!(
            names,
            vec![
                "idx_candidates_party".to_string(),
                "idx_candidates_state".to_string(),
                "idx_candidates_year".to_string(),
            ]
        );
    }

    #[test]
    fn reloading_same_csv_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("ge.csv");
        fs::write(&csv_path, SAMPLE_CSV).expect("write csv");
        let db_path = dir.path().join("elections.db");

        load_database(&csv_path, &db_path, YearRange::default()).expect("first load");
        let first = snapshot(&db_path);
        load_database(&csv_path, &db_path, YearRange::default()).expect("second load");
        let second = snapshot(&db_path);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn read_only_open_requires_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(ElectionStore::open_read_only(&dir.path().join("missing.db")).is_err());
    }

    fn snapshot(path: &Path) -> Vec<(String, Vec<serde_json::Value>)> {
        let store = ElectionStore::open_read_only(path).expect("open");
        TABLES
            .iter()
            .map(|table| (table.to_string(), store.dump_table(table).expect("dump")))
            .collect()
    }
}
