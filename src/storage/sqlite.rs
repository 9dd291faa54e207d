use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use super::PensionerStore;
use crate::domain::{AgeCategory, CanonicalRecord};
use crate::error::{IngestError, Result};

const COLUMNS: &str = "ppo_number, year_of_birth, date_of_birth, age, age_category, \
    pension_sanctioning_authority, psa_district, bank_name, disbursing_branch_address, \
    disbursing_branch_pincode, pensioner_postal_address, pensioner_pincode, state, district, data_source";

/// SQLite-backed store; one table per collection with the PPO number as primary key
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened pensioner store at {}", db_path.display());
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    fn ensure_collection(&self, collection: &str) -> Result<()> {
        validate_collection(collection)?;
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {collection} (
                ppo_number                    TEXT PRIMARY KEY,
                year_of_birth                 TEXT,
                date_of_birth                 TEXT,
                age                           INTEGER,
                age_category                  TEXT NOT NULL,
                pension_sanctioning_authority TEXT,
                psa_district                  TEXT,
                bank_name                     TEXT,
                disbursing_branch_address     TEXT,
                disbursing_branch_pincode     TEXT,
                pensioner_postal_address      TEXT,
                pensioner_pincode             TEXT,
                state                         TEXT NOT NULL,
                district                      TEXT,
                data_source                   TEXT NOT NULL
            );
            "#
        ))?;
        Ok(())
    }

    /// Every record in `collection`, in insertion order
    pub fn records(&self, collection: &str) -> Result<Vec<CanonicalRecord>> {
        self.ensure_collection(collection)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM {collection} ORDER BY rowid"))?;
        let rows = stmt.query_map([], |row| {
            let category: String = row.get(4)?;
            Ok(CanonicalRecord {
                ppo_number: row.get(0)?,
                year_of_birth: row.get(1)?,
                date_of_birth: row.get(2)?,
                age: row.get::<_, Option<i64>>(3)?.and_then(|a| u32::try_from(a).ok()),
                age_category: AgeCategory::parse(&category).unwrap_or(AgeCategory::Unknown),
                pension_sanctioning_authority: row.get(5)?,
                psa_district: row.get(6)?,
                bank_name: row.get(7)?,
                disbursing_branch_address: row.get(8)?,
                disbursing_branch_pincode: row.get(9)?,
                pensioner_postal_address: row.get(10)?,
                pensioner_pincode: row.get(11)?,
                state: row.get(12)?,
                district: row.get(13)?,
                data_source: row.get(14)?,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }
}

impl PensionerStore for SqliteStore {
    fn existing_keys(&self, collection: &str) -> Result<HashSet<String>> {
        self.ensure_collection(collection)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT ppo_number FROM {collection}"))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = HashSet::new();
        for key in rows {
            keys.insert(key?);
        }
        debug!("Loaded {} existing keys from {}", keys.len(), collection);
        Ok(keys)
    }

    fn bulk_insert(&mut self, collection: &str, records: &[CanonicalRecord]) -> Result<usize> {
        self.ensure_collection(collection)?;
        let tx = self.conn.transaction()?;
        {
            // Plain INSERT: a key conflict aborts the chunk rather than overwriting
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {collection} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ))?;
            for r in records {
                stmt.execute(params![
                    r.ppo_number,
                    r.year_of_birth,
                    r.date_of_birth,
                    r.age.map(i64::from),
                    r.age_category.as_str(),
                    r.pension_sanctioning_authority,
                    r.psa_district,
                    r.bank_name,
                    r.disbursing_branch_address,
                    r.disbursing_branch_pincode,
                    r.pensioner_postal_address,
                    r.pensioner_pincode,
                    r.state,
                    r.district,
                    r.data_source,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }
}

/// Collection names are interpolated into SQL, so only plain identifiers pass
fn validate_collection(collection: &str) -> Result<()> {
    let mut chars = collection.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(IngestError::Config(format!("invalid collection name '{collection}'")))
    }
}
