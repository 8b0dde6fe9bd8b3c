use std::collections::HashMap;

use rusqlite::{params, Connection};

use crate::{
    defaults::{DatabaseError, StorageConfiguration},
    Dictionary, Value,
};

/// Stable storage for persistent domains. Every value is stored as the JSON encoding of a
/// [`Value`] in a single `defaults` table keyed by domain and key.
///
/// The connection is owned by the persistence runner, so every method runs on that thread and
/// in submission order.
pub(crate) struct SqliteDatabase {
    connection: Connection,
    write_error: Option<DatabaseError>,
}

impl SqliteDatabase {
    pub(crate) fn open(configuration: &StorageConfiguration) -> Result<Self, DatabaseError> {
        let connection = match configuration {
            StorageConfiguration::Sqlite { file_path } => {
                let connection = Connection::open(file_path)?;
                // Set WAL mode for better concurrency
                connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
                connection
            }
            StorageConfiguration::InMemory => Connection::open_in_memory()?,
        };

        connection.execute(
            "CREATE TABLE IF NOT EXISTS defaults (
                domain TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (domain, key)
            )",
            [],
        )?;

        Ok(SqliteDatabase {
            connection,
            write_error: None,
        })
    }

    pub(crate) fn load_all(&self) -> Result<HashMap<String, Dictionary>, DatabaseError> {
        let mut stmt = self
            .connection
            .prepare("SELECT domain, key, value FROM defaults")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut domains: HashMap<String, Dictionary> = HashMap::new();
        for row in rows {
            let (domain, key, value) = row?;
            match serde_json::from_str::<Value>(&value) {
                Ok(value) => {
                    domains.entry(domain).or_default().insert(key, value);
                }
                Err(e) => log::warn!("Skipping undecodable value for '{key}' in '{domain}': {e}"),
            }
        }

        Ok(domains)
    }

    pub(crate) fn set_entry(
        &mut self,
        domain: &str,
        key: &str,
        value: Option<&Value>,
    ) -> Result<(), DatabaseError> {
        match value {
            Some(value) => {
                let value = serde_json::to_string(value)?;
                self.connection.execute(
                    "INSERT OR REPLACE INTO defaults (domain, key, value) VALUES (?1, ?2, ?3)",
                    params![domain, key, value],
                )?;
            }
            None => {
                self.connection.execute(
                    "DELETE FROM defaults WHERE domain = ?1 AND key = ?2",
                    params![domain, key],
                )?;
            }
        }
        Ok(())
    }

    pub(crate) fn replace_domain(
        &mut self,
        domain: &str,
        entries: &Dictionary,
    ) -> Result<(), DatabaseError> {
        let transaction = self.connection.transaction()?;

        transaction.execute("DELETE FROM defaults WHERE domain = ?1", params![domain])?;
        for (key, value) in entries {
            let value = serde_json::to_string(value)?;
            transaction.execute(
                "INSERT INTO defaults (domain, key, value) VALUES (?1, ?2, ?3)",
                params![domain, key, value],
            )?;
        }

        transaction.commit()?;
        Ok(())
    }

    pub(crate) fn remove_domain(&mut self, domain: &str) -> Result<(), DatabaseError> {
        self.connection
            .execute("DELETE FROM defaults WHERE domain = ?1", params![domain])?;
        Ok(())
    }

    /// Keep the outcome of a write-behind operation so the next synchronize can report it.
    pub(crate) fn record(&mut self, result: Result<(), DatabaseError>) {
        if let Err(e) = result {
            log::warn!("Failed to persist defaults change: {e}");
            self.write_error = Some(e);
        }
    }

    pub(crate) fn take_write_error(&mut self) -> Option<DatabaseError> {
        self.write_error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database() -> SqliteDatabase {
        SqliteDatabase::open(&StorageConfiguration::InMemory).expect("in-memory database opens")
    }

    #[test]
    fn entries_round_trip_by_domain() {
        let mut db = database();
        db.set_entry("a", "count", Some(&Value::Integer(3)))
            .expect("write succeeds");
        db.set_entry("b", "count", Some(&Value::Float(3.0)))
            .expect("write succeeds");

        let domains = db.load_all().expect("load succeeds");

        assert_eq!(domains["a"]["count"], Value::Integer(3));
        assert_eq!(domains["b"]["count"], Value::Float(3.0));
    }

    #[test]
    fn removing_entry_and_domain() {
        let mut db = database();
        db.set_entry("a", "one", Some(&Value::from("1")))
            .expect("write succeeds");
        db.set_entry("a", "two", Some(&Value::from("2")))
            .expect("write succeeds");
        db.set_entry("b", "one", Some(&Value::from("1")))
            .expect("write succeeds");

        db.set_entry("a", "one", None).expect("delete succeeds");
        assert_eq!(
            db.load_all().expect("load succeeds")["a"].keys().collect::<Vec<_>>(),
            vec!["two"]
        );

        db.remove_domain("a").expect("delete succeeds");
        let domains = db.load_all().expect("load succeeds");
        assert!(!domains.contains_key("a"));
        assert!(domains.contains_key("b"));
    }

    #[test]
    fn replace_domain_discards_previous_entries() {
        let mut db = database();
        db.set_entry("a", "old", Some(&Value::Bool(true)))
            .expect("write succeeds");

        let replacement = Dictionary::from([("new".to_owned(), Value::data(vec![0, 255]))]);
        db.replace_domain("a", &replacement)
            .expect("replace succeeds");

        assert_eq!(db.load_all().expect("load succeeds")["a"], replacement);
    }

    #[test]
    fn undecodable_rows_are_skipped() {
        let mut db = database();
        db.set_entry("a", "kept", Some(&Value::from("kept")))
            .expect("write succeeds");
        db.connection
            .execute(
                "INSERT INTO defaults (domain, key, value) VALUES ('a', 'broken', '{\"Float\":null}')",
                [],
            )
            .expect("raw insert succeeds");

        let domains = db.load_all().expect("load succeeds");

        assert_eq!(
            domains["a"],
            Dictionary::from([("kept".to_owned(), Value::from("kept"))])
        );
    }

    #[test]
    fn recorded_errors_are_taken_once() {
        let mut db = database();
        let error = serde_json::from_str::<Value>("not json").expect_err("invalid json");

        db.record(Ok(()));
        assert!(db.take_write_error().is_none());

        db.record(Err(error.into()));
        assert!(db.take_write_error().is_some());
        assert!(db.take_write_error().is_none());
    }
}
