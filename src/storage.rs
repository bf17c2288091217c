//! Persistent key-value storage for the referrer cache
//!
//! This module wraps an embedded redb database holding the one-shot
//! install-referrer result. Values are stored as JSON strings.

use std::path::Path;
use std::sync::Arc;

use redb::backends::InMemoryBackend;
use redb::{Database, ReadableDatabase, TableDefinition};

/// Table holding the referrer cache
///
/// Key: one of [`KEY_REFERRER_DATA`] or [`KEY_PROCESSED_AT`]
/// Value: JSON-serialized `ReferrerData`, or epoch millis as a decimal string
///
/// Example:
/// - Key: "referrer_data"
/// - Value: '{"referrer_string":"utm_source=x&fp_id=abc",...}'
pub const TABLE_REFERRER: TableDefinition<&str, &str> = TableDefinition::new("dln_referrer_v1");

/// Serialized `ReferrerData`
pub const KEY_REFERRER_DATA: &str = "referrer_data";

/// Marker written together with the data; its presence means "processed"
pub const KEY_PROCESSED_AT: &str = "processed_at";

/// Handle to the referrer store, cheap to clone
#[derive(Clone)]
pub struct ReferrerStore {
    db: Arc<Database>,
}

impl ReferrerStore {
    /// Creates or opens the store file at `path`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use deeplinknow::storage::ReferrerStore;
    /// let store = ReferrerStore::open("dln.redb").expect("Failed to open referrer store");
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self, redb::Error> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// A store that lives only as long as this process.
    pub fn in_memory() -> Result<Self, redb::Error> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, redb::Error> {
        // Create the table up front so read transactions never miss it
        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(TABLE_REFERRER)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, redb::Error> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_REFERRER)?;
        let value = table.get(key)?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    pub fn contains(&self, key: &str) -> Result<bool, redb::Error> {
        Ok(self.get(key)?.is_some())
    }

    /// Writes all entries in a single transaction.
    pub fn put_all(&self, entries: &[(&str, &str)]) -> Result<(), redb::Error> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE_REFERRER)?;
            for (key, value) in entries {
                table.insert(*key, *value)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}
