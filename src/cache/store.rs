use super::error::{CacheError, Result};
use crate::server::timer;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache key type
pub type KeyType = Bytes;

/// Cache value associated with a key
pub type ValueType = Bytes;

/// Meta data stored with a cache value
#[derive(Clone, Debug)]
pub struct EntryMeta {
    pub(crate) cas: u64,
    pub(crate) flags: u32,
    /// Absolute timer second after which the entry is expired; 0 means
    /// the entry never expires.
    pub(crate) deadline: u64,
}

impl EntryMeta {
    pub fn new(cas: u64, flags: u32, deadline: u64) -> EntryMeta {
        EntryMeta {
            cas,
            flags,
            deadline,
        }
    }
}

/// Value and meta data stored in the cache
#[derive(Clone, Debug)]
pub struct Record {
    pub(crate) header: EntryMeta,
    pub(crate) value: ValueType,
}

impl Record {
    pub fn new(value: ValueType, cas: u64, flags: u32, deadline: u64) -> Record {
        let header = EntryMeta::new(cas, flags, deadline);
        Record { header, value }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Result of a successful mutation; cas is the token stamped on the
/// stored record.
#[derive(Debug)]
pub struct SetStatus {
    pub cas: u64,
}

/// Shared key/value store. The map is sharded by key hash, every shard
/// behind its own reader-writer lock, so readers take a shared lock and
/// mutations an exclusive one without a process-wide bottleneck.
pub struct Store {
    memory: DashMap<KeyType, Record>,
    timer: Arc<dyn timer::Timer + Send + Sync>,
    cas_id: AtomicU64,
}

impl Store {
    pub fn new(timer: Arc<dyn timer::Timer + Send + Sync>) -> Store {
        Store {
            memory: DashMap::new(),
            timer,
            cas_id: AtomicU64::new(0),
        }
    }

    /// Allocates the next CAS token as the post-increment value of a
    /// single atomic counter. 0 is reserved on the wire for "don't check
    /// CAS", so the counter is advanced once more if it wraps to 0.
    fn next_cas(&self) -> u64 {
        let mut cas = self.cas_id.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        if cas == 0 {
            cas = self.cas_id.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        }
        cas
    }

    pub fn get(&self, key: &KeyType) -> Result<Record> {
        let record = match self.memory.get(key) {
            Some(entry) => entry.value().clone(),
            None => return Err(CacheError::NotFound),
        };

        if self.check_if_expired(key, &record) {
            return Err(CacheError::NotFound);
        }
        Ok(record)
    }

    /// Expiry is lazy: a deadline in the past removes the entry on the
    /// read that observes it, never from a background task. The removal
    /// re-checks the CAS observed under the read lock so it cannot erase
    /// a record written by a concurrent mutator.
    fn check_if_expired(&self, key: &KeyType, record: &Record) -> bool {
        if record.header.deadline == 0 {
            return false;
        }
        if record.header.deadline >= self.timer.timestamp() {
            return false;
        }
        self.memory
            .remove_if(key, |_key, current| current.header.cas == record.header.cas);
        true
    }

    /// Inserts only when the key is absent. Presence alone decides the
    /// outcome: an expired entry that no read has removed yet still
    /// counts as present.
    pub fn add(&self, key: KeyType, mut record: Record) -> Result<SetStatus> {
        match self.memory.entry(key) {
            Entry::Occupied(_) => Err(CacheError::KeyExists),
            Entry::Vacant(entry) => {
                let cas = self.next_cas();
                record.header.cas = cas;
                entry.insert(record);
                Ok(SetStatus { cas })
            }
        }
    }

    pub fn set(&self, key: KeyType, record: Record) -> Result<SetStatus> {
        self.store_checked(key, record, false)
    }

    pub fn replace(&self, key: KeyType, record: Record) -> Result<SetStatus> {
        self.store_checked(key, record, true)
    }

    /// record.header.cas carries the CAS the client expects; 0 skips the
    /// comparison. The stored record always receives a fresh token under
    /// the same exclusive entry lock that publishes it.
    fn store_checked(
        &self,
        key: KeyType,
        mut record: Record,
        replace_only: bool,
    ) -> Result<SetStatus> {
        match self.memory.entry(key) {
            Entry::Occupied(mut entry) => {
                let expected = record.header.cas;
                if expected != 0 && entry.get().header.cas != expected {
                    return Err(CacheError::KeyExists);
                }
                let cas = self.next_cas();
                record.header.cas = cas;
                entry.insert(record);
                Ok(SetStatus { cas })
            }
            Entry::Vacant(entry) => {
                if replace_only {
                    return Err(CacheError::NotFound);
                }
                let cas = self.next_cas();
                record.header.cas = cas;
                entry.insert(record);
                Ok(SetStatus { cas })
            }
        }
    }
}
