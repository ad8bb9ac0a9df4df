use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Record, Store, StoreError};

/// In-process store with the same contract as `PgStore`: ids start at 1, are
/// never reused, and listings come back in ascending id order.
///
/// Used for exercising routers without a database. `set_unavailable(true)` makes
/// every operation fail the way an exhausted pool would.
pub struct MemoryStore<R> {
    inner: Mutex<Inner<R>>,
    inserts: AtomicUsize,
    unavailable: AtomicBool,
}

struct Inner<R> {
    rows: BTreeMap<i64, R>,
    next_id: i64,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
            inserts: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }
}

impl<R> MemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of insert calls that reached the store, successful or not.
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("pool timed out".to_owned()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner<R>>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("poisoned memory store lock".to_owned()))
    }
}

#[async_trait]
impl<R: Record> Store<R> for MemoryStore<R> {
    async fn insert_returning_id(&self, new: R::New) -> Result<R, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut inner = self.lock()?;
        let id = inner.next_id;
        inner.next_id += 1;

        let record = R::from_new(id, new);
        inner.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn query_one(&self, id: i64) -> Result<Option<R>, StoreError> {
        self.check_available()?;
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    async fn query_many(&self) -> Result<Vec<R>, StoreError> {
        self.check_available()?;
        Ok(self.lock()?.rows.values().cloned().collect())
    }
}
