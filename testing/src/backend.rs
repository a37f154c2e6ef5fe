//! In-memory [`OrderBackend`] for tests.
//!
//! Each call runs as one critical section over a shared map of records and
//! named sets, which gives the compound primitives the same all-or-nothing
//! behaviour a server-side script has in Redis.
//!
//! Faults can be injected per call site with [`InMemoryBackend::fail_next`].
//! The two mid-transaction fault points apply the first step, fail the second,
//! and roll the first back before reporting [`BackendError::Aborted`], so
//! tests can verify no partial state ever becomes visible.

use order_api_core::backend::{BackendError, BackendFuture, OrderBackend, ScanPage};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Call site at which an injected fault fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// `ping` fails with a connection error.
    Ping,
    /// `get` fails with a connection error.
    Get,
    /// `get_many` fails with a connection error.
    GetMany,
    /// `replace` fails with a connection error before writing.
    Replace,
    /// `insert_indexed` writes the record, then the index step aborts.
    InsertAfterWrite,
    /// `remove_indexed` deletes the record, then the index step aborts.
    RemoveAfterDelete,
    /// `scan_index` fails with a connection error.
    Scan,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, String>,
    sets: HashMap<String, BTreeSet<String>>,
    faults: Vec<FaultPoint>,
    latency: Option<Duration>,
}

impl Inner {
    /// Consume a pending fault for `point`, if one is armed.
    fn take_fault(&mut self, point: FaultPoint) -> bool {
        if let Some(pos) = self.faults.iter().position(|f| *f == point) {
            self.faults.remove(pos);
            true
        } else {
            false
        }
    }
}

/// In-memory order backend.
///
/// Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot fault for the next call at `point`.
    ///
    /// Faults stack: arming the same point twice fails the next two calls.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn fail_next(&self, point: FaultPoint) -> Result<(), BackendError> {
        self.lock()?.faults.push(point);
        Ok(())
    }

    /// Disarm every pending fault.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn clear_faults(&self) -> Result<(), BackendError> {
        self.lock()?.faults.clear();
        Ok(())
    }

    /// Delay every subsequent call by `latency`, `None` to disable.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn set_latency(&self, latency: Option<Duration>) -> Result<(), BackendError> {
        self.lock()?.latency = latency;
        Ok(())
    }

    /// Write a raw value, bypassing the index (for planting corrupt or
    /// orphaned data).
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn raw_put(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.lock()?
            .records
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Add a raw member to a set, bypassing the record map.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn raw_add_member(&self, index: &str, member: &str) -> Result<(), BackendError> {
        self.lock()?
            .sets
            .entry(index.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    /// Keys of all stored records.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn record_keys(&self) -> Result<BTreeSet<String>, BackendError> {
        Ok(self.lock()?.records.keys().cloned().collect())
    }

    /// Members of the named set.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn index_members(&self, index: &str) -> Result<BTreeSet<String>, BackendError> {
        Ok(self
            .lock()?
            .sets
            .get(index)
            .cloned()
            .unwrap_or_default())
    }

    /// Returns `true` if the records under `prefix` are exactly the members of `index`.
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn is_consistent(&self, index: &str, prefix: &str) -> Result<bool, BackendError> {
        let inner = self.lock()?;
        let records: BTreeSet<&str> = inner
            .records
            .keys()
            .map(String::as_str)
            .filter(|k| k.starts_with(prefix))
            .collect();
        let members: BTreeSet<&str> = inner
            .sets
            .get(index)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default();
        Ok(records == members)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, BackendError> {
        self.inner
            .lock()
            .map_err(|_| BackendError::Command("Mutex lock failed".to_string()))
    }

    async fn pause(&self) -> Result<(), BackendError> {
        let latency = self.lock()?.latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        Ok(())
    }

    fn injected(point: FaultPoint) -> BackendError {
        BackendError::Connection(format!("injected fault at {point:?}"))
    }
}

impl OrderBackend for InMemoryBackend {
    fn ping(&self) -> BackendFuture<'_, ()> {
        Box::pin(async move {
            self.pause().await?;
            if self.lock()?.take_fault(FaultPoint::Ping) {
                return Err(Self::injected(FaultPoint::Ping));
            }
            Ok(())
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Option<String>> {
        Box::pin(async move {
            self.pause().await?;
            let mut inner = self.lock()?;
            if inner.take_fault(FaultPoint::Get) {
                return Err(Self::injected(FaultPoint::Get));
            }
            Ok(inner.records.get(key).cloned())
        })
    }

    fn get_many<'a>(&'a self, keys: &'a [String]) -> BackendFuture<'a, Vec<Option<String>>> {
        Box::pin(async move {
            self.pause().await?;
            let mut inner = self.lock()?;
            if inner.take_fault(FaultPoint::GetMany) {
                return Err(Self::injected(FaultPoint::GetMany));
            }
            Ok(keys.iter().map(|k| inner.records.get(k).cloned()).collect())
        })
    }

    fn replace<'a>(&'a self, key: &'a str, value: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            self.pause().await?;
            let mut inner = self.lock()?;
            if inner.take_fault(FaultPoint::Replace) {
                return Err(Self::injected(FaultPoint::Replace));
            }
            match inner.records.get_mut(key) {
                Some(existing) => {
                    value.clone_into(existing);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn insert_indexed<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        index: &'a str,
    ) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            self.pause().await?;
            let mut inner = self.lock()?;

            if inner.records.contains_key(key) {
                return Ok(false);
            }
            inner.records.insert(key.to_string(), value.to_string());

            if inner.take_fault(FaultPoint::InsertAfterWrite) {
                inner.records.remove(key);
                return Err(BackendError::Aborted(format!(
                    "index update for {key} failed, record write rolled back"
                )));
            }

            inner
                .sets
                .entry(index.to_string())
                .or_default()
                .insert(key.to_string());
            Ok(true)
        })
    }

    fn remove_indexed<'a>(&'a self, key: &'a str, index: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            self.pause().await?;
            let mut inner = self.lock()?;

            let Some(previous) = inner.records.remove(key) else {
                return Ok(false);
            };

            if inner.take_fault(FaultPoint::RemoveAfterDelete) {
                inner.records.insert(key.to_string(), previous);
                return Err(BackendError::Aborted(format!(
                    "index removal for {key} failed, record delete rolled back"
                )));
            }

            if let Some(set) = inner.sets.get_mut(index) {
                set.remove(key);
            }
            Ok(true)
        })
    }

    fn scan_index<'a>(
        &'a self,
        index: &'a str,
        cursor: u64,
        count: usize,
    ) -> BackendFuture<'a, ScanPage> {
        Box::pin(async move {
            self.pause().await?;
            let mut inner = self.lock()?;
            if inner.take_fault(FaultPoint::Scan) {
                return Err(Self::injected(FaultPoint::Scan));
            }

            let Some(set) = inner.sets.get(index) else {
                return Ok(ScanPage::default());
            };

            // Cursor is a position in the set's iteration order.
            let start = usize::try_from(cursor).unwrap_or(usize::MAX);
            let keys: Vec<String> = set.iter().skip(start).take(count).cloned().collect();
            let end = start.saturating_add(keys.len());

            let next = if end >= set.len() {
                0
            } else {
                u64::try_from(end).unwrap_or(0)
            };

            Ok(ScanPage { cursor: next, keys })
        })
    }
}
