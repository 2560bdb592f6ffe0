//! Content-addressed cache of detailed game statistics.
//!
//! Entries are keyed by `StatsKey` and are valid for the whole session: a
//! game's stats never change once recorded, so nothing is evicted short of
//! a full reset. Concurrent requests for the same key share one fetch and
//! its outcome, whether that is a blob or an error.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::fetch::FetchError;
use crate::models::{StatsBlob, StatsKey};

/// A populated cache entry.
#[derive(Debug, Clone, Serialize)]
pub struct StatsCacheEntry {
    pub key: StatsKey,
    pub blob: Arc<StatsBlob>,
    pub fetched_at: DateTime<Utc>,
}

/// What every caller of one fetch receives.
pub type StatsResult = Result<Arc<StatsBlob>, Arc<FetchError>>;

type Waiter = watch::Receiver<Option<StatsResult>>;

#[derive(Debug)]
enum Slot {
    Ready(StatsCacheEntry),
    InFlight(Waiter),
}

enum Role {
    Hit(Arc<StatsBlob>),
    Wait(Waiter),
    Lead(watch::Sender<Option<StatsResult>>),
}

/// Append-only stats blob cache with in-flight request collapsing.
#[derive(Debug, Default)]
pub struct StatsCache {
    slots: Mutex<HashMap<StatsKey, Slot>>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<StatsKey, Slot>> {
        // Nothing panics while holding the lock, but don't turn a poisoned
        // lock into a second panic.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached blob for `key`, if a fetch for it has completed.
    pub fn get(&self, key: &StatsKey) -> Option<Arc<StatsBlob>> {
        match self.slots().get(key) {
            Some(Slot::Ready(entry)) => Some(entry.blob.clone()),
            _ => None,
        }
    }

    fn role(&self, key: &StatsKey) -> Role {
        let mut slots = self.slots();
        match slots.get(key) {
            Some(Slot::Ready(entry)) => return Role::Hit(entry.blob.clone()),
            // A closed channel means the fetching caller was dropped.
            Some(Slot::InFlight(rx)) if rx.has_changed().is_ok() => return Role::Wait(rx.clone()),
            _ => {}
        }
        let (tx, rx) = watch::channel(None);
        slots.insert(key.clone(), Slot::InFlight(rx));
        Role::Lead(tx)
    }

    /// Return the cached blob, or run `fetch` to populate it.
    ///
    /// Callers racing on the same key await a single fetch and all receive
    /// its result, success or failure. A failed fetch leaves the key empty,
    /// so only a later call retries.
    pub async fn get_or_fetch<F, Fut>(&self, key: &StatsKey, fetch: F) -> StatsResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StatsBlob, FetchError>>,
    {
        loop {
            match self.role(key) {
                Role::Hit(blob) => {
                    debug!("Stats cache hit for {}", key);
                    return Ok(blob);
                }
                Role::Wait(mut rx) => {
                    debug!("Joining in-flight stats fetch for {}", key);
                    let outcome = match rx.wait_for(Option::is_some).await {
                        Ok(done) => Option::clone(&done),
                        Err(_) => None,
                    };
                    if let Some(outcome) = outcome {
                        return outcome;
                    }
                    // Sender dropped without an answer; go round and take over.
                }
                Role::Lead(tx) => {
                    info!("Fetching game stats for {}", key);
                    let outcome = match fetch().await {
                        Ok(blob) => {
                            let blob = Arc::new(blob);
                            self.slots().insert(
                                key.clone(),
                                Slot::Ready(StatsCacheEntry {
                                    key: key.clone(),
                                    blob: blob.clone(),
                                    fetched_at: Utc::now(),
                                }),
                            );
                            Ok(blob)
                        }
                        Err(e) => {
                            warn!("Game stats fetch for {} failed: {}", key, e);
                            self.slots().remove(key);
                            Err(Arc::new(e))
                        }
                    };
                    tx.send_replace(Some(outcome.clone()));
                    return outcome;
                }
            }
        }
    }

    /// All populated entries, oldest first.
    pub fn entries(&self) -> Vec<StatsCacheEntry> {
        let mut entries: Vec<StatsCacheEntry> = self
            .slots()
            .values()
            .filter_map(|slot| match slot {
                Slot::Ready(entry) => Some(entry.clone()),
                Slot::InFlight(_) => None,
            })
            .collect();
        entries.sort_by(|a, b| a.fetched_at.cmp(&b.fetched_at));
        entries
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything. Only used on a full session teardown.
    pub fn clear(&self) {
        self.slots().clear();
    }
}
