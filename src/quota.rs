//! Allowance accounting: atomic decrement-with-floor and compensating
//! increment over the counter store.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::store::CounterStore;

/// Serializes every read-modify-write on the counter store.
///
/// One manager owns one store handle and one lock; no process-wide state.
/// Critical sections cover a single read-modify-write — never a download or
/// a summarizer call. Cloning shares the same lock and store.
#[derive(Clone)]
pub struct QuotaManager {
    store: Arc<Mutex<CounterStore>>,
    /// Seed value, kept to spot over-restoration (see [`QuotaManager::restore`]).
    seed: i64,
}

impl QuotaManager {
    pub fn new(store: CounterStore, seed: i64) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            seed,
        }
    }

    /// Create the record for `instance_key` with the configured seed value
    /// if none exists. Idempotent: an existing record is left untouched.
    pub async fn initialize(&self, instance_key: u16) -> Result<()> {
        let store = self.store.lock().await;
        store.seed(instance_key, self.seed)?;
        Ok(())
    }

    /// Consume one unit of allowance if any remains.
    ///
    /// Returns false, without mutation, when the record is missing or
    /// already at zero. The read and the decrement happen under one lock,
    /// so two callers racing on `remaining == 1` cannot both succeed.
    pub async fn try_consume(&self, instance_key: u16) -> Result<bool> {
        let store = self.store.lock().await;
        match store.get(instance_key)? {
            Some(record) if record.remaining > 0 => {
                store.set_remaining(instance_key, record.remaining - 1)?;
                debug!(instance_key, remaining = record.remaining - 1, "consumed allowance");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Put one unit of allowance back.
    ///
    /// Compensating action for a [`QuotaManager::try_consume`] success whose
    /// downstream work failed; the pipeline guarantees it fires at most once
    /// per request. No ceiling is enforced, so a balance climbing above the
    /// seed can only mean a double-compensation bug — it is logged loudly.
    pub async fn restore(&self, instance_key: u16) -> Result<()> {
        let store = self.store.lock().await;
        if let Some(record) = store.get(instance_key)? {
            let restored = record.remaining + 1;
            store.set_remaining(instance_key, restored)?;
            debug!(instance_key, remaining = restored, "restored allowance");
            if restored > self.seed {
                warn!(
                    instance_key,
                    remaining = restored,
                    seed = self.seed,
                    "allowance exceeds seed value after restore"
                );
            }
        }
        Ok(())
    }

    /// Current allowance, 0 if no record exists. May trail an in-flight
    /// mutation by at most one.
    pub async fn remaining(&self, instance_key: u16) -> Result<i64> {
        let store = self.store.lock().await;
        Ok(store.get(instance_key)?.map_or(0, |r| r.remaining))
    }
}
