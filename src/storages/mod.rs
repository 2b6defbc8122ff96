//! Shared durable storage
//!
//! Cross-session code→URL records with a 1-hour TTL. Expiry is lazy (checked
//! on access) with an occasional full sweep sampled by [`SweepTrigger`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::errors::Result;

pub mod models;
pub mod temp_file;

pub use models::{LINK_TTL_SECS, StoredUrl, TempRecord};
pub use temp_file::TempFileStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch an unexpired record. Expired or corrupt records are deleted on
    /// access and reported as absent.
    async fn get(&self, code: &str) -> Option<StoredUrl>;
    async fn set(&self, link: StoredUrl) -> Result<()>;
    async fn remove(&self, code: &str) -> Result<()>;
    /// Delete every expired record, returning how many were removed.
    async fn sweep(&self) -> Result<usize>;
    async fn count(&self) -> Result<usize>;
    async fn backend_name(&self) -> String;
}

pub struct StorageFactory;

impl StorageFactory {
    pub fn create(config: &Config) -> Result<Arc<dyn Storage>> {
        let storage = TempFileStorage::new(config.storage_dir.clone())?;
        Ok(Arc::new(storage))
    }
}

/// Default sweep sampling: ~1% of creation requests.
pub const SWEEP_DENOMINATOR: u32 = 100;

/// Samples whether a creation request should trigger a full sweep.
///
/// Injectable so tests can force deterministic sweeps with a denominator
/// of 1 instead of relying on randomness.
#[derive(Clone, Debug)]
pub struct SweepTrigger {
    denominator: u32,
}

impl SweepTrigger {
    pub fn new(denominator: u32) -> Self {
        SweepTrigger {
            denominator: denominator.max(1),
        }
    }

    pub fn should_fire(&self) -> bool {
        self.denominator == 1 || rand::random_range(0..self.denominator) == 0
    }
}

impl Default for SweepTrigger {
    fn default() -> Self {
        SweepTrigger::new(SWEEP_DENOMINATOR)
    }
}
