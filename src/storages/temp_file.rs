use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::{Storage, StoredUrl, TempRecord};
use crate::errors::{Result, ShortstashError};

/// One-file-per-code JSON store under a dedicated directory.
///
/// Records are independent files, so operations are record-scoped with no
/// cross-record locking. Concurrent writers to the same code are not
/// coordinated (last writer wins); codes are random, so collisions across
/// sessions are a known, low-probability race.
pub struct TempFileStorage {
    dir: PathBuf,
}

impl TempFileStorage {
    /// 初始化存储目录（首次使用时创建）
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(|e| {
            ShortstashError::file_operation(format!(
                "failed to create storage directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        info!("TempFileStorage ready at {}", dir.display());
        Ok(TempFileStorage { dir })
    }

    fn record_path(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{}.json", code))
    }

    /// Corrupt or unreadable records read as `None`; callers delete them.
    fn read_record(&self, path: &Path) -> Option<TempRecord> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }
}

#[async_trait]
impl Storage for TempFileStorage {
    async fn get(&self, code: &str) -> Option<StoredUrl> {
        let path = self.record_path(code);
        if !path.exists() {
            return None;
        }

        let Some(record) = self.read_record(&path) else {
            warn!("removing corrupt record for code {}", code);
            let _ = fs::remove_file(&path);
            return None;
        };

        // 惰性过期：访问时删除过期记录
        if record.expires < Utc::now().timestamp() {
            debug!("record {} expired, removing on access", code);
            let _ = fs::remove_file(&path);
            return None;
        }

        Some(StoredUrl::from_record(code, record))
    }

    async fn set(&self, link: StoredUrl) -> Result<()> {
        let record = TempRecord::from(&link);
        let json = serde_json::to_string(&record)?;
        fs::write(self.record_path(&link.code), json)?;
        Ok(())
    }

    async fn remove(&self, code: &str) -> Result<()> {
        let path = self.record_path(code);
        if !path.exists() {
            return Err(ShortstashError::not_found(format!(
                "no record for code {}",
                code
            )));
        }
        fs::remove_file(&path)?;
        Ok(())
    }

    async fn sweep(&self) -> Result<usize> {
        let now = Utc::now().timestamp();
        let mut removed = 0;

        for entry in fs::read_dir(&self.dir)? {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // fail-open: unparsable records are swept along with expired ones
            let expired = match self.read_record(&path) {
                Some(record) => record.expires < now,
                None => true,
            };
            if expired && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("sweep removed {} expired records", removed);
        }
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        let mut n = 0;
        for entry in fs::read_dir(&self.dir)? {
            let Ok(entry) = entry else { continue };
            if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                n += 1;
            }
        }
        Ok(n)
    }

    async fn backend_name(&self) -> String {
        "temp_file".to_string()
    }
}
