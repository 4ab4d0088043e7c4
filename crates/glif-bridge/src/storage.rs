use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use glif_core::config::StorageConfig;
use glif_core::error::BridgeError;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Flat directory of generated images named `<unix-ts>.<ext>`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    extension: String,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(cfg: &StorageConfig) -> Self {
        Self::new(&cfg.image_dir, &cfg.image_extension)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), BridgeError> {
        std::fs::create_dir_all(&self.dir).map_err(|err| {
            BridgeError::storage(format!("create image dir {}", self.dir.display()), err)
        })
    }

    pub async fn save(&self, bytes: &[u8]) -> Result<PathBuf, BridgeError> {
        self.save_with_timestamp(unix_ts(), bytes).await
    }

    pub(crate) async fn save_with_timestamp(
        &self,
        ts: u64,
        bytes: &[u8],
    ) -> Result<PathBuf, BridgeError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|err| {
            BridgeError::storage(format!("create image dir {}", self.dir.display()), err)
        })?;

        let mut suffix = 0u32;
        loop {
            let path = self.dir.join(self.file_name(ts, suffix));
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let mut file = match opened {
                Ok(f) => f,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!("image name taken, trying next: path={}", path.display());
                    suffix += 1;
                    continue;
                }
                Err(err) => {
                    return Err(BridgeError::storage(
                        format!("create {}", path.display()),
                        err,
                    ))
                }
            };
            file.write_all(bytes)
                .await
                .map_err(|err| BridgeError::storage(format!("write {}", path.display()), err))?;
            file.flush()
                .await
                .map_err(|err| BridgeError::storage(format!("flush {}", path.display()), err))?;
            info!("image saved: path={} bytes={}", path.display(), bytes.len());
            return Ok(path);
        }
    }

    pub async fn read(&self, path: &Path) -> Result<Vec<u8>, BridgeError> {
        tokio::fs::read(path)
            .await
            .map_err(|err| BridgeError::storage(format!("read {}", path.display()), err))
    }

    fn file_name(&self, ts: u64, suffix: u32) -> String {
        if suffix == 0 {
            format!("{ts}.{}", self.extension)
        } else {
            format!("{ts}-{suffix}.{}", self.extension)
        }
    }
}

pub(crate) fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
