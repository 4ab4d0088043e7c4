use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use glif_core::config::RetentionConfig;
use glif_core::error::BridgeError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_age: Duration,
    pub interval: Duration,
}

impl RetentionPolicy {
    pub fn from_config(cfg: &RetentionConfig) -> Self {
        Self {
            max_age: cfg.max_age(),
            interval: cfg.interval(),
        }
    }
}

/// Deletes regular files directly under `dir` whose mtime is more than
/// `max_age` before `now`. Returns how many were removed.
pub fn sweep_once(dir: &Path, max_age: Duration, now: SystemTime) -> Result<usize, BridgeError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|err| BridgeError::cleanup(format!("list {}", dir.display()), err))?;

    let mut removed = 0usize;
    for entry in entries {
        let entry = match entry {
            Ok(v) => v,
            Err(err) => {
                warn!("retention: skip unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        let meta = match entry.metadata() {
            Ok(v) => v,
            Err(err) => {
                warn!("retention: stat failed path={} err={err}", path.display());
                continue;
            }
        };
        if !meta.is_file() {
            continue;
        }
        let modified = match meta.modified() {
            Ok(v) => v,
            Err(err) => {
                warn!("retention: mtime unavailable path={} err={err}", path.display());
                continue;
            }
        };
        // mtime in the future counts as brand new
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age <= max_age {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                removed += 1;
                info!("retention: removed old image path={}", path.display());
            }
            Err(err) => warn!("retention: remove failed path={} err={err}", path.display()),
        }
    }

    if removed > 0 {
        info!("retention: sweep done, removed={removed} dir={}", dir.display());
    } else {
        info!("retention: no old images in {}", dir.display());
    }
    Ok(removed)
}

/// Background task that sweeps the image directory every `interval`.
/// Dropping it without `stop` also ends the task at its next wake.
pub struct RetentionScheduler {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl RetentionScheduler {
    pub fn spawn(dir: PathBuf, policy: RetentionPolicy) -> Self {
        let (tx, mut rx) = oneshot::channel::<()>();
        info!(
            "retention: scheduler started dir={} max_age_seconds={} interval_seconds={}",
            dir.display(),
            policy.max_age.as_secs(),
            policy.interval.as_secs()
        );
        let handle = tokio::spawn(async move {
            loop {
                // 先等待再扫描；下一轮从本轮结束时重新计时
                tokio::select! {
                    _ = tokio::time::sleep(policy.interval) => {}
                    _ = &mut rx => break,
                }
                debug!("retention: sweep begin dir={}", dir.display());
                if let Err(err) = sweep_once(&dir, policy.max_age, SystemTime::now()) {
                    error!("retention: sweep failed: {err}");
                }
            }
            info!("retention: scheduler stopped");
        });
        Self {
            shutdown: tx,
            handle,
        }
    }

    /// Stops the timer and waits for an in-progress sweep to finish.
    pub async fn stop(self) {
        let Self { shutdown, handle } = self;
        let _ = shutdown.send(());
        if let Err(err) = handle.await {
            error!("retention: scheduler task ended abnormally: {err}");
        }
    }
}
