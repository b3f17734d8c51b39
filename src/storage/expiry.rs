//! Background Expiry Sweeper
//!
//! Reads only treat expired entries as absent; they never remove them. This
//! module provides the "active expiry" half: a background task that
//! periodically walks the TTL index of a [`Storage`] and purges the entries
//! whose deadline has passed.
//!
//! ## Design
//!
//! Each pass:
//! 1. Takes a snapshot of the TTL index via [`Storage::all_with_ttl`]
//! 2. Picks the entries that are expired as of the pass start
//! 3. Removes each one with [`Storage::purge_expired`], which re-checks the
//!    stored value under the write lock, so a key refreshed by a concurrent
//!    `put` after the snapshot survives
//!
//! Only keys carrying a TTL are visited, so a pass costs O(TTL entries)
//! rather than O(all entries).
//!
//! ## Adaptive Frequency
//!
//! If many indexed keys are expiring, the sweeper runs more frequently.
//! If few are, it backs off to save CPU.

use super::{Result, Storage};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Base interval between sweeps (default: 100ms)
    pub base_interval: Duration,

    /// Minimum interval between sweeps (default: 10ms)
    pub min_interval: Duration,

    /// Maximum interval between sweeps (default: 1s)
    pub max_interval: Duration,

    /// If this fraction of indexed keys are expired, speed up sweeping
    pub speedup_threshold: f64,

    /// If this fraction of indexed keys are expired, slow down sweeping
    pub slowdown_threshold: f64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(100),
            min_interval: Duration::from_millis(10),
            max_interval: Duration::from_secs(1),
            speedup_threshold: 0.25,
            slowdown_threshold: 0.01,
        }
    }
}

/// Outcome of a single sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries in the TTL index snapshot
    pub scanned: usize,
    /// Entries that were expired in the snapshot
    pub expired: usize,
    /// Entries actually removed
    pub purged: usize,
}

/// Runs one sweep pass over `storage`.
///
/// `expired` can exceed `purged` when another caller deleted or refreshed
/// a key between the snapshot and the purge.
pub fn sweep_once<S>(storage: &S) -> Result<SweepReport>
where
    S: Storage,
{
    let now = Instant::now();
    let snapshot = storage.all_with_ttl()?;

    let mut report = SweepReport {
        scanned: snapshot.len(),
        ..SweepReport::default()
    };

    for (key, value) in &snapshot {
        if !value.is_expired(now) {
            continue;
        }
        report.expired += 1;
        if storage.purge_expired(key, now)? {
            report.purged += 1;
        }
    }

    Ok(report)
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Starts the expiry sweeper as a background task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use ttlkv::storage::{ExpiryConfig, ExpirySweeper, MemoryStorage};
    /// use std::sync::Arc;
    ///
    /// let storage = Arc::new(MemoryStorage::new());
    /// let sweeper = ExpirySweeper::start(storage, ExpiryConfig::default());
    ///
    /// // Sweeper runs in the background...
    ///
    /// // Dropping the sweeper will stop it
    /// drop(sweeper);
    /// ```
    pub fn start<S>(storage: Arc<S>, config: ExpiryConfig) -> Self
    where
        S: Storage + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(sweeper_loop(storage, config, shutdown_rx));

        info!("Background expiry sweeper started");

        Self { shutdown_tx }
    }

    /// Stops the expiry sweeper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        info!("Background expiry sweeper stopped");
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Computes the next interval from the outcome of a pass.
fn next_interval(current: Duration, report: &SweepReport, config: &ExpiryConfig) -> Duration {
    if report.scanned == 0 {
        return (current * 2).min(config.max_interval);
    }

    let expiry_rate = report.expired as f64 / report.scanned as f64;

    if expiry_rate > config.speedup_threshold {
        (current / 2).max(config.min_interval)
    } else if expiry_rate < config.slowdown_threshold && report.expired == 0 {
        (current * 2).min(config.max_interval)
    } else {
        current
    }
}

/// The main sweeper loop.
async fn sweeper_loop<S>(
    storage: Arc<S>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    S: Storage + 'static,
{
    let mut current_interval = config.base_interval;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(current_interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let report = match sweep_once(storage.as_ref()) {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "Expiry sweep failed");
                continue;
            }
        };

        let next = next_interval(current_interval, &report, &config);
        if next < current_interval {
            debug!(
                expired = report.expired,
                scanned = report.scanned,
                new_interval_ms = next.as_millis(),
                "High expiry rate, speeding up sweeper"
            );
        } else if next > current_interval {
            trace!(
                new_interval_ms = next.as_millis(),
                "Low expiry rate, slowing down sweeper"
            );
        }
        current_interval = next;

        if report.purged > 0 {
            debug!(
                purged = report.purged,
                ttl_keys_remaining = report.scanned - report.purged,
                "Expired keys cleaned up"
            );
        }
    }
}

/// Starts the expiry sweeper with default configuration.
pub fn start_expiry_sweeper<S>(storage: Arc<S>) -> ExpirySweeper
where
    S: Storage + 'static,
{
    ExpirySweeper::start(storage, ExpiryConfig::default())
}
