use crate::domain::economic::EconomicSnapshot;
use crate::domain::errors::EconomicDataError;
use crate::domain::ports::EconomicIndicatorProvider;
use chrono::Utc;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub fetch_timeout: Duration,
    /// Minimum wait after a failed refresh before the provider is tried again.
    pub retry_backoff: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            fetch_timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_secs(300),
        }
    }
}

struct Published {
    snapshot: Arc<EconomicSnapshot>,
    refreshed_at: Instant,
    invalidated: bool,
}

/// Time-bounded cache of the current economic snapshot.
///
/// Readers clone an `Arc` out of the lock and never see a half-built snapshot;
/// refreshes build the replacement completely before publishing it. Only one
/// refresh runs at a time.
pub struct EconomicIndicatorCache {
    provider: Arc<dyn EconomicIndicatorProvider>,
    settings: CacheSettings,
    published: RwLock<Option<Published>>,
    last_failure: RwLock<Option<Instant>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for EconomicIndicatorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EconomicIndicatorCache")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .field("published", &"<RwLock>")
            .finish()
    }
}

impl EconomicIndicatorCache {
    pub fn new(provider: Arc<dyn EconomicIndicatorProvider>, settings: CacheSettings) -> Self {
        Self {
            provider,
            settings,
            published: RwLock::new(None),
            last_failure: RwLock::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Current snapshot, refreshing from the provider when it has expired.
    ///
    /// Never fails: a provider error or timeout keeps the previous snapshot, or
    /// yields built-in defaults if nothing was ever fetched.
    pub async fn get_snapshot(&self) -> Arc<EconomicSnapshot> {
        if let Some(fresh) = self.fresh_snapshot() {
            return fresh;
        }
        if self.in_backoff() {
            return self.current();
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(fresh) = self.fresh_snapshot() {
            return fresh;
        }
        if self.in_backoff() {
            return self.current();
        }

        match self.fetch().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.publish(snapshot.clone());
                snapshot
            }
            Err(e) => {
                warn!(
                    "EconomicIndicatorCache: refresh from {} failed ({}), serving {}",
                    self.provider.name(),
                    e,
                    if self.has_snapshot() {
                        "previous snapshot"
                    } else {
                        "built-in defaults"
                    }
                );
                self.record_failure();
                self.current()
            }
        }
    }

    /// Published snapshot without attempting a refresh (defaults if none).
    pub fn current(&self) -> Arc<EconomicSnapshot> {
        let guard = match self.published.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .as_ref()
            .map(|p| p.snapshot.clone())
            .unwrap_or_else(|| Arc::new(EconomicSnapshot::defaults()))
    }

    /// Age of the published snapshot, if any.
    pub fn age(&self) -> Option<Duration> {
        let guard = match self.published.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.as_ref().map(|p| p.refreshed_at.elapsed())
    }

    /// Force the next `get_snapshot` to go to the provider.
    pub fn invalidate(&self) {
        match self.published.write() {
            Ok(mut guard) => {
                if let Some(p) = guard.as_mut() {
                    p.invalidated = true;
                }
            }
            Err(poisoned) => {
                if let Some(p) = poisoned.into_inner().as_mut() {
                    p.invalidated = true;
                }
            }
        }
        self.clear_failure();
    }

    fn has_snapshot(&self) -> bool {
        match self.published.read() {
            Ok(g) => g.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }

    fn fresh_snapshot(&self) -> Option<Arc<EconomicSnapshot>> {
        let guard = match self.published.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .as_ref()
            .filter(|p| !p.invalidated && p.refreshed_at.elapsed() < self.settings.ttl)
            .map(|p| p.snapshot.clone())
    }

    fn in_backoff(&self) -> bool {
        let guard = match self.last_failure.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.is_some_and(|at| at.elapsed() < self.settings.retry_backoff)
    }

    async fn fetch(&self) -> Result<EconomicSnapshot, EconomicDataError> {
        debug!(
            "EconomicIndicatorCache: refreshing from {}",
            self.provider.name()
        );
        let observations =
            tokio::time::timeout(self.settings.fetch_timeout, self.provider.fetch_indicators())
                .await
                .map_err(|_| EconomicDataError::Timeout {
                    duration_ms: self.settings.fetch_timeout.as_millis() as u64,
                })??;

        if observations.is_empty() {
            return Err(EconomicDataError::EmptyResponse);
        }

        let snapshot = EconomicSnapshot::from_observations(&observations, Utc::now());
        if !snapshot.defaulted.is_empty() {
            warn!(
                "EconomicIndicatorCache: {} did not supply {:?}, using defaults for them",
                self.provider.name(),
                snapshot.defaulted
            );
        }
        info!(
            "EconomicIndicatorCache: snapshot refreshed from {} (policy={:.2}%, mortgage={:.2}%, rate_env={:.2})",
            self.provider.name(),
            snapshot.indicators.policy_rate,
            snapshot.indicators.mortgage_rate_5y,
            snapshot.composites.interest_rate_environment
        );
        Ok(snapshot)
    }

    fn publish(&self, snapshot: Arc<EconomicSnapshot>) {
        let published = Published {
            snapshot,
            refreshed_at: Instant::now(),
            invalidated: false,
        };
        match self.published.write() {
            Ok(mut guard) => *guard = Some(published),
            Err(poisoned) => {
                tracing::error!("EconomicIndicatorCache: lock poisoned during publish, recovering");
                *poisoned.into_inner() = Some(published);
            }
        }
        self.clear_failure();
    }

    fn record_failure(&self) {
        match self.last_failure.write() {
            Ok(mut guard) => *guard = Some(Instant::now()),
            Err(poisoned) => *poisoned.into_inner() = Some(Instant::now()),
        }
    }

    fn clear_failure(&self) {
        match self.last_failure.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}
