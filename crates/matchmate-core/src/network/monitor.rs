//! Connectivity monitor.
//!
//! Observes network reachability by probing lightweight endpoints from a
//! background tokio task and reports connected/disconnected transitions
//! through a callback. Monitoring is best-effort: if observation itself
//! fails (probe client cannot be built, no probe URLs configured) the
//! state remains connected rather than raising an error.
//!
//! `is_connected()` defaults to connected before the first observation so
//! a cold start never shows a false "offline" state.

use crate::config::NetworkConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for connectivity probing.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// URLs to probe for connectivity (in order of preference).
    pub probe_urls: Vec<String>,
    /// Timeout for each probe request.
    pub probe_timeout: Duration,
    /// How often to re-probe.
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_urls: vec!["https://randomuser.me/api?results=1".to_string()],
            probe_timeout: NetworkConfig::PROBE_TIMEOUT,
            poll_interval: Duration::from_secs(30),
        }
    }
}

/// Network reachability monitor.
///
/// Cheap to clone; clones share the same observed state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    /// Last known reachability. Connected until observed otherwise.
    connected: AtomicBool,
    /// Whether the background task should keep running.
    active: AtomicBool,
    /// Held while the callback runs. `stop` acquires it after clearing
    /// `active`, so an in-flight callback finishes before `stop` returns
    /// and no later one starts.
    callback_gate: Mutex<()>,
    config: MonitorConfig,
}

impl ConnectivityMonitor {
    /// Create a monitor with default probe configuration.
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default())
    }

    /// Create a monitor with custom probe configuration.
    pub fn with_config(config: MonitorConfig) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                connected: AtomicBool::new(true),
                active: AtomicBool::new(false),
                callback_gate: Mutex::new(()),
                config,
            }),
        }
    }

    /// Last known reachability state.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Start observing reachability on a background task.
    ///
    /// `on_change` fires once with the initial observed state and then on
    /// every transition until [`stop`](Self::stop) is called. Calling
    /// `start` while already observing is a no-op.
    pub fn start<F>(&self, on_change: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        if self.inner.active.swap(true, Ordering::SeqCst) {
            debug!("Connectivity monitoring already active");
            return;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            info!("Starting connectivity monitoring");

            // Initial observation, reported unconditionally.
            let initial = probe_all(&inner.config).await;
            inner.connected.store(initial, Ordering::SeqCst);
            {
                let _gate = inner
                    .callback_gate
                    .lock()
                    .unwrap_or_else(|e| e.into_inner());
                if inner.active.load(Ordering::SeqCst) {
                    on_change(initial);
                }
            }

            while inner.active.load(Ordering::SeqCst) {
                tokio::time::sleep(inner.config.poll_interval).await;

                if !inner.active.load(Ordering::SeqCst) {
                    break;
                }

                let connected = probe_all(&inner.config).await;
                let previous = inner.connected.swap(connected, Ordering::SeqCst);
                if connected != previous {
                    if connected {
                        info!("Network connectivity restored");
                    } else {
                        warn!("Network connectivity lost - all probe URLs failed");
                    }
                    let _gate = inner
                        .callback_gate
                        .lock()
                        .unwrap_or_else(|e| e.into_inner());
                    if inner.active.load(Ordering::SeqCst) {
                        on_change(connected);
                    }
                }
            }

            info!("Connectivity monitoring stopped");
        });
    }

    /// Stop observing. No further callbacks fire after this returns:
    /// clearing `active` stops new callbacks, and taking the gate waits
    /// out one that already started.
    pub fn stop(&self) {
        self.inner.active.store(false, Ordering::SeqCst);
        drop(
            self.inner
                .callback_gate
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );
    }

    /// Whether the background task is active.
    pub fn is_monitoring(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe the configured URLs, returning true if any is reachable.
///
/// An empty probe list and a probe client that cannot be built both count
/// as "remains connected": monitoring failure must never look like an
/// offline network.
async fn probe_all(config: &MonitorConfig) -> bool {
    if config.probe_urls.is_empty() {
        return true;
    }

    let client = match reqwest::Client::builder()
        .timeout(config.probe_timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to create probe client, assuming connected: {}", e);
            return true;
        }
    };

    for url in &config.probe_urls {
        match client.head(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                // Redirects and auth/rate-limit refusals still prove the
                // network path works.
                if status.is_success() || status.is_redirection() || status.as_u16() == 403 {
                    return true;
                }
                debug!("Probe {} answered with status {}", url, status);
            }
            Err(e) => {
                debug!("Probe failed for {}: {}", url, e);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn no_probe_config() -> MonitorConfig {
        MonitorConfig {
            probe_urls: vec![],
            probe_timeout: Duration::from_millis(10),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_connected_by_default() {
        let monitor = ConnectivityMonitor::new();
        assert!(monitor.is_connected());
        assert!(!monitor.is_monitoring());
    }

    #[tokio::test]
    async fn test_initial_state_is_reported() {
        let monitor = ConnectivityMonitor::with_config(no_probe_config());
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        monitor.start(move |connected| {
            assert!(connected);
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(calls.load(Ordering::SeqCst) >= 1);
        assert!(monitor.is_connected());
        monitor.stop();
    }

    #[tokio::test]
    async fn test_stop_halts_callbacks() {
        let monitor = ConnectivityMonitor::with_config(no_probe_config());
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        monitor.start(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        monitor.stop();
        assert!(!monitor.is_monitoring());

        let after_stop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        // No-transition polls never fire the callback, and after stop
        // nothing does.
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_waits_for_in_flight_callback() {
        let monitor = ConnectivityMonitor::with_config(no_probe_config());
        let entered = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let entered_clone = entered.clone();
        let finished_clone = finished.clone();

        monitor.start(move |_| {
            entered_clone.store(true, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(100));
            finished_clone.store(true, Ordering::SeqCst);
        });

        while !entered.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let stopper = monitor.clone();
        tokio::task::spawn_blocking(move || stopper.stop())
            .await
            .unwrap();

        // stop returned, so the callback that was running must be done.
        assert!(finished.load(Ordering::SeqCst));
        assert!(!monitor.is_monitoring());
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let monitor = ConnectivityMonitor::with_config(no_probe_config());
        monitor.start(|_| {});
        monitor.start(|_| {});
        assert!(monitor.is_monitoring());
        monitor.stop();
    }

    #[tokio::test]
    async fn test_empty_probe_list_remains_connected() {
        assert!(probe_all(&no_probe_config()).await);
    }
}
